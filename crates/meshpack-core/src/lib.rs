//! Meshpack Core - Shared data contract for the mesh pipeline
//!
//! This crate provides the types every stage of the pipeline agrees on:
//! - Vertex attribute encodings and semantics
//! - Attribute recipes and the vertex layouts they produce
//! - Draw info handed to the render loop
//! - The binary package layout written by the converter and mapped by the importer
//! - Common error types

pub mod draw;
pub mod error;
pub mod format;
pub mod package;
pub mod recipe;

pub use draw::{MeshDrawInfo, INDEX_SIZE};
pub use error::{AssetError, BufferKind, PackageError};
pub use format::{AttributeKind, Format, NoEncoding};
pub use recipe::{AttributeRecipe, NamedAttribute, RecipeEntry, VertexAttribute, VertexLayout};
