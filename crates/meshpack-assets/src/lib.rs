//! Meshpack Assets - Source model loading and package conversion
//!
//! Reads glTF 2.0 models into sub-meshes and converts them into mesh package
//! folders, one vertex format per folder.

mod converter;
mod gltf_loader;
mod mesh;
mod source;

pub use converter::MeshConverter;
pub use gltf_loader::{load_gltf, GltfSource};
pub use mesh::SourceSubMesh;
pub use source::MeshSource;
