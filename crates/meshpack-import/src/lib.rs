//! Meshpack Import - Runtime loading of converted mesh packages
//!
//! Copies the geometry of requested meshes from one or more package folders
//! into caller-owned vertex and index buffers, then hands back a
//! [`MeshDrawPlanner`] that groups draws by vertex format and tag.

mod folder;
mod importer;
mod planner;

pub use folder::{FolderMeshes, MeshFolderImporter};
pub use importer::MeshImporter;
pub use planner::{MeshDrawPlanner, MeshFormatGroup, MeshGroup};
