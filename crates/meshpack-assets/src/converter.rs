//! Conversion of source models into mesh packages

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use meshpack_core::package::{
    encode_mesh_data, encode_vertex_format, is_valid_mesh_name, mesh_file_name, MeshData,
    MeshRecord, VertexFormatData, FORMAT_FILE_NAME,
};
use meshpack_core::{AssetError, AttributeRecipe, RecipeEntry, INDEX_SIZE};
use tracing::{debug, info};

use crate::gltf_loader::GltfSource;
use crate::mesh::SourceSubMesh;
use crate::source::MeshSource;

/// Converted geometry of one destination mesh, before it is written.
#[derive(Debug, Clone, Default)]
struct ConvertedMesh {
    source: PathBuf,
    data: MeshData,
    vertex_count: u32,
    index_count: u32,
}

/// Converts source models into one package folder with a single vertex format.
///
/// Add the recipe first, then load any number of sources, then write them out
/// with [`MeshConverter::convert`].
pub struct MeshConverter<S = GltfSource> {
    source: S,
    recipe: AttributeRecipe,
    meshes: BTreeMap<String, ConvertedMesh>,
}

impl MeshConverter<GltfSource> {
    pub fn new() -> Self {
        Self::with_source(GltfSource)
    }
}

impl Default for MeshConverter<GltfSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MeshSource> MeshConverter<S> {
    /// Create a converter reading models through `source`.
    pub fn with_source(source: S) -> Self {
        info!("Mesh converter created");
        Self {
            source,
            recipe: AttributeRecipe::new(),
            meshes: BTreeMap::new(),
        }
    }

    /// Append one attribute to the output vertex layout. The recipe is frozen
    /// once the first mesh is loaded.
    pub fn add_attribute(&mut self, entry: RecipeEntry) -> Result<(), AssetError> {
        if !self.meshes.is_empty() {
            return Err(AssetError::RecipeLocked);
        }
        debug!(
            "Recipe attribute '{}': {} as {}",
            entry.name, entry.kind, entry.format
        );
        self.recipe.push(entry);
        Ok(())
    }

    pub fn recipe(&self) -> &AttributeRecipe {
        &self.recipe
    }

    /// Names of the meshes loaded so far, sorted.
    pub fn mesh_names(&self) -> impl Iterator<Item = &str> {
        self.meshes.keys().map(String::as_str)
    }

    /// Convert every sub-mesh of the model at `path` into one mesh named
    /// `name`, or the file stem when `name` is `None`.
    pub fn load(&mut self, path: &Path, name: Option<&str>) -> Result<(), AssetError> {
        if !path.exists() {
            return Err(AssetError::MissingAsset(path.to_path_buf()));
        }
        if self.recipe.is_empty() {
            return Err(AssetError::EmptyRecipe);
        }
        if let Some(entry) = self.recipe.first_unsupported() {
            return Err(AssetError::UnsupportedFormat {
                attribute: entry.name.clone(),
                format: entry.format,
            });
        }

        let name = match name {
            Some(name) => name.to_owned(),
            None => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        if !is_valid_mesh_name(&name) {
            return Err(AssetError::InvalidMeshName(name));
        }
        if let Some(existing) = self.meshes.get(&name) {
            return Err(AssetError::DuplicateMesh {
                first: existing.source.display().to_string(),
                second: path.display().to_string(),
                name,
            });
        }

        info!("Loading for converting: {}", path.display());

        let sub_meshes = self.source.load(path)?;
        let mesh = convert_sub_meshes(path, &self.recipe, &sub_meshes)?;

        let (indices, vertices) = self.meshes.values().fold(
            (u64::from(mesh.index_count), u64::from(mesh.vertex_count)),
            |(i, v), m| (i + u64::from(m.index_count), v + u64::from(m.vertex_count)),
        );
        if indices > u64::from(u32::MAX) || vertices > u64::from(u32::MAX) {
            return Err(AssetError::IndexOverflow(name));
        }

        info!(
            "Mesh '{}': {} vertices, {} indices from {} sub-meshes",
            name,
            mesh.vertex_count,
            mesh.index_count,
            sub_meshes.len()
        );

        self.meshes.insert(name, mesh);
        Ok(())
    }

    /// Load every file in `dir` with the given extension, in file name order,
    /// each under its file stem. Returns how many files were loaded.
    pub fn load_directory(&mut self, dir: &Path, extension: &str) -> Result<usize, AssetError> {
        let mut paths = source_files(dir, extension)?;
        paths.sort();
        for path in &paths {
            self.load(path, None)?;
        }
        Ok(paths.len())
    }

    /// Write `format.mpk` and one `<mesh>.mpk` per loaded mesh into `dst`.
    ///
    /// Files are staged next to their targets and renamed into place only
    /// after every write succeeded; a failed call publishes nothing.
    pub fn convert(&self, dst: &Path) -> Result<(), AssetError> {
        info!("Converting to folder {}", dst.display());

        fs::create_dir_all(dst).map_err(|e| AssetError::Io(dst.to_path_buf(), e))?;

        let format = VertexFormatData {
            attributes: self.recipe.layout().iter().cloned().collect(),
            meshes: self.mesh_records()?,
        };

        // the format index goes last so it never names a mesh file that is missing
        let mut staged = StagedFiles::default();
        for (name, mesh) in &self.meshes {
            staged.write(dst.join(mesh_file_name(name)), &encode_mesh_data(&mesh.data))?;
        }
        staged.write(dst.join(FORMAT_FILE_NAME), &encode_vertex_format(&format))?;
        staged.publish()?;

        info!(
            "Wrote {} meshes with stride {} to {}",
            self.meshes.len(),
            self.recipe.stride(),
            dst.display()
        );
        Ok(())
    }

    /// Index records in name order. `first_index` assumes the whole folder is
    /// loaded, packed in that same order.
    fn mesh_records(&self) -> Result<BTreeMap<String, MeshRecord>, AssetError> {
        let mut first_index = 0u32;
        let mut records = BTreeMap::new();
        for (name, mesh) in &self.meshes {
            records.insert(
                name.clone(),
                MeshRecord {
                    first_index,
                    index_count: mesh.index_count,
                    vertex_count: mesh.vertex_count,
                },
            );
            first_index = first_index
                .checked_add(mesh.index_count)
                .ok_or_else(|| AssetError::IndexOverflow(name.clone()))?;
        }
        Ok(records)
    }
}

/// Interleave every sub-mesh's vertices per `recipe` and concatenate their
/// indices, offsetting each sub-mesh by the vertices already written.
fn convert_sub_meshes(
    path: &Path,
    recipe: &AttributeRecipe,
    sub_meshes: &[SourceSubMesh],
) -> Result<ConvertedMesh, AssetError> {
    let stride = recipe.stride();
    let total_vertices: usize = sub_meshes.iter().map(SourceSubMesh::vertex_count).sum();
    let vertex_count = u32::try_from(total_vertices).map_err(|_| {
        AssetError::SourceLoadFailed(path.to_path_buf(), "more than 2^32 vertices".into())
    })?;

    let mut mesh = ConvertedMesh {
        source: path.to_path_buf(),
        data: MeshData {
            vertices: Vec::with_capacity(total_vertices * stride),
            indices: Vec::new(),
        },
        vertex_count,
        index_count: 0,
    };

    let mut base_vertex = 0u32;
    for sub_mesh in sub_meshes {
        if let Some(entry) = recipe.entries().iter().find(|e| !sub_mesh.has(e.kind)) {
            return Err(AssetError::MissingSourceAttribute {
                path: path.to_path_buf(),
                attribute: entry.name.clone(),
                kind: entry.kind,
            });
        }

        write_vertices(path, recipe, sub_mesh, &mut mesh.data.vertices)?;

        let sub_vertices = sub_mesh.vertex_count() as u32;
        for index in sub_mesh.triangle_indices() {
            if index >= sub_vertices {
                return Err(AssetError::SourceLoadFailed(
                    path.to_path_buf(),
                    format!("index {index} out of range for {sub_vertices} vertices"),
                ));
            }
            mesh.data
                .indices
                .extend_from_slice(&(base_vertex + index).to_ne_bytes());
        }
        base_vertex += sub_vertices;
    }

    mesh.index_count = u32::try_from(mesh.data.indices.len() / INDEX_SIZE).map_err(|_| {
        AssetError::SourceLoadFailed(path.to_path_buf(), "more than 2^32 indices".into())
    })?;
    Ok(mesh)
}

fn write_vertices(
    path: &Path,
    recipe: &AttributeRecipe,
    sub_mesh: &SourceSubMesh,
    out: &mut Vec<u8>,
) -> Result<(), AssetError> {
    for vertex in 0..sub_mesh.vertex_count() {
        for entry in recipe.entries() {
            let value = sub_mesh.field(entry.kind, vertex).ok_or_else(|| {
                AssetError::MissingSourceAttribute {
                    path: path.to_path_buf(),
                    attribute: entry.name.clone(),
                    kind: entry.kind,
                }
            })?;
            entry
                .format
                .encode(value, out)
                .map_err(|e| AssetError::UnsupportedFormat {
                    attribute: entry.name.clone(),
                    format: e.0,
                })?;
        }
    }
    Ok(())
}

/// Files in `dir` whose extension matches `extension`, case-insensitively.
fn source_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, AssetError> {
    if !dir.is_dir() {
        return Err(AssetError::MissingAsset(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|e| AssetError::Io(dir.to_path_buf(), e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| AssetError::Io(dir.to_path_buf(), e))?.path();
        let matches = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if path.is_file() && matches {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Temporary files awaiting an all-or-nothing rename. Anything still pending
/// when this is dropped is deleted.
#[derive(Default)]
struct StagedFiles {
    pending: Vec<(PathBuf, PathBuf)>,
}

impl StagedFiles {
    fn write(&mut self, target: PathBuf, bytes: &[u8]) -> Result<(), AssetError> {
        let mut staging = target.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        fs::write(&staging, bytes).map_err(|e| AssetError::Io(staging.clone(), e))?;
        self.pending.push((staging, target));
        Ok(())
    }

    /// Rename every staged file into place, in staging order. If a rename
    /// fails, targets already renamed by this call are removed again and the
    /// files still staged are deleted on drop.
    fn publish(mut self) -> Result<(), AssetError> {
        let mut published = Vec::with_capacity(self.pending.len());
        while !self.pending.is_empty() {
            let (staging, target) = self.pending.remove(0);
            if let Err(e) = fs::rename(&staging, &target) {
                let _ = fs::remove_file(&staging);
                for done in &published {
                    let _ = fs::remove_file(done);
                }
                return Err(AssetError::Io(target, e));
            }
            published.push(target);
        }
        Ok(())
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        for (staging, _) in &self.pending {
            let _ = fs::remove_file(staging);
        }
    }
}
