use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use meshpack_assets::{MeshConverter, MeshSource, SourceSubMesh};
use meshpack_core::package::{mesh_file_name, FORMAT_FILE_NAME};
use meshpack_core::{AssetError, AttributeKind, BufferKind, Format, MeshDrawInfo, RecipeEntry};
use meshpack_import::{MeshDrawPlanner, MeshGroup, MeshImporter};

struct MemorySource(HashMap<&'static str, Vec<SourceSubMesh>>);

impl MeshSource for MemorySource {
    fn load(&self, path: &Path) -> Result<Vec<SourceSubMesh>, AssetError> {
        let key = path.file_name().unwrap().to_string_lossy();
        self.0
            .get(&*key)
            .cloned()
            .ok_or_else(|| AssetError::SourceLoadFailed(path.to_path_buf(), "unknown".into()))
    }
}

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("meshpack-pipeline-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(dir.join("sources")).unwrap();
        Self(dir)
    }

    fn root(&self) -> PathBuf {
        self.0.join("packages")
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn quad() -> SourceSubMesh {
    SourceSubMesh {
        positions: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ],
        normals: Some(vec![[0.0, 0.0, 1.0]; 4]),
        indices: Some(vec![0, 1, 2, 0, 2, 3]),
        ..Default::default()
    }
}

fn triangle(z: f32) -> SourceSubMesh {
    SourceSubMesh {
        positions: vec![[0.0, 0.0, z], [1.0, 0.0, z], [0.0, 1.0, z]],
        normals: Some(vec![[0.0, 1.0, 0.0]; 3]),
        indices: None,
        ..Default::default()
    }
}

fn source() -> MemorySource {
    MemorySource(HashMap::from([
        ("wall.gltf", vec![quad()]),
        ("roof.gltf", vec![triangle(1.0)]),
        ("door.gltf", vec![quad(), triangle(2.0)]),
        ("marker.gltf", vec![triangle(5.0)]),
    ]))
}

/// "lit" holds door, roof and wall with positions and normals; "unlit"
/// holds marker with positions only.
fn convert_scene(dir: &TempDir) {
    let sources = dir.0.join("sources");
    let lit = [
        ("inPositions", AttributeKind::Position, Format::R32G32B32Sfloat),
        ("inNormals", AttributeKind::Normal, Format::R32G32B32Sfloat),
    ];
    let unlit = [("inPositions", AttributeKind::Position, Format::R32G32B32Sfloat)];

    for (folder, recipe, files) in [
        ("lit", &lit[..], &["wall", "roof", "door"][..]),
        ("unlit", &unlit[..], &["marker"][..]),
    ] {
        let mut converter = MeshConverter::with_source(source());
        for (name, kind, format) in recipe {
            converter
                .add_attribute(RecipeEntry::new(*name, *kind, *format))
                .unwrap();
        }
        for file in files {
            let path = sources.join(format!("{file}.gltf"));
            fs::write(&path, b"").unwrap();
            converter.load(&path, None).unwrap();
        }
        converter.convert(&dir.root().join(folder)).unwrap();
    }
}

fn load(root: &Path, requested: &[&str]) -> (MeshDrawPlanner, Vec<u8>, Vec<u8>) {
    let importer = MeshImporter::open(root, requested).unwrap();
    let mut vertices = vec![0u8; importer.size_for_vertices()];
    let mut indices = vec![0u8; importer.size_for_indices()];
    let planner = importer.load(&mut vertices, &mut indices).unwrap();
    (planner, vertices, indices)
}

fn floats(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes(c.try_into().unwrap()))
        .collect()
}

fn indices_of(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_ne_bytes(c.try_into().unwrap()))
        .collect()
}

#[test]
fn converted_geometry_survives_import() {
    let dir = TempDir::new();
    convert_scene(&dir);

    let (planner, vertices, indices) = load(&dir.root(), &["door"]);
    let (draw, format) = planner.mesh("door").unwrap();
    assert_eq!(format, "lit");
    assert_eq!(draw, MeshDrawInfo::new(0, 9, 0));

    assert_eq!(vertices.len(), 7 * 24);
    let floats = floats(&vertices);
    assert_eq!(&floats[..6], &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    assert_eq!(&floats[4 * 6..5 * 6], &[0.0, 0.0, 2.0, 0.0, 1.0, 0.0]);

    // second sub-mesh is indexed sequentially, after the quad's four vertices
    assert_eq!(indices_of(&indices), vec![0, 1, 2, 0, 2, 3, 4, 5, 6]);
}

#[test]
fn stride_matches_layout_offsets() {
    let dir = TempDir::new();
    convert_scene(&dir);

    let (planner, _, _) = load(&dir.root(), &["wall", "marker"]);
    let lit = &planner.format_groups()[0];
    assert_eq!(lit.stride(), 24);
    assert_eq!(lit.attribute("inPositions").unwrap().offset, 0);
    assert_eq!(lit.attribute("inNormals").unwrap().offset, 12);
    assert_eq!(
        lit.attribute("inNormals").unwrap().kind,
        AttributeKind::Normal
    );

    let unlit = &planner.format_groups()[1];
    assert_eq!(unlit.stride(), 12);
    assert!(!unlit.has_attribute("inNormals"));
}

#[test]
fn undersized_buffers_are_rejected_untouched() {
    let dir = TempDir::new();
    convert_scene(&dir);

    let importer = MeshImporter::open(dir.root(), &["wall", "marker"]).unwrap();
    let mut vertices = vec![0xab; importer.size_for_vertices() - 1];
    let mut indices = vec![0xab; importer.size_for_indices()];
    match importer.load(&mut vertices, &mut indices) {
        Err(AssetError::BufferTooSmall {
            buffer: BufferKind::Vertex,
            ..
        }) => {}
        other => panic!("expected BufferTooSmall, got: {:?}", other),
    }
    assert!(vertices.iter().all(|&b| b == 0xab));
    assert!(indices.iter().all(|&b| b == 0xab));
}

#[test]
fn second_folder_starts_after_the_first() {
    let dir = TempDir::new();
    convert_scene(&dir);

    let (mut planner, vertices, indices) = load(&dir.root(), &["wall", "roof", "marker"]);
    let names: Vec<&str> = planner.iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["lit", "unlit"]);

    // roof and wall: 3 + 4 vertices at 24 bytes, 3 + 6 indices
    let lit_vertices = 7 * 24;
    let lit_indices = 9 * 4;
    let unlit = &planner.format_groups()[1];
    assert_eq!(unlit.vertex_offset(), lit_vertices);
    assert_eq!(unlit.index_offset(), lit_indices);
    assert_eq!(vertices.len(), lit_vertices + 3 * 12);
    assert_eq!(indices.len(), lit_indices + 3 * 4);

    planner.draw("marker", "debug").unwrap();
    planner.draw("wall", "debug").unwrap();
    let marker = planner.format_groups()[1].groups()[0].draws()[0];
    assert_eq!(marker, MeshDrawInfo::new(9, 3, 0));
    let wall = planner.format_groups()[0].groups()[0].draws()[0];
    assert_eq!(wall, MeshDrawInfo::new(3, 6, 3));

    assert_eq!(
        floats(&vertices[lit_vertices..lit_vertices + 12]),
        vec![0.0, 0.0, 5.0]
    );
    assert_eq!(indices_of(&indices[lit_indices..]), vec![0, 1, 2]);
}

#[test]
fn tag_groups_keep_first_draw_order() {
    let dir = TempDir::new();
    convert_scene(&dir);

    let (mut planner, _, _) = load(&dir.root(), &["door", "roof", "wall"]);
    planner.draw("wall", "phong").unwrap();
    planner.draw("roof", "phong").unwrap();
    planner.draw("door", "flat").unwrap();

    let lit = &planner.format_groups()[0];
    let tags: Vec<&str> = lit.iter().map(MeshGroup::tag).collect();
    assert_eq!(tags, vec!["phong", "flat"]);

    let (wall, _) = planner.mesh("wall").unwrap();
    let (roof, _) = planner.mesh("roof").unwrap();
    let (door, _) = planner.mesh("door").unwrap();
    assert_eq!(lit.groups()[0].draws(), &[wall, roof]);
    assert_eq!(lit.groups()[1].draws(), &[door]);
}

#[test]
fn repeated_draws_are_not_merged() {
    let dir = TempDir::new();
    convert_scene(&dir);

    let (mut planner, _, _) = load(&dir.root(), &["roof"]);
    planner.draw("roof", "flat").unwrap();
    planner.draw("roof", "flat").unwrap();

    let flat = &planner.format_groups()[0].groups()[0];
    assert_eq!(flat.len(), 2);
    assert_eq!(planner.draw_count(), 2);
}

#[test]
fn partial_selection_limits_sizes_and_meshes() {
    let dir = TempDir::new();
    convert_scene(&dir);

    let all = MeshImporter::open(dir.root(), &["door", "roof", "wall", "marker"]).unwrap();
    let some = MeshImporter::open(dir.root(), &["roof"]).unwrap();
    assert!(some.size_for_vertices() < all.size_for_vertices());
    assert_eq!(some.size_for_vertices(), 3 * 24);
    assert_eq!(some.size_for_indices(), 3 * 4);

    let (mut planner, _, _) = load(&dir.root(), &["roof"]);
    assert_eq!(planner.mesh_names(), vec!["roof"]);
    assert_eq!(planner.mesh("roof").unwrap().0, MeshDrawInfo::new(0, 3, 0));
    assert!(matches!(
        planner.draw("wall", "flat"),
        Err(AssetError::UnknownMesh(_))
    ));
    // unlit contributes an empty format group
    assert_eq!(planner.format_groups().len(), 2);
}

#[test]
fn unrequested_or_unknown_names_are_not_errors() {
    let dir = TempDir::new();
    convert_scene(&dir);

    let (mut planner, vertices, _) = load(&dir.root(), &["ghost"]);
    assert!(vertices.is_empty());
    assert!(matches!(
        planner.draw("ghost", "flat"),
        Err(AssetError::UnknownMesh(_))
    ));
}

#[test]
fn missing_format_file_stops_the_import() {
    let dir = TempDir::new();
    convert_scene(&dir);
    fs::remove_file(dir.root().join("unlit").join(FORMAT_FILE_NAME)).unwrap();

    match MeshImporter::open(dir.root(), &["marker"]) {
        Err(AssetError::MissingAsset(path)) => {
            assert_eq!(path, dir.root().join("unlit").join(FORMAT_FILE_NAME))
        }
        other => panic!("expected MissingAsset, got: {:?}", other),
    }
}

#[test]
fn mesh_in_two_folders_is_a_conflict() {
    let dir = TempDir::new();
    convert_scene(&dir);
    let lit = dir.root().join("lit");
    let copy = dir.root().join("lit_copy");
    fs::create_dir_all(&copy).unwrap();
    for file in [FORMAT_FILE_NAME.to_string(), mesh_file_name("roof")] {
        fs::copy(lit.join(&file), copy.join(&file)).unwrap();
    }

    assert!(matches!(
        MeshImporter::open(dir.root(), &["roof"]),
        Err(AssetError::DuplicateMesh { .. })
    ));
    // not requested, so not a conflict
    assert!(MeshImporter::open(dir.root(), &["marker"]).is_ok());
}

#[test]
fn version_bump_is_corrupt_package() {
    let dir = TempDir::new();
    convert_scene(&dir);
    let path = dir.root().join("lit").join(mesh_file_name("roof"));
    let mut bytes = fs::read(&path).unwrap();
    bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    let importer = MeshImporter::open(dir.root(), &["roof"]).unwrap();
    let mut vertices = vec![0; importer.size_for_vertices()];
    let mut indices = vec![0; importer.size_for_indices()];
    assert!(matches!(
        importer.load(&mut vertices, &mut indices),
        Err(AssetError::CorruptPackage { .. })
    ));
}
