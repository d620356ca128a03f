//! meshpack - converts source models into mesh packages and inspects them

mod settings;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use meshpack_assets::MeshConverter;
use meshpack_import::MeshImporter;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use settings::PipelineSettings;

const USAGE: &str = "\
Usage:
  meshpack convert [settings.toml]
  meshpack inspect <root> <mesh>...";

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("convert") => {
            let path = args.get(1).map(PathBuf::from);
            convert(path.as_deref())
        }
        Some("inspect") => match &args[1..] {
            [root, meshes @ ..] if !meshes.is_empty() => inspect(Path::new(root), meshes),
            _ => bail!("inspect needs a root folder and at least one mesh\n{USAGE}"),
        },
        Some("help" | "--help" | "-h") => {
            println!("{USAGE}");
            Ok(())
        }
        _ => bail!("Unknown command\n{USAGE}"),
    }
}

fn convert(settings_path: Option<&Path>) -> Result<()> {
    let settings = PipelineSettings::load_or_default_path(settings_path)?;

    for folder in &settings.folders {
        let output = settings.folder_output(folder);
        info!("Converting folder '{}' into {:?}", folder.name, output);

        let mut converter = MeshConverter::new();
        for entry in &folder.recipe {
            converter.add_attribute(entry.clone())?;
        }

        for source in &folder.sources {
            converter
                .load(&source.path, source.name.as_deref())
                .with_context(|| format!("Failed to load {:?}", source.path))?;
        }
        if let Some(dir) = &folder.source_dir {
            let count = converter
                .load_directory(dir, &folder.extension)
                .with_context(|| format!("Failed to load models from {:?}", dir))?;
            info!("Loaded {} models from {:?}", count, dir);
        }

        converter
            .convert(&output)
            .with_context(|| format!("Failed to convert folder '{}'", folder.name))?;
    }

    info!("Converted {} folders", settings.folders.len());
    Ok(())
}

fn inspect(root: &Path, meshes: &[String]) -> Result<()> {
    let importer = MeshImporter::open(root, meshes)
        .with_context(|| format!("Failed to open mesh packages in {:?}", root))?;

    let mut vertices = vec![0u8; importer.size_for_vertices()];
    let mut indices = vec![0u8; importer.size_for_indices()];
    let planner = importer.load(&mut vertices, &mut indices)?;

    let found: serde_json::Map<String, serde_json::Value> = planner
        .mesh_names()
        .into_iter()
        .filter_map(|name| planner.mesh(name).map(|found| (name, found)))
        .map(|(name, (draw, format))| {
            (
                name.to_owned(),
                json!({ "format": format, "draw": draw }),
            )
        })
        .collect();

    let report = json!({
        "root": root,
        "vertex_bytes": vertices.len(),
        "index_bytes": indices.len(),
        "formats": planner.format_groups(),
        "meshes": found,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
