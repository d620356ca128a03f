//! Pipeline settings
//!
//! Describes which source models are converted into which folders, and with
//! which attribute recipe. Read from `~/.config/meshpack/pipeline.toml` unless
//! a path is given on the command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use meshpack_core::RecipeEntry;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Everything `meshpack convert` needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Root folder receiving one subfolder per converted folder
    pub output_root: PathBuf,
    #[serde(default)]
    pub folders: Vec<FolderSettings>,
}

impl PipelineSettings {
    /// Get the default settings file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("meshpack").join("pipeline.toml"))
    }

    /// Load settings from `path`. Relative paths inside the file are
    /// resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let mut settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        settings.resolve(base);
        settings.validate()?;

        info!(
            "Loaded pipeline settings from {:?}: {} folders",
            path,
            settings.folders.len()
        );
        Ok(settings)
    }

    /// Load from the command line path, or from the default location.
    pub fn load_or_default_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let Some(path) = Self::default_path() else {
                    bail!("Could not determine config directory");
                };
                Self::load(&path)
            }
        }
    }

    /// Folder destination under the output root
    pub fn folder_output(&self, folder: &FolderSettings) -> PathBuf {
        self.output_root.join(&folder.name)
    }

    fn resolve(&mut self, base: &Path) {
        self.output_root = base.join(&self.output_root);
        for folder in &mut self.folders {
            for source in &mut folder.sources {
                source.path = base.join(&source.path);
            }
            if let Some(dir) = folder.source_dir.as_mut() {
                *dir = base.join(&*dir);
            }
        }
    }

    fn validate(&self) -> Result<()> {
        for (i, folder) in self.folders.iter().enumerate() {
            if folder.name.is_empty() || folder.name.contains(['/', '\\']) {
                bail!("Folder {} has an invalid name '{}'", i, folder.name);
            }
            if self.folders[..i].iter().any(|f| f.name == folder.name) {
                bail!("Folder '{}' is configured twice", folder.name);
            }
            if folder.sources.is_empty() && folder.source_dir.is_none() {
                bail!("Folder '{}' has no sources", folder.name);
            }
        }
        Ok(())
    }
}

/// One converted folder: a shared recipe and the models encoded with it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSettings {
    /// Folder name, also the format group name at runtime
    pub name: String,
    #[serde(default)]
    pub sources: Vec<SourceSettings>,
    /// Directory scanned for models with `extension`
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub recipe: Vec<RecipeEntry>,
}

/// A single source model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    pub path: PathBuf,
    /// Mesh name, defaults to the file stem
    #[serde(default)]
    pub name: Option<String>,
}

fn default_extension() -> String {
    "gltf".to_string()
}
