//! Configuration and settings management

use crate::cloud::RenderOptions;
use crate::loader::{LoadOptions, DEFAULT_UNIT};
use crate::search::SearchBackendKind;
use crate::sort::SortPolicy;
use crate::tree::TreeOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// How to resolve leaves that are neither branches nor disk entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openfile_fallback: Option<String>,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub tree: TreeSettings,
    #[serde(default)]
    pub disk: DiskSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub space: SpaceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub robots_txt: String,
    pub logo_href: String,
    pub logo_img: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2010,
            robots_txt: "User-agent: *\nDisallow: *".to_string(),
            logo_href: "http://localhost".to_string(),
            logo_img: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreeSettings {
    /// Bytes per report block
    pub unit: u64,
    pub aggregate: bool,
    /// Sizes are abstract counts, not bytes on a disk
    pub non_disk: bool,
    pub sort: SortPolicy,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            unit: DEFAULT_UNIT,
            aggregate: false,
            non_disk: false,
            sort: SortPolicy::Version,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiskSettings {
    pub document_root: PathBuf,
    /// File shown above a directory read from disk, like Apache's HeaderName
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,
    /// File shown below a directory read from disk, like Apache's ReadmeName
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme_name: Option<String>,
    pub index_ignore: Vec<String>,
    /// Extension (with its dot) to mime type
    pub mimetypes: BTreeMap<String, String>,
    /// Write entries read from disk back into the tree
    pub update_cache_from_disk: bool,
}

impl Default for DiskSettings {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("/"),
            header_name: None,
            readme_name: None,
            index_ignore: vec!["*~".to_string()],
            mimetypes: [".dir", ".info", ".log"]
                .into_iter()
                .map(|ext| (ext.to_string(), "text/plain".to_string()))
                .collect(),
            update_cache_from_disk: false,
        }
    }
}

impl DiskSettings {
    /// Configured mime type for `path`, by extension.
    pub fn mimetype_for(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_str()?;
        self.mimetypes.get(&format!(".{}", ext)).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    pub backend: SearchBackendKind,
    pub dict_host: String,
    pub search_tip: String,
    pub checkbox_tip: String,
    pub read_from_disk_tip: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self {
            backend: SearchBackendKind::Locate,
            dict_host: "localhost".to_string(),
            search_tip: render.search_tip,
            checkbox_tip: render.checkbox_tip,
            read_from_disk_tip: render.read_from_disk_tip,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpaceSettings {
    /// Filesystem types or sources left out of the space tree
    pub ignore_filesystems: Vec<String>,
}

impl Default for SpaceSettings {
    fn default() -> Self {
        Self {
            ignore_filesystems: vec!["tmpfs".to_string(), "udev".to_string()],
        }
    }
}

impl Settings {
    /// Load settings from a file, or return defaults if file doesn't exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        Ok(settings)
    }

    /// Save settings to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(())
    }

    /// Get the default settings file path
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dircloud");

        config_dir.join("settings.toml")
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            unit: self.tree.unit,
            tree: TreeOptions {
                aggregate: self.tree.aggregate,
                sort: self.tree.sort,
            },
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            logo_href: self.server.logo_href.clone(),
            logo_img: self.server.logo_img.clone(),
            search_tip: self.search.search_tip.clone(),
            checkbox_tip: self.search.checkbox_tip.clone(),
            read_from_disk_tip: self.search.read_from_disk_tip.clone(),
            non_disk: self.tree.non_disk,
        }
    }
}

// Config directory lookup without pulling in the dirs crate
mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var_os("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var_os("APPDATA").map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }
}
