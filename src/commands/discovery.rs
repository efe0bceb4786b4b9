//! On-disk command units
//!
//! A command unit is a YAML or JSON manifest somewhere below the commands
//! root. It is marked as a command by a top-level `command:` key naming a type
//! identifier known to the [`CommandCatalog`](super::catalog::CommandCatalog).
//! The remaining keys are [`CommandOptions`] overrides, guard identifiers and
//! free-form `settings` handed to the command factory.
//!
//! ```yaml
//! command: SayCommand
//! name: rules
//! aliases: [r]
//! cooldown_ms: 10000
//! guards: [ServerOnlyGuard]
//! settings:
//!   text: Be nice.
//! ```
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use anyhow::{anyhow, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::metadata::{CommandOptions, UNCATEGORIZED};

/// Extensions scanned when none are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// File stem suffixes that mark fixtures and declaration files
const EXCLUDED_MARKERS: &[&str] = &[".test", ".spec", ".d"];

pub fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// A manifest file found below the commands root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredUnit {
    pub path: PathBuf,
    /// First directory below the root, or `uncategorized`
    pub category: String,
}

/// One command declaration inside a unit
#[derive(Debug, Clone, Deserialize)]
pub struct CommandManifest {
    /// Type identifier resolved through the catalog
    pub command: String,
    #[serde(flatten)]
    pub options: CommandOptions,
    #[serde(default)]
    pub guards: Vec<String>,
    #[serde(default)]
    pub settings: serde_yaml::Value,
}

impl CommandManifest {
    /// Look up a string setting
    pub fn setting_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(serde_yaml::Value::as_str)
    }
}

/// Recursively collect units under `root`, sorted by path
///
/// Only an unreadable root is an error. Subdirectories and entries that
/// cannot be read are logged and skipped. Symlinked directories are
/// followed once each.
pub async fn discover_units(root: &Path, extensions: &[String]) -> Result<Vec<DiscoveredUnit>> {
    let mut units = Vec::new();
    let mut visited = HashSet::new();
    if let Ok(canonical) = tokio::fs::canonicalize(root).await {
        visited.insert(canonical);
    }

    let mut entries = tokio::fs::read_dir(root)
        .await
        .map_err(|e| anyhow!("Failed to read {}: {}", root.display(), e))?;
    let mut pending = Vec::new();
    scan_dir(root, &mut entries, extensions, &mut visited, &mut pending, &mut units).await;

    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                continue;
            }
        };
        scan_dir(root, &mut entries, extensions, &mut visited, &mut pending, &mut units).await;
    }

    units.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(units)
}

async fn scan_dir(
    root: &Path,
    entries: &mut tokio::fs::ReadDir,
    extensions: &[String],
    visited: &mut HashSet<PathBuf>,
    pending: &mut Vec<PathBuf>,
    units: &mut Vec<DiscoveredUnit>,
) {
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Stopped reading a directory below {}: {}", root.display(), e);
                break;
            }
        };
        let path = entry.path();

        // follows symlinks
        let is_dir = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.is_dir(),
            Err(e) => {
                warn!("Skipping unreadable entry {}: {}", path.display(), e);
                continue;
            }
        };

        if is_dir {
            match tokio::fs::canonicalize(&path).await {
                Ok(canonical) => {
                    if visited.insert(canonical) {
                        pending.push(path);
                    } else {
                        debug!("Already scanned {}, skipping", path.display());
                    }
                }
                Err(e) => warn!("Skipping unreadable directory {}: {}", path.display(), e),
            }
        } else if is_candidate(&path, extensions) {
            let category = category_for(root, &path);
            units.push(DiscoveredUnit { path, category });
        }
    }
}

/// Whether a file has a scanned extension and is not a fixture/declaration
pub fn is_candidate(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    if !extensions
        .iter()
        .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    {
        return false;
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    !EXCLUDED_MARKERS.iter().any(|marker| stem.ends_with(marker))
}

/// Category of a unit: the first path segment below `root`
pub fn category_for(root: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return UNCATEGORIZED.to_string();
    };

    let mut components = relative.components();
    match (components.next(), components.next()) {
        (Some(first), Some(_)) => first.as_os_str().to_string_lossy().into_owned(),
        _ => UNCATEGORIZED.to_string(),
    }
}

/// Read and parse every command declaration in a unit
///
/// Returns an empty list for files that are valid but not marked as
/// commands.
pub async fn read_manifests(path: &Path) -> Result<Vec<CommandManifest>> {
    let contents = tokio::fs::read_to_string(path).await?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let document: serde_yaml::Value = if is_json {
        serde_json::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };

    parse_document(document)
}

fn parse_document(document: serde_yaml::Value) -> Result<Vec<CommandManifest>> {
    let declarations = match document {
        serde_yaml::Value::Sequence(items) => items,
        serde_yaml::Value::Null => Vec::new(),
        other => vec![other],
    };

    declarations
        .into_iter()
        .filter(|decl| decl.get("command").is_some())
        .map(|decl| serde_yaml::from_value(decl).map_err(Into::into))
        .collect()
}
