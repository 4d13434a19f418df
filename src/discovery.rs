//! Runtime discovery of module menu entries.
//!
//! Each immediate sub-directory of the modules directory is one module.
//! An optional `module.json` inside it overrides the label, icon and
//! description. Discovery runs before the controller is built; the
//! controller never knows where its sections came from.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::ConsoleError;
use crate::types::{MenuItem, META_PATH};

/// Manifest file read from a module directory.
pub const MODULE_MANIFEST: &str = "module.json";

/// Item id prefix for discovered modules.
pub const MODULE_ID_PREFIX: &str = "module:";

const DEFAULT_MODULE_ICON: &str = "📦";

#[derive(Debug, Default, Deserialize)]
struct ModuleManifest {
    name: Option<String>,
    icon: Option<String>,
    description: Option<String>,
    enabled: Option<bool>,
}

/// Discover module items under `dir`, sorted by directory name.
///
/// A missing directory yields no items. Hidden (`.`) and private (`_`)
/// directories are skipped. A malformed manifest does not hide the module;
/// it falls back to the directory name.
///
/// # Errors
/// Returns an error if `dir` exists but cannot be read.
pub fn discover_modules(dir: &Path) -> Result<Vec<MenuItem>, ConsoleError> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "modules directory absent");
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|source| ConsoleError::Discovery {
            path: dir.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let name = match entry.file_name().to_str() {
            Some(name) => name,
            None => continue,
        };

        if name.starts_with('.') || name.starts_with('_') {
            continue;
        }

        items.push(module_item(name, entry.path()));
    }

    tracing::info!(dir = %dir.display(), count = items.len(), "discovered modules");
    Ok(items)
}

fn module_item(dir_name: &str, path: &Path) -> MenuItem {
    let manifest = read_manifest(path);

    MenuItem::new(format!("{MODULE_ID_PREFIX}{dir_name}"), manifest.name.unwrap_or_else(|| dir_name.to_string()))
        .icon(manifest.icon.unwrap_or_else(|| DEFAULT_MODULE_ICON.to_string()))
        .description(manifest.description.unwrap_or_default())
        .enabled(manifest.enabled.unwrap_or(true))
        .with_meta(META_PATH, path.display().to_string())
}

fn read_manifest(module_dir: &Path) -> ModuleManifest {
    let path = module_dir.join(MODULE_MANIFEST);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return ModuleManifest::default(),
    };

    match serde_json::from_str(&raw) {
        Ok(manifest) => manifest,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring malformed module manifest");
            ModuleManifest::default()
        }
    }
}

/// File count and total size of a module directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModuleStats {
    pub files: usize,
    pub bytes: u64,
}

pub fn module_stats(path: &Path) -> ModuleStats {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .fold(ModuleStats::default(), |mut stats, entry| {
            stats.files += 1;
            stats.bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            stats
        })
}

/// Directory recorded on a discovered item.
pub fn module_path(item: &MenuItem) -> Option<PathBuf> {
    item.meta(META_PATH).map(PathBuf::from)
}

// ============================================================================
// TESTS
// ============================================================================
