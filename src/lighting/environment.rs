//! Environment map discovery and the `_ibl.ktx` / `_skybox.ktx` naming pair.

use std::path::{Path, PathBuf};

pub const IBL_SUFFIX: &str = "_ibl.ktx";
pub const SKYBOX_SUFFIX: &str = "_skybox.ktx";

/// Trailing selector entry that asks for a file instead of a named map.
pub const CUSTOM_ENVIRONMENT_ENTRY: &str = "Custom...";

pub fn ibl_path(resource_dir: &Path, name: &str) -> PathBuf {
    resource_dir.join(format!("{name}{IBL_SUFFIX}"))
}

pub fn default_ibl_path(resource_dir: &Path) -> PathBuf {
    ibl_path(resource_dir, super::DEFAULT_IBL)
}

/// Sibling skybox for an `_ibl.ktx` file. Other paths have no derived skybox.
pub fn skybox_path_for(ibl_path: &Path) -> Option<PathBuf> {
    let text = ibl_path.to_str()?;
    let stem = text.strip_suffix(IBL_SUFFIX)?;
    Some(PathBuf::from(format!("{stem}{SKYBOX_SUFFIX}")))
}

/// Names of the environment maps in `dir`, sorted, with the suffix removed.
///
/// An unreadable directory yields an empty list.
pub fn list_environment_maps(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::warn!("Cannot list resource directory {}: {}", dir.display(), err);
            return Vec::new();
        }
    };

    let mut file_names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    file_names.sort();

    file_names
        .into_iter()
        .filter_map(|name| {
            name.strip_suffix(IBL_SUFFIX)
                .filter(|stem| !stem.is_empty())
                .map(str::to_string)
        })
        .collect()
}

/// Selector entries: the discovered maps followed by the custom-file entry.
pub fn environment_choices(dir: &Path) -> Vec<String> {
    let mut choices = list_environment_maps(dir);
    choices.push(CUSTOM_ENVIRONMENT_ENTRY.to_string());
    choices
}
