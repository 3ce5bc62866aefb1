//! Destination layout: `<save_to>/<YYYY>/<MM>/<DD>/<original file name>`.
//!
//! The date comes from the asset's local capture time, not its upload time.
//! Two assets that resolve to the same path are treated as the same file.

use crate::api::AssetDescriptor;
use chrono::Datelike;
use std::path::{Path, PathBuf};

/// Final path of `asset` under `save_root`.
pub fn destination_path(save_root: &Path, asset: &AssetDescriptor) -> PathBuf {
    let date = asset.local_date_time.date();
    save_root
        .join(date.year().to_string())
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}", date.day()))
        .join(file_name_component(asset))
}

/// Characters the filesystem cannot hold inside one path component.
#[cfg(unix)]
fn is_forbidden(c: char) -> bool {
    c == '/' || c == '\0'
}

#[cfg(not(unix))]
fn is_forbidden(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// Keeps the server-provided name as a single path component: characters the
/// platform forbids in a file name become `_`, and a name that would escape
/// the day directory falls back to the asset id.
fn file_name_component(asset: &AssetDescriptor) -> String {
    let name: String = asset
        .original_file_name
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    match name.as_str() {
        "" | "." | ".." => asset.id.clone(),
        _ => name,
    }
}
