//! Filename sanitization, item naming and collision-free path resolution.

use std::path::{Path, PathBuf};

use crate::api::ItemRecord;

/// Characters that are replaced with `_` in every local name.
pub const FORBIDDEN_CHARS: [char; 11] = ['(', ')', '/', '\\', '<', '>', '"', '|', ':', '*', '?'];

/// Extension given to every downloaded item.
pub const ITEM_EXTENSION: &str = "pdf";

/// Suffix of in-flight downloads.
pub(crate) const PARTIAL_SUFFIX: &str = ".part";

/// Longest item stem in bytes, leaving room for ` (N).pdf.part`.
const MAX_STEM_BYTES: usize = 200;

/// First number tried when a target file already exists.
const FIRST_COLLISION_SUFFIX: u32 = 2;

/// Replaces every forbidden character with `_`.
///
/// Every other character is preserved, and sanitizing an already-clean
/// string returns it unchanged.
#[must_use]
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Local directory name for a remote folder.
///
/// Falls back to the folder's id when the sanitized name would not be a
/// normal path component (empty, `.` or `..`), so no folder can resolve
/// outside its parent.
#[must_use]
pub fn folder_dir_name(name: &str, folder_id: &str) -> String {
    let sanitized = sanitize(name);
    if is_normal_component(&sanitized) {
        return sanitized;
    }
    let fallback = sanitize(folder_id);
    if is_normal_component(&fallback) {
        fallback
    } else {
        "_".to_string()
    }
}

/// File stem (without extension) for an item.
///
/// Unnamed items use the date part of their creation timestamp; named items
/// use `"<name> - <description>"`, or just the name when there is no
/// description.
#[must_use]
pub fn item_file_stem(item: &ItemRecord) -> String {
    let raw = if item.name.is_empty() {
        item.created_at.chars().take(10).collect::<String>()
    } else if item.description.is_empty() {
        item.name.clone()
    } else {
        format!("{} - {}", item.name, item.description)
    };

    let stem = truncate_to_char_boundary(&sanitize(&raw), MAX_STEM_BYTES).to_string();
    if is_normal_component(&stem) {
        stem
    } else {
        folder_dir_name("", &item.id)
    }
}

/// Resolves `<dir>/<stem>.pdf`, or the first free `<dir>/<stem> (N).pdf`
/// with N starting at 2. Existing files are never returned.
#[must_use]
pub fn resolve_collision_free_path(dir: &Path, stem: &str) -> PathBuf {
    let base_path = dir.join(format!("{stem}.{ITEM_EXTENSION}"));
    if !base_path.exists() {
        return base_path;
    }

    let mut n = FIRST_COLLISION_SUFFIX;
    loop {
        let candidate = dir.join(format!("{stem} ({n}).{ITEM_EXTENSION}"));
        if !candidate.exists() {
            return candidate;
        }
        n = n.saturating_add(1);
    }
}

/// Path of the in-flight file for `target`.
#[must_use]
pub(crate) fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(PARTIAL_SUFFIX);
    target.with_file_name(name)
}

fn is_normal_component(name: &str) -> bool {
    !name.trim().is_empty() && name != "." && name != ".."
}

fn truncate_to_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
