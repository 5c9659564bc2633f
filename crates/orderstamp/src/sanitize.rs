//! Helpers for keeping paths out of log fields and for validating the folder
//! names that routing rules join onto the base folder.

use std::path::{Component, Path};

use crate::error::ValidationError;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Checks that `name` is a single relative path segment.
///
/// Routing targets are joined onto the configured base folder, so a name
/// containing separators, `..`, or a root would escape it.
pub fn validate_folder_name(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFolderName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(invalid("folder name is empty"));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(invalid("path separators are not allowed"));
    }

    let mut components = Path::new(trimmed).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), _) | (Some(Component::CurDir), _) => {
            Err(invalid("relative directory references are not allowed"))
        }
        _ => Err(invalid("must be a single folder name")),
    }
}
