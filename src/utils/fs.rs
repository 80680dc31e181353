//! Filesystem helpers

use std::path::{Path, PathBuf};

use tokio::fs;

use autograder_common::{GradeError, GradeResult};

/// Delete a directory if present and create it again, empty.
pub async fn recreate_dir(path: &Path) -> GradeResult<()> {
    if fs::try_exists(path).await.unwrap_or(false) {
        fs::remove_dir_all(path)
            .await
            .map_err(|e| GradeError::fs(path, e))?;
    }
    fs::create_dir_all(path)
        .await
        .map_err(|e| GradeError::fs(path, e))
}

/// Read a file as text, replacing invalid UTF-8.
pub async fn read_text(path: &Path) -> GradeResult<String> {
    let bytes = fs::read(path).await.map_err(|e| GradeError::fs(path, e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Paths from `paths` that are not regular files.
pub fn missing_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().filter(|p| !p.is_file()).cloned().collect()
}

/// Base name of a path for display, falling back to the full path.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
