use crate::review::{EssayReview, ReviewError};
use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix identifying review files inside a reviews directory.
pub const REVIEW_FILE_SUFFIX: &str = ".review.json";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid review data in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ReviewError,
    },
    #[error("Invalid reviews directory: {0}")]
    InvalidReviewsDir(String),
}

/// Read and validate a review file
pub fn read_review(
    relative_path: &RelativePath,
    reviews_root: &Path,
) -> Result<EssayReview, IoError> {
    let absolute_path = relative_path.to_path(reviews_root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    let content = fs::read_to_string(&absolute_path).map_err(IoError::Io)?;
    EssayReview::from_json(&content).map_err(|source| IoError::Parse {
        path: absolute_path,
        source,
    })
}

/// Write a review as pretty JSON
pub fn write_review(
    relative_path: &RelativePath,
    reviews_root: &Path,
    review: &EssayReview,
) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(reviews_root);
    let content = review.to_json().map_err(|source| IoError::Parse {
        path: absolute_path.clone(),
        source,
    })?;

    // Create parent directories if they don't exist
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)?;
    log::debug!("wrote review {} to {}", review.essay_id(), absolute_path.display());
    Ok(())
}

/// Scan for review files in the reviews directory
pub fn scan_review_files(reviews_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    if !reviews_root.exists() {
        return Err(IoError::InvalidReviewsDir(
            "reviews directory not found".to_string(),
        ));
    }

    let mut files = Vec::new();
    scan_directory_recursive(reviews_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && name.ends_with(REVIEW_FILE_SUFFIX)
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_reviews_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidReviewsDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}
