use crate::review::EssayReview;
use std::path::PathBuf;
use tempfile::TempDir;

pub const SAMPLE_ESSAY: &str = "Technology have change the way student learns.";

pub fn create_test_reviews_dir() -> TempDir {
    TempDir::new().unwrap()
}

pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(name);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&file_path, content).unwrap();
    file_path
}

/// Write an uncorrected review of [`SAMPLE_ESSAY`].
pub fn create_test_review(dir: &TempDir, name: &str, essay_id: &str) -> PathBuf {
    let review = EssayReview::new(essay_id, SAMPLE_ESSAY);
    create_test_file(dir, name, &review.to_json().unwrap())
}
