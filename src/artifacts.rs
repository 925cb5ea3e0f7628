use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const ARTIFACTS_DIR: &str = "corpus_tests/artifacts";

/// Per-kind artifact directory, rooted under the build workspace when the
/// runner exports it and relative to the working directory otherwise.
fn artifacts_subdirectory(kind: &str) -> io::Result<PathBuf> {
    let mut dir = match std::env::var_os("BUILD_WORKSPACE_DIRECTORY") {
        Some(root) => PathBuf::from(root).join(ARTIFACTS_DIR),
        None => PathBuf::from(ARTIFACTS_DIR),
    };
    fs::create_dir_all(&dir)?;
    dir.push(kind);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Copy the input that crashed the device into the artifact directory and
/// return where it was saved. A no-op copy (input already in place) is
/// fine.
pub fn save_crash_artifact(kind: &str, input_path: &Path) -> io::Result<PathBuf> {
    let input_name = input_path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "input path has no file name"))?;
    let save_path = artifacts_subdirectory(kind)?.join(input_name);
    if input_path != save_path {
        fs::copy(input_path, &save_path)?;
    }
    println!("Saving file to {}", save_path.display());
    Ok(save_path)
}
