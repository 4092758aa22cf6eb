//! Content-addressed build versions
//!
//! Hashes every file under the asset root (relative path and bytes, in
//! sorted path order) so the same build output always yields the same
//! version and any changed asset yields a new one.

use crate::error::{FreshenError, FreshenResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Hash the asset tree, skipping the files the publisher itself rewrites
pub fn hash_asset_tree(root: &Path, skip: &[&Path]) -> FreshenResult<String> {
    if !root.is_dir() {
        return Err(FreshenError::AssetRootNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    collect_files(root, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    for path in files {
        if skip.iter().any(|s| paths_match(s, &path)) {
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(&path);
        // Separator-normalised so the hash is stable across platforms
        let rel = rel.to_string_lossy().replace('\\', "/");
        let contents = fs::read(&path)
            .map_err(|e| FreshenError::io(format!("reading asset {}", path.display()), e))?;

        hasher.update(rel.as_bytes());
        hasher.update([0u8]);
        hasher.update((contents.len() as u64).to_le_bytes());
        hasher.update(&contents);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> FreshenResult<()> {
    let entries = fs::read_dir(dir)
        .map_err(|e| FreshenError::io(format!("reading directory {}", dir.display()), e))?;

    for entry in entries {
        let entry =
            entry.map_err(|e| FreshenError::io(format!("reading entry in {}", dir.display()), e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| FreshenError::io(format!("inspecting {}", path.display()), e))?;

        if file_type.is_dir() {
            collect_files(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn paths_match(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
