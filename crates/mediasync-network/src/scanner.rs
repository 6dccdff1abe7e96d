//! Directory scanning for the listing service

use crate::filter::Pattern;
use mediasync_types::{FileRecord, Fingerprint};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

/// Walk `dirs` and return one record per non-directory entry
///
/// Entries that cannot be read are logged and skipped. Symbolic links are
/// not followed.
pub fn scan_dirs<P: AsRef<Path>>(dirs: &[P]) -> Vec<FileRecord> {
    scan(dirs, |_| true)
}

/// Like [`scan_dirs`], keeping only files whose name matches `pattern`
pub fn scan_matching<P: AsRef<Path>>(dirs: &[P], pattern: &Pattern) -> Vec<FileRecord> {
    scan(dirs, |name| pattern.matches(name))
}

/// Fingerprint of the path set currently under `dirs`
pub fn fingerprint_dirs<P: AsRef<Path>>(dirs: &[P]) -> Fingerprint {
    Fingerprint::of_paths(scan_dirs(dirs).into_iter().map(|record| record.path))
}

fn scan<P, F>(dirs: &[P], keep: F) -> Vec<FileRecord>
where
    P: AsRef<Path>,
    F: Fn(&str) -> bool,
{
    let mut files = Vec::new();

    for dir in dirs {
        for entry in WalkDir::new(dir.as_ref()) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error accessing {}: {}", dir.as_ref().display(), e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if !keep(&name) {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => files.push(FileRecord {
                    path: entry.path().to_string_lossy().into_owned(),
                    name,
                    size: metadata.len(),
                }),
                Err(e) => warn!("Error getting info for {}: {}", entry.path().display(), e),
            }
        }
    }

    files
}
