//! Template archive extraction and directory replacement

use crate::error::{ScaffoldError, ScaffoldResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extract every entry of the zip at `archive_path` into `dest`.
///
/// `dest` is created if missing. Entries whose names would escape `dest`
/// are skipped. Returns the number of files written.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> ScaffoldResult<usize> {
    let archive_err = |reason: String| ScaffoldError::Archive {
        path: dest.to_path_buf(),
        reason,
    };

    let file = fs::File::open(archive_path).map_err(|e| {
        ScaffoldError::io(format!("opening archive {}", archive_path.display()), e)
    })?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| archive_err(format!("invalid zip: {}", e)))?;

    fs::create_dir_all(dest)
        .map_err(|e| ScaffoldError::io(format!("creating directory {}", dest.display()), e))?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| archive_err(format!("failed to read entry {}: {}", index, e)))?;

        let out_path = match entry.enclosed_name() {
            Some(name) => dest.join(name),
            None => {
                warn!("Skipping archive entry with unsafe path: {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| {
                ScaffoldError::io(format!("creating directory {}", out_path.display()), e)
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ScaffoldError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        let mut outfile = fs::File::create(&out_path).map_err(|e| {
            ScaffoldError::io(format!("creating file {}", out_path.display()), e)
        })?;
        io::copy(&mut entry, &mut outfile)
            .map_err(|e| archive_err(format!("failed to extract {}: {}", entry.name(), e)))?;
        written += 1;
    }

    debug!("Extracted {} file(s) into {}", written, dest.display());
    Ok(written)
}

/// Move `staging` into place at `live`, replacing whatever was there.
///
/// The previous tree is renamed aside first and deleted afterwards, so `live`
/// never holds a partially populated tree.
pub fn swap_into_place(staging: &Path, live: &Path) -> ScaffoldResult<()> {
    let retired = sibling(live, &format!("old-{}", std::process::id()));
    remove_dir_if_exists(&retired)?;

    let had_previous = live.exists();
    if had_previous {
        fs::rename(live, &retired).map_err(|e| {
            ScaffoldError::io(format!("moving aside {}", live.display()), e)
        })?;
    }

    if let Err(e) = fs::rename(staging, live) {
        // Put the old tree back so readers keep a usable template
        if had_previous {
            let _ = fs::rename(&retired, live);
        }
        return Err(ScaffoldError::io(
            format!("moving {} into place", staging.display()),
            e,
        ));
    }

    if had_previous {
        if let Err(e) = fs::remove_dir_all(&retired) {
            warn!("Failed to remove previous tree {}: {}", retired.display(), e);
        }
    }
    Ok(())
}

/// `<parent>/<name>.<suffix>` next to `path`
pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}", name, suffix))
}

pub fn remove_dir_if_exists(path: &Path) -> ScaffoldResult<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ScaffoldError::io(format!("removing {}", path.display()), e)),
    }
}
