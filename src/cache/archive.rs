//! Tar extraction into a snapshot directory
//!
//! Takes the raw output of `git archive --format=tar`. Every entry is placed
//! with [`safe_join`]; an entry that would land outside the destination aborts
//! the whole extraction before anything is written for it.

use crate::cache::paths::safe_join;
use crate::error::{AilloyError, AilloyResult};
use std::fs;
use std::io;
use std::path::Path;
use tar::{Archive, EntryType};
use tracing::debug;

/// Upper bound for permission bits of extracted files
const FILE_MODE_MASK: u32 = 0o755;

/// Mode for extracted directories (always traversable)
const DIR_MODE: u32 = 0o755;

/// Unpack a tar byte stream into `dest`.
///
/// Directories and regular files are materialized; links and other special
/// entries (including git's pax global header) are skipped.
pub fn extract_tar(bytes: &[u8], dest: &Path) -> AilloyResult<()> {
    fs::create_dir_all(dest)
        .map_err(|e| AilloyError::io(format!("creating {}", dest.display()), e))?;

    let mut archive = Archive::new(bytes);
    let entries = archive
        .entries()
        .map_err(|e| AilloyError::io("reading tar archive", e))?;

    let mut files = 0usize;
    for entry in entries {
        let mut entry = entry.map_err(|e| AilloyError::io("reading tar entry", e))?;
        let name = entry
            .path()
            .map_err(|e| AilloyError::io("reading tar entry path", e))?
            .into_owned();

        let target = safe_join(dest, &name)?;

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&target).map_err(|e| {
                    AilloyError::io(format!("creating directory {}", target.display()), e)
                })?;
                set_mode(&target, DIR_MODE)?;
            }
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        AilloyError::io(format!("creating directory {}", parent.display()), e)
                    })?;
                }
                let mut file = fs::File::create(&target).map_err(|e| {
                    AilloyError::io(format!("creating file {}", target.display()), e)
                })?;
                io::copy(&mut entry, &mut file).map_err(|e| {
                    AilloyError::io(format!("writing file {}", target.display()), e)
                })?;
                let mode = entry.header().mode().unwrap_or(0o644) & FILE_MODE_MASK;
                set_mode(&target, mode)?;
                files += 1;
            }
            other => {
                debug!("Skipping tar entry {} ({:?})", name.display(), other);
            }
        }
    }

    debug!("Extracted {} files into {}", files, dest.display());
    Ok(())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> AilloyResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| AilloyError::io(format!("setting permissions on {}", path.display()), e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> AilloyResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use tar::{Builder, Header};
    use tempfile::TempDir;

    fn append_file(builder: &mut Builder<Vec<u8>>, name: &str, body: &[u8], mode: u32) {
        let mut header = Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(mode);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();
        builder.append_data(&mut header, name, body).unwrap();
    }

    /// Write an entry name verbatim, bypassing the builder's own `..` checks
    fn append_raw(builder: &mut Builder<Vec<u8>>, name: &str, body: &[u8]) {
        let mut header = Header::new_old();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();
        builder.append(&header, body).unwrap();
    }

    #[test]
    fn extracts_files_and_dirs() {
        let mut builder = Builder::new(Vec::new());
        let mut dir = Header::new_gnu();
        dir.set_entry_type(EntryType::Directory);
        dir.set_mode(0o700);
        dir.set_size(0);
        dir.set_cksum();
        builder.append_data(&mut dir, "molds/", io::empty()).unwrap();
        append_file(&mut builder, "mold.yaml", b"name: widget\n", 0o644);
        append_file(&mut builder, "molds/claude/ingot.yaml", b"x: 1\n", 0o644);
        let bytes = builder.into_inner().unwrap();

        let temp = TempDir::new().unwrap();
        extract_tar(&bytes, temp.path()).unwrap();

        assert_eq!(
            fs::read_to_string(temp.path().join("mold.yaml")).unwrap(),
            "name: widget\n"
        );
        assert!(temp.path().join("molds/claude/ingot.yaml").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn masks_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let mut builder = Builder::new(Vec::new());
        append_file(&mut builder, "setuid.sh", b"#!/bin/sh\n", 0o4777);
        let bytes = builder.into_inner().unwrap();

        let temp = TempDir::new().unwrap();
        extract_tar(&bytes, temp.path()).unwrap();

        let mode = fs::metadata(temp.path().join("setuid.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o7777, 0o755);
    }

    #[test]
    fn rejects_parent_traversal() {
        let mut builder = Builder::new(Vec::new());
        append_raw(&mut builder, "../../etc/passwd", b"root::0:0::/:/bin/sh\n");
        let bytes = builder.into_inner().unwrap();

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("a").join("b");
        let err = extract_tar(&bytes, &dest).unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Security);
        assert!(err.to_string().contains("escapes"));
        assert!(!temp.path().join("etc").exists());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    }

    #[test]
    fn skips_symlinks() {
        let mut builder = Builder::new(Vec::new());
        let mut link = Header::new_gnu();
        link.set_entry_type(EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        builder
            .append_link(&mut link, "escape", "/etc/passwd")
            .unwrap();
        append_file(&mut builder, "mold.yaml", b"ok\n", 0o644);
        let bytes = builder.into_inner().unwrap();

        let temp = TempDir::new().unwrap();
        extract_tar(&bytes, temp.path()).unwrap();

        assert!(temp.path().join("mold.yaml").exists());
        assert!(fs::symlink_metadata(temp.path().join("escape")).is_err());
    }
}
