use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{common, ErrorCode, LabflowError, Result};

/// How files are placed into the workflow directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// Hard link only; any failure is fatal.
    #[default]
    HardLink,
    /// Hard link, copying instead when source and destination are on
    /// different filesystems.
    HardLinkOrCopy,
}

/// Places dataset files under a workflow directory.
#[derive(Debug, Clone)]
pub struct Stager {
    root: PathBuf,
    mode: LinkMode,
}

impl Stager {
    pub fn new(root: impl Into<PathBuf>, mode: LinkMode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    /// Link `source` to `destination` (relative to the root) and return the
    /// staged path, which is absolute when the root is.
    ///
    /// Staging the same file again is a no-op; a different file already at
    /// the destination is replaced.
    pub fn stage(&self, source: &Path, destination: &Path) -> Result<PathBuf> {
        let target = self.root.join(destination);

        if !source.is_file() {
            return Err(LabflowError::staging_with_code(
                ErrorCode::STAGING_SOURCE_MISSING,
                format!("Source file {} does not exist", source.display()),
                Some(source.to_path_buf()),
            ));
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| common::directory_failed(parent.to_path_buf()).with_source(e))?;
        }

        if target.exists() || target.symlink_metadata().is_ok() {
            if is_same_file(source, &target) {
                debug!("{} already staged", target.display());
                return Ok(target);
            }
            std::fs::remove_file(&target)
                .map_err(|e| common::link_failed(source, &target).with_source(e))?;
        }

        match std::fs::hard_link(source, &target) {
            Ok(()) => {
                debug!("Linked {} -> {}", source.display(), target.display());
                Ok(target)
            }
            Err(e) if self.mode == LinkMode::HardLinkOrCopy && is_cross_device(&e) => {
                warn!(
                    "{} is on another filesystem; copying to {}",
                    source.display(),
                    target.display()
                );
                std::fs::copy(source, &target)
                    .map_err(|e| common::link_failed(source, &target).with_source(e))?;
                Ok(target)
            }
            Err(e) => Err(common::link_failed(source, &target).with_source(e)),
        }
    }
}

/// True when both paths are the same file on disk, hard links included.
#[cfg(unix)]
pub fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
pub fn is_same_file(_a: &Path, _b: &Path) -> bool {
    false
}

#[cfg(unix)]
fn is_cross_device(error: &io::Error) -> bool {
    error.raw_os_error() == Some(nix::errno::Errno::EXDEV as i32)
}

#[cfg(not(unix))]
fn is_cross_device(_error: &io::Error) -> bool {
    false
}
