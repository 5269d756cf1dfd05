//! Local media folders created on first run

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;

/// Resolved media folders under the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folders {
    pub post_sounds: PathBuf,
    pub post_thumbnails: PathBuf,
    pub post_avatars: PathBuf,
    pub user_avatars: PathBuf,
}

impl Folders {
    pub fn under(root: &Path) -> Self {
        Self {
            post_sounds: root.join("posts").join("sounds"),
            post_thumbnails: root.join("posts").join("thumbnails"),
            post_avatars: root.join("posts").join("avatars"),
            user_avatars: root.join("users").join("avatars"),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [
            &self.post_sounds,
            &self.post_thumbnails,
            &self.post_avatars,
            &self.user_avatars,
        ]
    }
}

/// Create every media folder under `root`. Existing folders are left alone.
pub fn ensure_folders(root: &Path) -> Result<Folders> {
    let folders = Folders::under(root);
    for dir in folders.all() {
        fs::create_dir_all(dir)?;
        debug!(path = %dir.display(), "folder ready");
    }
    Ok(folders)
}
