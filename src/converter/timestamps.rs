use std::fs::{File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

/// Access and modification times of a file, captured before conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamps {
    pub accessed: SystemTime,
    pub modified: SystemTime,
}

impl FileStamps {
    pub async fn capture(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path).await?;
        Ok(Self {
            accessed: meta.accessed()?,
            modified: meta.modified()?,
        })
    }

    pub async fn apply(&self, path: &Path) -> io::Result<()> {
        let times = FileTimes::new()
            .set_accessed(self.accessed)
            .set_modified(self.modified);
        let path: PathBuf = path.to_owned();
        tokio::task::spawn_blocking(move || {
            // write access is needed on windows to change attributes
            let file = File::options().write(true).open(&path)?;
            file.set_times(times)
        })
        .await
        .map_err(io::Error::other)?
    }
}
