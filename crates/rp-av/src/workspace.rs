//! Workspace management for runtime operations.
//!
//! A [`Workspace`] provides a temporary directory for the files ffmpeg needs
//! on disk: the materialised input bytes of a frame source, or the output of
//! an encoder session. The directory and everything in it is removed when
//! the workspace is dropped.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A self-cleaning scratch directory.
///
/// # Example
///
/// ```no_run
/// use rp_av::Workspace;
///
/// # async fn example() -> rp_core::Result<()> {
/// let workspace = Workspace::new()?;
/// let input = workspace.write_file("input.mp4", b"...").await?;
/// // ... hand `input` to ffmpeg ...
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a new workspace under the system temp directory.
    pub fn new() -> rp_core::Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("reelpress-")
            .tempdir()
            .map_err(|e| rp_core::Error::tool("workspace", format!("failed to create temp dir: {e}")))?;

        Ok(Self { temp_dir })
    }

    /// Path to the temporary directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a path for a named temporary file inside the workspace.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write `data` to a named file inside the workspace and return its path.
    pub async fn write_file(&self, name: &str, data: &[u8]) -> rp_core::Result<PathBuf> {
        let path = self.temp_file(name);
        tokio::fs::write(&path, data).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_inside_workspace() {
        let ws = Workspace::new().unwrap();
        let tf = ws.temp_file("output.webm");
        assert!(tf.starts_with(ws.temp_dir()));
        assert_eq!(tf.file_name().unwrap(), "output.webm");
    }

    #[tokio::test]
    async fn write_file_round_trip() {
        let ws = Workspace::new().unwrap();
        let path = ws.write_file("input.mp4", b"payload").await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"payload");
    }

    #[test]
    fn drop_removes_directory() {
        let ws = Workspace::new().unwrap();
        let dir = ws.temp_dir().to_path_buf();
        assert!(dir.exists());
        drop(ws);
        assert!(!dir.exists());
    }
}
