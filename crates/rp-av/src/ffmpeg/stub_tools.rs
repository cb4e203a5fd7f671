//! Shell-script stand-ins for ffmpeg and ffprobe, so the runtime can be
//! exercised on hosts without the real tools.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use rp_core::config::ToolsConfig;
use tempfile::TempDir;

use crate::tools::ToolRegistry;

/// ffprobe output for a 64x36, two second clip with one audio track.
pub const PROBE_JSON: &str = r#"{"format":{"format_name":"mov,mp4,m4a","duration":"2.000000","size":"64"},"streams":[{"codec_type":"video","codec_name":"h264","width":64,"height":36,"r_frame_rate":"30/1"},{"codec_type":"audio","codec_name":"aac"}]}"#;

/// Directory of stub tools; removed on drop.
pub struct StubTools {
    dir: TempDir,
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
}

impl StubTools {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            ffmpeg: None,
            ffprobe: None,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Install an ffprobe that prints `json` and exits 0.
    pub fn ffprobe_printing(mut self, json: &str) -> Self {
        let body = format!("cat <<'JSON'\n{json}\nJSON\n");
        self.ffprobe = Some(self.script("ffprobe", &body));
        self
    }

    /// Install an ffmpeg with the given shell body.
    pub fn ffmpeg(mut self, body: &str) -> Self {
        self.ffmpeg = Some(self.script("ffmpeg", body));
        self
    }

    pub fn registry(&self) -> ToolRegistry {
        ToolRegistry::discover(&ToolsConfig {
            ffmpeg_path: self.ffmpeg.clone(),
            ffprobe_path: self.ffprobe.clone(),
            timeout_secs: 10,
        })
    }

    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}
