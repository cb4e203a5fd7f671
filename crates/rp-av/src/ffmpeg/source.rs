//! Frame source that seeks by asking ffmpeg for a single PNG frame.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use image::ImageFormat;
use rp_core::{Error, SourceMetadata, SourceVideo};
use rp_media::{FrameSource, FrameSourceLoader, Seek};

use crate::command::ToolCommand;
use crate::probe::probe_media;
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// Loads inputs by materialising them in a [`Workspace`] and probing them
/// with ffprobe.
#[derive(Debug, Clone)]
pub struct FfmpegLoader {
    registry: ToolRegistry,
}

impl FfmpegLoader {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl FrameSourceLoader for FfmpegLoader {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn load(&self, source: &SourceVideo) -> rp_core::Result<Box<dyn FrameSource>> {
        let load_failed = |e: Error| Error::source_load_failed(format!("{}: {e}", source.name()));

        let ffprobe = self.registry.require("ffprobe").map_err(load_failed)?;
        let ffmpeg = self.registry.require("ffmpeg").map_err(load_failed)?;

        let workspace = Workspace::new().map_err(load_failed)?;
        let file_name = match source.extension() {
            Some(ext) => format!("input.{ext}"),
            None => "input".to_string(),
        };
        let input = workspace
            .write_file(&file_name, source.data())
            .await
            .map_err(load_failed)?;

        let probed = probe_media(&ffprobe.path, &input, self.registry.timeout())
            .await
            .map_err(load_failed)?;
        let metadata = probed.metadata().ok_or_else(|| {
            Error::source_load_failed(format!("{}: no decodable video stream", source.name()))
        })?;

        tracing::debug!(
            source = source.name(),
            width = metadata.width,
            height = metadata.height,
            duration = metadata.duration_secs,
            "source loaded"
        );

        Ok(Box::new(FfmpegFrameSource {
            ffmpeg: ffmpeg.path.clone(),
            timeout: self.registry.timeout(),
            input,
            metadata,
            _workspace: workspace,
        }))
    }
}

/// A loaded input. The materialised file is deleted on drop.
#[derive(Debug)]
pub struct FfmpegFrameSource {
    ffmpeg: PathBuf,
    timeout: Duration,
    input: PathBuf,
    metadata: SourceMetadata,
    _workspace: Workspace,
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    fn metadata(&self) -> SourceMetadata {
        self.metadata
    }

    async fn seek(&mut self, time_secs: f64) -> rp_core::Result<Seek> {
        if time_secs >= self.metadata.duration_secs {
            return Ok(Seek::EndOfStream);
        }

        let mut cmd = ToolCommand::new(self.ffmpeg.clone());
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin"]);
        cmd.args(["-ss".to_string(), format!("{:.3}", time_secs.max(0.0))]);
        cmd.arg("-i");
        cmd.arg(self.input.to_string_lossy().as_ref());
        cmd.args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"]);
        cmd.timeout(self.timeout);

        let out = cmd.execute().await?;
        // Container durations can overstate the last decodable timestamp.
        if out.stdout.is_empty() {
            tracing::trace!(time_secs, "no frame decoded; treating as end of stream");
            return Ok(Seek::EndOfStream);
        }

        let frame = image::load_from_memory_with_format(&out.stdout, ImageFormat::Png)
            .map_err(|e| Error::tool("ffmpeg", format!("undecodable frame at {time_secs:.3}s: {e}")))?
            .into_rgba8();
        Ok(Seek::Frame(frame))
    }
}
