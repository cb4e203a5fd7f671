//! Encoder sessions that pipe raw RGBA surfaces into an ffmpeg child.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rp_core::{Container, Error, MimeType};
use rp_media::{EncoderBackend, EncoderCapabilities, EncoderSession, Frame, SessionSettings};

use super::capabilities::{encoder_for, FfmpegCapabilities};
use crate::command::{ToolCommand, ToolProcess};
use crate::tools::ToolRegistry;
use crate::workspace::Workspace;

/// Build the ffmpeg argument list for one session writing to `output`.
pub fn session_args(settings: &SessionSettings, encoder: &str, output: &Path) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner", "-loglevel", "error", "-nostats", "-y",
        "-f", "rawvideo",
        "-pix_fmt", "rgba",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.push("-s".into());
    args.push(format!("{}x{}", settings.width, settings.height));
    args.push("-r".into());
    args.push(settings.frame_rate.to_string());
    args.extend(["-i", "-", "-an", "-c:v"].map(String::from));
    args.push(encoder.to_string());

    let tuning: &[&str] = match encoder {
        "libvpx-vp9" => &[
            "-b:v", "0", "-crf", "35",
            "-deadline", "realtime", "-cpu-used", "8", "-row-mt", "1",
        ],
        "libvpx" => &["-b:v", "1M", "-deadline", "realtime", "-cpu-used", "8"],
        // yuv420p needs even dimensions.
        "libx264" => &[
            "-preset", "veryfast", "-crf", "28",
            "-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2",
            "-movflags", "+faststart",
        ],
        _ => &[],
    };
    args.extend(tuning.iter().map(|s| s.to_string()));

    let muxer = match settings.mime_type.container {
        Container::Webm => "webm",
        Container::Mp4 => "mp4",
    };
    args.extend(["-pix_fmt", "yuv420p", "-f", muxer].map(String::from));
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Opens [`FfmpegEncoderSession`]s against the discovered ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoderBackend {
    registry: ToolRegistry,
    capabilities: Arc<FfmpegCapabilities>,
}

impl FfmpegEncoderBackend {
    pub fn new(registry: ToolRegistry, capabilities: Arc<FfmpegCapabilities>) -> Self {
        Self {
            registry,
            capabilities,
        }
    }
}

impl EncoderBackend for FfmpegEncoderBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn open_session(&self, settings: &SessionSettings) -> rp_core::Result<Box<dyn EncoderSession>> {
        let ffmpeg = self
            .registry
            .require("ffmpeg")
            .map_err(|e| Error::encoder_unsupported(e.to_string()))?;

        if !self.capabilities.is_type_supported(&settings.mime_type) {
            return Err(Error::encoder_unsupported(format!(
                "ffmpeg cannot encode {}",
                settings.mime_type
            )));
        }

        let workspace =
            Workspace::new().map_err(|e| Error::encoder_unsupported(e.to_string()))?;
        let output = workspace.temp_file(&format!(
            "output.{}",
            settings.mime_type.container.extension()
        ));

        tracing::debug!(
            mime = %settings.mime_type,
            width = settings.width,
            height = settings.height,
            fps = settings.frame_rate,
            "opening ffmpeg session"
        );

        Ok(Box::new(FfmpegEncoderSession {
            settings: *settings,
            ffmpeg: ffmpeg.path.clone(),
            timeout: self.registry.timeout(),
            output,
            process: None,
            frames: 0,
            started: false,
            _workspace: workspace,
        }))
    }
}

/// One encode. The ffmpeg child is spawned on the first submitted frame.
#[derive(Debug)]
pub struct FfmpegEncoderSession {
    settings: SessionSettings,
    ffmpeg: PathBuf,
    timeout: Duration,
    output: PathBuf,
    process: Option<ToolProcess>,
    frames: usize,
    started: bool,
    _workspace: Workspace,
}

impl FfmpegEncoderSession {
    fn mime_type(&self) -> MimeType {
        self.settings.mime_type
    }

    fn spawn(&self) -> rp_core::Result<ToolProcess> {
        let encoder = encoder_for(&self.mime_type());
        let mut cmd = ToolCommand::new(self.ffmpeg.clone());
        cmd.args(session_args(&self.settings, encoder, &self.output));
        cmd.timeout(self.timeout);
        cmd.spawn_streaming()
    }
}

#[async_trait]
impl EncoderSession for FfmpegEncoderSession {
    async fn start(&mut self) -> rp_core::Result<()> {
        if self.started {
            return Err(Error::encode_failed("session already started"));
        }
        self.started = true;
        Ok(())
    }

    async fn submit(&mut self, surface: &Frame) -> rp_core::Result<()> {
        if !self.started {
            return Err(Error::encode_failed("submit before start"));
        }
        if surface.dimensions() != (self.settings.width, self.settings.height) {
            return Err(Error::encode_failed(format!(
                "surface {}x{} does not match session {}x{}",
                surface.width(),
                surface.height(),
                self.settings.width,
                self.settings.height
            )));
        }

        if self.process.is_none() {
            self.process = Some(self.spawn().map_err(|e| e.into_encode_failed("ffmpeg"))?);
        }
        if let Some(process) = self.process.as_mut() {
            process
                .write(surface.as_raw())
                .await
                .map_err(|e| e.into_encode_failed("ffmpeg"))?;
        }
        self.frames += 1;
        Ok(())
    }

    async fn stop(&mut self) -> rp_core::Result<Vec<Bytes>> {
        let Some(process) = self.process.take() else {
            return Ok(Vec::new());
        };

        process
            .finish()
            .await
            .map_err(|e| e.into_encode_failed("ffmpeg finalization"))?;
        let data = tokio::fs::read(&self.output)
            .await
            .map_err(|e| Error::encode_failed(format!("ffmpeg produced no output: {e}")))?;

        tracing::debug!(
            frames = self.frames,
            bytes = data.len(),
            mime = %self.mime_type(),
            "ffmpeg session finished"
        );
        Ok(vec![Bytes::from(data)])
    }
}
