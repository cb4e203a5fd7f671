//! Deterministic in-memory media runtime for tests.
//!
//! - [`SyntheticLoader`] produces solid-colour frames for a declared size and
//!   duration, and records every seek.
//! - [`StaticCapabilities`] reports a fixed set of supported mime types.
//! - [`ScriptedEncoder`] records every session it opens and fails on demand.
//!
//! All three are cheap to clone; clones share their recorded state so a test
//! can keep a handle while the pipeline owns another.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::Rgba;
use parking_lot::Mutex;
use rp_core::{Error, MimeType, SourceMetadata, SourceVideo};

use crate::encoder::{
    EncoderBackend, EncoderCapabilities, EncoderSession, MediaRuntime, SessionSettings,
};
use crate::frame::{Frame, FrameSource, FrameSourceLoader, Seek};
use crate::negotiate::PREFERRED_MIME_TYPES;

// ---------------------------------------------------------------------------
// Frame source
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct LoaderLog {
    loads: usize,
    seeks: Vec<f64>,
}

/// Loader producing [`SyntheticSource`]s.
#[derive(Debug, Clone)]
pub struct SyntheticLoader {
    metadata: SourceMetadata,
    fail_load: bool,
    fail_seek_at: Option<usize>,
    log: Arc<Mutex<LoaderLog>>,
}

impl SyntheticLoader {
    pub fn new(metadata: SourceMetadata) -> Self {
        Self {
            metadata,
            fail_load: false,
            fail_seek_at: None,
            log: Arc::default(),
        }
    }

    /// Every load fails with [`Error::SourceLoadFailed`].
    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// The `n`th seek (0-based, counted per loaded source) fails with a
    /// decoder error.
    pub fn failing_seek_at(mut self, n: usize) -> Self {
        self.fail_seek_at = Some(n);
        self
    }

    /// Number of successful loads so far.
    pub fn load_count(&self) -> usize {
        self.log.lock().loads
    }

    /// Every seek timestamp requested so far, across all loaded sources.
    pub fn seek_log(&self) -> Vec<f64> {
        self.log.lock().seeks.clone()
    }
}

#[async_trait]
impl FrameSourceLoader for SyntheticLoader {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn load(&self, source: &SourceVideo) -> rp_core::Result<Box<dyn FrameSource>> {
        if self.fail_load {
            return Err(Error::source_load_failed(format!(
                "synthetic decoder rejected {}",
                source.name()
            )));
        }
        self.log.lock().loads += 1;
        Ok(Box::new(SyntheticSource {
            metadata: self.metadata,
            fail_seek_at: self.fail_seek_at,
            seeks: 0,
            log: Arc::clone(&self.log),
        }))
    }
}

/// A frame source whose frames are a solid colour derived from the timestamp.
#[derive(Debug)]
pub struct SyntheticSource {
    metadata: SourceMetadata,
    fail_seek_at: Option<usize>,
    seeks: usize,
    log: Arc<Mutex<LoaderLog>>,
}

#[async_trait]
impl FrameSource for SyntheticSource {
    fn metadata(&self) -> SourceMetadata {
        self.metadata
    }

    async fn seek(&mut self, time_secs: f64) -> rp_core::Result<Seek> {
        let index = self.seeks;
        self.seeks += 1;
        self.log.lock().seeks.push(time_secs);

        if self.fail_seek_at == Some(index) {
            return Err(Error::tool("synthetic", format!("decode error at {time_secs}s")));
        }
        if time_secs >= self.metadata.duration_secs {
            return Ok(Seek::EndOfStream);
        }

        let shade = ((time_secs * 17.0) as u64 % 256) as u8;
        Ok(Seek::Frame(Frame::from_pixel(
            self.metadata.width,
            self.metadata.height,
            Rgba([shade, 255 - shade, 128, 255]),
        )))
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// A fixed capability set.
#[derive(Debug, Clone)]
pub struct StaticCapabilities {
    supported: Vec<MimeType>,
    recorder: bool,
}

impl StaticCapabilities {
    /// Everything in the default preference list is supported.
    pub fn all() -> Self {
        Self::only(PREFERRED_MIME_TYPES)
    }

    /// A recorder exists but claims no mime type.
    pub fn none() -> Self {
        Self::only(Vec::<MimeType>::new())
    }

    pub fn only(supported: impl IntoIterator<Item = MimeType>) -> Self {
        Self {
            supported: supported.into_iter().collect(),
            recorder: true,
        }
    }

    /// No recorder at all.
    pub fn without_recorder(mut self) -> Self {
        self.recorder = false;
        self
    }
}

impl EncoderCapabilities for StaticCapabilities {
    fn name(&self) -> &'static str {
        "static"
    }

    fn recorder_available(&self) -> bool {
        self.recorder
    }

    fn is_type_supported(&self, mime: &MimeType) -> bool {
        self.supported.contains(mime)
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// What one scripted session saw.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub settings: SessionSettings,
    pub started: bool,
    pub frames: usize,
    pub stopped: bool,
}

#[derive(Debug, Default)]
struct EncoderScript {
    fail_open: HashSet<usize>,
    fail_start: HashSet<usize>,
    fail_submit: HashSet<(usize, usize)>,
    stall_submit: HashSet<(usize, usize)>,
    fail_stop: HashSet<usize>,
    opened: usize,
    sessions: Vec<SessionRecord>,
}

/// Encoder backend with per-session failure injection.
///
/// Session indices count every `open_session` call, including failed ones.
#[derive(Debug, Clone)]
pub struct ScriptedEncoder {
    bytes_per_frame: usize,
    script: Arc<Mutex<EncoderScript>>,
}

impl Default for ScriptedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEncoder {
    pub fn new() -> Self {
        Self {
            bytes_per_frame: 64,
            script: Arc::default(),
        }
    }

    /// Size of the chunk each captured frame contributes to the output.
    pub fn with_bytes_per_frame(mut self, n: usize) -> Self {
        self.bytes_per_frame = n;
        self
    }

    /// Opening session `index` fails with [`Error::EncoderUnsupported`].
    pub fn fail_open(self, index: usize) -> Self {
        self.script.lock().fail_open.insert(index);
        self
    }

    /// Starting session `index` fails.
    pub fn fail_start(self, index: usize) -> Self {
        self.script.lock().fail_start.insert(index);
        self
    }

    /// Submitting frame `frame` to session `session` never completes.
    pub fn stall_submit(self, session: usize, frame: usize) -> Self {
        self.script.lock().stall_submit.insert((session, frame));
        self
    }

    /// Submitting frame `frame` to session `session` fails.
    pub fn fail_submit(self, session: usize, frame: usize) -> Self {
        self.script.lock().fail_submit.insert((session, frame));
        self
    }

    /// Stopping session `index` fails.
    pub fn fail_stop(self, index: usize) -> Self {
        self.script.lock().fail_stop.insert(index);
        self
    }

    /// Number of `open_session` calls, including failed ones.
    pub fn open_attempts(&self) -> usize {
        self.script.lock().opened
    }

    /// Records of every successfully opened session, in order.
    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.script.lock().sessions.clone()
    }
}

impl EncoderBackend for ScriptedEncoder {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn open_session(&self, settings: &SessionSettings) -> rp_core::Result<Box<dyn EncoderSession>> {
        let mut script = self.script.lock();
        let index = script.opened;
        script.opened += 1;

        if script.fail_open.contains(&index) {
            return Err(Error::encoder_unsupported(format!(
                "scripted encoder refuses {}",
                settings.mime_type
            )));
        }

        let record = script.sessions.len();
        script.sessions.push(SessionRecord {
            settings: *settings,
            started: false,
            frames: 0,
            stopped: false,
        });

        Ok(Box::new(ScriptedSession {
            index,
            record,
            settings: *settings,
            bytes_per_frame: self.bytes_per_frame,
            chunks: Vec::new(),
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedSession {
    index: usize,
    record: usize,
    settings: SessionSettings,
    bytes_per_frame: usize,
    chunks: Vec<Bytes>,
    script: Arc<Mutex<EncoderScript>>,
}

#[async_trait]
impl EncoderSession for ScriptedSession {
    async fn start(&mut self) -> rp_core::Result<()> {
        let mut script = self.script.lock();
        if script.fail_start.contains(&self.index) {
            return Err(Error::encode_failed("scripted recorder refused to start"));
        }
        script.sessions[self.record].started = true;
        Ok(())
    }

    async fn submit(&mut self, surface: &Frame) -> rp_core::Result<()> {
        let stalled = {
            let script = self.script.lock();
            let frame = script.sessions[self.record].frames;
            script.stall_submit.contains(&(self.index, frame))
        };
        if stalled {
            std::future::pending::<()>().await;
        }

        let mut script = self.script.lock();
        let frame = script.sessions[self.record].frames;
        if script.fail_submit.contains(&(self.index, frame)) {
            return Err(Error::encode_failed(format!(
                "scripted failure on frame {frame}"
            )));
        }
        if surface.dimensions() != (self.settings.width, self.settings.height) {
            return Err(Error::encode_failed(format!(
                "surface {:?} does not match session {}x{}",
                surface.dimensions(),
                self.settings.width,
                self.settings.height
            )));
        }
        script.sessions[self.record].frames += 1;
        self.chunks
            .push(Bytes::from(vec![(frame % 256) as u8; self.bytes_per_frame]));
        Ok(())
    }

    async fn stop(&mut self) -> rp_core::Result<Vec<Bytes>> {
        let mut script = self.script.lock();
        if script.fail_stop.contains(&self.index) {
            return Err(Error::encode_failed("scripted finalization failure"));
        }
        script.sessions[self.record].stopped = true;
        Ok(std::mem::take(&mut self.chunks))
    }
}

/// Assemble a [`MediaRuntime`] from synthetic parts.
pub fn runtime(
    loader: SyntheticLoader,
    capabilities: StaticCapabilities,
    encoder: ScriptedEncoder,
) -> MediaRuntime {
    MediaRuntime::new(Arc::new(loader), Arc::new(capabilities), Arc::new(encoder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rp_core::Container;

    fn settings() -> SessionSettings {
        SessionSettings {
            width: 4,
            height: 2,
            frame_rate: 10,
            mime_type: MimeType::container(Container::Webm),
        }
    }

    #[tokio::test]
    async fn scripted_session_records_frames() {
        let encoder = ScriptedEncoder::new().with_bytes_per_frame(3);
        let mut session = encoder.open_session(&settings()).unwrap();
        session.start().await.unwrap();
        session.submit(&Frame::new(4, 2)).await.unwrap();
        session.submit(&Frame::new(4, 2)).await.unwrap();
        let chunks = session.stop().await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].len(), 3);
        let rec = &encoder.sessions()[0];
        assert!(rec.started && rec.stopped);
        assert_eq!(rec.frames, 2);
    }

    #[tokio::test]
    async fn scripted_session_rejects_wrong_surface() {
        let encoder = ScriptedEncoder::new();
        let mut session = encoder.open_session(&settings()).unwrap();
        assert!(session.submit(&Frame::new(3, 3)).await.is_err());
    }

    #[test]
    fn failed_open_still_counts() {
        let encoder = ScriptedEncoder::new().fail_open(0);
        assert!(encoder.open_session(&settings()).is_err());
        assert!(encoder.open_session(&settings()).is_ok());
        assert_eq!(encoder.open_attempts(), 2);
        assert_eq!(encoder.sessions().len(), 1);
    }

    #[tokio::test]
    async fn synthetic_source_end_of_stream() {
        let loader = SyntheticLoader::new(SourceMetadata {
            width: 2,
            height: 2,
            duration_secs: 1.0,
            has_audio: false,
        });
        let mut src = loader.load(&SourceVideo::new("a.mp4", vec![])).await.unwrap();
        assert!(matches!(src.seek(0.5).await.unwrap(), Seek::Frame(_)));
        assert!(matches!(src.seek(1.0).await.unwrap(), Seek::EndOfStream));
        assert_eq!(loader.seek_log(), vec![0.5, 1.0]);
        assert_eq!(loader.load_count(), 1);
    }
}
