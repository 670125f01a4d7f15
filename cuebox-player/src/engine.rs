//! Media engine boundary
//!
//! The playback core drives audio through two narrow traits: a
//! [`MediaEngine`] creates one [`PlayerHandle`] per open file, and the
//! handle exposes transport and volume control. Decoding and device
//! output stay behind this boundary; tests substitute mock engines.
//!
//! [`RodioEngine`] is the default backend for the binary. The rodio
//! output stream is not `Send`, so the engine keeps it on a dedicated
//! thread and hands out `Sink`-backed handles, the same arrangement a
//! rodio-based player uses for its audio thread.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::warn;

/// Factory for engine handles, one per open audio file
pub trait MediaEngine: Send + Sync {
    /// Create a player bound to `path`, ready to play but not playing.
    ///
    /// Fails with [`Error::EngineStart`] if the file cannot be opened or
    /// decoded by the backend.
    fn create_player(&self, path: &Path) -> Result<Box<dyn PlayerHandle>>;
}

/// One native playback instance bound to one open audio file
pub trait PlayerHandle: Send {
    /// Begin playback; fails with [`Error::EngineStart`] if the engine
    /// refuses.
    fn play(&mut self) -> Result<()>;

    /// Stop playback; ends the `is_playing` condition.
    fn stop(&mut self);

    /// Whether the engine currently reports this handle as playing.
    fn is_playing(&self) -> bool;

    /// Current playback position in milliseconds.
    fn position_ms(&self) -> u64;

    /// Seek to an absolute position in milliseconds.
    fn seek_ms(&mut self, position_ms: u64);

    /// Last volume set on this handle (0-100).
    fn volume(&self) -> u8;

    /// Set this handle's volume (0-100); does not touch the global volume.
    fn set_volume(&mut self, volume: u8);
}

/// Request sent to the rodio worker thread
struct CreateRequest {
    path: PathBuf,
    reply: mpsc::Sender<Result<rodio::Sink>>,
}

/// rodio-backed [`MediaEngine`]
///
/// Owns a worker thread holding the output stream for the default audio
/// device. Dropping the engine shuts the thread down.
pub struct RodioEngine {
    request_tx: mpsc::Sender<CreateRequest>,
}

impl RodioEngine {
    /// Open the default audio output device.
    pub fn new() -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<CreateRequest>();
        let (startup_tx, startup_rx) = mpsc::channel::<Result<()>>();

        std::thread::Builder::new()
            .name("cuebox-audio".to_string())
            .spawn(move || {
                let mut stream = match rodio::OutputStreamBuilder::open_default_stream() {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = startup_tx
                            .send(Err(Error::EngineStart(format!("no audio output device: {}", e))));
                        return;
                    }
                };
                // rodio logs to stderr when the stream is dropped; that is
                // noise next to our own shutdown logging.
                stream.log_on_drop(false);
                let _ = startup_tx.send(Ok(()));

                while let Ok(request) = request_rx.recv() {
                    let _ = request.reply.send(open_sink(&stream, &request.path));
                }
            })?;

        startup_rx
            .recv()
            .map_err(|_| Error::EngineStart("audio thread exited during startup".to_string()))??;

        Ok(Self { request_tx })
    }
}

/// Open and decode `path` into a paused sink on the worker's stream.
fn open_sink(stream: &rodio::OutputStream, path: &Path) -> Result<rodio::Sink> {
    let file = File::open(path)
        .map_err(|e| Error::EngineStart(format!("failed to open {:?}: {}", path, e)))?;
    let source = rodio::Decoder::new(BufReader::new(file))
        .map_err(|e| Error::EngineStart(format!("failed to decode {:?}: {}", path, e)))?;

    let sink = rodio::Sink::connect_new(stream.mixer());
    sink.pause();
    sink.append(source);
    Ok(sink)
}

impl MediaEngine for RodioEngine {
    fn create_player(&self, path: &Path) -> Result<Box<dyn PlayerHandle>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.request_tx
            .send(CreateRequest {
                path: path.to_path_buf(),
                reply: reply_tx,
            })
            .map_err(|_| Error::EngineStart("audio thread is gone".to_string()))?;

        let sink = reply_rx
            .recv()
            .map_err(|_| Error::EngineStart("audio thread is gone".to_string()))??;

        Ok(Box::new(RodioPlayer {
            sink,
            path: path.to_path_buf(),
            volume: 100,
        }))
    }
}

/// [`PlayerHandle`] backed by a rodio `Sink`
struct RodioPlayer {
    sink: rodio::Sink,
    path: PathBuf,
    volume: u8,
}

impl PlayerHandle for RodioPlayer {
    fn play(&mut self) -> Result<()> {
        self.sink.play();
        Ok(())
    }

    fn stop(&mut self) {
        self.sink.stop();
    }

    fn is_playing(&self) -> bool {
        !self.sink.is_paused() && !self.sink.empty()
    }

    fn position_ms(&self) -> u64 {
        self.sink.get_pos().as_millis() as u64
    }

    fn seek_ms(&mut self, position_ms: u64) {
        if let Err(e) = self.sink.try_seek(Duration::from_millis(position_ms)) {
            warn!("Seek to {}ms failed for {:?}: {}", position_ms, self.path, e);
        }
    }

    fn volume(&self) -> u8 {
        self.volume
    }

    fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(100);
        self.volume = volume;
        self.sink.set_volume(f32::from(volume) / 100.0);
    }
}
