//! Hardware layer signals.
//!
//! Each layer has an on and an off signal. Signals arrive as text lines on
//! a Unix control socket, so any hotkey daemon can feed them:
//!
//! ```text
//! layer nav on
//! layer sym off
//! ```

use std::io::{BufRead, BufReader, ErrorKind};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use modeglue_context::Layer;
use modeglue_events::{EventSinkRef, SourceEvent};

use crate::error::{SourceError, SourceResult};

const ACCEPT_INTERVAL: Duration = Duration::from_millis(50);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(1);

/// On/off state of each layer. Nav wins when both are on.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LayerTracker {
    nav: bool,
    sym: bool,
}

impl LayerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Layer {
        if self.nav {
            Layer::Nav
        } else if self.sym {
            Layer::Sym
        } else {
            Layer::None
        }
    }

    /// Apply a signal. Returns the resolved layer if the signal changed
    /// any state, even when the resolved layer is the same.
    pub fn set(&mut self, layer: Layer, active: bool) -> Option<Layer> {
        let slot = match layer {
            Layer::Nav => &mut self.nav,
            Layer::Sym => &mut self.sym,
            Layer::None => return None,
        };

        if *slot == active {
            return None;
        }
        *slot = active;
        Some(self.current())
    }
}

/// Parse `layer <nav|sym> <on|off>`.
pub fn parse_signal(line: &str) -> Option<(Layer, bool)> {
    let mut words = line.split_whitespace();
    if words.next()? != "layer" {
        return None;
    }
    let layer = Layer::parse(words.next()?)?;
    let active = match words.next()? {
        "on" => true,
        "off" => false,
        _ => return None,
    };
    if words.next().is_some() {
        return None;
    }
    Some((layer, active))
}

/// Listens on the control socket and reports resolved layer changes.
pub struct LayerListener {
    path: PathBuf,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LayerListener {
    pub fn bind(path: impl Into<PathBuf>, sink: EventSinkRef) -> SourceResult<Self> {
        let path = path.into();
        let socket_error = |source| SourceError::Socket {
            path: path.clone(),
            source,
        };

        // Left behind by a previous run that did not shut down cleanly.
        if path.exists() {
            std::fs::remove_file(&path).map_err(socket_error)?;
        }

        let listener = UnixListener::bind(&path).map_err(socket_error)?;
        listener.set_nonblocking(true).map_err(socket_error)?;

        tracing::info!(path = %path.display(), "layer control socket listening");

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("layer-listener".into())
            .spawn(move || accept_loop(listener, thread_running, sink))
            .map_err(|source| SourceError::Thread {
                name: "layer-listener",
                source,
            })?;

        Ok(Self {
            path,
            running,
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop listening and remove the socket file.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl Drop for LayerListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(listener: UnixListener, running: Arc<AtomicBool>, sink: EventSinkRef) {
    let mut tracker = LayerTracker::new();

    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _)) => serve_client(stream, &mut tracker, &running, &sink),
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_INTERVAL),
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept control connection");
                thread::sleep(ACCEPT_INTERVAL);
            }
        }
    }

    tracing::debug!("layer listener stopped");
}

fn serve_client(
    stream: UnixStream,
    tracker: &mut LayerTracker,
    running: &AtomicBool,
    sink: &EventSinkRef,
) {
    if let Err(e) = stream
        .set_nonblocking(false)
        .and_then(|()| stream.set_read_timeout(Some(CLIENT_TIMEOUT)))
    {
        tracing::warn!(error = %e, "failed to configure control connection");
        return;
    }

    for line in BufReader::new(stream).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!(error = %e, "control connection closed");
                break;
            }
        };

        let Some((layer, active)) = parse_signal(&line) else {
            tracing::warn!(line = %line.trim(), "unrecognized control command");
            continue;
        };

        if let Some(resolved) = tracker.set(layer, active) {
            tracing::debug!(layer = resolved.as_str(), "layer changed");
            if running.load(Ordering::SeqCst) {
                sink.send(SourceEvent::LayerChanged(resolved));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modeglue_events::InMemorySink;
    use std::io::Write;

    #[test]
    fn test_nav_wins_over_sym() {
        let mut tracker = LayerTracker::new();
        assert_eq!(tracker.set(Layer::Sym, true), Some(Layer::Sym));
        assert_eq!(tracker.set(Layer::Nav, true), Some(Layer::Nav));
        assert_eq!(tracker.set(Layer::Sym, false), Some(Layer::Nav));
        assert_eq!(tracker.set(Layer::Nav, false), Some(Layer::None));
    }

    #[test]
    fn test_repeated_signal_is_ignored() {
        let mut tracker = LayerTracker::new();
        assert_eq!(tracker.set(Layer::Nav, true), Some(Layer::Nav));
        assert_eq!(tracker.set(Layer::Nav, true), None);
        assert_eq!(tracker.set(Layer::Sym, false), None);
    }

    #[test]
    fn test_parse_signal() {
        assert_eq!(parse_signal("layer nav on"), Some((Layer::Nav, true)));
        assert_eq!(parse_signal("  layer sym off \n"), Some((Layer::Sym, false)));
        assert_eq!(parse_signal("layer fn on"), None);
        assert_eq!(parse_signal("layer nav"), None);
        assert_eq!(parse_signal("layer nav on now"), None);
        assert_eq!(parse_signal("mode nav on"), None);
    }

    #[test]
    fn test_listener_reports_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control.sock");
        let sink = Arc::new(InMemorySink::new());

        let mut listener = LayerListener::bind(&path, sink.clone()).unwrap();

        let mut client = UnixStream::connect(&path).unwrap();
        client
            .write_all(b"layer nav on\nlayer nav on\nbogus\nlayer nav off\n")
            .unwrap();
        drop(client);

        for _ in 0..50 {
            if sink.len() >= 2 {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        listener.stop();

        let layers: Vec<Layer> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                SourceEvent::LayerChanged(layer) => Some(layer),
                _ => None,
            })
            .collect();
        assert_eq!(layers, vec![Layer::Nav, Layer::None]);
        assert!(!path.exists());
    }
}
