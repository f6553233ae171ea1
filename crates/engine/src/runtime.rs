//! Startup and shutdown wiring.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Sender};
use modeglue_ax::Accessibility;
use modeglue_context::{WindowCallback, WindowProbe, WindowWatcher};
use modeglue_events::{ChannelSink, EventSinkRef, SourceEvent};
use modeglue_input::ShortcutPosterRef;
use modeglue_sources::{EditModeSource, FamilySource, LayerListener};
use modeglue_variables::{EnvironmentFile, PushQueue, VariableSinkRef, VariableStore};

use crate::aggregator::{AggregatorSettings, ModeAggregator};
use crate::config::Config;
use crate::error::EngineResult;
use crate::event_loop::EventLoop;

/// How long shutdown waits for a push already in flight.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Every source plus the event loop they feed.
pub struct Runtime<A: Accessibility> {
    event_loop: EventLoop<A>,
    events: Sender<SourceEvent>,
    edit_mode: Option<EditModeSource>,
    families: Option<FamilySource>,
    layers: Option<LayerListener>,
    windows: WindowWatcher,
    accessibility: bool,
}

impl<A: Accessibility> Runtime<A> {
    /// Reset the variables and start every source.
    ///
    /// Sources that fail to start are logged and left out. Window, focus
    /// and overlay tracking start only when accessibility is trusted.
    pub fn start<P>(
        config: &Config,
        ax: Arc<A>,
        probe: Arc<P>,
        variables: VariableSinkRef,
        poster: ShortcutPosterRef,
    ) -> EngineResult<Self>
    where
        P: WindowProbe + ?Sized + 'static,
    {
        let started = Instant::now();
        let (events_tx, events_rx) = unbounded();
        let (done_tx, done_rx) = unbounded();

        let pushes = PushQueue::worker(variables, done_tx)?;
        let store = VariableStore::new(EnvironmentFile::new(config.karabiner_environment.clone()));
        let mut aggregator = ModeAggregator::new(
            Arc::clone(&ax),
            AggregatorSettings::from(config),
            store,
            pushes,
            poster,
        );
        aggregator.reset_variables();

        let sink: EventSinkRef = Arc::new(ChannelSink::new(events_tx.clone()));

        let edit_mode = EditModeSource::start(config.edit_mode_file.clone(), Arc::clone(&sink))
            .map_err(|e| tracing::error!(error = %e, "edit mode source not started"))
            .ok();
        let families = FamilySource::start(
            config.edit_mode_preferences.clone(),
            config.families(),
            Arc::clone(&sink),
        )
        .map_err(|e| tracing::error!(error = %e, "app family source not started"))
        .ok();
        let layers = LayerListener::bind(config.control_socket.clone(), Arc::clone(&sink))
            .map_err(|e| tracing::error!(error = %e, "layer listener not started"))
            .ok();

        let mut windows = WindowWatcher::new();
        let accessibility = ax.is_trusted();
        if accessibility {
            aggregator.enable_accessibility(Arc::clone(&sink));
            aggregator.follow_window_activity(windows.waker());

            let window_sink = Arc::clone(&sink);
            let callback: WindowCallback =
                Arc::new(move |snapshot| window_sink.send(SourceEvent::WindowChanged(snapshot)));
            windows.start_with_interval(
                probe,
                config.window_rules(),
                callback,
                config.window_poll_interval(),
            );
        } else {
            tracing::error!("accessibility not granted, window and focus tracking disabled");
        }

        tracing::info!(elapsed = ?started.elapsed(), accessibility, "runtime started");

        Ok(Self {
            event_loop: EventLoop::new(aggregator, events_rx, done_rx),
            events: events_tx,
            edit_mode,
            families,
            layers,
            windows,
            accessibility,
        })
    }

    /// Whether window, focus and overlay tracking are running.
    pub fn accessibility_enabled(&self) -> bool {
        self.accessibility
    }

    /// Sink for delivering events from outside, such as a shutdown request.
    pub fn handle(&self) -> EventSinkRef {
        Arc::new(ChannelSink::new(self.events.clone()))
    }

    pub fn event_loop(&self) -> &EventLoop<A> {
        &self.event_loop
    }

    /// Run until shutdown is requested, then stop everything.
    pub fn run(mut self) {
        self.event_loop.run();
        self.shutdown();
    }

    fn shutdown(&mut self) {
        tracing::info!("shutting down");

        self.windows.stop();
        if let Some(source) = self.edit_mode.as_mut() {
            source.stop();
        }
        if let Some(source) = self.families.as_mut() {
            source.stop();
        }
        if let Some(listener) = self.layers.as_mut() {
            listener.stop();
        }

        self.event_loop.shutdown(DRAIN_TIMEOUT);
        tracing::info!("shutdown complete");
    }
}
