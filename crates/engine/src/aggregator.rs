//! Mode aggregation.
//!
//! Owns every piece of mode state and is driven by [`SourceEvent`]s on the
//! event thread. Each handler stages what changed and then requests one
//! push, so logically related values reach the remapping engine together.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use modeglue_ax::{Accessibility, AxEvent};
use modeglue_context::{
    resolve_mode, EditMode, Layer, Mode, OverlayKind, OverrideMode, WindowSnapshot, WindowWaker,
};
use modeglue_events::{EventSinkRef, FamilyMap, SourceEvent};
use modeglue_input::{Shortcut, ShortcutPosterRef};
use modeglue_sources::{
    FocusSnapshot, FocusSource, OverlayChange, OverlaySource, OverlayTracker,
    WindowActivitySource,
};
use modeglue_variables::{PushOutcome, PushQueue, VariableNames, VariableStore};

use crate::config::Config;
use crate::memory::AppModeMemory;

/// Whether the event loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Shutdown,
}

/// Tunables the aggregator takes from [`Config`].
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub names: VariableNames,
    pub modal_depth: usize,
    pub memory_debounce: Duration,
    pub normal_mode_shortcut: Shortcut,
    pub visual_mode_shortcut: Shortcut,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AggregatorSettings {
    fn from(config: &Config) -> Self {
        Self {
            names: VariableNames::new(config.variable_prefix.clone()),
            modal_depth: config.modal_search_depth,
            memory_debounce: config.mode_memory_debounce(),
            normal_mode_shortcut: config.normal_mode_shortcut.clone(),
            visual_mode_shortcut: config.visual_mode_shortcut.clone(),
        }
    }
}

pub struct ModeAggregator<A: Accessibility> {
    ax: Arc<A>,
    settings: AggregatorSettings,
    store: VariableStore,
    pushes: PushQueue,
    poster: ShortcutPosterRef,
    memory: AppModeMemory,

    // Present only once accessibility is granted.
    focus: Option<FocusSource<A>>,
    overlay: Option<OverlaySource<A>>,
    window_activity: Option<WindowActivitySource<A>>,
    overlay_tracker: OverlayTracker,

    layer: Layer,
    override_mode: OverrideMode,
    edit_mode: EditMode,
    families: FamilyMap,
    window: Option<WindowSnapshot>,
}

impl<A: Accessibility> ModeAggregator<A> {
    pub fn new(
        ax: Arc<A>,
        settings: AggregatorSettings,
        store: VariableStore,
        pushes: PushQueue,
        poster: ShortcutPosterRef,
    ) -> Self {
        let memory = AppModeMemory::new(settings.memory_debounce);
        Self {
            ax,
            settings,
            store,
            pushes,
            poster,
            memory,
            focus: None,
            overlay: None,
            window_activity: None,
            overlay_tracker: OverlayTracker::new(),
            layer: Layer::None,
            override_mode: OverrideMode::Off,
            edit_mode: EditMode::Insert,
            families: FamilyMap::new(),
            window: None,
        }
    }

    /// Start following the frontmost app's focus and the overlay provider.
    /// Their notifications are reported through `sink`.
    pub fn enable_accessibility(&mut self, sink: EventSinkRef) {
        self.focus = Some(FocusSource::new(Arc::clone(&self.ax), Arc::clone(&sink)));
        self.overlay = Some(OverlaySource::new(Arc::clone(&self.ax), sink));
    }

    /// Wake the window watcher whenever the frontmost app switches away or
    /// changes window.
    pub fn follow_window_activity(&mut self, waker: WindowWaker) {
        self.window_activity = Some(WindowActivitySource::new(Arc::clone(&self.ax), waker));
    }

    pub fn mode(&self) -> Mode {
        resolve_mode(self.layer, self.override_mode, self.edit_mode)
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    pub fn override_mode(&self) -> OverrideMode {
        self.override_mode
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn memory(&self) -> &AppModeMemory {
        &self.memory
    }

    /// When the debounced mode save is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.memory.deadline()
    }

    /// Force-write every variable's default.
    pub fn reset_variables(&mut self) {
        let defaults = self.settings.names.defaults();
        let sink = Arc::clone(self.pushes.sink());
        if self.store.force_defaults(&defaults, sink.as_ref()) {
            tracing::info!(count = defaults.len(), "variables reset to defaults");
        }
    }

    /// Fire the debounced mode save if due.
    pub fn tick(&mut self, now: Instant) {
        self.memory.fire_due(now);
    }

    pub fn handle(&mut self, event: SourceEvent, now: Instant) -> Flow {
        tracing::trace!(topic = event.topic(), "event");

        match event {
            SourceEvent::EditModeChanged(mode) => self.on_edit_mode(mode, now),
            SourceEvent::FamiliesChanged(families) => self.on_families(families),
            SourceEvent::LayerChanged(layer) => self.on_layer(layer),
            SourceEvent::WindowChanged(snapshot) => self.on_window(snapshot, now),
            SourceEvent::Accessibility(event) => self.on_accessibility(event),
            SourceEvent::Overlay(event) => self.on_overlay(event),
            SourceEvent::Shutdown => {
                tracing::info!("shutdown requested");
                return Flow::Shutdown;
            }
        }
        Flow::Continue
    }

    pub fn on_push_complete(&mut self, outcome: PushOutcome) {
        self.pushes.on_complete(&mut self.store, outcome);
    }

    /// Post the shortcuts that put the modal editor into `mode`. Insert
    /// has no shortcut.
    pub fn force_edit_mode(&self, mode: EditMode) {
        match mode {
            EditMode::Insert => tracing::debug!("no shortcut forces insert mode"),
            EditMode::Normal => self.post(&self.settings.normal_mode_shortcut),
            EditMode::Visual => {
                self.post(&self.settings.normal_mode_shortcut);
                self.post(&self.settings.visual_mode_shortcut);
            }
        }
    }

    /// Stop observing, wait for an in-flight push and stop the push
    /// worker, then reset every variable.
    pub fn shutdown(&mut self, done: &Receiver<PushOutcome>, timeout: Duration) {
        if let Some(focus) = self.focus.as_mut() {
            focus.stop();
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.stop();
        }
        if let Some(activity) = self.window_activity.as_mut() {
            activity.stop();
        }
        self.memory.cancel();
        self.pushes.drain(&mut self.store, done, timeout);
        self.pushes.shutdown(&mut self.store, done);
        self.reset_variables();
    }

    fn on_edit_mode(&mut self, mode: EditMode, now: Instant) {
        tracing::debug!(mode = mode.as_str(), "edit mode changed");
        self.apply_edit_mode(mode, now);
        self.refresh_mode();
        self.push();
    }

    fn on_layer(&mut self, layer: Layer) {
        tracing::debug!(layer = layer.as_str(), "layer changed");
        self.layer = layer;
        self.refresh_mode();
        self.push();
    }

    fn on_families(&mut self, families: FamilyMap) {
        self.families = families;
        let family = self.frontmost_family();
        self.store
            .stage(&self.settings.names.frontmost_app_family(), family);
        self.push();
    }

    fn on_window(&mut self, snapshot: WindowSnapshot, now: Instant) {
        self.memory.cancel();

        let frontmost = snapshot.frontmost_pid();
        let overlay_host = snapshot.overlay_host_pid();
        let names = &self.settings.names;
        self.store.stage(&names.frontmost_app(), snapshot.frontmost_name());
        self.store.stage(&names.overlay_app(), snapshot.overlay_name());
        self.store
            .stage(&names.window_identifier(), snapshot.window_identifier.as_str());
        self.window = Some(snapshot);
        let family = self.frontmost_family();
        self.store
            .stage(&self.settings.names.frontmost_app_family(), family);

        let recalled = self.memory.recall(frontmost);
        tracing::debug!(pid = ?frontmost, mode = recalled.as_str(), "recalled app mode");
        self.apply_edit_mode(recalled, now);
        if recalled == EditMode::Normal {
            self.post(&self.settings.normal_mode_shortcut);
        }

        self.follow_focus(frontmost);
        self.follow_overlay(overlay_host);
        if let Some(activity) = self.window_activity.as_mut() {
            activity.retarget(frontmost);
        }

        self.refresh_mode();
        self.push();
    }

    fn on_accessibility(&mut self, event: AxEvent) {
        let current = self
            .focus
            .as_ref()
            .is_some_and(|focus| focus.is_current(event.subscription));
        if !current {
            tracing::trace!(subscription = %event.subscription, "stale focus notification");
            return;
        }

        self.stage_focus(Some(event.pid));
        self.refresh_mode();
        self.push();
    }

    fn on_overlay(&mut self, event: AxEvent) {
        let current = self
            .overlay
            .as_ref()
            .is_some_and(|overlay| overlay.is_current(event.subscription));
        if !current {
            tracing::trace!(subscription = %event.subscription, "stale overlay notification");
            return;
        }

        let Some(app) = self.ax.application(event.pid) else {
            return;
        };
        match self.overlay_tracker.observe(&app, event.notification) {
            Some(OverlayChange::Appeared(kind)) | Some(OverlayChange::Changed(kind)) => {
                tracing::debug!(kind = kind.as_str(), "overlay shown");
                self.store
                    .stage(&self.settings.names.overlay_type(), kind.as_str());
            }
            Some(OverlayChange::Disappeared) => self.overlay_disappeared(),
            None => return,
        }

        self.refresh_mode();
        self.push();
    }

    fn overlay_disappeared(&mut self) {
        tracing::debug!("overlay gone");
        if self.override_mode == OverrideMode::AutoRevert {
            self.post(&self.settings.normal_mode_shortcut);
            self.set_override(OverrideMode::Off);
        }
        self.store
            .stage(&self.settings.names.overlay_type(), OverlayKind::None.as_str());
    }

    /// Take `mode` as the editor's mode, handling the override transitions
    /// at the insert and normal edges, and remember it for the frontmost
    /// app.
    fn apply_edit_mode(&mut self, mode: EditMode, now: Instant) {
        match mode {
            EditMode::Insert if self.override_mode == OverrideMode::Off => self.pull_override(),
            EditMode::Normal if self.override_mode != OverrideMode::Off => {
                self.set_override(OverrideMode::Off)
            }
            _ => {}
        }

        self.edit_mode = mode;
        if let Some(pid) = self.window.as_ref().and_then(WindowSnapshot::frontmost_pid) {
            self.memory.save(pid, mode, now);
        }
    }

    /// Read the override an external actor may have requested.
    fn pull_override(&mut self) {
        let name = self.settings.names.mode();
        self.override_mode = match self.store.read(&name) {
            Some(value) => OverrideMode::parse(&value).unwrap_or_else(|| {
                tracing::warn!(value = %value, "unknown override mode");
                OverrideMode::Off
            }),
            None => {
                tracing::error!("couldn't pull override mode");
                OverrideMode::Off
            }
        };
        if self.override_mode != OverrideMode::Off {
            tracing::debug!(mode = self.override_mode.as_str(), "override pulled");
        }
    }

    fn set_override(&mut self, mode: OverrideMode) {
        self.override_mode = mode;
        self.store.stage(&self.settings.names.mode(), mode.as_str());
    }

    fn follow_focus(&mut self, pid: Option<i32>) {
        let retargeted = match self.focus.as_mut() {
            Some(focus) => focus.retarget(pid),
            None => false,
        };
        if retargeted {
            self.stage_focus(pid);
        }
    }

    fn follow_overlay(&mut self, pid: Option<i32>) {
        let attached = match self.overlay.as_mut() {
            Some(overlay) => overlay.attach(pid),
            None => false,
        };
        if attached {
            let visible = self.overlay_tracker.dialogs() > 0;
            self.overlay_tracker.reset();
            if visible {
                self.overlay_disappeared();
            }
        }
    }

    fn stage_focus(&mut self, pid: Option<i32>) {
        let snapshot = pid
            .and_then(|pid| self.ax.application(pid))
            .map(|app| FocusSnapshot::capture(&app, self.settings.modal_depth))
            .unwrap_or_default();
        tracing::trace!(?snapshot, "focus snapshot");

        let names = &self.settings.names;
        self.store.stage(&names.modal_role(), snapshot.modal_role);
        self.store.stage(&names.focused_role(), snapshot.focused_role);
        self.store
            .stage(&names.focused_subrole(), snapshot.focused_subrole);
        self.store
            .stage(&names.focused_placeholder(), snapshot.focused_placeholder);
    }

    fn frontmost_family(&self) -> &'static str {
        self.window
            .as_ref()
            .and_then(|window| window.frontmost.as_ref())
            .and_then(|app| self.families.get(&app.bundle_id))
            .copied()
            .unwrap_or_default()
            .as_str()
    }

    fn refresh_mode(&mut self) {
        let mode = self.mode();
        self.store
            .stage(&self.settings.names.consolidated_mode(), mode.as_str());
    }

    fn push(&mut self) {
        self.pushes.request(&mut self.store);
    }

    fn post(&self, shortcut: &Shortcut) {
        if let Err(e) = self.poster.post(shortcut) {
            tracing::warn!(error = %e, key_code = shortcut.key_code, "failed to post shortcut");
        }
    }
}
