//! Aggregator scenarios over an in-memory accessibility tree, a recording
//! variable sink and a recording shortcut poster.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use modeglue_ax::{roles, Attribute, MemoryAccessibility, MemoryElement, Notification};
use modeglue_context::{
    AppFamily, AppInfo, EditMode, Layer, Mode, OverrideMode, StaticProbe, WindowRules,
    WindowSnapshot, WindowWatcher,
};
use modeglue_engine::{AggregatorSettings, Flow, ModeAggregator};
use modeglue_events::{FamilyMap, InMemorySink, SourceEvent};
use modeglue_input::{RecordingPoster, Shortcut};
use modeglue_variables::{
    EnvironmentFile, MemorySink, PushQueue, VariableNames, VariableResult, VariableSink,
    VariableStore, VariableValue, Variables,
};
use tempfile::TempDir;

const SAFARI: i32 = 101;
const NOTES: i32 = 102;
const HOMEROW: i32 = 900;

struct Harness {
    ax: Arc<MemoryAccessibility>,
    variables: Arc<MemorySink>,
    poster: Arc<RecordingPoster>,
    notifications: Arc<InMemorySink>,
    aggregator: ModeAggregator<MemoryAccessibility>,
    names: VariableNames,
    environment: PathBuf,
    start: Instant,
    _dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let environment = dir.path().join("karabiner_environment");
        write_override(&environment, "");

        let ax = Arc::new(MemoryAccessibility::new());
        let variables = Arc::new(MemorySink::new());
        let poster = Arc::new(RecordingPoster::new());
        let notifications = Arc::new(InMemorySink::new());

        let mut aggregator = ModeAggregator::new(
            Arc::clone(&ax),
            AggregatorSettings::default(),
            VariableStore::new(EnvironmentFile::new(&environment)),
            PushQueue::inline(variables.clone()),
            poster.clone(),
        );
        aggregator.reset_variables();
        aggregator.enable_accessibility(notifications.clone());

        Self {
            ax,
            variables,
            poster,
            notifications,
            aggregator,
            names: VariableNames::default(),
            environment,
            start: Instant::now(),
            _dir: dir,
        }
    }

    fn at(&self, millis: u64) -> Instant {
        self.start + Duration::from_millis(millis)
    }

    fn send(&mut self, event: SourceEvent, millis: u64) -> Flow {
        let now = self.at(millis);
        self.aggregator.tick(now);
        self.aggregator.handle(event, now)
    }

    /// Feed every notification the sources have reported so far.
    fn forward_notifications(&mut self, millis: u64) {
        for event in self.notifications.take() {
            self.send(event, millis);
        }
    }

    fn pushed(&self, name: &str) -> Option<String> {
        self.variables
            .value(name)
            .and_then(|value| value.as_str().map(str::to_string))
    }

    fn consolidated(&self) -> Option<String> {
        self.pushed(&self.names.consolidated_mode())
    }
}

fn write_override(path: &Path, mode: &str) {
    let content = format!(
        "{{\n  \"variables\": {{\n    \"kG.consolidatedMode\": \"\",\n    \"kG.mode\": \"{mode}\",\n  }}\n}}\n"
    );
    std::fs::write(path, content).unwrap();
}

fn window(app: Option<AppInfo>, overlay_host: Option<AppInfo>) -> SourceEvent {
    SourceEvent::WindowChanged(WindowSnapshot {
        frontmost: app,
        overlay: None,
        window_identifier: String::new(),
        overlay_host,
    })
}

fn safari() -> AppInfo {
    AppInfo::new(SAFARI, "com.apple.Safari", "Safari")
}

fn notes() -> AppInfo {
    AppInfo::new(NOTES, "com.apple.Notes", "Notes")
}

fn homerow() -> AppInfo {
    AppInfo::new(HOMEROW, "com.superultra.Homerow", "Homerow")
}

fn dialog() -> MemoryElement {
    MemoryElement::new(roles::WINDOW).with(Attribute::Subrole, roles::SYSTEM_DIALOG)
}

#[test]
fn test_startup_resets_every_variable() {
    let harness = Harness::new();
    let batches = harness.variables.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), harness.names.defaults().len());
    assert!(batches[0].values().all(|v| *v == VariableValue::from("")));
}

#[test]
fn test_layer_wins_over_override_which_wins_over_edit_mode() {
    let mut harness = Harness::new();
    write_override(&harness.environment, "manual");

    harness.send(SourceEvent::EditModeChanged(EditMode::Insert), 0);
    assert_eq!(harness.aggregator.override_mode(), OverrideMode::Manual);
    assert_eq!(harness.consolidated().as_deref(), Some("manual"));

    harness.send(SourceEvent::LayerChanged(Layer::Nav), 10);
    assert_eq!(harness.aggregator.mode(), Mode::Nav);
    assert_eq!(harness.consolidated().as_deref(), Some("nav"));

    harness.send(SourceEvent::LayerChanged(Layer::None), 20);
    assert_eq!(harness.consolidated().as_deref(), Some("manual"));
}

#[test]
fn test_normal_mode_closes_override() {
    let mut harness = Harness::new();
    write_override(&harness.environment, "manual");
    harness.send(SourceEvent::EditModeChanged(EditMode::Insert), 0);
    assert_eq!(harness.aggregator.override_mode(), OverrideMode::Manual);

    harness.send(SourceEvent::EditModeChanged(EditMode::Normal), 10);

    assert_eq!(harness.aggregator.override_mode(), OverrideMode::Off);
    let last = harness.variables.batches().pop().unwrap();
    assert_eq!(last.get(&harness.names.mode()), Some(&VariableValue::from("")));
    assert_eq!(
        last.get(&harness.names.consolidated_mode()),
        Some(&VariableValue::from("normal"))
    );
}

#[test]
fn test_override_pulled_only_while_off() {
    let mut harness = Harness::new();
    write_override(&harness.environment, "manual");
    harness.send(SourceEvent::EditModeChanged(EditMode::Insert), 0);

    write_override(&harness.environment, "input");
    harness.send(SourceEvent::EditModeChanged(EditMode::Insert), 10);
    assert_eq!(harness.aggregator.override_mode(), OverrideMode::Manual);
}

#[test]
fn test_unreadable_override_is_off() {
    let mut harness = Harness::new();
    std::fs::remove_file(&harness.environment).unwrap();

    harness.send(SourceEvent::EditModeChanged(EditMode::Insert), 0);
    assert_eq!(harness.aggregator.override_mode(), OverrideMode::Off);
    assert_eq!(harness.aggregator.mode(), Mode::Insert);
}

#[test]
fn test_unchanged_recompute_pushes_nothing() {
    let mut harness = Harness::new();
    harness.send(SourceEvent::LayerChanged(Layer::Sym), 0);
    let count = harness.variables.batches().len();

    harness.send(SourceEvent::LayerChanged(Layer::Sym), 10);
    assert_eq!(harness.variables.batches().len(), count);
}

#[test]
fn test_window_change_stages_descriptive_values_in_one_batch() {
    let mut harness = Harness::new();
    let mut families = FamilyMap::new();
    families.insert("com.apple.Safari".to_string(), AppFamily::Pgr);
    harness.send(SourceEvent::FamiliesChanged(families), 0);
    let before = harness.variables.batches().len();

    harness.send(
        SourceEvent::WindowChanged(WindowSnapshot {
            frontmost: Some(safari()),
            overlay: Some(homerow()),
            window_identifier: "main".to_string(),
            overlay_host: None,
        }),
        10,
    );

    let batches = harness.variables.batches();
    assert_eq!(batches.len(), before + 1);
    let batch = batches.last().unwrap();
    let names = &harness.names;
    assert_eq!(batch.get(&names.frontmost_app()), Some(&VariableValue::from("Safari")));
    assert_eq!(batch.get(&names.overlay_app()), Some(&VariableValue::from("Homerow")));
    assert_eq!(batch.get(&names.window_identifier()), Some(&VariableValue::from("main")));
    assert_eq!(batch.get(&names.frontmost_app_family()), Some(&VariableValue::from("pgr")));
}

#[test]
fn test_families_reload_restages_frontmost_family() {
    let mut harness = Harness::new();
    harness.send(window(Some(notes()), None), 0);

    let mut families = FamilyMap::new();
    families.insert("com.apple.Notes".to_string(), AppFamily::Electron);
    harness.send(SourceEvent::FamiliesChanged(families), 10);

    assert_eq!(
        harness.pushed(&harness.names.frontmost_app_family()).as_deref(),
        Some("electron")
    );
}

#[test]
fn test_window_switch_recalls_saved_mode() {
    let mut harness = Harness::new();
    harness.send(window(Some(safari()), None), 0);
    harness.send(SourceEvent::EditModeChanged(EditMode::Normal), 10);

    // Debounce elapses, Safari's mode is committed.
    harness.aggregator.tick(harness.at(300));
    assert_eq!(harness.aggregator.memory().recall(Some(SAFARI)), EditMode::Normal);

    harness.send(window(Some(notes()), None), 400);
    assert_eq!(harness.aggregator.edit_mode(), EditMode::Insert);
    assert!(harness.poster.posted().is_empty());

    harness.send(window(Some(safari()), None), 800);
    assert_eq!(harness.aggregator.edit_mode(), EditMode::Normal);
    assert_eq!(harness.poster.posted(), vec![Shortcut::normal_mode()]);
    assert_eq!(harness.consolidated().as_deref(), Some("normal"));
}

#[test]
fn test_window_switch_cancels_pending_save() {
    let mut harness = Harness::new();
    harness.send(window(Some(safari()), None), 0);
    harness.aggregator.tick(harness.at(250));

    harness.send(SourceEvent::EditModeChanged(EditMode::Visual), 300);
    harness.send(window(Some(notes()), None), 350);
    harness.aggregator.tick(harness.at(1000));

    assert_eq!(harness.aggregator.memory().recall(Some(SAFARI)), EditMode::Insert);
}

#[test]
fn test_focus_snapshot_follows_frontmost_app() {
    let mut harness = Harness::new();
    let app = MemoryElement::new(roles::APPLICATION);
    let window_element = app.add_child(MemoryElement::new(roles::WINDOW));
    let field = window_element.add_child(
        MemoryElement::new("AXTextField").with(Attribute::Placeholder, "Search"),
    );
    app.set_focused(Some(field));
    harness.ax.insert_app(SAFARI, app.clone());

    harness.send(window(Some(safari()), None), 0);
    assert_eq!(harness.pushed(&harness.names.focused_role()).as_deref(), Some("AXTextField"));
    assert_eq!(
        harness.pushed(&harness.names.focused_placeholder()).as_deref(),
        Some("Search")
    );

    window_element.add_child(MemoryElement::new(roles::SHEET));
    assert_eq!(harness.ax.emit(SAFARI, Notification::WindowCreated), 1);
    harness.forward_notifications(10);
    assert_eq!(harness.pushed(&harness.names.modal_role()).as_deref(), Some(roles::SHEET));
}

#[test]
fn test_stale_focus_notification_is_ignored() {
    let mut harness = Harness::new();
    let app = MemoryElement::new(roles::APPLICATION);
    harness.ax.insert_app(SAFARI, app.clone());
    harness.send(window(Some(safari()), None), 0);

    harness.ax.emit(SAFARI, Notification::FocusedElementChanged);
    let stale = harness.notifications.take();
    assert_eq!(stale.len(), 1);

    harness.send(window(Some(notes()), None), 10);
    let focused = MemoryElement::new("AXTextArea");
    app.set_focused(Some(focused));
    let before = harness.variables.batches().len();

    for event in stale {
        harness.send(event, 20);
    }
    assert_eq!(harness.variables.batches().len(), before);
    assert_ne!(harness.pushed(&harness.names.focused_role()).as_deref(), Some("AXTextArea"));
}

#[test]
fn test_auto_revert_on_overlay_disappear() {
    let mut harness = Harness::new();
    let provider = MemoryElement::new(roles::APPLICATION);
    harness.ax.insert_app(HOMEROW, provider.clone());

    write_override(&harness.environment, "auto");
    harness.send(window(Some(safari()), Some(homerow())), 0);
    assert_eq!(harness.aggregator.override_mode(), OverrideMode::AutoRevert);

    provider.add_child(dialog());
    harness.ax.emit(HOMEROW, Notification::WindowCreated);
    harness.forward_notifications(10);
    assert_eq!(harness.pushed(&harness.names.overlay_type()).as_deref(), Some("search"));
    assert!(harness.poster.posted().is_empty());

    provider.clear_children();
    harness.ax.emit(HOMEROW, Notification::ElementDestroyed);
    harness.forward_notifications(20);

    assert_eq!(harness.poster.posted(), vec![Shortcut::normal_mode()]);
    assert_eq!(harness.aggregator.override_mode(), OverrideMode::Off);
    assert_eq!(harness.pushed(&harness.names.overlay_type()).as_deref(), Some(""));
    assert_eq!(harness.pushed(&harness.names.mode()).as_deref(), Some(""));
}

#[test]
fn test_overlay_disappear_without_auto_revert_posts_nothing() {
    let mut harness = Harness::new();
    let provider = MemoryElement::new(roles::APPLICATION);
    harness.ax.insert_app(HOMEROW, provider.clone());
    harness.send(window(Some(safari()), Some(homerow())), 0);

    let scroll = provider.add_child(dialog());
    scroll.add_child(MemoryElement::new("AXGroup"));
    harness.ax.emit(HOMEROW, Notification::WindowCreated);
    harness.forward_notifications(10);
    assert_eq!(harness.pushed(&harness.names.overlay_type()).as_deref(), Some("scroll"));

    provider.clear_children();
    harness.ax.emit(HOMEROW, Notification::ElementDestroyed);
    harness.forward_notifications(20);

    assert!(harness.poster.posted().is_empty());
    assert_eq!(harness.pushed(&harness.names.overlay_type()).as_deref(), Some(""));
}

#[test]
fn test_failed_push_retried_with_next_event() {
    let mut harness = Harness::new();
    harness.variables.set_failing(true);
    harness.send(SourceEvent::LayerChanged(Layer::Nav), 0);
    assert_eq!(harness.consolidated().as_deref(), Some(""));

    harness.variables.set_failing(false);
    harness.send(SourceEvent::LayerChanged(Layer::Nav), 10);
    assert_eq!(harness.consolidated().as_deref(), Some("nav"));
}

#[test]
fn test_force_visual_posts_normal_then_visual() {
    let harness = Harness::new();
    harness.aggregator.force_edit_mode(EditMode::Visual);
    assert_eq!(
        harness.poster.posted(),
        vec![Shortcut::normal_mode(), Shortcut::visual_mode()]
    );
}

#[test]
fn test_shutdown_event_stops_loop() {
    let mut harness = Harness::new();
    assert_eq!(harness.send(SourceEvent::Shutdown, 0), Flow::Shutdown);
    assert_eq!(harness.send(SourceEvent::LayerChanged(Layer::Sym), 0), Flow::Continue);
}

/// Slow sink that notes whether two calls ever overlapped.
struct SlowSink {
    inner: MemorySink,
    active: AtomicUsize,
    overlapped: AtomicBool,
}

impl VariableSink for SlowSink {
    fn set_variables(&self, variables: &Variables) -> VariableResult<()> {
        if self.active.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        std::thread::sleep(Duration::from_millis(150));
        let result = self.inner.set_variables(variables);
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[test]
fn test_shutdown_resets_only_after_slow_push_finishes() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(SlowSink {
        inner: MemorySink::new(),
        active: AtomicUsize::new(0),
        overlapped: AtomicBool::new(false),
    });
    let (done_tx, done_rx) = crossbeam_channel::unbounded();
    let mut aggregator = ModeAggregator::new(
        Arc::new(MemoryAccessibility::new()),
        AggregatorSettings::default(),
        VariableStore::new(EnvironmentFile::new(dir.path().join("karabiner_environment"))),
        PushQueue::worker(sink.clone(), done_tx).unwrap(),
        Arc::new(RecordingPoster::new()),
    );
    aggregator.reset_variables();

    aggregator.handle(SourceEvent::LayerChanged(Layer::Nav), Instant::now());
    aggregator.shutdown(&done_rx, Duration::from_millis(10));

    assert!(!sink.overlapped.load(Ordering::SeqCst));
    let batches = sink.inner.batches();
    assert_eq!(batches.len(), 3);
    let consolidated = VariableNames::default().consolidated_mode();
    assert_eq!(batches[1].get(&consolidated), Some(&VariableValue::from("nav")));
    assert_eq!(batches[2].get(&consolidated), Some(&VariableValue::from("")));
}

#[test]
fn test_frontmost_window_change_wakes_window_watcher() {
    let mut harness = Harness::new();
    let probe = Arc::new(StaticProbe::new());
    probe.set_focused(Some(safari()));

    let (seen_tx, seen_rx) = crossbeam_channel::unbounded();
    let mut watcher = WindowWatcher::new();
    harness.aggregator.follow_window_activity(watcher.waker());
    watcher.start_with_interval(
        Arc::clone(&probe),
        WindowRules::default(),
        Arc::new(move |snapshot: WindowSnapshot| {
            let _ = seen_tx.send(snapshot);
        }),
        Duration::from_secs(60),
    );

    let first = seen_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(first.frontmost_pid(), Some(SAFARI));
    harness.send(SourceEvent::WindowChanged(first), 0);

    probe.set_focused(Some(notes()));
    assert_eq!(harness.ax.emit(SAFARI, Notification::FocusedWindowChanged), 1);

    let next = seen_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(next.frontmost_pid(), Some(NOTES));
    watcher.stop();
}
