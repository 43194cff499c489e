//! Central event loop: switch activations, health ticks and generation results all funnel
//! through `GridRuntime`, which owns the grid, the chat log and the orchestrator.

use anyhow::Result;
use core_events::{Event, InputEvent, KeyEvent};
use core_generation::{
    GenerationEvent, GenerationOptions, GenerationOrchestrator, handle_activation,
};
use core_input::{AsyncInputShutdown, BoundAction, KeyBindings};
use core_render::{GridRenderer, TerminalGuard, compose_frame};
use core_state::{ChatLog, GridState};
use core_wire::PredictionService;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};

/// Fallback when the terminal cannot report its size.
pub const DEFAULT_SIZE: (u16, u16) = (80, 24);

pub enum LoopControl {
    Continue { dirty: bool },
    Break { reason: ShutdownReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    CtrlC,
    KeyQuit,
    ChannelClosed,
}

impl ShutdownReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownReason::CtrlC => "ctrl_c",
            ShutdownReason::KeyQuit => "key_quit",
            ShutdownReason::ChannelClosed => "channel_closed",
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn log_shutdown_stage(reason: ShutdownReason, stage: &'static str) {
    info!(
        target: "runtime.shutdown",
        reason = reason.as_str(),
        stage = stage,
        "shutdown_stage"
    );
}

/// Everything the loop mutates in response to events.
pub struct Session {
    pub grid: GridState,
    pub chat: ChatLog,
    pub orchestrator: GenerationOrchestrator,
    pub generation_rx: mpsc::UnboundedReceiver<GenerationEvent>,
    pub bindings: KeyBindings,
}

impl Session {
    pub fn new(
        service: Arc<dyn PredictionService>,
        options: GenerationOptions,
        bindings: KeyBindings,
    ) -> Self {
        let (orchestrator, generation_rx) = GenerationOrchestrator::new(service, options);
        Self {
            grid: GridState::new(),
            chat: ChatLog::new(),
            orchestrator,
            generation_rx,
            bindings,
        }
    }
}

/// Background tasks the loop must stop on shutdown.
#[derive(Default)]
pub struct RuntimeTasks {
    pub input_task: Option<JoinHandle<()>>,
    pub input_shutdown: Option<AsyncInputShutdown>,
    pub source_handles: Vec<JoinHandle<()>>,
}

pub struct GridRuntime<'a> {
    session: Session,
    renderer: GridRenderer,
    size: (u16, u16),
    out: Box<dyn Write>,
    rx: mpsc::Receiver<Event>,
    tx: Option<mpsc::Sender<Event>>,
    tasks: RuntimeTasks,
    _terminal_guard: Option<TerminalGuard<'a>>,
}

impl<'a> GridRuntime<'a> {
    pub fn new(
        session: Session,
        tx: mpsc::Sender<Event>,
        rx: mpsc::Receiver<Event>,
        tasks: RuntimeTasks,
        terminal_guard: Option<TerminalGuard<'a>>,
        out: Box<dyn Write>,
    ) -> Self {
        let size = crossterm::terminal::size().unwrap_or(DEFAULT_SIZE);
        Self {
            session,
            renderer: GridRenderer::new(),
            size,
            out,
            rx,
            tx: Some(tx),
            tasks,
            _terminal_guard: terminal_guard,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.paint();

        let mut shutdown_reason = ShutdownReason::ChannelClosed;
        loop {
            let control = tokio::select! {
                event = self.rx.recv() => match event {
                    Some(event) => self.dispatch(&event),
                    None => break,
                },
                Some(generation) = self.session.generation_rx.recv() => {
                    self.handle_generation(generation)
                }
            };
            match control {
                LoopControl::Break { reason } => {
                    shutdown_reason = reason;
                    break;
                }
                LoopControl::Continue { dirty } => {
                    if dirty {
                        self.paint();
                    }
                }
            }
        }

        self.rx.close();
        self.finalize_shutdown(shutdown_reason).await;
        Ok(())
    }

    fn dispatch(&mut self, event: &Event) -> LoopControl {
        match event {
            Event::Input(input) => self.handle_input_event(input),
            Event::HealthCheckDue => self.handle_health_check_due(),
        }
    }

    async fn finalize_shutdown(&mut self, reason: ShutdownReason) {
        log_shutdown_stage(reason, "begin");
        if let Some(tx) = self.tx.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "dropping_runtime_sender"
            );
            drop(tx);
        }

        while let Some(handle) = self.tasks.source_handles.pop() {
            match tokio::time::timeout(Duration::from_millis(200), handle).await {
                Ok(Ok(_)) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_stopped"
                ),
                Ok(Err(err)) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_cancelled"
                ),
                Ok(Err(err)) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "event_source_task_error"
                ),
                Err(_) => warn!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "event_source_task_timeout"
                ),
            }
        }

        if let Some(shutdown) = self.tasks.input_shutdown.take() {
            trace!(
                target: "runtime.shutdown",
                reason = reason.as_str(),
                "input_task_shutdown_signal"
            );
            shutdown.signal();
        }

        if let Some(handle) = self.tasks.input_task.take() {
            match handle.await {
                Ok(_) => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "input_task_joined"
                ),
                Err(err) if err.is_cancelled() => trace!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    "input_task_cancelled"
                ),
                Err(err) => error!(
                    target: "runtime.shutdown",
                    reason = reason.as_str(),
                    ?err,
                    "input_task_join_failed"
                ),
            }
        }

        log_shutdown_stage(reason, "complete");
    }

    fn paint(&mut self) {
        let (cols, rows) = self.size;
        let frame = compose_frame(&self.session.grid, &self.session.chat, cols, rows);
        if let Err(e) = self.renderer.paint(&frame, &mut self.out) {
            error!(target: "render.frame", ?e, "paint_error");
        }
    }

    fn handle_input_event(&mut self, input: &InputEvent) -> LoopControl {
        match input {
            InputEvent::CtrlC => self.handle_ctrl_c(),
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Resize(w, h) => self.handle_resize(*w, *h),
        }
    }

    fn handle_ctrl_c(&mut self) -> LoopControl {
        info!(target: "runtime", "shutdown");
        LoopControl::Break {
            reason: ShutdownReason::CtrlC,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> LoopControl {
        match self.session.bindings.resolve(key) {
            Some(BoundAction::Quit) => LoopControl::Break {
                reason: ShutdownReason::KeyQuit,
            },
            Some(BoundAction::Activate(activation)) => {
                let Session {
                    grid,
                    chat,
                    orchestrator,
                    ..
                } = &mut self.session;
                let outcome = handle_activation(activation, grid, chat, orchestrator);
                trace!(target: "runtime", ?activation, ?outcome, "activation_handled");
                LoopControl::Continue { dirty: true }
            }
            None => {
                trace!(target: "input.keys", key = %key, "key_unbound");
                LoopControl::Continue { dirty: false }
            }
        }
    }

    fn handle_resize(&mut self, width: u16, height: u16) -> LoopControl {
        self.size = (width, height);
        self.renderer.invalidate();
        LoopControl::Continue { dirty: true }
    }

    fn handle_health_check_due(&mut self) -> LoopControl {
        self.session.orchestrator.check_health();
        LoopControl::Continue { dirty: false }
    }

    fn handle_generation(&mut self, event: GenerationEvent) -> LoopControl {
        let Session {
            grid,
            chat,
            orchestrator,
            ..
        } = &mut self.session;
        let dirty = orchestrator.handle_event(event, grid, chat);
        LoopControl::Continue { dirty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedBackend;
    use core_config::KeysConfig;
    use core_events::KeyCode;
    use core_state::Mode;
    use std::sync::Mutex;
    use tracing::Subscriber;
    use tracing::dispatcher::Dispatch;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::Registry;

    #[derive(Clone, Default)]
    struct Capture {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    #[derive(Clone, Debug)]
    struct CapturedEvent {
        target: String,
        fields: Vec<(String, String)>,
    }

    #[derive(Default)]
    struct FieldCollector {
        fields: Vec<(String, String)>,
    }

    impl Visit for FieldCollector {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S> Layer<S> for Capture
    where
        S: Subscriber,
    {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut collector = FieldCollector::default();
            event.record(&mut collector);
            let meta = event.metadata();
            self.events.lock().unwrap().push(CapturedEvent {
                target: meta.target().to_string(),
                fields: collector.fields,
            });
        }
    }

    fn runtime(backend: FixedBackend) -> (GridRuntime<'static>, mpsc::Sender<Event>) {
        let bindings = KeyBindings::from_config(&KeysConfig::default()).unwrap();
        let session = Session::new(Arc::new(backend), GenerationOptions::default(), bindings);
        let (tx, rx) = mpsc::channel(16);
        let mut rt = GridRuntime::new(
            session,
            tx.clone(),
            rx,
            RuntimeTasks::default(),
            None,
            Box::new(std::io::sink()),
        );
        rt.size = DEFAULT_SIZE;
        (rt, tx)
    }

    fn key(c: char) -> Event {
        Event::Input(InputEvent::Key(KeyEvent::plain(KeyCode::Char(c))))
    }

    async fn settle(rt: &mut GridRuntime<'_>) {
        let event = rt.session.generation_rx.recv().await.expect("generation event");
        rt.handle_generation(event);
    }

    #[test]
    fn shutdown_reason_labels_are_stable() {
        assert_eq!(ShutdownReason::CtrlC.as_str(), "ctrl_c");
        assert_eq!(ShutdownReason::KeyQuit.as_str(), "key_quit");
        assert_eq!(ShutdownReason::ChannelClosed.as_str(), "channel_closed");
    }

    #[test]
    fn shutdown_logging_includes_reason_and_stage() {
        let capture = Capture::default();
        let events = capture.events.clone();
        let subscriber = Registry::default().with(capture);
        let dispatcher = Dispatch::new(subscriber);

        tracing::dispatcher::with_default(&dispatcher, || {
            log_shutdown_stage(ShutdownReason::KeyQuit, "complete");
        });

        let events = events.lock().unwrap();
        let shutdown_event = events
            .iter()
            .find(|event| event.target == "runtime.shutdown")
            .expect("shutdown log emitted");
        assert!(
            shutdown_event
                .fields
                .iter()
                .any(|(name, value)| name == "reason" && value.contains("key_quit"))
        );
        assert!(
            shutdown_event
                .fields
                .iter()
                .any(|(name, value)| name == "stage" && value.contains("complete"))
        );
    }

    #[tokio::test]
    async fn movement_keys_drive_the_cursor() {
        let (mut rt, _tx) = runtime(FixedBackend::healthy());
        assert!(matches!(
            rt.dispatch(&key('1')),
            LoopControl::Continue { dirty: true }
        ));
        assert_eq!(rt.session.grid.cursor_position(), 1);
        rt.dispatch(&key('2'));
        assert_eq!(rt.session.grid.cursor_position(), 5);
    }

    #[tokio::test]
    async fn unbound_key_is_not_dirty() {
        let (mut rt, _tx) = runtime(FixedBackend::healthy());
        assert!(matches!(
            rt.dispatch(&key('z')),
            LoopControl::Continue { dirty: false }
        ));
        assert_eq!(rt.session.grid.cursor_position(), 0);
    }

    #[tokio::test]
    async fn quit_key_and_ctrl_c_break_the_loop() {
        let (mut rt, _tx) = runtime(FixedBackend::healthy());
        assert!(matches!(
            rt.dispatch(&key('q')),
            LoopControl::Break {
                reason: ShutdownReason::KeyQuit
            }
        ));
        assert!(matches!(
            rt.dispatch(&Event::Input(InputEvent::CtrlC)),
            LoopControl::Break {
                reason: ShutdownReason::CtrlC
            }
        ));
    }

    #[tokio::test]
    async fn health_tick_connects_and_fetches_context_words() {
        let (mut rt, _tx) = runtime(FixedBackend::healthy());
        rt.dispatch(&Event::HealthCheckDue);
        settle(&mut rt).await; // health result, issues fetch
        assert!(rt.session.grid.is_backend_connected());
        assert!(rt.session.grid.is_loading());
        settle(&mut rt).await; // fetch result
        assert_eq!(&rt.session.grid.words()[..2], ["dog", "cat"]);
        assert!(!rt.session.grid.is_loading());
    }

    #[tokio::test]
    async fn selecting_a_word_updates_chat_and_requests_more() {
        let (mut rt, _tx) = runtime(FixedBackend::healthy());
        rt.session.grid.set_backend_connected(true);
        rt.dispatch(&key('3'));
        assert_eq!(rt.session.chat.current_sentence(), ["I"]);
        assert_eq!(rt.session.grid.mode(), Mode::Continuing);
        assert!(rt.session.grid.is_loading());
        settle(&mut rt).await;
        assert_eq!(rt.session.grid.words()[0], "dog");
        assert_eq!(rt.session.grid.cursor_position(), 0);
    }

    #[tokio::test]
    async fn offline_selection_keeps_the_grid() {
        let (mut rt, _tx) = runtime(FixedBackend::unreachable());
        let before = rt.session.grid.words().to_vec();
        rt.dispatch(&key('3'));
        assert_eq!(rt.session.chat.current_sentence(), ["I"]);
        assert_eq!(rt.session.grid.words(), before.as_slice());
        assert!(!rt.session.grid.is_loading());
    }

    #[tokio::test]
    async fn resize_repaints_from_scratch() {
        let (mut rt, _tx) = runtime(FixedBackend::healthy());
        rt.paint();
        assert!(matches!(
            rt.dispatch(&Event::Input(InputEvent::Resize(100, 30))),
            LoopControl::Continue { dirty: true }
        ));
        assert_eq!(rt.size, (100, 30));
        rt.paint();
        assert_eq!(rt.renderer.metrics().full_frames, 2);
    }

    #[tokio::test]
    async fn run_processes_queued_events_until_quit_key() {
        let capture = Capture::default();
        let events = capture.events.clone();
        let _guard = tracing::dispatcher::set_default(&Dispatch::new(
            Registry::default().with(capture),
        ));

        let (mut rt, tx) = runtime(FixedBackend::healthy());
        tx.send(key('1')).await.unwrap();
        tx.send(key('1')).await.unwrap();
        tx.send(key('q')).await.unwrap();
        tx.send(key('1')).await.unwrap();
        drop(tx);
        rt.run().await.unwrap();
        assert_eq!(rt.session.grid.cursor_position(), 2);
        assert!(rt.tx.is_none());

        let events = events.lock().unwrap();
        assert!(events.iter().any(|event| {
            event.target == "runtime.shutdown"
                && event
                    .fields
                    .iter()
                    .any(|(name, value)| name == "reason" && value.contains("key_quit"))
        }));
    }
}
