//! Control driver.
//!
//! Owns the session gate, mode router and mouse coalescer, and is the only
//! component that executes their [`StoreWrite`]s. Events are decided one at
//! a time; in [`ControlDriver::run`] the resulting writes are issued without
//! waiting on each other, so one slow write cannot hold back a click.
//!
//! ```text
//!  ControlEvent ──▶ gate.check ──▶ router / publisher / coalescer
//!                                        │
//!                                        ▼ StoreWrite
//!  coalescer timer ───────────────▶ store.set / store.update ──▶ Notice
//! ```
//!
//! Failed writes are reported as a [`Notice::Rejected`] and dropped; the
//! driver never retries. Rejected commands never reach the store.

use std::{fmt, sync::Arc, time::Duration};

use smarthid_proto::{HidPath, MouseButton, MouseState, OperationMode, ScrollDirection};
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinSet},
};
use tokio_util::sync::CancellationToken;

use crate::{
    coalescer::{CoalescerConfig, MouseCoalescer},
    env::Environment,
    error::{CommandKind, ControlError, ErrorKind},
    gate::{LockoutPolicy, Secret, SessionGate},
    publisher::{CommandPublisher, read_mouse_state},
    router::ModeRouter,
    store::{SharedStore, StoreWrite},
};

/// Driver tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlConfig {
    /// Pointer sampling window.
    pub coalesce_window: Duration,
    /// Delay before a click is released.
    pub release_delay: Duration,
    /// Login lockout policy.
    pub lockout: LockoutPolicy,
}

impl ControlConfig {
    fn coalescer(&self) -> CoalescerConfig {
        CoalescerConfig { window: self.coalesce_window, release_delay: self.release_delay }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        let coalescer = CoalescerConfig::default();
        Self {
            coalesce_window: coalescer.window,
            release_delay: coalescer.release_delay,
            lockout: LockoutPolicy::default(),
        }
    }
}

/// Operator input.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Password submission.
    Login {
        /// Candidate password.
        password: String,
    },
    /// Switch operation mode.
    SetMode(OperationMode),
    /// Text to type.
    Text(String),
    /// Ducky script to run.
    Script(String),
    /// LED color token or `#RRGGBB`.
    Led(String),
    /// Raw pointer position.
    PointerMove {
        /// Horizontal coordinate.
        x: f64,
        /// Vertical coordinate.
        y: f64,
    },
    /// Press with automatic release.
    Click(MouseButton),
    /// Press without release.
    QuickClick(MouseButton),
    /// One scroll pulse.
    Scroll(ScrollDirection),
    /// Read back `hid/mouseData`.
    ReadMouse,
}

/// Operator-facing outcome of an event or timer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Login accepted.
    Authenticated,
    /// A write reached the store.
    Published {
        /// Command the write belongs to.
        command: CommandKind,
        /// Path written.
        path: HidPath,
    },
    /// Pointer move recorded locally, write pending on the sample timer.
    Buffered {
        /// Local cursor x.
        x: f64,
        /// Local cursor y.
        y: f64,
    },
    /// Current store view of the mouse.
    Mouse(MouseState),
    /// Command refused or write failed.
    Rejected(ControlError),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => f.write_str("logged in"),
            Self::Published { command, path } => write!(f, "{command} sent to {path}"),
            Self::Buffered { x, y } => write!(f, "cursor at ({x}, {y})"),
            Self::Mouse(state) => write!(
                f,
                "x={} y={} click={} left={} right={} scroll={}",
                state.x, state.y, state.click, state.left_click, state.right_click, state.scroll
            ),
            Self::Rejected(err) => write!(f, "{err}"),
        }
    }
}

/// Executes operator events against a shared store.
pub struct ControlDriver<E: Environment, S: SharedStore + ?Sized> {
    env: E,
    store: Arc<S>,
    gate: SessionGate<E::Instant>,
    router: ModeRouter,
    coalescer: MouseCoalescer<E::Instant>,
}

impl<E, S> ControlDriver<E, S>
where
    E: Environment,
    S: SharedStore + ?Sized,
{
    /// Creates a driver in typing mode, awaiting login.
    pub fn new(env: E, store: Arc<S>, secret: Secret, config: ControlConfig) -> Self {
        Self {
            env,
            store,
            gate: SessionGate::new(secret, config.lockout),
            router: ModeRouter::default(),
            coalescer: MouseCoalescer::new(config.coalescer()),
        }
    }

    /// Session gate.
    pub fn gate(&self) -> &SessionGate<E::Instant> {
        &self.gate
    }

    /// Mode router.
    pub fn router(&self) -> &ModeRouter {
        &self.router
    }

    /// Mouse coalescer.
    pub fn coalescer(&self) -> &MouseCoalescer<E::Instant> {
        &self.coalescer
    }

    /// Handles one event and waits for its write to land.
    pub async fn handle(&mut self, event: ControlEvent) -> Notice {
        let now = self.env.now();
        match self.plan(event, now) {
            Ok(step) => execute(Arc::clone(&self.store), step).await,
            Err(err) => reject(err),
        }
    }

    /// Earliest coalescer deadline.
    pub fn next_deadline(&self) -> Option<E::Instant> {
        self.coalescer.next_deadline()
    }

    /// Publishes every coalescer write due now.
    pub async fn fire_due(&mut self) -> Vec<Notice> {
        let now = self.env.now();
        let writes = self.coalescer.poll(now);
        self.publish_all(writes).await
    }

    /// Publishes all pending coalescer writes without waiting for their
    /// deadlines, so no button is left pressed on the device.
    pub async fn flush(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Some(deadline) = self.coalescer.next_deadline() {
            let writes = self.coalescer.poll(deadline);
            notices.extend(self.publish_all(writes).await);
        }
        notices
    }

    /// Runs until `shutdown` fires or `events` closes, then flushes.
    ///
    /// Writes are issued without waiting for earlier ones to complete, so a
    /// slow store never delays a click press or a scheduled release. Each
    /// write reports its own notice when it lands. Events already queued when
    /// `shutdown` fires are still handled, and every in-flight write is
    /// awaited before returning.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ControlEvent>,
        notices: mpsc::Sender<Notice>,
        shutdown: CancellationToken,
    ) where
        S: 'static,
    {
        tracing::info!(mode = %self.router.current_mode(), "control driver started");
        let mut in_flight: JoinSet<Notice> = JoinSet::new();

        loop {
            let delay = self.next_deadline().map(|due| {
                let now = self.env.now();
                if due > now { due - now } else { Duration::ZERO }
            });
            let env = self.env.clone();
            let timer = async move {
                match delay {
                    Some(delay) => env.sleep(delay).await,
                    None => std::future::pending::<()>().await,
                }
            };

            // Due timers first so a busy event stream cannot delay a
            // release; queued events drain before shutdown is honored.
            tokio::select! {
                biased;
                () = timer => {
                    let now = self.env.now();
                    for write in self.coalescer.poll(now) {
                        self.spawn_step(&mut in_flight, timer_step(write));
                    }
                },
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => {
                    forward(&notices, done).await;
                },
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let now = self.env.now();
                    match self.plan(event, now) {
                        Ok(Step::Done(notice)) => send(&notices, notice).await,
                        Ok(step) => self.spawn_step(&mut in_flight, step),
                        Err(err) => send(&notices, reject(err)).await,
                    }
                },
                () = shutdown.cancelled() => break,
            }
        }

        while let Some(deadline) = self.coalescer.next_deadline() {
            for write in self.coalescer.poll(deadline) {
                self.spawn_step(&mut in_flight, timer_step(write));
            }
        }
        let mut drained = 0usize;
        while let Some(done) = in_flight.join_next().await {
            forward(&notices, done).await;
            drained += 1;
        }
        tracing::info!(drained, "control driver stopped");
    }

    fn spawn_step(&self, in_flight: &mut JoinSet<Notice>, step: Step)
    where
        S: 'static,
    {
        in_flight.spawn(execute(Arc::clone(&self.store), step));
    }

    /// Applies the gate, router and coalescer to one event and returns the
    /// store work it needs, without touching the store.
    fn plan(&mut self, event: ControlEvent, now: E::Instant) -> Result<Step, ControlError> {
        if !matches!(event, ControlEvent::Login { .. }) {
            self.gate.check(now)?;
        }

        let step = match event {
            ControlEvent::Login { password } => {
                self.gate.submit(&password, now)?;
                // Device should see the mode the operator starts in.
                Step::Login(self.router.mirror())
            },
            ControlEvent::SetMode(mode) => {
                if mode != OperationMode::Mouse && self.coalescer.cancel_sample() {
                    tracing::debug!(%mode, "pending pointer sample dropped on mode change");
                }
                Step::Write { command: CommandKind::Mode, write: self.router.set_mode(mode) }
            },
            ControlEvent::Text(text) => {
                Step::Write { command: CommandKind::Text, write: CommandPublisher::text(&self.router, &text)? }
            },
            ControlEvent::Script(script) => {
                Step::Write { command: CommandKind::Script, write: CommandPublisher::script(&self.router, &script)? }
            },
            ControlEvent::Led(color) => {
                Step::Write { command: CommandKind::Led, write: CommandPublisher::led(&color)? }
            },
            ControlEvent::PointerMove { x, y } => {
                self.router.require(CommandKind::PointerMove, OperationMode::Mouse)?;
                if let Some(due) = self.coalescer.on_move(x, y, now) {
                    tracing::trace!(x, y, ?due, "sample timer armed");
                }
                Step::Done(Notice::Buffered { x, y })
            },
            ControlEvent::Click(button) => {
                self.router.require(CommandKind::Click, OperationMode::Mouse)?;
                Step::Write { command: CommandKind::Click, write: self.coalescer.on_click(button, now) }
            },
            ControlEvent::QuickClick(button) => Step::Write {
                command: CommandKind::QuickClick,
                write: CommandPublisher::quick_click(&self.router, button)?,
            },
            ControlEvent::Scroll(direction) => Step::Write {
                command: CommandKind::Scroll,
                write: CommandPublisher::scroll(&self.router, direction)?,
            },
            ControlEvent::ReadMouse => Step::ReadMouse,
        };
        Ok(step)
    }

    async fn publish_all(&self, writes: Vec<StoreWrite>) -> Vec<Notice> {
        let mut notices = Vec::with_capacity(writes.len());
        for write in writes {
            notices.push(execute(Arc::clone(&self.store), timer_step(write)).await);
        }
        notices
    }
}

/// Store work decided for one event.
#[derive(Debug)]
enum Step {
    /// Nothing to send.
    Done(Notice),
    /// Mode mirror after a successful login; its failure is only logged.
    Login(StoreWrite),
    /// A command write.
    Write { command: CommandKind, write: StoreWrite },
    /// Read back `hid/mouseData`.
    ReadMouse,
}

async fn execute<S: SharedStore + ?Sized>(store: Arc<S>, step: Step) -> Notice {
    match step {
        Step::Done(notice) => notice,
        Step::Login(mirror) => {
            if let Err(err) = mirror.apply(store.as_ref()).await {
                tracing::warn!(error = %err, "mode mirror after login failed");
            }
            Notice::Authenticated
        },
        Step::Write { command, write } => {
            let path = write.path();
            match write.apply(store.as_ref()).await {
                Ok(()) => {
                    tracing::debug!(%command, %path, "published");
                    Notice::Published { command, path }
                },
                Err(err) => reject(err.into()),
            }
        },
        Step::ReadMouse => match read_mouse_state(store.as_ref()).await {
            Ok(state) => Notice::Mouse(state),
            Err(err) => reject(err.into()),
        },
    }
}

async fn send(notices: &mpsc::Sender<Notice>, notice: Notice) {
    if notices.send(notice).await.is_err() {
        tracing::debug!("notice receiver dropped");
    }
}

async fn forward(notices: &mpsc::Sender<Notice>, done: Result<Notice, JoinError>) {
    match done {
        Ok(notice) => send(notices, notice).await,
        Err(err) => tracing::error!(error = %err, "store write task failed"),
    }
}

fn timer_step(write: StoreWrite) -> Step {
    Step::Write { command: timer_command(&write), write }
}

/// Timer writes are either a pointer sample (carries a position) or a click
/// release.
fn timer_command(write: &StoreWrite) -> CommandKind {
    match write {
        StoreWrite::Update { fields, .. } if fields.contains_key("x") => CommandKind::PointerMove,
        _ => CommandKind::Click,
    }
}

fn reject(err: ControlError) -> Notice {
    match err.kind() {
        ErrorKind::Transport => tracing::error!(error = %err, "store write failed"),
        ErrorKind::Auth => tracing::warn!(error = %err, "command refused"),
        ErrorKind::Validation => tracing::info!(error = %err, "command rejected"),
    }
    Notice::Rejected(err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Instant,
    };

    use serde_json::json;

    use super::*;
    use crate::{
        error::{AuthError, ValidationError},
        store::MemoryStore,
    };

    /// Manually advanced clock.
    #[derive(Clone)]
    struct ManualEnv {
        start: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl ManualEnv {
        fn new() -> Self {
            Self { start: Instant::now(), offset: Arc::new(Mutex::new(Duration::ZERO)) }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Environment for ManualEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            self.start + *self.offset.lock().unwrap()
        }

        fn unix_now(&self) -> Duration {
            Duration::from_secs(1_700_000_000) + *self.offset.lock().unwrap()
        }

        async fn sleep(&self, _duration: Duration) {}
    }

    fn driver() -> (ManualEnv, Arc<MemoryStore>, ControlDriver<ManualEnv, MemoryStore>) {
        let env = ManualEnv::new();
        let store = Arc::new(MemoryStore::new());
        let driver = ControlDriver::new(
            env.clone(),
            Arc::clone(&store),
            Secret::new("hunter2"),
            ControlConfig::default(),
        );
        (env, store, driver)
    }

    async fn logged_in() -> (ManualEnv, Arc<MemoryStore>, ControlDriver<ManualEnv, MemoryStore>) {
        let (env, store, mut driver) = driver();
        assert_eq!(driver.handle(ControlEvent::Login { password: "hunter2".into() }).await, Notice::Authenticated);
        store.clear_journal();
        (env, store, driver)
    }

    #[tokio::test]
    async fn commands_before_login_are_refused() {
        let (_env, store, mut driver) = driver();

        let notice = driver.handle(ControlEvent::Led("RED".into())).await;

        assert_eq!(
            notice,
            Notice::Rejected(ControlError::Auth(AuthError::LoginRequired { remaining_attempts: 5 }))
        );
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn login_mirrors_current_mode() {
        let (_env, store, mut driver) = driver();

        driver.handle(ControlEvent::Login { password: "hunter2".into() }).await;

        assert_eq!(store.peek("hid/mode"), Some(json!("Typing Mode")));
    }

    #[tokio::test]
    async fn wrong_mode_never_touches_store() {
        let (_env, store, mut driver) = logged_in().await;

        let notice = driver.handle(ControlEvent::Scroll(ScrollDirection::Up)).await;

        assert!(matches!(
            notice,
            Notice::Rejected(ControlError::Validation(ValidationError::WrongMode { .. }))
        ));
        assert!(store.journal().is_empty());
    }

    #[tokio::test]
    async fn pointer_sample_is_published_on_timer() {
        let (env, store, mut driver) = logged_in().await;
        driver.handle(ControlEvent::SetMode(OperationMode::Mouse)).await;
        store.clear_journal();

        for i in 0u32..5 {
            driver.handle(ControlEvent::PointerMove { x: f64::from(i), y: 7.0 }).await;
        }
        assert!(driver.fire_due().await.is_empty());
        assert!(store.journal().is_empty());

        env.advance(Duration::from_millis(50));
        let fired = driver.fire_due().await;

        assert_eq!(
            fired,
            vec![Notice::Published { command: CommandKind::PointerMove, path: HidPath::MouseData }]
        );
        assert_eq!(store.peek("hid/mouseData/x"), Some(json!(4)));
        assert_eq!(store.peek("hid/mouseData/y"), Some(json!(7)));
    }

    #[tokio::test]
    async fn leaving_mouse_mode_drops_pending_sample() {
        let (env, store, mut driver) = logged_in().await;
        driver.handle(ControlEvent::SetMode(OperationMode::Mouse)).await;
        driver.handle(ControlEvent::PointerMove { x: 5.0, y: 5.0 }).await;
        driver.handle(ControlEvent::SetMode(OperationMode::Typing)).await;
        store.clear_journal();

        env.advance(Duration::from_millis(60));
        let fired = driver.fire_due().await;

        assert!(fired.is_empty(), "sample fired after leaving mouse mode: {fired:?}");
        assert!(store.writes_to("hid/mouseData").is_empty());
        assert_eq!(driver.next_deadline(), None);
    }

    #[tokio::test]
    async fn leaving_mouse_mode_still_releases_click() {
        let (env, store, mut driver) = logged_in().await;
        driver.handle(ControlEvent::SetMode(OperationMode::Mouse)).await;
        driver.handle(ControlEvent::Click(MouseButton::Left)).await;
        driver.handle(ControlEvent::PointerMove { x: 1.0, y: 2.0 }).await;
        driver.handle(ControlEvent::SetMode(OperationMode::Ducky)).await;

        env.advance(Duration::from_millis(100));
        let fired = driver.fire_due().await;

        assert_eq!(fired, vec![Notice::Published { command: CommandKind::Click, path: HidPath::MouseData }]);
        assert_eq!(store.peek("hid/mouseData/leftClick"), Some(json!(false)));
        assert_eq!(store.peek("hid/mouseData/x"), None);
    }

    #[tokio::test]
    async fn flush_releases_pending_click() {
        let (_env, store, mut driver) = logged_in().await;
        driver.handle(ControlEvent::SetMode(OperationMode::Mouse)).await;
        driver.handle(ControlEvent::Click(MouseButton::Left)).await;
        assert_eq!(store.peek("hid/mouseData/leftClick"), Some(json!(true)));

        let flushed = driver.flush().await;

        assert_eq!(flushed.len(), 1);
        assert_eq!(store.peek("hid/mouseData/leftClick"), Some(json!(false)));
        assert_eq!(driver.next_deadline(), None);
    }

    #[test]
    fn notice_display() {
        let notice = Notice::Published { command: CommandKind::Led, path: HidPath::LedColor };
        assert_eq!(notice.to_string(), "LED color sent to hid/ledColor");
    }
}
