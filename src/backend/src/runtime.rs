//! Native driver of the onboarding core.
//!
//! Effects are handled in the order the core emits them. Socket sends are
//! queued before the next effect is looked at, which keeps command ordering
//! intact. Everything asynchronous comes back through one channel and is
//! resolved on the runtime's task.

use crate::{
    config::AppConfig,
    device_client::DeviceClient,
    socket_client::{self, Session, SessionEvent, SessionMessage},
};
use anyhow::{Result, anyhow, bail};
use crux_core::{Core, Request};
use crux_http::protocol::{HttpRequest, HttpResult};
use log::{debug, info, warn};
use pitop_onboarding_core::{
    App, Effect, ErrorType, Event, NavigationOperation, NavigationOutput, SocketEvent,
    SocketOperation, SocketOutput, TimerOperation, TimerOutput, UpdateState, UpgradeEvent,
    ViewModel,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub ws_url: String,
    pub probe_timeout: Duration,
    pub auto_confirm: bool,
}

impl From<&AppConfig> for RuntimeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            ws_url: config.device.ws_url.clone(),
            probe_timeout: config.device.probe_timeout,
            auto_confirm: config.auto_confirm,
        }
    }
}

/// How the upgrade step ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    UpToDate,
    NotUpdated { state: UpdateState, error: ErrorType },
}

impl Outcome {
    pub fn from_view(view: &ViewModel) -> Self {
        if view.state == UpdateState::Finished {
            Outcome::UpToDate
        } else {
            Outcome::NotUpdated {
                state: view.state,
                error: view.error,
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::UpToDate => 0,
            Outcome::NotUpdated { .. } => 2,
        }
    }
}

/// What the page asked for when the runtime stopped
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Mount the page again with a fresh core
    Reload { path: String, search: String },
    /// Leave the upgrade step
    Done(Outcome),
}

impl Flow {
    fn reload(url: &str) -> Self {
        match url.split_once('?') {
            Some((path, query)) => Flow::Reload {
                path: path.to_string(),
                search: format!("?{query}"),
            },
            None => Flow::Reload {
                path: url.to_string(),
                search: String::new(),
            },
        }
    }
}

/// The action a user would take on `view`, for unattended runs
///
/// Declining the system upgrade and leaving on errors both skip the step.
pub fn headless_action(view: &ViewModel, auto_confirm: bool) -> Option<UpgradeEvent> {
    if view.can_continue {
        Some(UpgradeEvent::Continue)
    } else if view.can_start_upgrade {
        Some(if auto_confirm {
            UpgradeEvent::StartUpgrade
        } else {
            UpgradeEvent::Skip
        })
    } else if view.error.is_set() && view.can_skip {
        Some(UpgradeEvent::Skip)
    } else {
        None
    }
}

enum Resolution {
    Http(Request<HttpRequest>, HttpResult),
    Socket(Request<SocketOperation>, SocketOutput),
    TimerFired(u64),
    Event(Event),
}

struct PendingTimer {
    request: Request<TimerOperation>,
    task: JoinHandle<()>,
}

pub struct Runtime<C> {
    core: Core<App>,
    client: Arc<C>,
    config: RuntimeConfig,
    clock: Instant,

    tx: UnboundedSender<Resolution>,
    rx: UnboundedReceiver<Resolution>,
    session_tx: UnboundedSender<SessionMessage>,
    session_rx: UnboundedReceiver<SessionMessage>,

    session: Option<Session>,
    session_seq: u64,
    pending_connect: Option<Request<SocketOperation>>,
    timers: HashMap<u64, PendingTimer>,

    shown: Option<(UpdateState, ErrorType)>,
    flow: Option<Flow>,
}

impl<C> Runtime<C>
where
    C: DeviceClient + Send + Sync + 'static,
{
    pub fn new(client: Arc<C>, config: RuntimeConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (session_tx, session_rx) = mpsc::unbounded_channel();

        Self {
            core: Core::new(),
            client,
            config,
            clock: Instant::now(),
            tx,
            rx,
            session_tx,
            session_rx,
            session: None,
            session_seq: 0,
            pending_connect: None,
            timers: HashMap::new(),
            shown: None,
            flow: None,
        }
    }

    /// Mount the upgrade page at `path` and run it until it reloads or leaves
    pub async fn run(mut self, path: &str, search: &str) -> Result<Flow> {
        info!("mounting {path}{search}");
        let effects = self.core.process_event(Event::Upgrade(UpgradeEvent::Mount {
            page_url: path.to_string(),
            search: search.to_string(),
        }));
        self.process(effects)?;

        loop {
            if let Some(flow) = self.flow.take() {
                self.shutdown();
                return Ok(flow);
            }

            let effects = tokio::select! {
                Some(resolution) = self.rx.recv() => self.resolve(resolution)?,
                Some(message) = self.session_rx.recv() => self.handle_session(message)?,
                else => bail!("runtime channels closed"),
            };
            self.process(effects)?;
        }
    }

    fn process(&mut self, effects: Vec<Effect>) -> Result<()> {
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            queue.extend(self.handle_effect(effect)?);
        }
        Ok(())
    }

    fn handle_effect(&mut self, effect: Effect) -> Result<Vec<Effect>> {
        match effect {
            Effect::Render(_) => {
                self.render();
                Ok(Vec::new())
            }
            Effect::Http(request) => {
                let client = Arc::clone(&self.client);
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = client.execute(request.operation.clone()).await;
                    let _ = tx.send(Resolution::Http(request, result));
                });
                Ok(Vec::new())
            }
            Effect::Socket(request) => self.handle_socket(request),
            Effect::Timer(request) => self.handle_timer(request),
            Effect::Navigation(request) => self.handle_navigation(request),
        }
    }

    fn handle_socket(&mut self, mut request: Request<SocketOperation>) -> Result<Vec<Effect>> {
        let output = match request.operation.clone() {
            SocketOperation::Connect { path } => {
                self.session_seq += 1;
                let url = format!("{}{path}", self.config.ws_url);
                debug!("opening updater socket {} to {url}", self.session_seq);
                self.session = Some(Session::open(
                    self.session_seq,
                    url,
                    self.session_tx.clone(),
                ));
                if self.pending_connect.replace(request).is_some() {
                    debug!("superseded pending socket connect");
                }
                return Ok(Vec::new());
            }
            SocketOperation::Send { command } => match &self.session {
                Some(session) => match session.send(command) {
                    Ok(()) => SocketOutput::Sent,
                    Err(e) => SocketOutput::Failed {
                        reason: format!("{e:#}"),
                    },
                },
                None => SocketOutput::Failed {
                    reason: format!("cannot send {command}: not connected"),
                },
            },
            SocketOperation::Close => {
                self.session = None;
                self.pending_connect = None;
                SocketOutput::Closed
            }
            SocketOperation::Probe { path } => {
                let url = format!("{}{path}", self.config.ws_url);
                let timeout = self.config.probe_timeout;
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let output = match socket_client::probe(&url, timeout).await {
                        Ok(()) => SocketOutput::ProbeSucceeded,
                        Err(e) => SocketOutput::Failed {
                            reason: format!("{e:#}"),
                        },
                    };
                    let _ = tx.send(Resolution::Socket(request, output));
                });
                return Ok(Vec::new());
            }
        };

        self.resolve_request(&mut request, output, "socket")
    }

    fn handle_timer(&mut self, mut request: Request<TimerOperation>) -> Result<Vec<Effect>> {
        match request.operation.clone() {
            TimerOperation::Start { id, millis } => {
                let tx = self.tx.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                    let _ = tx.send(Resolution::TimerFired(id));
                });
                if let Some(previous) = self.timers.insert(id, PendingTimer { request, task }) {
                    warn!("timer {id} restarted while pending");
                    previous.task.abort();
                }
                Ok(Vec::new())
            }
            TimerOperation::Cancel { id } => {
                let mut effects = Vec::new();
                if let Some(mut pending) = self.timers.remove(&id) {
                    pending.task.abort();
                    effects = self.resolve_request(
                        &mut pending.request,
                        TimerOutput::Cancelled { id },
                        "timer",
                    )?;
                }
                effects.extend(self.resolve_request(
                    &mut request,
                    TimerOutput::Cancelled { id },
                    "timer",
                )?);
                Ok(effects)
            }
        }
    }

    fn handle_navigation(
        &mut self,
        mut request: Request<NavigationOperation>,
    ) -> Result<Vec<Effect>> {
        let flow = match &request.operation {
            NavigationOperation::Reload { url } => {
                info!("reloading {url}");
                Flow::reload(url)
            }
            NavigationOperation::NextPage => {
                let outcome = Outcome::from_view(&self.core.view());
                info!("leaving upgrade step: {outcome:?}");
                Flow::Done(outcome)
            }
        };
        self.flow = Some(flow);

        self.resolve_request(&mut request, NavigationOutput::Navigated, "navigation")
    }

    fn resolve(&mut self, resolution: Resolution) -> Result<Vec<Effect>> {
        match resolution {
            Resolution::Http(mut request, result) => {
                self.resolve_request(&mut request, result, "http")
            }
            Resolution::Socket(mut request, output) => {
                self.resolve_request(&mut request, output, "socket")
            }
            Resolution::TimerFired(id) => {
                let Some(mut pending) = self.timers.remove(&id) else {
                    debug!("timer {id} fired after cancel");
                    return Ok(Vec::new());
                };
                let now_ms = u64::try_from(self.clock.elapsed().as_millis()).unwrap_or(u64::MAX);
                self.resolve_request(
                    &mut pending.request,
                    TimerOutput::Elapsed { id, now_ms },
                    "timer",
                )
            }
            Resolution::Event(event) => Ok(self.core.process_event(event)),
        }
    }

    fn handle_session(&mut self, message: SessionMessage) -> Result<Vec<Effect>> {
        if self.session.as_ref().map(Session::id) != Some(message.session) {
            debug!("dropping {:?} of stale updater socket {}", message.event, message.session);
            return Ok(Vec::new());
        }

        let event = match message.event {
            SessionEvent::Opened => {
                return self.resolve_connect(SocketOutput::Connected);
            }
            SessionEvent::Failed(reason) => {
                self.session = None;
                return self.resolve_connect(SocketOutput::Failed { reason });
            }
            SessionEvent::Frame(frame) => SocketEvent::Message(frame),
            SessionEvent::Error(e) => SocketEvent::Error(e),
            SessionEvent::Closed => {
                self.session = None;
                SocketEvent::Closed
            }
        };

        Ok(self.core.process_event(Event::Socket(event)))
    }

    fn resolve_connect(&mut self, output: SocketOutput) -> Result<Vec<Effect>> {
        match self.pending_connect.take() {
            Some(mut request) => self.resolve_request(&mut request, output, "socket connect"),
            None => {
                debug!("no pending socket connect for {output:?}");
                Ok(Vec::new())
            }
        }
    }

    fn resolve_request<Op>(
        &self,
        request: &mut Request<Op>,
        output: Op::Output,
        what: &str,
    ) -> Result<Vec<Effect>>
    where
        Op: crux_core::capability::Operation,
    {
        self.core
            .resolve(request, output)
            .map_err(|e| anyhow!("failed to resolve {what} request: {e:?}"))
    }

    fn render(&mut self) {
        let view = self.core.view();
        let shown = (view.state, view.error);
        if self.shown == Some(shown) {
            debug!("{:.0}% {}", view.progress, view.last_message);
            return;
        }
        self.shown = Some(shown);

        info!("{}: {}", view.title, view.explanation);
        if view.should_burn || view.require_burn {
            info!(
                "a new major OS version {} is available",
                view.latest_os_version.as_deref().unwrap_or("(unknown)")
            );
        }

        if let Some(action) = headless_action(&view, self.config.auto_confirm) {
            info!("answering {:?} with {action:?}", view.state);
            let _ = self.tx.send(Resolution::Event(Event::Upgrade(action)));
        }
    }

    fn shutdown(&mut self) {
        self.session = None;
        for (_, pending) in self.timers.drain() {
            pending.task.abort();
        }
    }
}
