//! Updater socket sessions over tokio-tungstenite.
//!
//! A session connects in the background and reports everything that happens
//! to it as a [`SessionMessage`] tagged with its id, so messages of replaced
//! sessions can be told apart. Commands are queued synchronously and written
//! in order once the connection is up.

use anyhow::{Context, Result, anyhow};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use pitop_onboarding_core::UpdaterCommand;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened,
    /// The connection could not be established
    Failed(String),
    Frame(String),
    Error(String),
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMessage {
    pub session: u64,
    pub event: SessionEvent,
}

/// One connection to the updater socket
///
/// Dropping the session closes the connection gracefully.
pub struct Session {
    id: u64,
    commands: UnboundedSender<UpdaterCommand>,
}

impl Session {
    pub fn open(id: u64, url: String, events: UnboundedSender<SessionMessage>) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_session(id, url, rx, events));

        Self { id, commands }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Queue `command`; fails once the connection is gone
    pub fn send(&self, command: UpdaterCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("updater socket {} is closed", self.id))
    }
}

async fn run_session(
    id: u64,
    url: String,
    mut commands: UnboundedReceiver<UpdaterCommand>,
    events: UnboundedSender<SessionMessage>,
) {
    let emit = |event| {
        // the receiver is gone once the runtime finished
        let _ = events.send(SessionMessage { session: id, event });
    };

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            debug!("updater socket {id}: failed to connect to {url}: {e}");
            emit(SessionEvent::Failed(format!("failed to connect to {url}: {e}")));
            return;
        }
    };
    info!("updater socket {id} connected to {url}");
    emit(SessionEvent::Opened);

    let (mut sink, mut stream) = stream.split();
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => {
                    debug!("updater socket {id} -> {command}");
                    if let Err(e) = sink.send(Message::Text(command.as_str().to_string())).await {
                        warn!("updater socket {id}: failed to send {command}: {e}");
                        emit(SessionEvent::Error(e.to_string()));
                        break;
                    }
                }
                None => {
                    debug!("updater socket {id} closing");
                    if let Err(e) = sink.close().await {
                        debug!("updater socket {id}: close failed: {e}");
                    }
                    break;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => emit(SessionEvent::Frame(text)),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("updater socket {id}: {e}");
                    emit(SessionEvent::Error(e.to_string()));
                    break;
                }
            },
        }
    }

    info!("updater socket {id} closed");
    emit(SessionEvent::Closed);
}

/// Open and immediately close a throwaway connection to `url`
pub async fn probe(url: &str, timeout: Duration) -> Result<()> {
    let (mut stream, _response) = tokio::time::timeout(timeout, connect_async(url))
        .await
        .context("socket probe timed out")?
        .context("socket probe failed")?;

    if let Err(e) = stream.close(None).await {
        debug!("closing socket probe failed: {e}");
    }

    Ok(())
}
