//! Updater socket command definitions.
//!
//! The Shell owns the actual WebSocket. After a successful `Connect` it pushes
//! inbound frames, errors and the close as `SocketEvent`s on its own.

use crux_core::capability::Operation;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::RequestBuilder;
use crate::types::UpdaterCommand;

// Operations that the Shell needs to perform on the updater socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SocketOperation {
    /// Open the session socket to `<wsBase><path>`, replacing any previous one
    Connect { path: String },
    Send { command: UpdaterCommand },
    Close,
    /// Open and immediately close a throwaway connection to `<wsBase><path>`
    Probe { path: String },
}

// The output from socket operations (shell tells us what happened)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SocketOutput {
    Connected,
    Sent,
    Closed,
    ProbeSucceeded,
    Failed { reason: String },
}

impl Operation for SocketOperation {
    type Output = SocketOutput;
}

/// Command-based updater socket API
pub struct Socket<Effect, Event> {
    _effect: PhantomData<Effect>,
    _event: PhantomData<Event>,
}

impl<Effect, Event> Socket<Effect, Event>
where
    Effect: Send + From<crux_core::Request<SocketOperation>> + 'static,
    Event: Send + 'static,
{
    pub fn connect(path: impl Into<String>) -> RequestBuilder<SocketOperation, Effect, Event> {
        RequestBuilder::new(SocketOperation::Connect { path: path.into() })
    }

    pub fn send(command: UpdaterCommand) -> RequestBuilder<SocketOperation, Effect, Event> {
        RequestBuilder::new(SocketOperation::Send { command })
    }

    pub fn close() -> RequestBuilder<SocketOperation, Effect, Event> {
        RequestBuilder::new(SocketOperation::Close)
    }

    pub fn probe(path: impl Into<String>) -> RequestBuilder<SocketOperation, Effect, Event> {
        RequestBuilder::new(SocketOperation::Probe { path: path.into() })
    }
}
