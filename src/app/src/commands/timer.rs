//! Timer command definitions.
//!
//! Timers are identified by ids the Core allocates. `Elapsed` carries the
//! Shell's monotonic clock so the Core can measure durations without relying
//! on tick counting.

use crux_core::capability::Operation;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::RequestBuilder;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOperation {
    Start { id: u64, millis: u64 },
    Cancel { id: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimerOutput {
    Elapsed { id: u64, now_ms: u64 },
    Cancelled { id: u64 },
}

impl Operation for TimerOperation {
    type Output = TimerOutput;
}

/// Command-based timer API
pub struct Timer<Effect, Event> {
    _effect: PhantomData<Effect>,
    _event: PhantomData<Event>,
}

impl<Effect, Event> Timer<Effect, Event>
where
    Effect: Send + From<crux_core::Request<TimerOperation>> + 'static,
    Event: Send + 'static,
{
    /// Fire once after `millis`
    pub fn start(id: u64, millis: u64) -> RequestBuilder<TimerOperation, Effect, Event> {
        RequestBuilder::new(TimerOperation::Start { id, millis })
    }

    /// Cancel a pending timer; unknown ids are acknowledged as cancelled
    pub fn cancel(id: u64) -> RequestBuilder<TimerOperation, Effect, Event> {
        RequestBuilder::new(TimerOperation::Cancel { id })
    }
}
