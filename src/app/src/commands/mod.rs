//! Custom shell operations.
//!
//! Each submodule defines the operation/output pair the Shell implements and a
//! command-based API producing requests for it.

pub mod navigation;
pub mod socket;
pub mod timer;

use crux_core::{capability::Operation, command, Command};
use std::marker::PhantomData;

/// Request builder shared by the custom operations
#[must_use]
pub struct RequestBuilder<Op, Effect, Event> {
    operation: Op,
    _effect: PhantomData<Effect>,
    _event: PhantomData<fn() -> Event>,
}

impl<Op, Effect, Event> RequestBuilder<Op, Effect, Event>
where
    Op: Operation,
    Effect: Send + From<crux_core::Request<Op>> + 'static,
    Event: Send + 'static,
{
    pub(crate) fn new(operation: Op) -> Self {
        Self {
            operation,
            _effect: PhantomData,
            _event: PhantomData,
        }
    }

    /// Build the request into a Command RequestBuilder
    pub fn build(
        self,
    ) -> command::RequestBuilder<Effect, Event, impl std::future::Future<Output = Op::Output>> {
        command::RequestBuilder::new(move |ctx| async move {
            Command::request_from_shell(self.operation)
                .into_future(ctx)
                .await
        })
    }
}
