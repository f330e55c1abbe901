//! Navigation command definitions (page reload and wizard progression).

use crux_core::capability::Operation;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::RequestBuilder;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NavigationOperation {
    /// Full reload of the given page URL
    Reload { url: String },
    /// Leave the upgrade step for the next wizard page
    NextPage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NavigationOutput {
    Navigated,
}

impl Operation for NavigationOperation {
    type Output = NavigationOutput;
}

pub struct Navigation<Effect, Event> {
    _effect: PhantomData<Effect>,
    _event: PhantomData<Event>,
}

impl<Effect, Event> Navigation<Effect, Event>
where
    Effect: Send + From<crux_core::Request<NavigationOperation>> + 'static,
    Event: Send + 'static,
{
    pub fn reload(url: impl Into<String>) -> RequestBuilder<NavigationOperation, Effect, Event> {
        RequestBuilder::new(NavigationOperation::Reload { url: url.into() })
    }

    pub fn next_page() -> RequestBuilder<NavigationOperation, Effect, Event> {
        RequestBuilder::new(NavigationOperation::NextPage)
    }
}
