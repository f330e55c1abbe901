pub mod commands;
pub mod events;
pub mod http_helpers;
pub mod macros;
pub mod model;
pub mod presentation;
pub mod types;
pub mod update;

#[cfg(target_arch = "wasm32")]
pub mod wasm;


use crux_core::Command;

// Re-export core types
pub use crate::{
    commands::{
        navigation::{NavigationOperation, NavigationOutput},
        socket::{SocketOperation, SocketOutput},
        timer::{TimerOperation, TimerOutput},
    },
    events::{Event, RestartEvent, SocketEvent, UpgradeEvent},
    http_helpers::{build_url, BASE_URL, NO_CACHE_HEADERS},
    model::Model,
    presentation::{format_bytes, ViewModel},
    types::*,
    update::socket::UPGRADE_ENDPOINT,
};

#[crux_macros::effect(typegen)]
pub enum Effect {
    Render(crux_core::render::RenderOperation),
    Http(crux_http::protocol::HttpRequest),
    Socket(SocketOperation),
    Timer(TimerOperation),
    Navigation(NavigationOperation),
}

pub type HttpCmd = crux_http::command::Http<Effect, Event>;
pub type SocketCmd = crate::commands::socket::Socket<Effect, Event>;
pub type TimerCmd = crate::commands::timer::Timer<Effect, Event>;
pub type NavigationCmd = crate::commands::navigation::Navigation<Effect, Event>;

/// The Core application
#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Effect = Effect;

    fn update(&self, event: Self::Event, model: &mut Self::Model) -> Command<Effect, Event> {
        update::update(event, model)
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        presentation::view(model)
    }
}
