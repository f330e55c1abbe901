//! Browser bindings of the core.
//!
//! The web shell sends `Mount`/`Unmount` and user actions, pushes updater
//! socket notifications and resolves the Http, Socket, Timer and Navigation
//! effects. Everything crosses the boundary bincode-serialized by the bridge.

use lazy_static::lazy_static;
use wasm_bindgen::{prelude::wasm_bindgen, JsError};

use crux_core::{
    bridge::{Bridge, EffectId},
    Core,
};

use crate::App;

lazy_static! {
    static ref CORE: Bridge<App> = Bridge::new(Core::new());
}

#[wasm_bindgen(start)]
pub fn init_wasm() {
    // fails only when a logger is already installed
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Serialized effects requested in reaction to the serialized event
#[wasm_bindgen]
pub fn process_event(event: &[u8]) -> Result<Vec<u8>, JsError> {
    let mut effects = Vec::new();
    CORE.update(event, &mut effects)
        .map_err(|e| JsError::new(&format!("failed to process event: {e}")))?;
    Ok(effects)
}

#[wasm_bindgen]
pub fn view() -> Result<Vec<u8>, JsError> {
    let mut view = Vec::new();
    CORE.view(&mut view)
        .map_err(|e| JsError::new(&format!("failed to serialize view: {e}")))?;
    Ok(view)
}

/// Resolve effect `id` with its serialized output
#[wasm_bindgen]
pub fn handle_response(id: u32, output: &[u8]) -> Result<Vec<u8>, JsError> {
    let mut effects = Vec::new();
    CORE.resolve(EffectId(id), output, &mut effects)
        .map_err(|e| JsError::new(&format!("failed to resolve effect {id}: {e}")))?;
    Ok(effects)
}
