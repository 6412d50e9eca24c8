use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

use neurobot_types::ClientConfig;

mod dom;
pub mod http;
mod markdown;
pub mod storage;
pub mod theme;
mod utils;
mod view;

pub use http::HttpTransport;
pub use storage::LocalStorage;
pub use theme::Theme;

/// Initialize the WASM application
/// This sets up panic hooks and logging
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    wasm_logger::init(wasm_logger::Config::default());

    log::info!("Neurobot WASM initialized");
}

/// Mount the chat client with the default configuration
#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
    view::NeurobotApp::new(ClientConfig::default())?.start()
}

/// Mount the chat client with a JSON object overriding parts of the configuration
#[wasm_bindgen]
pub fn start_with_config(config_json: &str) -> Result<(), JsValue> {
    let config = ClientConfig::from_json(config_json)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    log::info!("Using backend at {}", config.base_url);
    view::NeurobotApp::new(config)?.start()
}

/// Get the window object
fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("No window object"))
}

/// Get the document object
fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("No document object"))
}
