//! WASM entry points for the web worker.
//!
//! Compiled only for wasm32. JavaScript feeds JSON-serialized control
//! messages in and polls JSON result messages out; the clock tick comes
//! from the worker's own scheduler.

use wasm_bindgen::prelude::*;

use doc_store::SiteId;

use crate::messages::ControlMessage;
use crate::session::WorkerSession;

// Single-threaded inside the worker.
thread_local! {
    static SESSION: std::cell::RefCell<Option<WorkerSession>> = const { std::cell::RefCell::new(None) };
}

/// Initialize the worker session. Must be called once before anything
/// else; the site id must be unique among this document's replicas.
#[wasm_bindgen]
pub fn init(site: u64) {
    console_error_panic_hook::set_once();
    SESSION.with(|cell| {
        *cell.borrow_mut() = Some(WorkerSession::new(SiteId(site)));
    });
}

/// Feed one JSON control message.
#[wasm_bindgen]
pub fn post_message(json_input: &str, now_ms: f64) -> Result<(), JsValue> {
    let msg: ControlMessage = serde_json::from_str(json_input)
        .map_err(|e| JsValue::from_str(&format!("failed to parse message: {e}")))?;
    SESSION.with(|cell| {
        let mut session = cell.borrow_mut();
        let session = session
            .as_mut()
            .ok_or_else(|| JsValue::from_str("session not initialized; call init() first"))?;
        session.handle(msg, now_ms as u64);
        Ok(())
    })
}

/// Advance the debounce clock; runs a rebuild when one is due.
#[wasm_bindgen]
pub fn tick(now_ms: f64) {
    SESSION.with(|cell| {
        if let Some(session) = cell.borrow_mut().as_mut() {
            session.tick(now_ms as u64);
        }
    });
}

/// Drain pending result messages as a JSON array.
#[wasm_bindgen]
pub fn drain_messages() -> String {
    SESSION.with(|cell| {
        let mut session = cell.borrow_mut();
        match session.as_mut() {
            Some(session) => serde_json::to_string(&session.drain())
                .unwrap_or_else(|e| format!(r#"[{{"type":"error","message":"{e}"}}]"#)),
            None => "[]".to_string(),
        }
    })
}
