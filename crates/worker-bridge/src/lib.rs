pub mod debounce;
pub mod messages;
pub mod session;
pub mod stl;
#[cfg(target_arch = "wasm32")]
pub mod wasm_api;

pub use debounce::Debouncer;
pub use messages::{ControlMessage, ResultMessage};
pub use session::WorkerSession;
