//! Scripting and assertion helpers for end-to-end tests: build
//! documents feature by feature, drive the real worker message path,
//! and assert on what it publishes.

pub mod assertions;
pub mod helpers;
pub mod script;

pub use assertions::*;
pub use helpers::*;
pub use script::ModelScript;
