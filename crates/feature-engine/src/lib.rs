pub mod context;
pub mod interpret;
pub mod planes;
pub mod rebuild;
pub mod refs;
pub mod sketch;
pub mod types;

pub use rebuild::{PreviewSpec, RebuildEngine};
pub use refs::{RefIndex, RefTarget};
pub use types::{BodyEntry, InterpretError, RebuildOutput, SketchSolution};
