pub mod boolean;
pub mod extrude;
pub mod revolve;
pub mod types;

pub use boolean::execute_boolean;
pub use extrude::execute_extrude;
pub use revolve::execute_revolve;
pub use types::{OpError, OpOutput};
