pub mod analytic;
pub mod mesh;
pub mod traits;
pub mod truck_kernel;
pub mod truck_mesh;
pub mod types;

pub use analytic::AnalyticKernel;
pub use traits::*;
pub use truck_kernel::TruckKernel;
pub use types::*;
