pub mod problem;
pub mod store;

pub use problem::*;
pub use store::*;
