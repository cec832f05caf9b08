pub mod lead;
pub mod project;
pub mod service;

pub use lead::*;
pub use project::*;
pub use service::*;
