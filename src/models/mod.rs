// Core data models for Leadboard
// These structs represent the domain entities

pub mod lead;
pub mod project;
pub mod stage;

pub use lead::*;
pub use project::*;
pub use stage::*;
