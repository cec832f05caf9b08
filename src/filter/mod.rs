pub mod evaluator;
pub mod parser;

pub use evaluator::{filter_leads, FilterState};
pub use parser::parse_filter;
