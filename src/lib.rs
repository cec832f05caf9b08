//! Leadboard - Sales pipeline board with optimistic stage transitions
//!
//! This library provides the core functionality for Leadboard, including:
//! - Stage registry and lead data models
//! - Filter parsing and evaluation
//! - Per-stage aggregation and pipeline totals
//! - The pipeline store, drag gesture controller and optimistic transition coordinator
//! - Quick actions (view, edit, call, email, message)
//! - SQLite-backed lead service and project directory
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use leadboard::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod repo;
pub mod utils;
