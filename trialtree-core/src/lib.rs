//! trialtree Core - Schedule Data Types
//!
//! Pure data structures shared by the DSL compiler and its consumers.
//! This crate holds the event model, the arena tree the compiler builds,
//! the compiled schedule and the compile options. No parsing lives here.

pub mod config;
pub mod error;
pub mod event;
pub mod schedule;
pub mod tree;

pub use config::*;
pub use error::*;
pub use event::*;
pub use schedule::*;
pub use tree::*;
