//! Parser module for the schedule DSL

pub mod cst;
pub mod cursor;
pub mod parser;

pub use cst::*;
pub use parser::*;
