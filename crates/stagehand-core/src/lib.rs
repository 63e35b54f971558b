pub mod advance;
pub mod checklist;
pub mod config;
pub mod error;
pub mod fs;
pub mod git;
pub mod io;
pub mod links;
pub mod lint;
pub mod paths;
pub mod phase_analysis;
pub mod plan;
pub mod rules;
pub mod templates;
pub mod transition;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::{Result, StagehandError};
