pub mod archive;
pub mod bumper;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod git;
pub mod index;
pub mod logging;
pub mod metadata;
pub mod report;
pub mod ui;
pub mod workspace;

pub use error::{ModuleBuilderError, Result};
