//! Testdeck — local registry of project directories, their test frameworks,
//! test files, ports and settings.

pub mod api;
pub mod backup;
pub mod config;
pub mod detect;
pub mod error;
pub mod paths;
pub mod registry;
pub mod remote;
pub mod scan;
pub mod store;
