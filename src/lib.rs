pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod install;
pub mod model;
pub mod runtime;
pub mod store;
pub mod version;
