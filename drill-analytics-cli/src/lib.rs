// Library exports for the drill analytics CLI
// This allows testing of internal modules

pub mod api;
pub mod commands;
pub mod config;
pub mod replay;
pub mod report;
