// Frameworks layer: process bootstrap and environment configuration.

pub mod cli;
pub mod config;
