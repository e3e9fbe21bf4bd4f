//! Persistent storage infrastructure for the host application.
//!
//! - **`config`** – Reads and writes the TOML configuration file.

pub mod config;
