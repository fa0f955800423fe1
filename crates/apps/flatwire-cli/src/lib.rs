//! Encode envelope buffers from TOML descriptions and inspect existing ones.

pub mod commands;
pub mod config;
pub mod input;
pub mod inspect;
pub mod output;
