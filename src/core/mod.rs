//! Core library components.
//!
//! The extraction engine, the destination API seam, and the spreader. Nothing
//! in here prints to the terminal.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod domain;
pub mod extract;
pub mod naming;
pub mod octopus;
pub mod publish;
pub mod source;
pub mod spread;
pub mod types;
