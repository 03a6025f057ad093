//! Session initialization for the capability-gated tool gateway.
//!
//! This crate wires the pieces together: it parses the process-wide
//! allow-list, evaluates each catalog gate exactly once against the
//! authenticated principal, and hands back an immutable per-session
//! registry. It also ships the built-in tool set recovered behind the
//! OAuth boundary: arithmetic, a GitHub user lookup, and a gated
//! image-generation call.

#![warn(missing_docs, clippy::pedantic)]

pub mod builtin;
mod init;

pub use init::SessionInitializer;
