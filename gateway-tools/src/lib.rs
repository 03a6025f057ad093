//! Tool registration, validation, and dispatch for the gateway.
//!
//! The modules exposed here describe tools as data: a named descriptor
//! carries an argument schema, a capability gate, and a handler. A static
//! catalog of descriptors is filtered once per session into an immutable
//! registry, so a tool the caller is not entitled to is never advertised at
//! all. Invocation validates arguments against the schema before the handler
//! runs.

#![warn(missing_docs, clippy::pedantic)]

pub mod content;
pub mod descriptor;
pub mod registry;
pub mod schema;
