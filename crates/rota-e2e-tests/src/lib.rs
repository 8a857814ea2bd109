//! End-to-end tests for the rota rotation protocol.
//!
//! The tests live under `tests/` and drive the four rotation steps through
//! the dispatcher against the in-memory secret store and the bundled
//! service client plugins.

#![cfg(test)]
