//! Library half of the `quizmesh` binary, shared with the integration tests.

pub mod commands;
