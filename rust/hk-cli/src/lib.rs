//! Shared CLI plumbing for the `hk` binary: ANSI color helpers and the
//! error-chain formatter used for I/O failures that sit outside `HkError`
//! (missing files, unreadable paths).

pub mod colors;
pub mod error_chain;
pub mod repl;
