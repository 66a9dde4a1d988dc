#![forbid(unsafe_code)]
//! Minimal ustar archive engine.
//!
//! [`tar::Archiver`] creates, appends to, updates (append-if-absent), lists
//! and extracts archives of regular files. Every archive is a sequence of
//! 512-byte header blocks, each followed by its zero-padded content, closed
//! by two all-zero blocks.

pub mod tar;
