//! Core types shared across objdiff facilities
//!
//! This crate provides the canonical field keys and event names used by
//! both the error facility and the logging facility of `objdiff-core`.

pub mod schema;
