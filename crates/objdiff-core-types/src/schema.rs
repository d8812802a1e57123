//! Canonical schema constants for structured logging and events
//!
//! These constants keep the diff and policy engine's log output consistent
//! with the error codes it reports.

// Field keys every lifecycle event carries
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
