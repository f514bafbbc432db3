#![allow(clippy::shadow_reuse, reason = "Shadowing for Arc clones is idiomatic")]
#![allow(clippy::cognitive_complexity, reason = "Complex async handlers are inherent")]
#![allow(clippy::single_call_fn, reason = "HTTP handlers are called once from router")]

pub mod audit;
pub mod auth;
pub mod feedback;
pub mod governance;
pub mod health;
pub mod triage;
pub mod webhook;
