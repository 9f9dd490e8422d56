//! Tollgate Core - shared vocabulary for the approval gate and prompt bridge.
//!
//! This crate intentionally holds only plain data types:
//!
//! - [`ToolCall`]: a named, argument-bearing request for a side-effecting action
//! - [`RiskClass`]: coarse severity label attached to a call for triage
//! - [`Timestamp`]: UTC timestamp wrapper used by requests and bridge documents

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod call;
pub mod types;

pub use call::ToolCall;
pub use types::{RiskClass, Timestamp};
