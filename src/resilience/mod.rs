//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound body / upstream response head / upstream body:
//!     → timeouts.rs (deadline per suspension point)
//!     → elapsed deadline becomes ProxyError::Timeout
//! ```
//!
//! # Design Decisions
//! - Every wait on a peer has a deadline
//! - No retries: a failed hop fails the whole call
//! - Redirect depth is bounded in forward::redirect

pub mod timeouts;
