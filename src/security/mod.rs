//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (admission: fixed window counter)
//!     → proxy handler
//! Outgoing response:
//!     → headers.rs (strip defaults, add CORS)
//! ```
//!
//! # Design Decisions
//! - Admission runs before the handler allocates any buffer or connection
//! - One limiter instance per process, injected rather than global
//! - Header policy covers every response, including rejections

pub mod headers;
pub mod rate_limit;
