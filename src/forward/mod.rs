//! Forwarding engine.
//!
//! # Data Flow
//! ```text
//! url query parameter
//!     → target.rs (percent-decode, restore `$`/`,` delimiters)
//!     → body.rs (buffer inbound body)
//!     → redirect.rs (hop loop, bounded)
//!         → client.rs (one upstream exchange per hop)
//!         → body.rs (buffer upstream body)
//!     → terminal ForwardResponse relayed by http::response
//! ```
//!
//! # Design Decisions
//! - Everything is call-local; no state shared between calls
//! - Bodies are buffered whole, never re-encoded
//! - Only the `host` header is dropped before dispatch

pub mod body;
pub mod client;
pub mod error;
pub mod redirect;
pub mod target;
pub mod types;

pub use body::BodyCollector;
pub use client::{ClientSettings, Dispatch, OutboundClient};
pub use error::{ProxyError, Stage};
pub use redirect::RedirectResolver;
pub use types::{ForwardRequest, ForwardResponse, TargetUrl};
