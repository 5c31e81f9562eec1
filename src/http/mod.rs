//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, proxy handler)
//!     → request.rs (target parameter, inbound body → ForwardRequest)
//!     → forward engine (redirect resolver, outbound client)
//!     → response.rs (relay terminal response or render failure)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use server::HttpServer;
