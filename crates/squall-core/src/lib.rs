//! squall-core: minimal HTTP server engine
//!
//! A single listener process built on tokio/hyper:
//! - Per-method route table over matchit
//! - Ordered middleware pipeline applied before dispatch
//! - One explicitly constructed [`App`] passed to the server, no globals

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

// Re-exports
pub use error::{Error, Result};
pub use request::{Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode};
pub use router::{RouteMatch, Router};

// Middleware re-exports
pub use middleware::{JsonBody, Middleware, Pipeline};

pub use server::{App, Handler, Server, ServerConfig};
