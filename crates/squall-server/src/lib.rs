//! Greeting HTTP server
//!
//! One parameterized component: each deployment is an [`Instance`] value
//! (port plus fixed greeting) driving the same app assembly and run path.
//! The two shipped binaries differ only in the `Instance` they construct.

use squall_core::{App, JsonBody, Response, Server, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use squall_core::{Error, Result};

/// A deployable server instance
#[derive(Debug, Clone, Copy)]
pub struct Instance {
    /// TCP port to bind
    pub port: u16,
    /// Fixed body returned by `GET /`
    pub message: &'static str,
}

/// Assemble the app: JSON body parsing, then the single greeting route
pub fn build_app(message: &'static str) -> Result<App> {
    let mut app = App::new();
    app.stage(JsonBody::new());
    app.get("/", move |_req| async move { Response::text(message) })?;
    Ok(app)
}

/// Bind and serve one instance; returns only on a fatal listener error
pub async fn run(instance: Instance) -> Result<()> {
    let app = build_app(instance.message)?;
    let server = Server::bind(&ServerConfig::new(instance.port), app)?;
    server.serve().await
}

/// Initialize the process-wide tracing subscriber
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();
}
