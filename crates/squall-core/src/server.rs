//! hyper-based HTTP listener
//!
//! Single listener process: an explicitly constructed [`App`] (route table
//! plus middleware pipeline) served over HTTP/1.1, one tokio task per
//! connection. Requests are independent and stateless, so the app is shared
//! immutably behind an `Arc` with no locking.

use crate::middleware::{Middleware, Pipeline};
use crate::{Method, Request, Response, Result, Router};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use std::future::Future;
use std::net::{SocketAddr, ToSocketAddrs};
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub hostname: String,
}

impl ServerConfig {
    /// Configuration listening on all interfaces
    pub fn new(port: u16) -> Self {
        Self {
            port,
            hostname: "0.0.0.0".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(3000)
    }
}

/// Route handler type
pub type Handler = Arc<
    dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync,
>;

/// The application: routes and middleware, built once before serving
#[derive(Default)]
pub struct App {
    router: Router<Handler>,
    pipeline: Pipeline,
}

impl App {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            pipeline: Pipeline::new(),
        }
    }

    /// Append a middleware stage; stages run in registration order
    pub fn stage<M: Middleware + 'static>(&mut self, stage: M) {
        self.pipeline.push(stage);
    }

    /// Register a route
    pub fn route<F, Fut>(&mut self, method: Method, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |req| {
            Box::pin(handler(req)) as Pin<Box<dyn Future<Output = Response> + Send>>
        });
        self.router.route(method, path, handler)
    }

    /// Register a GET route
    pub fn get<F, Fut>(&mut self, path: &str, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::Get, path, handler)
    }

    /// Run a request through the pipeline and route dispatch
    pub async fn handle(&self, mut req: Request) -> Response {
        let mut res = match self.pipeline.run_before(&mut req) {
            Some(res) => res,
            None => match self.router.find(req.method, &req.path) {
                Some(matched) => {
                    req.params = matched.params;
                    (matched.value)(req.clone()).await
                }
                None => Response::not_found(),
            },
        };
        self.pipeline.run_after(&req, &mut res);
        res
    }
}

/// Create the listening socket
///
/// SO_REUSEADDR only: a second bind on an actively bound port must fail.
fn bind_socket(addr: &SocketAddr) -> std::io::Result<Socket> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&(*addr).into())?;
    socket.listen(1024)?;

    Ok(socket)
}

/// A bound listener ready to serve an [`App`]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    app: Arc<App>,
}

impl Server {
    /// Bind the configured address. Must be called within a tokio runtime.
    ///
    /// Bind failure (port in use, permission denied) is fatal and surfaces
    /// as [`crate::Error::Io`]; no listener is established.
    pub fn bind(config: &ServerConfig, app: App) -> Result<Self> {
        let addr = (config.hostname.as_str(), config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("hostname resolved to no address: {}", config.hostname),
                )
            })?;

        let socket = bind_socket(&addr)?;
        let listener = TcpListener::from_std(socket.into())?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            app: Arc::new(app),
        })
    }

    /// The bound address (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until the process exits
    pub async fn serve(self) -> Result<()> {
        info!(
            "Server is running on http://localhost:{}",
            self.local_addr.port()
        );

        loop {
            let (stream, peer) = self.listener.accept().await?;
            stream.set_nodelay(true).ok();

            let app = Arc::clone(&self.app);
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let app = Arc::clone(&app);
                    async move {
                        Ok::<_, std::convert::Infallible>(dispatch(app, req).await)
                    }
                });

                if let Err(err) = hyper::server::conn::http1::Builder::new()
                    .serve_connection(io, service)
                    .await
                {
                    // Client disconnects and protocol errors end the
                    // connection, never the accept loop.
                    debug!("connection error from {peer}: {err}");
                }
            });
        }
    }
}

/// Translate one hyper request into an app response
async fn dispatch(app: Arc<App>, req: hyper::Request<Incoming>) -> hyper::Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            debug!("failed to read request body: {err}");
            return to_hyper_response(Response::bad_request("failed to read request body"));
        }
    };

    let request = match from_hyper_parts(parts, body) {
        Ok(request) => request,
        // Methods outside the route table's vocabulary can never match
        Err(_) => return to_hyper_response(Response::not_found()),
    };

    to_hyper_response(app.handle(request).await)
}

/// Convert hyper request parts to our Request type
pub fn from_hyper_parts(parts: hyper::http::request::Parts, body: Bytes) -> Result<Request> {
    let method = Method::from_str(parts.method.as_str())?;

    let mut request = Request::new(method, parts.uri.path());
    request.query = parts.uri.query().map(|s| s.to_string());
    request.body = body;

    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            request.headers.push((name.to_string(), v.to_string()));
        }
    }

    Ok(request)
}

/// Convert our Response to hyper Response
pub fn to_hyper_response(res: Response) -> hyper::Response<Full<Bytes>> {
    let mut builder = hyper::Response::builder().status(res.status.as_u16());

    for (name, value) in &res.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder.body(Full::new(res.body)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::JsonBody;
    use crate::{RequestBuilder, StatusCode};

    fn test_app() -> App {
        let mut app = App::new();
        app.stage(JsonBody::new());
        app.get("/", |_req| async { Response::text("hello") }).unwrap();
        app
    }

    #[tokio::test]
    async fn test_handle_matched_route() {
        let app = test_app();
        let req = RequestBuilder::new(Method::Get, "/").build();
        let res = app.handle(req).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body_string().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_handle_unmatched_is_404() {
        let app = test_app();

        let req = RequestBuilder::new(Method::Get, "/missing").build();
        assert_eq!(app.handle(req).await.status, StatusCode::NOT_FOUND);

        let req = RequestBuilder::new(Method::Post, "/").build();
        assert_eq!(app.handle(req).await.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_handle_malformed_json_short_circuits() {
        let app = test_app();
        let req = RequestBuilder::new(Method::Post, "/")
            .header("content-type", "application/json")
            .body("{not json".to_string())
            .build();
        assert_eq!(app.handle(req).await.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_handle_valid_json_still_dispatches() {
        let app = test_app();
        let req = RequestBuilder::new(Method::Get, "/")
            .header("content-type", "application/json")
            .body(r#"{"ignored":true}"#.to_string())
            .build();
        let res = app.handle(req).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body_string().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_bind_conflict_fails() {
        let first = Server::bind(&ServerConfig::new(0), App::new()).unwrap();
        let port = first.local_addr().port();

        let second = Server::bind(&ServerConfig::new(port), App::new());
        assert!(matches!(second, Err(crate::Error::Io(_))));
    }
}
