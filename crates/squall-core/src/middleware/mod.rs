//! Middleware pipeline
//!
//! An ordered list of request-transforming stages applied before route
//! dispatch. A stage may short-circuit with an error response, in which
//! case the handler never runs.

pub mod json;

pub use json::JsonBody;

use crate::{Request, Response};

/// Middleware trait - process request/response
pub trait Middleware: Send + Sync {
    /// Process request before handler; return `Some` to short-circuit
    fn before(&self, req: &mut Request) -> Option<Response>;

    /// Process response after handler
    fn after(&self, _req: &Request, _res: &mut Response) {}
}

/// Ordered middleware pipeline
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn push<M: Middleware + 'static>(&mut self, stage: M) {
        self.stages.push(Box::new(stage));
    }

    /// Run before stages in order, return early response if any
    pub fn run_before(&self, req: &mut Request) -> Option<Response> {
        for stage in &self.stages {
            if let Some(res) = stage.before(req) {
                return Some(res);
            }
        }
        None
    }

    /// Run after stages in reverse order
    pub fn run_after(&self, req: &Request, res: &mut Response) {
        for stage in self.stages.iter().rev() {
            stage.after(req, res);
        }
    }
}
