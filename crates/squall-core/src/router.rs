//! Route table
//!
//! Routes are organized by HTTP method for O(1) method dispatch, then
//! matched with a matchit radix trie. A method with no registered routes
//! matches nothing, so e.g. POST on a GET-only path is a plain 404.

use crate::{Error, Method, Result};
use std::collections::HashMap;

/// Route match result
#[derive(Debug, Clone)]
pub struct RouteMatch<T> {
    /// The matched handler/value
    pub value: T,
    /// Captured path parameters
    pub params: HashMap<String, String>,
}

/// HTTP router
pub struct Router<T> {
    methods: HashMap<Method, matchit::Router<T>>,
}

impl<T: Clone> Router<T> {
    /// Create a new router
    pub fn new() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Add a route
    pub fn route(&mut self, method: Method, path: &str, value: T) -> Result<()> {
        self.methods
            .entry(method)
            .or_insert_with(matchit::Router::new)
            .insert(path, value)
            .map_err(|e| Error::InvalidPath(e.to_string()))
    }

    /// Add a GET route
    pub fn get(&mut self, path: &str, value: T) -> Result<()> {
        self.route(Method::Get, path, value)
    }

    /// Match a request
    pub fn find(&self, method: Method, path: &str) -> Option<RouteMatch<T>> {
        let matched = self.methods.get(&method)?.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Some(RouteMatch {
            value: matched.value.clone(),
            params,
        })
    }
}

impl<T: Clone> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}
