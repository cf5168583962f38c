//! JSON body parsing middleware
//!
//! Parses request bodies declared as `application/json` into a
//! `serde_json::Value` before route dispatch. Malformed JSON
//! short-circuits with 400; other content types pass through untouched.

use super::Middleware;
use crate::{Request, Response, ResponseBuilder, StatusCode};

/// JSON body parser
#[derive(Default)]
pub struct JsonBody;

impl JsonBody {
    pub fn new() -> Self {
        Self
    }
}

fn is_json(content_type: &str) -> bool {
    // Ignore parameters such as `; charset=utf-8`
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .eq_ignore_ascii_case("application/json")
}

impl Middleware for JsonBody {
    fn before(&self, req: &mut Request) -> Option<Response> {
        let declared_json = req.content_type().map(is_json).unwrap_or(false);
        if !declared_json || req.body.is_empty() {
            return None;
        }

        match serde_json::from_slice::<serde_json::Value>(&req.body) {
            Ok(value) => {
                req.json = Some(value);
                None
            }
            Err(err) => Some(
                ResponseBuilder::new(StatusCode::BAD_REQUEST)
                    .header("content-type", "application/json")
                    .body(format!(r#"{{"error":"invalid JSON body: {}"}}"#, err))
                    .build(),
            ),
        }
    }
}
