//! WASM bindings for the bounded tier
//!
//! Runs small analyses inline in the browser, without a round trip to the
//! rating service. Larger requests come back as a plan-limit failure and
//! should be submitted to the service instead.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::api::{run_bounded, AnalysisRequest, AnalysisResult};
use crate::catalog::Catalog;
use crate::control::AnalysisContext;
use crate::error::BridgeError;

// Use wee_alloc for smaller WASM binary
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[derive(Serialize)]
struct BoundedResponse {
    #[serde(flatten)]
    result: AnalysisResult,
    ms_elapsed: u64,
}

/// Analyze a girder in the bounded tier.
///
/// Takes an `AnalysisRequest` as JSON and returns the `AnalysisResult` as
/// JSON, with the detailed payload inline. Designed to be called from a Web
/// Worker.
#[wasm_bindgen]
pub fn analyze_bounded(request_json: &str) -> String {
    let start = js_sys::Date::now();
    let catalog = Catalog::standard();
    let ctx = AnalysisContext::detached();

    let result = match AnalysisRequest::from_json(request_json) {
        Ok(request) => run_bounded(&request, &catalog, &ctx),
        Err(err) => parse_failure(&err),
    };

    let response = BoundedResponse {
        result,
        ms_elapsed: (js_sys::Date::now() - start) as u64,
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(r#"{{"status":"failed","error":{{"kind":"invalid_input","message":"Serialization failed: {e}"}}}}"#)
    })
}

fn parse_failure(err: &BridgeError) -> AnalysisResult {
    web_sys::console::warn_1(&JsValue::from_str(&format!("Failed to parse request: {err}")));
    let mut result = AnalysisResult::pending();
    result.status = crate::api::AnalysisStatus::Failed;
    result.error = Some(err.into());
    result
}

/// Vehicle catalog as JSON
#[wasm_bindgen]
pub fn vehicles() -> String {
    let catalog = Catalog::standard();
    let list: Vec<_> = catalog.vehicles.values().collect();
    serde_json::to_string(&list).unwrap_or_else(|_| "[]".to_string())
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
