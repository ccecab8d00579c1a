use std::path::PathBuf;

use serde_json::json;

use crate::grade::ClassificationPolicy;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{self, AnalysisModel};
use crate::sheet;

fn required_path(req: &Request) -> Result<PathBuf, serde_json::Value> {
    req.params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| err(&req.id, "bad_params", "missing params.path", None))
}

fn parse_policy(req: &Request) -> Result<ClassificationPolicy, serde_json::Value> {
    match req.params.get("policy") {
        None => Ok(ClassificationPolicy::TableA),
        Some(v) if v.is_null() => Ok(ClassificationPolicy::TableA),
        Some(v) => serde_json::from_value(v.clone()).map_err(|_| {
            err(
                &req.id,
                "bad_params",
                "policy must be one of: tableA, tableB",
                Some(json!({ "policy": v.clone() })),
            )
        }),
    }
}

fn store_and_reply(
    state: &mut AppState,
    req: &Request,
    analysis: anyhow::Result<AnalysisModel>,
) -> serde_json::Value {
    match analysis {
        Ok(model) => {
            let result = match serde_json::to_value(&model) {
                Ok(v) => v,
                Err(e) => return err(&req.id, "serialize_failed", e.to_string(), None),
            };
            state.last_analysis = Some(model);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "no_valid_records", e.to_string(), None),
    }
}

fn handle_analyze_flexible(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_path(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let policy = match parse_policy(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let table = match sheet::load_table(&path) {
        Ok(t) => t,
        Err(e) => return err(&req.id, "malformed_input", format!("{e:#}"), None),
    };
    store_and_reply(state, req, model::analyze_flexible(&table, policy))
}

fn handle_analyze_semester(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_path(req) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    let grid = match sheet::load_grid(&path) {
        Ok(g) => g,
        Err(e) => return err(&req.id, "malformed_input", format!("{e:#}"), None),
    };
    store_and_reply(state, req, model::analyze_semester(&grid))
}

fn handle_report_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(model) = state.last_analysis.as_ref() else {
        return err(&req.id, "no_analysis", "analyze a file first", None);
    };
    match serde_json::to_value(model) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "serialize_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analyze.flexible" => Some(handle_analyze_flexible(state, req)),
        "analyze.semester" => Some(handle_analyze_semester(state, req)),
        "report.model" => Some(handle_report_model(state, req)),
        _ => None,
    }
}
