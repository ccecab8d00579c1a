use serde::Deserialize;

use crate::model::AnalysisModel;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Sidecar state. Analyses run to completion per request; only the most
/// recent result is retained, for report rendering by the host application.
#[derive(Default)]
pub struct AppState {
    pub last_analysis: Option<AnalysisModel>,
}
