//! Shared stage-execution scaffolding (§4.12): every pipeline stage reports
//! through the same shape so timing and outcome show up uniformly in
//! structured logs without per-stage instrumentation boilerplate.

use std::time::Instant;

use serde::Serialize;

use rexlit_common::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub name: String,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

/// Run `body` as one named pipeline stage: wraps it in a tracing span,
/// times it, and converts its result into a [`StageOutcome`]. The error (if
/// any) is re-raised to the caller after the outcome is recorded, so stage
/// failures still abort the pipeline (§4.12: "re-raises").
pub fn stage<T>(
    name: &str,
    body: impl FnOnce() -> Result<(T, serde_json::Map<String, serde_json::Value>)>,
) -> (Result<T>, StageOutcome) {
    let span = tracing::info_span!("pipeline_stage", stage = name);
    let _guard = span.enter();
    let started = Instant::now();

    match body() {
        Ok((value, metrics)) => {
            let outcome = StageOutcome {
                name: name.to_string(),
                status: StageStatus::Completed,
                detail: None,
                duration_seconds: started.elapsed().as_secs_f64(),
                metrics,
            };
            tracing::info!(stage = name, duration_seconds = outcome.duration_seconds, "stage completed");
            (Ok(value), outcome)
        }
        Err(e) => {
            let outcome = StageOutcome {
                name: name.to_string(),
                status: StageStatus::Failed,
                detail: Some(e.to_string()),
                duration_seconds: started.elapsed().as_secs_f64(),
                metrics: serde_json::Map::new(),
            };
            tracing::error!(stage = name, error = %e, "stage failed");
            (Err(e), outcome)
        }
    }
}
