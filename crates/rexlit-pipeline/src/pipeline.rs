//! The staged orchestrator (§4.12): discover -> dedupe -> redaction_plan ->
//! bates_plan -> manifest -> pack, each stage wrapped by [`crate::stage::stage`].
//! A failing stage marks itself `failed` and re-raises; planners, the
//! ledger, and the search index all fail fast underneath it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;

use rexlit_common::error::Result;
use rexlit_crypto::KeyMaterial;
use rexlit_paths::ExtensionFilter;
use rexlit_redact::{RedactionAction, RedactionPlanEntry};

use crate::ports::{Dedup, Discovery, Ledger, Packager, Pii};
use crate::stage::{stage, StageOutcome};

/// Every collaborator the orchestrator needs, wired once at bootstrap.
pub struct PipelinePorts<'a> {
    pub discovery: &'a dyn Discovery,
    pub dedup: &'a dyn Dedup,
    pub pii: &'a dyn Pii,
    pub packager: &'a dyn Packager,
}

pub struct PipelineRequest<'a> {
    pub source: &'a Path,
    pub work_dir: &'a Path,
    pub filter: ExtensionFilter,
    pub bates_prefix: String,
    pub bates_width: usize,
    pub bates_separator: String,
    pub online_mode: bool,
}

pub struct PipelineOutcome {
    pub stages: Vec<StageOutcome>,
    pub manifest_path: PathBuf,
    pub bates_plan_path: PathBuf,
    pub redaction_plan_paths: Vec<PathBuf>,
    pub pack_manifest: rexlit_pack::PackManifest,
}

fn redaction_plan_path(work_dir: &Path, sha256: &str) -> PathBuf {
    work_dir.join("redaction_plans").join(format!("{sha256}.redaction-plan.enc"))
}

/// Run the full pipeline against `request.source`, recording an
/// `m1_pipeline` audit entry on success. On a stage failure, that stage's
/// [`StageOutcome`] records the error detail and the error itself
/// propagates to the caller; the ledger is not touched.
pub fn run(
    ports: &PipelinePorts,
    ledger: &mut dyn Ledger,
    key: &KeyMaterial,
    request: &PipelineRequest,
) -> Result<PipelineOutcome> {
    let mut stages = Vec::with_capacity(6);

    let (discovered, outcome) = stage("discover", || {
        let records = ports.discovery.stream(request.source, &request.filter)?;
        let mut metrics = serde_json::Map::new();
        metrics.insert("document_count".to_string(), serde_json::json!(records.len()));
        Ok((records, metrics))
    });
    stages.push(outcome);
    let discovered = discovered?;

    let (deduped, outcome) = stage("dedupe", || {
        let records = ports.dedup.dedup(discovered)?;
        let mut metrics = serde_json::Map::new();
        metrics.insert("document_count".to_string(), serde_json::json!(records.len()));
        Ok((records, metrics))
    });
    stages.push(outcome);
    let deduped = deduped?;

    let (redaction_plan_paths, outcome) = stage("redaction_plan", || {
        let mut paths = Vec::with_capacity(deduped.len());
        for record in &deduped {
            let text = std::fs::read_to_string(&record.path).unwrap_or_default();
            let matches = ports.pii.analyze_document(&text);
            let actions: Vec<RedactionAction> = matches.iter().map(|m| RedactionAction::from_match(m, None)).collect();
            if actions.is_empty() {
                continue;
            }
            let entry = RedactionPlanEntry::new(record.path.clone(), record.sha256.clone(), actions, None)?;
            let path = redaction_plan_path(request.work_dir, &record.sha256);
            rexlit_redact::write_redaction_plan(&path, &entry, key)?;
            paths.push(path);
        }
        let mut metrics = serde_json::Map::new();
        metrics.insert("plan_count".to_string(), serde_json::json!(paths.len()));
        Ok((paths, metrics))
    });
    stages.push(outcome);
    let redaction_plan_paths = redaction_plan_paths?;

    let (bates_plan_path, outcome) = stage("bates_plan", || {
        let plan = rexlit_bates::plan(deduped.clone(), &request.bates_prefix, request.bates_width, &request.bates_separator)?;
        let path = request.work_dir.join("bates_plan.jsonl");
        rexlit_jsonl::write_jsonl_atomic(&path, &plan.assignments)?;
        let mut metrics = serde_json::Map::new();
        metrics.insert("assignment_count".to_string(), serde_json::json!(plan.assignments.len()));
        Ok((path, metrics))
    });
    stages.push(outcome);
    let bates_plan_path = bates_plan_path?;

    let (manifest_path, outcome) = stage("manifest", || {
        let path = request.work_dir.join("manifest.jsonl");
        rexlit_jsonl::write_jsonl_atomic(&path, &deduped)?;
        let mut metrics = serde_json::Map::new();
        metrics.insert("document_count".to_string(), serde_json::json!(deduped.len()));
        Ok((path, metrics))
    });
    stages.push(outcome);
    let manifest_path = manifest_path?;

    let (pack_manifest, outcome) = stage("pack", || {
        let pack_dir = request.work_dir.join("pack");
        let options = rexlit_pack::PackOptions::default();
        let manifest = ports.packager.create_pack(request.source, &pack_dir, &options)?;
        let mut metrics = serde_json::Map::new();
        metrics.insert("artifact_count".to_string(), serde_json::json!(manifest.artifacts.len()));
        Ok((manifest, metrics))
    });
    stages.push(outcome);
    let pack_manifest = pack_manifest?;

    let mut outputs = vec![manifest_path.display().to_string()];
    outputs.extend(redaction_plan_paths.iter().map(|p| p.display().to_string()));
    outputs.push(bates_plan_path.display().to_string());
    outputs.push(request.work_dir.join("pack").join("manifest.json").display().to_string());

    let mut args = HashMap::new();
    args.insert("document_count".to_string(), serde_json::json!(deduped.len()));
    args.insert("executed_at".to_string(), serde_json::json!(Utc::now().to_rfc3339()));
    args.insert("online_mode".to_string(), serde_json::json!(request.online_mode));
    args.insert(
        "redaction_plans".to_string(),
        serde_json::json!(redaction_plan_paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>()),
    );

    ledger.append("m1_pipeline", vec![request.source.display().to_string()], outputs, args)?;

    Ok(PipelineOutcome {
        stages,
        manifest_path,
        bates_plan_path,
        redaction_plan_paths,
        pack_manifest,
    })
}
