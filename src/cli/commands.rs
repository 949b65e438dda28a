//! CLI command implementations for radarmatch.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::mount::{MemoryMount, TargetId};
use crate::render::RadarRenderer;
use crate::scheduler::{RenderScheduler, RenderService};
use crate::score::{aggregate, AuditKind, CanonicalScore, ScoreValidator, ValidationIssue};
use crate::types::config::{Config, StrategyKind};
use crate::{RadarError, RadarResult};

/// Upper bound on how long `render` waits for its chart.
const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> RadarResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("radarmatch.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    let data_dir = target_dir.join(".radarmatch");
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!(".radarmatch/ directory created");
    }

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("radarmatch initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!("Data directory: .radarmatch/");
    println!();
    println!("Next steps:");
    println!("  1. Check a score file: radarmatch validate score.json");
    println!("  2. Draw its chart:     radarmatch render score.json --output chart.png");

    Ok(())
}

/// Reads a file, or stdin for `-`.
fn read_input(path: &Path) -> RadarResult<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

/// Parses input text; text that is not JSON is kept as a JSON string so
/// it still normalizes to the default score.
fn parse_input(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// The breakdown of a `{score, breakdown}` payload, or the value itself.
fn breakdown_of(value: &Value) -> (AuditKind, &Value) {
    match value.get("breakdown") {
        Some(breakdown) => (AuditKind::ScoreValidation, breakdown),
        None => (AuditKind::Breakdown, value),
    }
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    score: u8,
    breakdown: CanonicalScore,
    issues: Vec<ValidationIssue>,
}

fn describe(issue: &ValidationIssue) -> String {
    let mut line = issue.kind.to_string();
    if let Some(field) = issue.field {
        line.push_str(&format!(" {}", field));
    }
    if let Some(original) = &issue.original {
        line.push_str(&format!(" (was {})", original));
    }
    if let Some(corrected) = issue.corrected {
        line.push_str(&format!(" -> {}", corrected));
    }
    line
}

/// Normalizes score files and prints the results.
pub async fn validate(files: &[PathBuf], json: bool, config: &Config) -> RadarResult<()> {
    let mut validator = ScoreValidator::new(config.validation.clone());
    let mut reports = Vec::with_capacity(files.len());

    for file in files {
        let name = file.display().to_string();
        let value = parse_input(&read_input(file)?);
        let (kind, breakdown) = breakdown_of(&value);
        let result = validator.validate_as(kind, Some(name.as_str()), breakdown);

        reports.push(FileReport {
            file: name,
            score: aggregate(&result.data),
            breakdown: result.data,
            issues: result.issues,
        });
    }

    let integrity = (files.len() > 1).then(|| validator.report());

    if json {
        let output = serde_json::json!({
            "results": reports,
            "report": integrity,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for report in &reports {
        println!("{}", report.file);
        println!("  Overall: {}", report.score);
        for (axis, value) in report.breakdown.iter() {
            println!("  {:<10} {:>3}", axis.label(), value);
        }
        if report.issues.is_empty() {
            println!("  No issues");
        } else {
            println!("  Issues ({}):", report.issues.len());
            for issue in &report.issues {
                println!("    - {}", describe(issue));
            }
        }
        println!();
    }

    if let Some(integrity) = integrity {
        println!("Integrity report");
        println!("  Validations with issues: {}", integrity.total_validations);
        for (kind, count) in &integrity.issues_by_type {
            println!("  {:<18} {}", kind, count);
        }
        for recommendation in &integrity.recommendations {
            println!("  * {}", recommendation);
        }
    }

    Ok(())
}

/// Renders a score file to PNG through the render service.
pub async fn render(
    file: &Path,
    output: &Path,
    strategy: Option<StrategyKind>,
    config: &Config,
) -> RadarResult<()> {
    let mut config = config.clone();
    if let Some(strategy) = strategy {
        config.renderer.strategy = strategy;
    }

    let value = parse_input(&read_input(file)?);
    let (_, breakdown) = breakdown_of(&value);

    let mount = MemoryMount::new();
    let scheduler = RenderScheduler::new(
        &config,
        Arc::new(RadarRenderer::new()),
        Box::new(mount.clone()),
    )?;
    let strategy = scheduler.context().strategy_kind();
    let (handle, task) = RenderService::spawn(scheduler, &config.scheduler);

    let target = TargetId::new(
        file.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "chart".to_string()),
    );
    let result = handle.enqueue_raw(target.clone(), breakdown, None)?;

    tokio::time::timeout(RENDER_TIMEOUT, handle.wait_idle())
        .await
        .map_err(|_| RadarError::render(target.as_str(), "timed out waiting for chart"))??;

    let png = mount.encode_png(&target)?;
    let report = handle.shutdown().await?;
    if task.await.is_err() {
        tracing::warn!("Render service task ended abnormally");
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output, png)?;

    println!("Chart written to: {}", output.display());
    println!("  Overall: {}", aggregate(&result.data));
    println!("  Strategy: {}", strategy);
    println!(
        "  Render time: {:.2}ms",
        report.metrics.average_render_time().as_secs_f64() * 1000.0
    );
    if !result.issues.is_empty() {
        println!("  Corrections: {}", result.issues.len());
    }
    if report.metrics.failures > 0 {
        println!("  Render failed; default chart written instead");
    }

    Ok(())
}

/// Repairs every score payload in the SQLite store.
#[cfg(feature = "sqlite")]
pub async fn repair(db: Option<PathBuf>, config: &Config) -> RadarResult<()> {
    use crate::storage::{GuardedStore, SqliteStore};

    let db_path = db.unwrap_or_else(|| config.storage.db_path.clone());
    if !db_path.exists() {
        println!("No score database at: {}", db_path.display());
        return Ok(());
    }

    let mut store = GuardedStore::from_config(SqliteStore::open(&db_path)?, config);
    let repaired = store.repair_all()?;
    let report = store.report();

    println!("Repaired {} entries in {}", repaired, db_path.display());
    for (kind, count) in &report.issues_by_type {
        println!("  {:<18} {}", kind, count);
    }
    for recommendation in &report.recommendations {
        println!("  * {}", recommendation);
    }

    Ok(())
}

/// Shows version.
pub fn version() {
    println!("radarmatch {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Compatibility score validation and radar chart rendering");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_input_keeps_garbage_as_string() {
        assert_eq!(parse_input("{\"a\":1}"), json!({"a": 1}));
        assert_eq!(parse_input("not json"), json!("not json"));
    }

    #[test]
    fn test_breakdown_of_envelope() {
        let envelope = json!({"score": 80, "breakdown": {"businessSynergy": 90}});
        let (kind, breakdown) = breakdown_of(&envelope);
        assert_eq!(kind, AuditKind::ScoreValidation);
        assert_eq!(breakdown, &json!({"businessSynergy": 90}));

        let bare = json!({"businessSynergy": 90});
        assert_eq!(breakdown_of(&bare).0, AuditKind::Breakdown);
    }

    #[test]
    fn test_describe_issue() {
        let issue = ValidationIssue::out_of_range(crate::score::Axis::BusinessSynergy, &json!(150), 100);
        let text = describe(&issue);
        assert!(text.starts_with("out_of_range"));
        assert!(text.contains("150"));
        assert!(text.ends_with("-> 100"));
    }
}
