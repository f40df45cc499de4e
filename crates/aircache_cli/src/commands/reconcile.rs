//! Reconcile command implementation.

use super::Context;
use aircache_sync::ReconcileReport;
use serde::Serialize;

/// Reconciliation summary.
#[derive(Debug, Serialize)]
pub struct ReconcileSummary {
    /// Records inserted or overwritten.
    pub upserted: usize,
    /// Local records deleted.
    pub deleted: usize,
    /// Cached passengers after the pass.
    pub passengers: usize,
    /// Pass duration in milliseconds.
    pub duration_ms: u128,
    /// Records that could not be applied.
    pub errors: Vec<String>,
}

impl From<&ReconcileReport> for ReconcileSummary {
    fn from(report: &ReconcileReport) -> Self {
        Self {
            upserted: report.upserted,
            deleted: report.deleted,
            passengers: report.passengers.len(),
            duration_ms: report.duration.as_millis(),
            errors: report.errors.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Runs the reconcile command.
pub async fn run(ctx: &Context, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = ctx.cache.reconcile().await?;
    let summary = ReconcileSummary::from(&report);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => print_text_output(&summary),
    }

    Ok(())
}

fn print_text_output(summary: &ReconcileSummary) {
    if summary.upserted == 0 && summary.deleted == 0 {
        println!("Cache already matches the remote ({} passengers)", summary.passengers);
    } else {
        println!("Reconciled in {} ms", summary.duration_ms);
        println!("  Upserted:   {}", summary.upserted);
        println!("  Deleted:    {}", summary.deleted);
        println!("  Passengers: {}", summary.passengers);
    }

    if !summary.errors.is_empty() {
        println!();
        println!("Skipped ({}):", summary.errors.len());
        for error in &summary.errors {
            println!("  - {error}");
        }
    }
}
