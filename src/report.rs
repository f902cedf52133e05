// src/report.rs — Markdown transcript writer

use std::path::{Path, PathBuf};

use chrono::Local;

use crate::core::types::{RunResult, WorkflowKind};

/// Write the run transcript as a markdown file under `dir`.
///
/// One file per run; the filename encodes the local timestamp. The exact
/// byte layout is for humans and is not parsed back by anything.
pub fn write_transcript(
    dir: &Path,
    kind: WorkflowKind,
    request: &str,
    result: &RunResult,
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let timestamp = Local::now();
    let path = dir.join(format!("result_{}.md", timestamp.format("%Y%m%d_%H%M%S")));

    let mut doc = String::new();
    doc.push_str("# AI Collaboration Result\n\n");
    doc.push_str(&format!("**Generated:** {}\n", timestamp.to_rfc3339()));
    doc.push_str(&format!("**Workflow:** {}\n\n", kind));

    doc.push_str("## Request\n\n");
    doc.push_str(request.trim());
    doc.push_str("\n\n## Final Output\n\n");
    doc.push_str(result.output.trim());
    doc.push_str("\n\n## Statistics\n\n");
    doc.push_str(&format!("- Stop reason: {}\n", result.stop_reason));
    doc.push_str(&format!(
        "- Approved: {}\n",
        if result.success { "yes" } else { "no" }
    ));
    doc.push_str(&format!("- Iterations: {}\n", result.iterations));
    doc.push_str(&format!("- Total tokens: {}\n", result.total_tokens));
    doc.push_str(&format!("- Estimated cost: ${:.4}\n", result.total_cost_usd));

    doc.push_str("\n## Iteration History\n\n");
    for record in &result.history {
        doc.push_str(&format!("### Iteration {}\n\n", record.index));
        doc.push_str("**Developer submission:**\n\n");
        doc.push_str(record.submission.trim());
        doc.push_str("\n\n");
        let verdict = if record.verdict.approved {
            "APPROVED"
        } else {
            "REVISE"
        };
        doc.push_str(&format!("**PM verdict:** {}\n\n", verdict));
        if !record.verdict.feedback.is_empty() {
            doc.push_str(record.verdict.feedback.trim());
            doc.push_str("\n\n");
        }
        doc.push_str(&format!(
            "_{} tokens, ${:.4}_\n\n---\n\n",
            record.usage.total(),
            record.cost_usd,
        ));
    }

    std::fs::write(&path, doc)?;
    Ok(path)
}
