// src/cli/progress.rs — Terminal progress renderer

use crate::core::types::ProgressEvent;

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout remains clean for the
/// final artifact. Returns a closure suitable for `Workflow::with_progress()`.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + 'static {
    move |event| eprintln!("{}", render(&event))
}

fn render(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::IterationStart {
            iteration,
            max_iterations,
        } => format!("[iter {}/{}] developer working...", iteration, max_iterations),
        ProgressEvent::Verdict {
            iteration,
            approved,
            cost_so_far,
        } => format!(
            "[iter {}] PM verdict: {} (${:.2})",
            iteration,
            if *approved { "approved" } else { "revise" },
            cost_so_far,
        ),
        ProgressEvent::Stalled {
            iteration,
            similarity,
            count,
        } => format!(
            "[iter {}] no meaningful change (similarity {:.2}, {} in a row)",
            iteration, similarity, count,
        ),
        ProgressEvent::Checkpoint { iteration } => {
            format!("[iter {}] checkpoint reached", iteration)
        }
        ProgressEvent::Complete {
            iterations,
            total_tokens,
            cost,
            stop_reason,
        } => format!(
            "[done] stop={} iterations={} tokens={} cost=${:.2}",
            stop_reason, iterations, total_tokens, cost,
        ),
    }
}
