use std::fmt::Write;

use crate::domain::{BatchResult, ItemState};

/// Render the end-of-run summary, one block per item in manifest order.
pub fn render(batch: &BatchResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "===== Download Summary =====");

    for result in batch {
        match (result.state(), &result.error) {
            (ItemState::Failed, Some(e)) => {
                let _ = writeln!(out, "[FAIL]   {}", result.path);
                let _ = writeln!(out, "         Error:  {}", e);
                let _ = writeln!(out, "         Status: {}", result.status);
            }
            (ItemState::Replaced, _) => {
                let _ = writeln!(out, "[OK]     {}", result.path);
                let _ = writeln!(out, "         Updated ({})", result.status);
                if let Some(warning) = &result.warning {
                    let _ = writeln!(out, "         Warning: {}", warning);
                }
            }
            _ => {
                let _ = writeln!(out, "[SKIP]   {}", result.path);
                let _ = writeln!(out, "         Not modified ({})", result.status);
            }
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "===== Completed: {} updated, {} failed =====",
        batch.updated_count(),
        batch.failed_count()
    );

    out
}

/// Whether the process should exit non-zero for this batch.
pub fn should_fail(batch: &BatchResult, strict: bool) -> bool {
    strict && batch.has_failures()
}
