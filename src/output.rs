//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! Gallery photos → web/
//!     3 photos, 1 video (1 here, 3 in 2 subdirectories)
//!     Conversions: 6 launched, 2 skipped, 0 failed
//! ```
//!
//! An interrupted run adds a final line:
//!
//! ```text
//!     Interrupted: gallery is incomplete, run again to finish
//! ```
//!
//! # Architecture
//!
//! [`format_run_output`] returns lines and does no I/O; [`print_run_output`]
//! writes them to stdout.

use crate::pipeline::RunOutcome;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Format the end-of-run report.
pub fn format_run_output(outcome: &RunOutcome, output_root: &Path) -> Vec<String> {
    let summary = &outcome.summary;
    let mut lines = Vec::new();

    let title = if summary.name.is_empty() {
        "Gallery".to_string()
    } else {
        format!("Gallery {}", summary.name)
    };
    lines.push(format!("{} → {}/", title, output_root.display()));

    let direct = summary.images + summary.videos;
    let nested = summary.nested_images + summary.nested_videos;
    lines.push(format!(
        "{}{}, {} ({} here, {} in {})",
        indent(1),
        plural(summary.total_images(), "photo", "photos"),
        plural(summary.total_videos(), "video", "videos"),
        direct,
        nested,
        plural(summary.directories, "subdirectory", "subdirectories"),
    ));
    lines.push(format!("{}Conversions: {}", indent(1), outcome.report));

    if outcome.interrupted {
        lines.push(format!(
            "{}Interrupted: gallery is incomplete, run again to finish",
            indent(1)
        ));
    }
    lines
}

pub fn print_run_output(outcome: &RunOutcome, output_root: &Path) {
    for line in format_run_output(outcome, output_root) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::MediaKind;
    use crate::dispatch::DispatchReport;
    use crate::types::DirectorySummary;

    fn outcome(interrupted: bool) -> RunOutcome {
        let mut child = DirectorySummary::new("sub");
        child.record_file(MediaKind::Video, "b.mp4.jpg");
        let mut summary = DirectorySummary::new("photos");
        summary.fold_child(&child);
        summary.record_file(MediaKind::Image, "t_a.jpg");
        RunOutcome {
            summary,
            report: DispatchReport {
                launched: 3,
                skipped: 1,
                failed: 1,
            },
            interrupted,
        }
    }

    #[test]
    fn formats_counts_and_report() {
        let lines = format_run_output(&outcome(false), Path::new("web"));
        assert_eq!(
            lines,
            vec![
                "Gallery photos → web/",
                "    1 photo, 1 video (1 here, 1 in 1 subdirectory)",
                "    Conversions: 3 launched, 1 skipped, 1 failed",
            ]
        );
    }

    #[test]
    fn interrupted_run_says_so() {
        let lines = format_run_output(&outcome(true), Path::new("web"));
        assert!(lines.last().unwrap().contains("Interrupted"));
    }

    #[test]
    fn unnamed_root_falls_back_to_generic_title() {
        let mut o = outcome(false);
        o.summary.name.clear();
        let lines = format_run_output(&o, Path::new("out"));
        assert_eq!(lines[0], "Gallery → out/");
    }
}
