//! Console output.
//!
//! Progress and summary lines go to stdout, per-object failures to stderr.

use blobtype_core::{StorageObject, UpdateOutcome, UpdateSummary};

/// Progress line for an updated object, `None` for every other outcome.
pub fn progress_line(object: &StorageObject, outcome: &UpdateOutcome) -> Option<String> {
    match outcome {
        UpdateOutcome::Updated { content_type } => {
            Some(format!("{} -> {content_type}", object.name))
        }
        _ => None,
    }
}

/// Failure line for an object whose update could not be persisted.
pub fn failure_line(object: &StorageObject, outcome: &UpdateOutcome) -> Option<String> {
    match outcome {
        UpdateOutcome::Failed {
            content_type,
            error,
        } => Some(format!(
            "Failed to set {} -> {content_type}: {error}",
            object.name
        )),
        _ => None,
    }
}

/// Final summary line.
pub fn summary_line(summary: &UpdateSummary) -> String {
    format!("Updated {} object(s)", summary.updated)
}

/// Prints the console lines for one object.
pub fn print_outcome(object: &StorageObject, outcome: &UpdateOutcome) {
    if let Some(line) = progress_line(object, outcome) {
        println!("{line}");
    }
    if let Some(line) = failure_line(object, outcome) {
        eprintln!("{line}");
    }
}

/// Prints the final summary line.
pub fn print_summary(summary: &UpdateSummary) {
    println!("{}", summary_line(summary));
}

#[cfg(test)]
mod tests {
    use blobtype_core::{Error, ObjectProperties};

    use super::*;

    fn object(name: &str) -> StorageObject {
        StorageObject::new(name, ObjectProperties::with_content_type("image/jpeg"))
    }

    #[test]
    fn test_progress_line() {
        let outcome = UpdateOutcome::Updated {
            content_type: "image/jpeg",
        };
        assert_eq!(
            progress_line(&object("photos/a.jpg"), &outcome).as_deref(),
            Some("photos/a.jpg -> image/jpeg")
        );
        assert!(failure_line(&object("photos/a.jpg"), &outcome).is_none());
    }

    #[test]
    fn test_skipped_objects_are_silent() {
        for outcome in [UpdateOutcome::NoMapping, UpdateOutcome::AlreadyCorrect] {
            assert!(progress_line(&object("a.bin"), &outcome).is_none());
            assert!(failure_line(&object("a.bin"), &outcome).is_none());
        }
    }

    #[test]
    fn test_failure_line() {
        let outcome = UpdateOutcome::Failed {
            content_type: "image/png",
            error: Error::timeout().with_message("request timed out"),
        };
        assert_eq!(
            failure_line(&object("b.png"), &outcome).as_deref(),
            Some("Failed to set b.png -> image/png: Timeout: request timed out")
        );
        assert!(progress_line(&object("b.png"), &outcome).is_none());
    }

    #[test]
    fn test_summary_line() {
        let summary = UpdateSummary {
            updated: 1,
            already_correct: 1,
            no_mapping: 1,
            failed: 0,
            interrupted: false,
        };
        assert_eq!(summary_line(&summary), "Updated 1 object(s)");
        assert_eq!(
            summary_line(&UpdateSummary::default()),
            "Updated 0 object(s)"
        );
    }
}
