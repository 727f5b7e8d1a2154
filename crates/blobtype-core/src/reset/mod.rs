//! Content-type update decision and apply loop.
//!
//! [`ContentTypeReset`] walks a container listing once, resolves the
//! expected content-type of every object from its name, and persists the
//! resolved value for objects whose stored type differs. Objects are
//! handled one at a time; a failed persist call is reported for that
//! object and the loop moves on. Cancellation is observed only between
//! objects, so every persisted update is reported.
//!
//! # Example
//!
//! ```rust,ignore
//! use blobtype_core::{ContentTypeReset, UpdateOutcome};
//!
//! let summary = ContentTypeReset::default()
//!     .run(&container, |object, outcome| {
//!         if let UpdateOutcome::Updated { content_type } = outcome {
//!             println!("{} -> {content_type}", object.name);
//!         }
//!     })
//!     .await?;
//! ```

mod outcome;

use futures::StreamExt;
pub use outcome::{Decision, UpdateOutcome, UpdateSummary};
use tokio_util::sync::CancellationToken;

use crate::{Error, ExtensionTable, ObjectContainer, Result, StorageObject, TRACING_TARGET_RESET};

/// Decides whether `object` needs a new content-type.
///
/// The stored value is compared ASCII case-insensitively, ignoring
/// surrounding whitespace. A missing or empty stored value always needs an
/// update when the extension is mapped.
pub fn decide(table: &ExtensionTable, object: &StorageObject) -> Decision {
    let Some(expected) = table.resolve(&object.name) else {
        return Decision::NoMapping;
    };

    match object.content_type() {
        Some(current) if current.trim().eq_ignore_ascii_case(expected) => {
            Decision::AlreadyCorrect
        }
        _ => Decision::Update(expected),
    }
}

/// Sequential content-type update loop over one container.
#[derive(Debug, Clone)]
pub struct ContentTypeReset<'a> {
    table: &'a ExtensionTable,
    cancel_token: CancellationToken,
}

impl Default for ContentTypeReset<'static> {
    fn default() -> Self {
        Self::new(ExtensionTable::builtin())
    }
}

impl<'a> ContentTypeReset<'a> {
    /// Creates a loop resolving types with `table`.
    pub fn new(table: &'a ExtensionTable) -> Self {
        Self {
            table,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Stops [`run`](Self::run) before the next object once `cancel_token`
    /// is cancelled.
    ///
    /// An object whose update is in flight is finished and reported first.
    pub fn with_cancellation(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    /// Processes every object listed by `container`.
    ///
    /// `on_outcome` is called once per object, after its outcome is final.
    /// A cancelled run returns the partial totals with
    /// [`UpdateSummary::interrupted`] set.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::Listing`](crate::ErrorKind::Listing) error
    /// when the listing itself fails. Objects visited before that point
    /// keep their updates. Per-object persist failures never end the run.
    pub async fn run<C, F>(&self, container: &C, mut on_outcome: F) -> Result<UpdateSummary>
    where
        C: ObjectContainer + ?Sized,
        F: FnMut(&StorageObject, &UpdateOutcome),
    {
        let container_name = container.container_name();
        tracing::info!(
            target: TRACING_TARGET_RESET,
            container = %container_name,
            mappings = self.table.len(),
            "Scanning container"
        );

        let mut summary = UpdateSummary::default();
        let mut objects = container.list_objects();

        loop {
            let item = tokio::select! {
                biased;

                () = self.cancel_token.cancelled() => {
                    tracing::warn!(
                        target: TRACING_TARGET_RESET,
                        container = %container_name,
                        scanned = summary.scanned(),
                        "Cancellation requested, stopping scan"
                    );
                    summary.interrupted = true;
                    break;
                }
                item = objects.next() => item,
            };

            let mut object = match item {
                Some(Ok(object)) => object,
                None => break,
                Some(Err(error)) => {
                    tracing::error!(
                        target: TRACING_TARGET_RESET,
                        container = %container_name,
                        error = %error,
                        scanned = summary.scanned(),
                        updated = summary.updated,
                        failed = summary.failed,
                        "Listing interrupted"
                    );

                    return Err(Error::listing()
                        .with_message(format!(
                            "listing of container '{container_name}' failed after {} object(s)",
                            summary.scanned()
                        ))
                        .with_source(error));
                }
            };

            let outcome = self.apply(container, &mut object).await;
            summary.record(&outcome);
            on_outcome(&object, &outcome);
        }

        tracing::info!(
            target: TRACING_TARGET_RESET,
            container = %container_name,
            scanned = summary.scanned(),
            updated = summary.updated,
            already_correct = summary.already_correct,
            no_mapping = summary.no_mapping,
            failed = summary.failed,
            interrupted = summary.interrupted,
            "Scan finished"
        );

        Ok(summary)
    }

    /// Decides and, when needed, persists the new content-type of a single
    /// object.
    ///
    /// On success `object` holds the new content-type. On failure it keeps
    /// the value it had before the call.
    pub async fn apply<C>(&self, container: &C, object: &mut StorageObject) -> UpdateOutcome
    where
        C: ObjectContainer + ?Sized,
    {
        let content_type = match decide(self.table, object) {
            Decision::NoMapping => {
                tracing::debug!(
                    target: TRACING_TARGET_RESET,
                    object = %object.name,
                    "No mapping for extension"
                );
                return UpdateOutcome::NoMapping;
            }
            Decision::AlreadyCorrect => {
                tracing::debug!(
                    target: TRACING_TARGET_RESET,
                    object = %object.name,
                    content_type = ?object.content_type(),
                    "Content-type already correct"
                );
                return UpdateOutcome::AlreadyCorrect;
            }
            Decision::Update(content_type) => content_type,
        };

        let previous = object.properties.content_type.take();
        object.set_content_type(content_type);

        match container.persist_content_type(object).await {
            Ok(()) => {
                tracing::info!(
                    target: TRACING_TARGET_RESET,
                    object = %object.name,
                    previous = ?previous,
                    content_type,
                    "Content-type updated"
                );
                UpdateOutcome::Updated { content_type }
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET_RESET,
                    object = %object.name,
                    content_type,
                    kind = error.kind_str(),
                    error = %error,
                    "Failed to persist content-type"
                );
                object.properties.content_type = previous;
                UpdateOutcome::Failed {
                    content_type,
                    error,
                }
            }
        }
    }
}
