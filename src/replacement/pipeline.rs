//! Ordered execution of replacement methods for one file.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn, Dispatch};

use super::occurrences::OccurrenceReplace;
use super::rebuild::PageRebuild;
use super::span_patch::SpanPatch;
use super::strategy::{
    FallbackOrder, ReplacementOutcome, ReplacementRequest, ReplacementStrategy, StrategyAttempt,
    StrategyId, StrategyReport,
};
use super::watermark::SimpleWatermark;
use crate::error::{PatchError, PatchResult};
use crate::pdf::PdfDocument;

/// Tries methods in order until one writes the destination file.
///
/// Every attempt starts from a fresh parse of the source bytes, so edits
/// made by a failed method never reach the next one. Output is written
/// through a temporary file in the destination directory and only once a
/// method has fully succeeded.
pub struct FallbackPipeline {
    strategies: BTreeMap<StrategyId, Box<dyn ReplacementStrategy>>,
    dispatch: Option<Dispatch>,
}

impl FallbackPipeline {
    /// A pipeline with the six built-in methods.
    pub fn new() -> Self {
        Self {
            strategies: BTreeMap::new(),
            dispatch: None,
        }
        .register(Box::new(SpanPatch::CLEAN))
        .register(Box::new(SpanPatch::MINIMAL))
        .register(Box::new(PageRebuild::DIRECT))
        .register(Box::new(SpanPatch::OVERLAY))
        .register(Box::new(PageRebuild::PRECISE))
        .register(Box::new(OccurrenceReplace))
    }

    /// Adds a method, replacing any registered under the same id.
    ///
    /// `simple` is always taken from the fallback passed to [`Self::run`].
    pub fn register(mut self, strategy: Box<dyn ReplacementStrategy>) -> Self {
        self.strategies.insert(strategy.id(), strategy);
        self
    }

    /// Sends this pipeline's events to `dispatch` instead of the caller's
    /// default subscriber.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn run(
        &self,
        request: &ReplacementRequest,
        order: &FallbackOrder,
        fallback: &SimpleWatermark,
    ) -> ReplacementOutcome {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, || {
                self.run_chain(request, order, fallback)
            }),
            None => self.run_chain(request, order, fallback),
        }
    }

    fn run_chain(
        &self,
        request: &ReplacementRequest,
        order: &FallbackOrder,
        fallback: &SimpleWatermark,
    ) -> ReplacementOutcome {
        let file = request.source_path.display().to_string();
        let mut attempts = Vec::new();

        let source = match fs::read(&request.source_path) {
            Ok(bytes) => bytes,
            Err(source) => {
                let err = PatchError::Io {
                    path: request.source_path.clone(),
                    source,
                };
                warn!(file = %file, error = %err, "cannot read source");
                return ReplacementOutcome {
                    succeeded: false,
                    strategy_used: None,
                    reason: Some(err.to_string()),
                    attempts,
                };
            }
        };

        for &id in order.ids() {
            let strategy: &dyn ReplacementStrategy = match id {
                StrategyId::Simple => fallback,
                _ => match self.strategies.get(&id) {
                    Some(strategy) => strategy.as_ref(),
                    None => {
                        warn!(file = %file, strategy = %id, "no such method registered");
                        attempts.push(StrategyAttempt {
                            strategy: id,
                            error: Some("method not registered".to_string()),
                            not_found: false,
                        });
                        continue;
                    }
                },
            };

            debug!(file = %file, strategy = %id, "attempting");
            match guarded_attempt(strategy, &source, request) {
                Ok(report) => {
                    info!(
                        file = %file,
                        strategy = %id,
                        erased = report.regions_erased,
                        inserted = report.runs_inserted,
                        "replaced"
                    );
                    attempts.push(StrategyAttempt {
                        strategy: id,
                        error: None,
                        not_found: false,
                    });
                    let reason = (id == StrategyId::Simple)
                        .then(|| "watermark written; old text was not searched for".to_string());
                    return ReplacementOutcome {
                        succeeded: true,
                        strategy_used: Some(id),
                        reason,
                        attempts,
                    };
                }
                Err(err) => {
                    if err.is_not_found() {
                        info!(file = %file, strategy = %id, "text not found");
                    } else {
                        warn!(file = %file, strategy = %id, error = %err, "method failed");
                    }
                    attempts.push(StrategyAttempt {
                        strategy: id,
                        error: Some(err.to_string()),
                        not_found: err.is_not_found(),
                    });
                }
            }
        }

        warn!(file = %file, tried = attempts.len(), "all methods failed");
        ReplacementOutcome {
            succeeded: false,
            strategy_used: None,
            reason: Some(match attempts.last() {
                Some(last) => format!(
                    "all {} method(s) failed, last: {}",
                    attempts.len(),
                    last.error.as_deref().unwrap_or("unknown error")
                ),
                None => "no methods to try".to_string(),
            }),
            attempts,
        }
    }
}

impl Default for FallbackPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// [`attempt`] with panics from the PDF backends turned into errors, so a
/// malformed document fails one method instead of the whole run.
fn guarded_attempt(
    strategy: &dyn ReplacementStrategy,
    source: &[u8],
    request: &ReplacementRequest,
) -> PatchResult<StrategyReport> {
    panic::catch_unwind(AssertUnwindSafe(|| attempt(strategy, source, request))).unwrap_or_else(
        |payload| {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown cause".to_string());
            Err(PatchError::Backend {
                backend: "pdf".to_string(),
                message: format!("{} panicked on this document: {}", strategy.id(), detail),
                source: None,
            })
        },
    )
}

/// One method on a fresh copy of the document, persisted on success.
fn attempt(
    strategy: &dyn ReplacementStrategy,
    source: &[u8],
    request: &ReplacementRequest,
) -> PatchResult<StrategyReport> {
    let mut doc = PdfDocument::from_bytes(source)?;
    let mut page = doc.first_page()?;
    let report = strategy.apply(&mut page, &request.replacement)?;
    doc.commit(page)?;
    let bytes = doc.to_bytes()?;
    persist(&request.destination_path, &bytes)?;
    Ok(report)
}

/// Writes `bytes` to `dest` through a temporary file in the same directory.
fn persist(dest: &Path, bytes: &[u8]) -> PatchResult<()> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let io_err = |source| PatchError::Io {
        path: dest.to_path_buf(),
        source,
    };

    fs::create_dir_all(parent).map_err(io_err)?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.persist(dest).map_err(|e| io_err(e.error))?;
    Ok(())
}
