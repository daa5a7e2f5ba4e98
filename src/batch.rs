//! Directory-level processing.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::ReplacementConfig;
use crate::error::{PatchError, PatchResult};
use crate::replacement::{FallbackOrder, FallbackPipeline, ReplacementOutcome, ReplacementRequest};

/// `*.pdf` files directly inside `dir`, sorted by name.
///
/// The extension match is case-sensitive and subdirectories are not
/// entered. A missing path or a path that is not a directory is a
/// configuration error.
pub fn find_pdf_files(dir: &Path) -> PatchResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(PatchError::Configuration {
            parameter: "input_dir".to_string(),
            reason: format!("directory '{}' does not exist", dir.display()),
        });
    }
    if !dir.is_dir() {
        return Err(PatchError::Configuration {
            parameter: "input_dir".to_string(),
            reason: format!("'{}' is not a directory", dir.display()),
        });
    }

    let entries = fs::read_dir(dir).map_err(|source| PatchError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| PatchError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "pdf") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<(PathBuf, ReplacementOutcome)>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Runs the pipeline over every PDF of a directory.
pub struct BatchRunner {
    pipeline: FallbackPipeline,
    config: ReplacementConfig,
    order: FallbackOrder,
    jobs: usize,
}

impl BatchRunner {
    pub fn new(pipeline: FallbackPipeline, config: ReplacementConfig, order: FallbackOrder) -> Self {
        Self {
            pipeline,
            config,
            order,
            jobs: 1,
        }
    }

    /// Processes up to `jobs` files at once. Methods for one file always
    /// run one after another.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Patches every PDF in `input_dir` into `output_dir` under the same
    /// file name.
    pub fn run(&self, input_dir: &Path, output_dir: &Path) -> PatchResult<BatchSummary> {
        self.config.validate()?;
        let files = find_pdf_files(input_dir)?;
        if files.is_empty() {
            warn!(dir = %input_dir.display(), "no PDF files found");
            return Ok(BatchSummary::default());
        }
        fs::create_dir_all(output_dir).map_err(|source| PatchError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        info!(count = files.len(), "found PDF files");

        let replacement = self.config.replacement();
        let process = |source: &PathBuf| {
            let destination = match source.file_name() {
                Some(name) => output_dir.join(name),
                None => output_dir.join("output.pdf"),
            };
            info!(file = %source.display(), "processing");
            let request = ReplacementRequest {
                source_path: source.clone(),
                destination_path: destination,
                replacement: replacement.clone(),
            };
            let outcome = self
                .pipeline
                .run(&request, &self.order, &self.config.watermark);
            (source.clone(), outcome)
        };

        let outcomes: Vec<(PathBuf, ReplacementOutcome)> = if self.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|e| PatchError::Configuration {
                    parameter: "jobs".to_string(),
                    reason: e.to_string(),
                })?;
            pool.install(|| files.par_iter().map(process).collect())
        } else {
            files.iter().map(process).collect()
        };

        let succeeded = outcomes.iter().filter(|(_, o)| o.succeeded).count();
        let summary = BatchSummary {
            succeeded,
            failed: outcomes.len() - succeeded,
            outcomes,
        };
        info!(
            "Processing complete: {} successful, {} failed",
            summary.succeeded, summary.failed
        );
        Ok(summary)
    }
}
