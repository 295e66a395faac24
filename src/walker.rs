//! Recursive mirror walk.
//!
//! Visits the input tree depth-first, one entry at a time, and mirrors
//! every qualifying file into the output tree: copy patterns are copied
//! verbatim, everything else goes through the chat client.

use crate::{
    client::ChatClient,
    config::ProcessingJob,
    error::{Error, Result},
    interaction::UserInteraction,
    overwrite::{OverwriteDecision, OverwriteSettings},
    pattern::CopyMatcher,
};
use serde::Serialize;
use std::{
    fs,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Shared, advisory cancellation signal.
///
/// Raising it never interrupts a remote call that is already running; the
/// walker notices it between files and after each call returns.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters collected during a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Files sent to the model and written
    pub processed: usize,

    /// Files copied verbatim because of a copy pattern
    pub copied: usize,

    /// Files ignored because of the suffix filter
    pub skipped_suffix: usize,

    /// Files left alone because the output existed
    pub skipped_existing: usize,

    /// Files whose processing failed
    pub failed: usize,
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Every directory was visited (or stopped by the test-run cap)
    Completed(WalkStats),
    /// The user cancelled; files finished so far stay written
    Cancelled(WalkStats),
}

impl WalkOutcome {
    /// Counters at the end of the walk.
    #[must_use]
    pub const fn stats(&self) -> &WalkStats {
        match self {
            Self::Completed(stats) | Self::Cancelled(stats) => stats,
        }
    }

    /// Returns true if the walk was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Cancelled,
}

/// Walks one [`ProcessingJob`].
pub struct Walker<'a, C: ChatClient + ?Sized> {
    job: &'a ProcessingJob,
    client: &'a C,
    ui: &'a mut dyn UserInteraction,
    matcher: CopyMatcher,
    overwrite: OverwriteSettings,
    cancel: CancelFlag,
    stats: WalkStats,
}

impl<'a, C: ChatClient + ?Sized> Walker<'a, C> {
    /// Creates a walker for `job`.
    ///
    /// # Errors
    ///
    /// Returns an error if a copy pattern is invalid.
    pub fn new(job: &'a ProcessingJob, client: &'a C, ui: &'a mut dyn UserInteraction) -> Result<Self> {
        Ok(Self {
            job,
            client,
            ui,
            matcher: CopyMatcher::new(&job.copy_patterns)?,
            overwrite: OverwriteSettings::new(),
            cancel: CancelFlag::new(),
            stats: WalkStats::default(),
        })
    }

    /// Uses `cancel` as the cancellation signal.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the walk.
    ///
    /// Per-file failures are reported through the interaction and never
    /// abort the walk.
    ///
    /// # Errors
    ///
    /// Returns an error only if the input root cannot be read at all.
    #[instrument(skip(self))]
    pub fn walk(mut self) -> Result<WalkOutcome> {
        let root = self.job.input_root.clone();
        let metadata = fs::metadata(&root).map_err(|e| Error::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(Error::config(format!(
                "Input path is not a directory: {}",
                root.display()
            )));
        }

        info!(
            "Walking {} into {}",
            root.display(),
            self.job.output_root.display()
        );

        let output_root = self.job.output_root.clone();
        let flow = self.visit_dir(&root, &output_root);

        info!(
            "Walk finished: {} processed, {} copied, {} failed",
            self.stats.processed, self.stats.copied, self.stats.failed
        );

        Ok(match flow {
            Flow::Continue => WalkOutcome::Completed(self.stats),
            Flow::Cancelled => WalkOutcome::Cancelled(self.stats),
        })
    }

    fn visit_dir(&mut self, input_dir: &Path, output_dir: &Path) -> Flow {
        let entries = WalkDir::new(input_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in entries {
            if self.cancel.is_cancelled() {
                return Flow::Cancelled;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error in {}: {}", input_dir.display(), e);
                    self.ui.report_error(&format!(
                        "Error reading directory {}: {}",
                        input_dir.display(),
                        e
                    ));
                    continue;
                }
            };

            let file_name = entry.file_name();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if self.visit_dir(entry.path(), &output_dir.join(file_name)) == Flow::Cancelled {
                    return Flow::Cancelled;
                }
                continue;
            }

            if !file_type.is_file() {
                continue;
            }

            let name = file_name.to_string_lossy();
            if !name.ends_with(&self.job.file_suffix_filter) {
                self.stats.skipped_suffix += 1;
                continue;
            }

            let input_path = entry.path();
            let output_path = output_dir.join(file_name);

            if self.matcher.should_copy_unmodified(&name) {
                match copy_verbatim(input_path, &output_path) {
                    Ok(()) => {
                        debug!("Copied {} unmodified", input_path.display());
                        self.stats.copied += 1;
                    }
                    Err(e) => self.report_failure(input_path, &e),
                }
                continue;
            }

            if output_path.exists()
                && self.overwrite.decide(&output_path, self.ui) == OverwriteDecision::No
            {
                debug!("Keeping existing {}", output_path.display());
                self.stats.skipped_existing += 1;
                continue;
            }

            match self.process_file(input_path, &output_path) {
                Ok(Flow::Cancelled) => return Flow::Cancelled,
                Ok(Flow::Continue) => {
                    self.stats.processed += 1;
                    // Only stops this directory's loop; enclosing levels keep going.
                    if self
                        .job
                        .test_run_cap
                        .is_some_and(|cap| self.stats.processed >= cap)
                    {
                        info!("Test run cap reached in {}", input_dir.display());
                        break;
                    }
                }
                Err(e) => self.report_failure(input_path, &e),
            }
        }

        Flow::Continue
    }

    /// Sends one file through the client and writes the reply.
    ///
    /// A reply that arrives after cancellation is dropped unwritten.
    fn process_file(&mut self, input_path: &Path, output_path: &Path) -> Result<Flow> {
        let bytes = fs::read(input_path).map_err(|e| Error::io(input_path, e))?;
        let content = String::from_utf8(bytes).map_err(|_| Error::invalid_utf8(input_path))?;

        let rel_display = self.relative_display(input_path);
        info!("Processing: {}", rel_display);
        self.ui.report_progress(&format!("Processing {}", rel_display));

        let reply = self.client.complete(&content, &self.job.system_prompt)?;

        if self.cancel.is_cancelled() {
            debug!("Discarding reply for {} after cancellation", rel_display);
            return Ok(Flow::Cancelled);
        }

        ensure_parent(output_path)?;
        fs::write(output_path, reply).map_err(|e| Error::io(output_path, e))?;
        debug!("Wrote {}", output_path.display());

        Ok(Flow::Continue)
    }

    fn report_failure(&mut self, input_path: &Path, error: &Error) {
        warn!("Failed to process {}: {}", input_path.display(), error);
        self.stats.failed += 1;
        self.ui.report_error(&format!(
            "Error processing file {}: {}",
            input_path.display(),
            error
        ));
    }

    fn relative_display(&self, path: &Path) -> String {
        pathdiff::diff_paths(path, &self.job.input_root)
            .unwrap_or_else(|| path.to_path_buf())
            .display()
            .to_string()
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

fn copy_verbatim(from: &Path, to: &Path) -> Result<()> {
    ensure_parent(to)?;
    fs::copy(from, to).map_err(|e| Error::io(to, e))?;
    Ok(())
}

/// Runs `job` with a fresh walker.
///
/// # Errors
///
/// See [`Walker::new`] and [`Walker::walk`].
pub fn walk<C: ChatClient + ?Sized>(
    job: &ProcessingJob,
    client: &C,
    ui: &mut dyn UserInteraction,
    cancel: CancelFlag,
) -> Result<WalkOutcome> {
    Walker::new(job, client, ui)?.with_cancel(cancel).walk()
}
