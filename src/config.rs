use crate::client::{ClientConfig, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::settings::Settings;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Number of files a test run processes before stopping.
pub const TEST_RUN_CAP: usize = 2;

/// Suffix appended to the chosen output directory.
pub const OUTPUT_DIR_SUFFIX: &str = "_processed";

pub(crate) const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Everything one tree walk needs, fixed for the walk's duration.
///
/// Use [`ProcessingJob::builder()`] to construct a job.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ProcessingJob {
    /// Directory whose files are processed
    pub input_root: PathBuf,

    /// Directory the mirrored tree is written to
    pub output_root: PathBuf,

    /// Only files whose name ends with this are considered
    pub file_suffix_filter: String,

    /// System prompt sent with every file
    pub system_prompt: String,

    /// Credential for the completion endpoint
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Endpoint root
    pub base_url: String,

    /// Stop a directory's iteration after this many processed files
    pub test_run_cap: Option<usize>,

    /// Base-name globs copied verbatim
    pub copy_patterns: Vec<String>,
}

impl ProcessingJob {
    /// Creates a new job builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use prompt_mirror::ProcessingJob;
    ///
    /// let job = ProcessingJob::builder()
    ///     .input_root("./docs")
    ///     .output_dir("./out")
    ///     .system_prompt("Translate to French")
    ///     .api_key("sk-...")
    ///     .build()
    ///     .expect("valid job");
    /// assert!(job.output_root.ends_with("out_processed"));
    /// ```
    #[must_use]
    pub fn builder() -> ProcessingJobBuilder {
        ProcessingJobBuilder::default()
    }

    /// Validates the job.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Input root doesn't exist or is not a directory
    /// - Output root lies inside the input root
    /// - System prompt is empty
    /// - Test run cap is zero
    pub fn validate(&self) -> Result<()> {
        if !self.input_root.exists() {
            return Err(Error::config(format!(
                "Input directory does not exist: {}",
                self.input_root.display()
            )));
        }

        if !self.input_root.is_dir() {
            return Err(Error::config(format!(
                "Input path is not a directory: {}",
                self.input_root.display()
            )));
        }

        if self.output_root.starts_with(&self.input_root) {
            return Err(Error::config(format!(
                "Output directory {} must not be inside the input directory {}",
                self.output_root.display(),
                self.input_root.display()
            )));
        }

        if self.system_prompt.trim().is_empty() {
            return Err(Error::config("System prompt must not be empty"));
        }

        if self.test_run_cap == Some(0) {
            return Err(Error::config("test_run_cap must be greater than 0"));
        }

        Ok(())
    }

    /// Connection settings for the completion client.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.api_key, &self.model).with_base_url(&self.base_url)
    }

    /// Mirrored output path for `input_path`.
    ///
    /// Returns `None` if `input_path` is not under the input root.
    #[must_use]
    pub fn output_path_for(&self, input_path: &Path) -> Option<PathBuf> {
        let relative = pathdiff::diff_paths(input_path, &self.input_root)?;
        if relative.starts_with("..") {
            return None;
        }
        Some(self.output_root.join(relative))
    }
}

/// Appends [`OUTPUT_DIR_SUFFIX`] to the last component of `dir`.
#[must_use]
pub fn processed_output_root(dir: &Path) -> PathBuf {
    let mut name = dir
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(OUTPUT_DIR_SUFFIX);
    dir.with_file_name(name)
}

/// Builder for creating a [`ProcessingJob`].
#[derive(Debug, Default)]
pub struct ProcessingJobBuilder {
    input_root: Option<PathBuf>,
    output_root: Option<PathBuf>,
    file_suffix_filter: Option<String>,
    system_prompt: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    test_run_cap: Option<usize>,
    copy_patterns: Vec<String>,
}

impl ProcessingJobBuilder {
    /// Copies suffix filter, credentials, model, endpoint, test-run flag and
    /// copy patterns from stored settings.
    #[must_use]
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.file_suffix_filter = Some(settings.file_type.clone());
        self.api_key = Some(settings.api_key.clone());
        self.model = Some(settings.model.clone());
        self.base_url = Some(settings.base_url.clone());
        self.test_run_cap = settings.test_run.then_some(TEST_RUN_CAP);
        self.copy_patterns = settings.file_copy_patterns.clone();
        self
    }

    /// Sets the directory to process.
    #[must_use]
    pub fn input_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_root = Some(path.into());
        self
    }

    /// Sets the chosen output directory; the job writes to its
    /// `_processed` sibling.
    #[must_use]
    pub fn output_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.output_root = Some(processed_output_root(path.as_ref()));
        self
    }

    /// Sets the exact output root, without the `_processed` suffix.
    #[must_use]
    pub fn output_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_root = Some(path.into());
        self
    }

    /// Sets the file name suffix filter, e.g. `.md`.
    #[must_use]
    pub fn file_suffix_filter(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix_filter = Some(suffix.into());
        self
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the endpoint root.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Caps the number of processed files per directory level.
    #[must_use]
    pub fn test_run_cap(mut self, cap: Option<usize>) -> Self {
        self.test_run_cap = cap;
        self
    }

    /// Sets the copy patterns.
    #[must_use]
    pub fn copy_patterns(mut self, patterns: Vec<String>) -> Self {
        self.copy_patterns = patterns;
        self
    }

    /// Builds the job.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or validation fails.
    pub fn build(self) -> Result<ProcessingJob> {
        let input_root = self
            .input_root
            .ok_or_else(|| Error::config("input_root is required"))?;
        let output_root = self
            .output_root
            .ok_or_else(|| Error::config("output directory is required"))?;

        let job = ProcessingJob {
            input_root,
            output_root,
            file_suffix_filter: self.file_suffix_filter.unwrap_or_default(),
            system_prompt: self.system_prompt.unwrap_or_default(),
            api_key: self.api_key.unwrap_or_default(),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            test_run_cap: self.test_run_cap,
            copy_patterns: self.copy_patterns,
        };

        job.validate()?;
        Ok(job)
    }
}
