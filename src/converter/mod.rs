use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use job::{BatchReport, ConversionJob, JobOutcome};
use log::{error, info, warn};
use timestamps::FileStamps;
use tokio::fs;
use tool::ImageTool;

use crate::config::{CollisionPolicy, Config};

pub mod format;
pub mod job;
pub mod timestamps;
pub mod tool;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' failed with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("expected output '{0}' was not produced; keeping the input")]
    MissingOutput(PathBuf),
    #[error("failed to read timestamps of '{path}': {source}")]
    ReadTimestamps {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to copy timestamps onto '{path}': {source}")]
    WriteTimestamps {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("converted, but failed to remove input '{path}': {source}")]
    RemoveInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("output '{output}' is already produced from '{first}'")]
    Collision { output: PathBuf, first: PathBuf },
}

pub struct Converter<T> {
    config: Config,
    tool: T,
}

impl<T: ImageTool> Converter<T> {
    pub fn new(config: Config, tool: T) -> Self {
        Self { config, tool }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Regular files directly under the input directory with the source
    /// extension, sorted by path.
    pub async fn scan(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(&self.config.input_dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !self.config.from.matches(&path) {
                continue;
            }
            // follows symlinks, so a link to an image counts as one
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => files.push(path),
                Ok(_) => {}
                Err(e) => warn!("ignoring {}: {}", path.display(), e),
            }
        }

        files.sort();
        Ok(files)
    }

    /// Pairs every input with its output. Output names are compared
    /// ASCII-case-insensitively so the plan holds on case-insensitive
    /// filesystems; the first input in path order keeps a contested name.
    pub fn plan(&self, inputs: Vec<PathBuf>) -> Vec<ConversionJob> {
        let mut claimed: HashMap<OsString, PathBuf> = HashMap::new();

        inputs
            .into_iter()
            .map(|input| {
                let mut job = ConversionJob::new(input, &self.config.output_dir, self.config.to);
                let key = job
                    .output
                    .file_name()
                    .map(|n| n.to_ascii_lowercase())
                    .unwrap_or_default();
                match claimed.get(&key) {
                    Some(first) => job.collides_with = Some(first.clone()),
                    None => {
                        claimed.insert(key, job.input.clone());
                    }
                }
                job
            })
            .collect()
    }

    /// Converts a single file: capture times, run the tool, check the output,
    /// copy the times over and optionally remove the input.
    pub async fn convert_one(&self, job: &ConversionJob) -> Result<PathBuf, ConvertError> {
        let stamps = FileStamps::capture(&job.input)
            .await
            .map_err(|source| ConvertError::ReadTimestamps {
                path: job.input.clone(),
                source,
            })?;

        self.tool.convert(&job.input, &job.output).await?;

        if !fs::try_exists(&job.output).await.unwrap_or(false) {
            return Err(ConvertError::MissingOutput(job.output.clone()));
        }

        stamps
            .apply(&job.output)
            .await
            .map_err(|source| ConvertError::WriteTimestamps {
                path: job.output.clone(),
                source,
            })?;

        if self.config.remove_input {
            fs::remove_file(&job.input)
                .await
                .map_err(|source| ConvertError::RemoveInput {
                    path: job.input.clone(),
                    source,
                })?;
        }

        Ok(job.output.clone())
    }

    pub async fn run(&self) -> anyhow::Result<BatchReport> {
        let inputs = self.scan().await.with_context(|| {
            format!(
                "failed to list {} files in '{}'",
                self.config.from,
                self.config.input_dir.display()
            )
        })?;
        info!(
            "found {} {} file(s) in {}",
            inputs.len(),
            self.config.from,
            self.config.input_dir.display()
        );

        let jobs = self.plan(inputs);
        let total = jobs.len();
        let mut report = BatchReport::default();

        for (i, job) in jobs.into_iter().enumerate() {
            let outcome = match &job.collides_with {
                Some(first) => self.collision_outcome(&job, first),
                None => match self.convert_one(&job).await {
                    Ok(output) => {
                        if self.config.remove_input {
                            report.inputs_removed += 1;
                        }
                        JobOutcome::Converted { output }
                    }
                    Err(error) => JobOutcome::Failed { error },
                },
            };

            match &outcome {
                JobOutcome::Converted { output } => {
                    info!("processed file: {} -> {}", job.input.display(), output.display())
                }
                JobOutcome::Skipped { reason } => {
                    warn!("skipping {}: {}", job.input.display(), reason)
                }
                JobOutcome::Failed { error } => {
                    error!("error processing file {}: {}", job.input.display(), error)
                }
            }

            let stop = outcome.is_failure() && self.config.fail_fast;
            report.push(job, outcome);
            if stop {
                warn!(
                    "stopping after the first failure, {} file(s) not attempted",
                    total - i - 1
                );
                break;
            }
        }

        Ok(report)
    }

    fn collision_outcome(&self, job: &ConversionJob, first: &Path) -> JobOutcome {
        match self.config.on_collision {
            CollisionPolicy::Skip => JobOutcome::Skipped {
                reason: format!(
                    "{} is already produced from {}",
                    job.output.display(),
                    first.display()
                ),
            },
            CollisionPolicy::Error => JobOutcome::Failed {
                error: ConvertError::Collision {
                    output: job.output.clone(),
                    first: first.to_path_buf(),
                },
            },
        }
    }
}
