use std::path::{Path, PathBuf};

use super::format::ImageFormat;
use super::ConvertError;

/// One input file paired with the output it will be converted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Set when an earlier job in the same batch already claimed `output`.
    pub collides_with: Option<PathBuf>,
}

impl ConversionJob {
    pub fn new(input: PathBuf, output_dir: &Path, to: ImageFormat) -> Self {
        let output = output_path(&input, output_dir, to);
        Self {
            input,
            output,
            collides_with: None,
        }
    }
}

pub fn output_path(input: &Path, output_dir: &Path, to: ImageFormat) -> PathBuf {
    // `with_extension` would eat the last dotted part of stems like "v1.2"
    let mut name = input
        .file_stem()
        .unwrap_or_else(|| input.as_os_str())
        .to_os_string();
    name.push(".");
    name.push(to.extension());
    output_dir.join(name)
}

#[derive(Debug)]
pub enum JobOutcome {
    Converted { output: PathBuf },
    Skipped { reason: String },
    Failed { error: ConvertError },
}

impl JobOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, JobOutcome::Failed { .. })
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub entries: Vec<(ConversionJob, JobOutcome)>,
    pub inputs_removed: usize,
}

impl BatchReport {
    pub fn push(&mut self, job: ConversionJob, outcome: JobOutcome) {
        self.entries.push((job, outcome));
    }

    pub fn converted(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Converted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(JobOutcome::is_failure)
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, pred: impl Fn(&JobOutcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| pred(o)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_keeps_stem_and_swaps_extension() {
        let job = ConversionJob::new("in/a.png".into(), Path::new("out"), ImageFormat::WebP);
        assert_eq!(job.output, PathBuf::from("out/a.webp"));

        let job = ConversionJob::new("in/v1.2.png".into(), Path::new("out"), ImageFormat::Jpeg);
        assert_eq!(job.output, PathBuf::from("out/v1.2.jpg"));
    }

    #[test]
    fn report_counts_by_outcome() {
        let job = ConversionJob::new("a.png".into(), Path::new("out"), ImageFormat::WebP);
        let mut report = BatchReport::default();
        assert!(report.is_success());

        report.push(
            job.clone(),
            JobOutcome::Converted {
                output: job.output.clone(),
            },
        );
        report.push(
            job.clone(),
            JobOutcome::Skipped {
                reason: "duplicate".to_string(),
            },
        );
        assert!(report.is_success());

        report.push(
            job.clone(),
            JobOutcome::Failed {
                error: ConvertError::MissingOutput(job.output.clone()),
            },
        );
        assert_eq!(report.converted(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }
}
