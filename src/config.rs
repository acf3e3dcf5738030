use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::converter::format::ImageFormat;

/// What to do with an input whose output name was already claimed earlier in
/// the same batch, e.g. `a.png` next to `a.PNG`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CollisionPolicy {
    /// Leave the later input alone and report it as skipped.
    Skip,
    /// Report the later input as a failed conversion.
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("'{0}' does not exist")]
    NotFound(PathBuf),
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),
    #[error("unknown image format: {0}. supported: {1}")]
    UnknownFormat(String, String),
    #[error("invalid quality {0}: expected a number from 1 to 100")]
    InvalidQuality(String),
    #[error("input and output are both {0} files in '{1}'; converting would overwrite the inputs")]
    SameLocation(ImageFormat, PathBuf),
    #[error("failed to inspect '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Everything one run needs. Built once from the command line and passed down.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub remove_input: bool,
    pub from: ImageFormat,
    pub to: ImageFormat,
    pub quality: u8,
    pub fail_fast: bool,
    pub on_collision: CollisionPolicy,
    pub tool_program: OsString,
}

impl Config {
    /// Checks that both directories exist before any conversion starts.
    pub fn validate(&self) -> Result<(), SetupError> {
        ensure_dir(&self.input_dir)?;
        ensure_dir(&self.output_dir)?;
        if !(1..=100).contains(&self.quality) {
            return Err(SetupError::InvalidQuality(self.quality.to_string()));
        }
        if self.from == self.to {
            let input = canonical(&self.input_dir)?;
            if input == canonical(&self.output_dir)? {
                return Err(SetupError::SameLocation(self.from, input));
            }
        }
        Ok(())
    }
}

pub fn parse_format(s: &str) -> Result<ImageFormat, SetupError> {
    ImageFormat::from_extension(s)
        .ok_or_else(|| SetupError::UnknownFormat(s.to_string(), ImageFormat::supported()))
}

pub fn parse_quality(s: &str) -> Result<u8, SetupError> {
    match s.trim().parse::<u8>() {
        Ok(q) if (1..=100).contains(&q) => Ok(q),
        _ => Err(SetupError::InvalidQuality(s.to_string())),
    }
}

fn ensure_dir(path: &Path) -> Result<(), SetupError> {
    if !path.exists() {
        return Err(SetupError::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(SetupError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

fn canonical(path: &Path) -> Result<PathBuf, SetupError> {
    path.canonicalize()
        .map_err(|e| SetupError::Io(path.to_path_buf(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(input: &Path, output: &Path) -> Config {
        Config {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            remove_input: false,
            from: ImageFormat::Png,
            to: ImageFormat::WebP,
            quality: 75,
            fail_fast: false,
            on_collision: CollisionPolicy::Skip,
            tool_program: "magick".into(),
        }
    }

    #[test]
    fn accepts_existing_directories() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        config(input.path(), output.path()).validate().unwrap();
    }

    #[test]
    fn rejects_missing_and_non_directories() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let file = dir.path().join("file.png");
        std::fs::write(&file, b"").unwrap();

        let err = config(&missing, dir.path()).validate().unwrap_err();
        assert!(matches!(err, SetupError::NotFound(_)));

        let err = config(dir.path(), &file).validate().unwrap_err();
        assert!(matches!(err, SetupError::NotADirectory(_)));
    }

    #[test]
    fn rejects_converting_in_place_to_the_same_format() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(dir.path(), dir.path());
        cfg.validate().unwrap();

        cfg.to = ImageFormat::Png;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, SetupError::SameLocation(ImageFormat::Png, _)));
    }

    #[test]
    fn parses_formats_and_quality() {
        assert_eq!(parse_format("JPG").unwrap(), ImageFormat::Jpeg);
        assert!(matches!(parse_format("psd"), Err(SetupError::UnknownFormat(..))));

        assert_eq!(parse_quality("90").unwrap(), 90);
        assert!(parse_quality("0").is_err());
        assert!(parse_quality("101").is_err());
        assert!(parse_quality("high").is_err());
    }
}
