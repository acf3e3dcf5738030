use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Stdio;

use anyhow::anyhow;
use log::debug;
use tokio::process::Command;

use super::ConvertError;

pub const DEFAULT_PROGRAM: &str = "magick";
pub const DEFAULT_QUALITY: u8 = 75;

pub trait ImageTool {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError>;
}

pub struct Magick {
    program: OsString,
    quality: u8,
}

impl Magick {
    pub fn new(program: impl Into<OsString>, quality: u8) -> Self {
        Self {
            program: program.into(),
            quality,
        }
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-quality".into(),
            self.quality.to_string().into(),
            input.into(),
            output.into(),
        ]
    }
}

impl ImageTool for Magick {
    async fn convert(&self, input: &Path, output: &Path) -> Result<(), ConvertError> {
        let args = self.args(input, output);
        let program = self.program.to_string_lossy().into_owned();

        debug!(
            "running '{} {}'",
            program,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ConvertError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(ConvertError::ToolFailed {
                program,
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Asks the tool for its version, e.g. "7.1.1-29" out of
/// "Version: ImageMagick 7.1.1-29 Q16-HDRI x86_64 ...".
pub async fn magick_version(program: &OsStr) -> anyhow::Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .await?;
    if !output.status.success() {
        anyhow::bail!("'{} -version' exited with {}", program.to_string_lossy(), output.status);
    }
    let version = String::from_utf8(output.stdout)?;
    parse_version(&version)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("failed to get version from output: {:?}", version.lines().next()))
}

fn parse_version(output: &str) -> Option<&str> {
    output.split_whitespace().nth(2)
}
