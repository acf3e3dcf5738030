use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::config::{parse_format, parse_quality, CollisionPolicy, Config, SetupError};
use crate::converter::format::ImageFormat;
use crate::converter::tool::{DEFAULT_PROGRAM, DEFAULT_QUALITY};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "imgpress",
    version,
    about = "Batch-convert the images of a directory with ImageMagick",
    long_about = "Converts every image of the source format found directly under --input into \
                  --output, one `magick` invocation per file. Converted files keep the access and \
                  modification times of their source.\n\
                  The tool can be overridden with MAGICK_BIN and the default quality with \
                  IMGPRESS_QUALITY (a .env file is read if present)."
)]
pub struct Cli {
    /// Input directory containing the source images.
    #[arg(long)]
    pub input: PathBuf,
    /// Output directory for the converted images.
    #[arg(long)]
    pub output: PathBuf,
    /// Remove input files after successful processing.
    #[arg(long = "remove_input", alias = "remove-input", default_value_t = false)]
    pub remove_input: bool,
    /// Source format; only files with this extension are converted.
    #[arg(long, default_value = "png", value_parser = parse_format)]
    pub from: ImageFormat,
    /// Destination format.
    #[arg(long, default_value = "webp", value_parser = parse_format)]
    pub to: ImageFormat,
    /// Quality handed to the tool (1-100).
    #[arg(long, value_parser = parse_quality)]
    pub quality: Option<u8>,
    /// Stop at the first failed file instead of continuing with the rest.
    #[arg(long, default_value_t = false)]
    pub fail_fast: bool,
    /// What to do when two inputs would produce the same output file.
    #[arg(long, value_enum, default_value = "skip")]
    pub on_collision: CollisionPolicy,
    /// Log level for imgpress itself; RUST_LOG is used when absent.
    #[arg(long)]
    pub log_level: Option<LevelFilter>,
}

impl Cli {
    /// Folds in the environment and checks the directories.
    pub fn into_config(self) -> Result<Config, SetupError> {
        let config = self.resolve(
            std::env::var("IMGPRESS_QUALITY").ok(),
            std::env::var_os("MAGICK_BIN"),
        )?;
        config.validate()?;
        Ok(config)
    }

    /// `--quality` wins over `env_quality`; an empty `env_bin` means unset.
    fn resolve(
        self,
        env_quality: Option<String>,
        env_bin: Option<OsString>,
    ) -> Result<Config, SetupError> {
        let quality = match (self.quality, env_quality) {
            (Some(q), _) => q,
            (None, Some(q)) => parse_quality(&q)?,
            (None, None) => DEFAULT_QUALITY,
        };
        let tool_program = env_bin
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PROGRAM.into());

        Ok(Config {
            input_dir: self.input,
            output_dir: self.output,
            remove_input: self.remove_input,
            from: self.from,
            to: self.to,
            quality,
            fail_fast: self.fail_fast,
            on_collision: self.on_collision,
            tool_program,
        })
    }
}
