mod cli;
mod config;
mod converter;

use std::process::exit;

use clap::Parser;
use cli::Cli;
use converter::tool::{magick_version, Magick};
use converter::Converter;
use env_logger::Env;
use log::{error, info, warn, LevelFilter};

fn logger(env: Env, level: Option<LevelFilter>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_env(env.default_filter_or("imgpress=info"));
    if let Some(level) = level {
        builder.filter_module("imgpress", level);
    }
    builder
}

fn init_logging(level: Option<LevelFilter>) {
    logger(Env::default(), level).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_level);
    info!("starting imgpress");

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };

    let tool = Magick::new(config.tool_program.clone(), config.quality);

    // a missing tool is reported per file, not here
    match magick_version(tool.program()).await {
        Ok(version) => info!("working w/ ImageMagick {}", version),
        Err(e) => warn!(
            "failed to get the version of '{}' -- imgpress requires ImageMagick on the path or MAGICK_BIN ({})",
            tool.program().to_string_lossy(),
            e
        ),
    }

    let converter = Converter::new(config, tool);
    let settings = converter.config();
    info!(
        "converting {} -> {} from {} into {} (quality {}{})",
        settings.from,
        settings.to,
        settings.input_dir.display(),
        settings.output_dir.display(),
        settings.quality,
        if settings.remove_input { ", removing inputs" } else { "" }
    );

    let report = converter.run().await?;
    info!(
        "{} converted, {} skipped, {} failed, {} input(s) removed",
        report.converted(),
        report.skipped(),
        report.failed(),
        report.inputs_removed
    );

    if !report.is_success() {
        println!("Operation failed. See above for errors.");
        exit(1);
    }

    println!("Operation completed successfully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log as _, Metadata};

    fn enabled(logger: &env_logger::Logger, target: &str, level: Level) -> bool {
        logger.enabled(&Metadata::builder().target(target).level(level).build())
    }

    // reads a variable nobody sets, so RUST_LOG in the test environment can't interfere
    fn quiet_env() -> Env<'static> {
        Env::new().filter("IMGPRESS_TEST_LOG_FILTER")
    }

    #[test]
    fn defaults_to_info_for_imgpress_only() {
        let built = logger(quiet_env(), None).build();
        assert!(enabled(&built, "imgpress::converter", Level::Info));
        assert!(!enabled(&built, "imgpress::converter", Level::Debug));
        assert!(!enabled(&built, "tokio::process", Level::Info));
    }

    #[test]
    fn log_level_flag_overrides_the_default_filter() {
        let built = logger(quiet_env(), Some(LevelFilter::Debug)).build();
        assert!(enabled(&built, "imgpress::converter::tool", Level::Debug));
        assert!(!enabled(&built, "imgpress", Level::Trace));
        assert!(!enabled(&built, "tokio::process", Level::Debug));

        let built = logger(quiet_env(), Some(LevelFilter::Error)).build();
        assert!(!enabled(&built, "imgpress", Level::Warn));
        assert!(enabled(&built, "imgpress", Level::Error));
    }
}
