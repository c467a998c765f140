//! `strata`: compress, decompress, and inspect persisted blobs.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use strata_config::{CliArgs, Config, default_config_dir};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Inspect and convert strata compressed blobs")]
struct Cli {
    #[command(flatten)]
    global: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress a file into the chunked blob format.
    Compress {
        input: PathBuf,
        output: PathBuf,
        /// zlib level, overriding the config and `--compression-level`.
        #[arg(long, allow_negative_numbers = true)]
        level: Option<i32>,
    },
    /// Decompress a chunked or legacy blob.
    Decompress { input: PathBuf, output: PathBuf },
    /// Print a blob's framing without decompressing it.
    Inspect { blob: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_dir = cli.global.config.clone().or_else(default_config_dir);
    let mut config = match config_dir.as_deref() {
        Some(dir) => Config::load_or_create(dir).unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}, using defaults");
            Config::default()
        }),
        None => Config::default(),
    };
    config.apply_cli_overrides(&cli.global);

    let log_dir = config_dir.map(|dir| dir.join("logs"));
    strata_log::init_logging(log_dir.as_deref(), cfg!(debug_assertions), Some(&config));

    let result = match cli.command {
        Command::Compress {
            input,
            output,
            level,
        } => commands::compress_file(&input, &output, &config.compression, level).map(|report| {
            info!(
                "Compressed {} bytes into {} bytes ({})",
                report.input_len,
                report.output_len,
                output.display()
            );
        }),
        Command::Decompress { input, output } => {
            commands::decompress_file(&input, &output).map(|report| {
                info!(
                    "Decompressed {} bytes into {} bytes ({})",
                    report.input_len,
                    report.output_len,
                    output.display()
                );
            })
        }
        Command::Inspect { blob } => commands::inspect_file(&blob).map(|description| {
            println!("{description}");
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("strata: {e}");
            ExitCode::FAILURE
        }
    }
}
