use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use tracing::error;
use zipconv::commands::archive::process_archive;
use zipconv::{CancellationToken, ConversionConfig, ConversionTarget, LogObserver};

/// Convert every image inside a ZIP or 7z archive to one format
#[derive(Parser, Debug)]
#[command(name = "zipconv", version, about)]
struct Cli {
    /// Archive to convert
    input: PathBuf,

    /// Target format: jpeg, png, webp or avif
    #[arg(short, long)]
    format: Option<ConversionTarget>,

    /// Output archive (default: <stem>.<format>.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Per-entry conversion deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// TOML config file; command line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn build_config(cli: &Cli) -> Result<ConversionConfig, String> {
    let mut config = match &cli.config {
        Some(path) => ConversionConfig::load(path)?,
        None => {
            let target = cli.format.ok_or("--format is required without --config")?;
            ConversionConfig::new(target)
        }
    };
    if let Some(target) = cli.format {
        config.target = target;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.entry_timeout_ms = timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = build_config(&cli).and_then(|config| {
        process_archive(
            &cli.input,
            cli.output.as_deref(),
            &config,
            &LogObserver,
            &CancellationToken::new(),
        )
    });

    match result {
        Ok(processed) => {
            match serde_json::to_string_pretty(&processed) {
                Ok(json) => println!("{}", json),
                Err(e) => error!("Failed to render summary: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
