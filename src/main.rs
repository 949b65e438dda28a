use clap::Parser;
use radarmatch::cli::{Cli, Commands};
use radarmatch::types::config::Config;
use radarmatch::RadarResult;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> RadarResult<()> {
    let cli = Cli::parse();

    // Load configuration first (no logging yet)
    let config = if cli.config.exists() {
        Config::load(&cli.config).unwrap_or_else(|_| Config::default_config())
    } else {
        Config::default_config()
    };

    // CLI flags take precedence over config
    let log_level = if cli.quiet {
        "error".to_string()
    } else if cli.verbose {
        "debug".to_string()
    } else {
        config.general.log_level.clone()
    };

    let filter = EnvFilter::from_default_env().add_directive(
        format!("radarmatch={}", log_level)
            .parse()
            .unwrap_or_else(|_| "radarmatch=info".parse().expect("fallback directive is valid")),
    );

    if config.general.log_format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }

    tracing::debug!("Configuration loaded from: {}", cli.config.display());

    match cli.command {
        Commands::Init { path } => {
            radarmatch::cli::commands::init(path).await?;
        }
        Commands::Validate { files, json } => {
            radarmatch::cli::commands::validate(&files, json, &config).await?;
        }
        Commands::Render {
            file,
            output,
            strategy,
        } => {
            radarmatch::cli::commands::render(&file, &output, strategy, &config).await?;
        }
        #[cfg(feature = "sqlite")]
        Commands::Repair { db } => {
            radarmatch::cli::commands::repair(db, &config).await?;
        }
        Commands::Version => {
            radarmatch::cli::commands::version();
        }
    }

    Ok(())
}
