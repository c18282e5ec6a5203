use anyhow::Result;
use awsauth_core::{Config, Env};
use clap::Parser;
use tracing::{debug, info, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod error;
mod output;

use cli::{Cli, Commands};
use error::AwsAuthError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<(), AwsAuthError> {
    trace!("Executing command: {:?}", cli.command);

    match &cli.command {
        Commands::Version => {
            debug!("Showing version information");
            print_version(cli.output)
        }
        Commands::Arn { arn } => commands::arn::handle_arn(arn, cli.output),
        Commands::Credentials => {
            let (config, env) = load_config(cli)?;
            commands::credentials::handle_credentials(&config, &env, cli.output).await
        }
        Commands::Whoami {
            skip_account_lookup,
        } => {
            let (config, env) = load_config(cli)?;
            commands::whoami::handle_whoami(&config, &env, *skip_account_lookup, cli.output).await
        }
    }
}

fn print_version(format: cli::OutputFormat) -> Result<(), AwsAuthError> {
    match format {
        cli::OutputFormat::Json | cli::OutputFormat::Yaml => {
            let output_data = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "name": env!("CARGO_PKG_NAME"),
            });
            output::print_output(&output_data, format)?;
        }
        cli::OutputFormat::Text => {
            println!("awsauth {}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}

/// Load the config file and layer command-line flags and the process
/// environment on top. This is the only place the real environment is read.
fn load_config(cli: &Cli) -> Result<(Config, Env), AwsAuthError> {
    let mut config = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        Config::load_from_path(&path)?
    } else {
        debug!("Loading config from default location");
        Config::load()?
    };

    if let Some(profile) = &cli.profile {
        config.profile = Some(profile.clone());
    }
    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if let Some(path) = &cli.shared_credentials_file {
        config.shared_credentials_file = Some(path.clone());
    }
    if let Some(url) = &cli.metadata_url {
        config.metadata_url = Some(url.clone());
    }
    if let Some(secs) = cli.identity_timeout {
        config.identity_timeout_secs = Some(secs);
    }
    config.skip_metadata_api_check |= cli.skip_metadata_api_check;

    let env = Env::real();
    config.apply_env(&env);
    config.validate()?;

    info!(
        region = %config.region,
        metadata_url = config.metadata_url(),
        "Configuration loaded"
    );
    Ok((config, env))
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "awsauth=warn,awsauth_core=warn",
            1 => "awsauth=info,awsauth_core=info",
            2 => "awsauth=debug,awsauth_core=debug",
            _ => "awsauth=trace,awsauth_core=trace,aws_sdk_iam=debug,aws_sdk_sts=debug",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}
