use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod client;
mod config;
mod credentials;
mod error;
mod evaluation;
mod flatten;
mod logging;
mod models;
mod output;
mod prompt;
mod runner;
mod validation;

use crate::client::AzureCompletionClient;
use crate::config::Config;
use crate::credentials::{Credentials, DotEnvStore};
use crate::evaluation::Evaluator;
use crate::output::OutputFormat;
use crate::runner::Runner;

/// Slate health - rate committee slate diversity with a language model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate every slate in a TOML run file
    Evaluate {
        /// Path to the TOML run file
        run_file: PathBuf,

        /// Output format: plain or json
        #[arg(short, long, default_value = "plain")]
        output: OutputFormat,

        /// Verbose output - debug logging mirrored to stderr
        #[arg(short, long)]
        verbose: bool,
    },
    /// Save completion service credentials to the key-value store
    SetCredentials {
        /// Azure OpenAI API key
        #[arg(long)]
        api_key: String,

        /// Azure OpenAI deployment name
        #[arg(long)]
        deployment: String,

        /// Azure OpenAI endpoint URL
        #[arg(long)]
        endpoint: String,

        /// Credentials file to update
        #[arg(long, default_value = ".env")]
        credentials_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Evaluate {
            run_file,
            output,
            verbose,
        } => {
            let config = Config::from_file(&run_file)?;
            logging::init(&config.service.log_path, verbose)?;

            let store = DotEnvStore::load(&config.service.credentials_path)?;
            let credentials = Credentials::from_provider(&store)?;
            let client = AzureCompletionClient::new(
                &credentials,
                &config.service.api_version,
                config.service.timeout(),
            );

            let runner = Runner::new(config, Evaluator::new(client));
            let reports = runner.run_slates().await?;

            output::print_results(&reports, output);
        }
        Command::SetCredentials {
            api_key,
            deployment,
            endpoint,
            credentials_path,
        } => {
            let mut store = DotEnvStore::load(&credentials_path)?;
            store.store(&api_key, &deployment, &endpoint)?;
            println!("Credentials saved to: {}", credentials_path.display());
        }
    }

    Ok(())
}
