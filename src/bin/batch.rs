//! Relay every query in a file and print one JSON outcome per line.
//! Run with: cargo run --bin secura-batch -- queries.txt

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use secura_relay::batch::{load_queries, run_batch};
use secura_relay::config::RelayConfig;
use secura_relay::llm::CompletionClient;
use secura_relay::start_relay::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "secura-batch")]
#[command(version, about = "Relay a file of queries to the chat completion API", long_about = None)]
struct Cli {
    /// Query file: a JSON array (`.json`) or one query per line
    path: PathBuf,
    /// Model for queries that do not name one
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = RelayConfig::from_env().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    let mut queries = load_queries(&cli.path)
        .with_context(|| format!("loading {}", cli.path.display()))?;
    if let Some(model) = &cli.model {
        for query in queries.iter_mut().filter(|q| q.model.is_none()) {
            query.model = Some(model.clone());
        }
    }

    let client = CompletionClient::new(&config.completion).context("building completion client")?;
    if !client.has_api_key() {
        bail!("GROQ_API_KEY is not set");
    }

    let outcomes = run_batch(&client, &queries).await;
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }

    let failed = outcomes.iter().filter(|o| !o.success).count();
    if failed > 0 {
        tracing::warn!(failed, "some queries failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_path_and_model() {
        let cli = Cli::try_parse_from(["secura-batch", "queries.json", "--model", "m1"]);
        let cli = cli.ok();
        assert_eq!(
            cli.as_ref().map(|c| c.path.clone()),
            Some(PathBuf::from("queries.json"))
        );
        assert_eq!(cli.and_then(|c| c.model).as_deref(), Some("m1"));
    }

    #[test]
    fn test_help_is_not_a_path() {
        let err = Cli::try_parse_from(["secura-batch", "--help"]).err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::DisplayHelp));
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let err = Cli::try_parse_from(["secura-batch"]).err();
        assert_eq!(
            err.map(|e| e.kind()),
            Some(ErrorKind::MissingRequiredArgument)
        );
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
