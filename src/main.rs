use anyhow::Result;
use clap::Parser;
use regex::Regex;
use token_provenance::address;
use token_provenance::analyzer::Analyzer;
use token_provenance::chain::{ChainId, resolve_chain};
use token_provenance::config::Config;
use token_provenance::report::{OutputFormat, format_report};
use tracing::info;

#[derive(Parser)]
#[command(name = "provenance")]
#[command(about = "Trace where an EVM token came from and who is behind it", long_about = None)]
struct Cli {
    /// Text containing the token contract address (0x + 40 hex digits);
    /// the first match is analyzed.
    input: Vec<String>,

    #[arg(short, long, default_value = "text")]
    format: String,

    /// Analyze on a specific chain instead of the resolver's choice.
    #[arg(long)]
    chain: Option<ChainId>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let text = cli.input.join(" ");
    let pattern = Regex::new(r"0x[0-9a-fA-F]{40}")?;
    let Some(candidate) = pattern.find(&text) else {
        anyhow::bail!(
            "no contract address found in input (expected 0x followed by 40 hex characters)"
        );
    };

    let token = address::validate(candidate.as_str())?;
    let chain = cli.chain.unwrap_or_else(|| resolve_chain(token));

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!(
        "Chains: {} configured, probe table: {} platform(s)",
        config.chains.len(),
        config.platforms.len()
    );

    let analyzer = Analyzer::from_config(&config)?;
    let analysis = analyzer.analyze_on(token, chain).await;

    println!("{}", format_report(&analysis, &format));

    Ok(())
}
