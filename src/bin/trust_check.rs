//! Command-line front-end for company trust analyses.
//!
//! With `--name` it runs a single analysis and prints the report. Without it,
//! it reads `name[|cin[|website]]` lines from stdin (`|` because company names
//! often contain commas). Every line is submitted
//! right away and only the newest submission's result is printed.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trust_gateway::analysis_client::AnalysisClient;
use trust_gateway::config::validate_engine_url;
use trust_gateway::models::CompanyInput;
use trust_gateway::report::ReportView;
use trust_gateway::session::{AnalysisSession, SessionState, Ticket};
use trust_gateway::tier_policy::TrustTierPolicy;

#[derive(Parser, Debug)]
#[command(name = "trust-check", version, about = "Check a company's legitimacy")]
struct Cli {
    /// Analyze endpoint (the gateway's /api/analyze or the engine directly)
    #[arg(
        long,
        env = "TRUST_CHECK_ENDPOINT",
        default_value = "http://127.0.0.1:3000/api/analyze"
    )]
    endpoint: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "ANALYSIS_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Scores strictly above this are HIGH when the engine omits a tier
    #[arg(long, env = "TRUST_TIER_HIGH_ABOVE", default_value_t = 80.0)]
    high_above: f64,

    /// Scores strictly below this are LOW when the engine omits a tier
    #[arg(long, env = "TRUST_TIER_LOW_BELOW", default_value_t = 40.0)]
    low_below: f64,

    /// Company name; omit to read companies from stdin
    #[arg(long)]
    name: Option<String>,

    /// Corporate Identification Number
    #[arg(long)]
    cin: Option<String>,

    /// Company website
    #[arg(long)]
    website: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trust_gateway=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    validate_engine_url(&cli.endpoint)?;
    if cli.timeout_secs == 0 {
        anyhow::bail!("--timeout-secs must be greater than zero");
    }

    let policy = TrustTierPolicy::new(cli.high_above, cli.low_below)?;
    let client = AnalysisClient::new(cli.endpoint.clone(), Duration::from_secs(cli.timeout_secs))?;

    match cli.name {
        Some(name) => {
            let mut input = CompanyInput::new(name);
            if let Some(cin) = cli.cin {
                input = input.with_cin(cin);
            }
            if let Some(website) = cli.website {
                input = input.with_website(website);
            }
            run_once(&client, &policy, &input).await
        }
        None => run_interactive(client, policy).await,
    }
}

async fn run_once(
    client: &AnalysisClient,
    policy: &TrustTierPolicy,
    input: &CompanyInput,
) -> anyhow::Result<()> {
    warn_website(input);
    eprintln!("Analyzing {} via {}...", input.name, client.endpoint());
    match client.analyze(input).await {
        Ok(analysis) => {
            println!("{}", ReportView::from_analysis(&analysis, policy));
            Ok(())
        }
        Err(e) => anyhow::bail!("Analysis failed: {}", e),
    }
}

async fn run_interactive(client: AnalysisClient, policy: TrustTierPolicy) -> anyhow::Result<()> {
    let client = Arc::new(client);
    let session = Arc::new(AnalysisSession::new(policy));
    let mut in_flight = JoinSet::new();

    eprintln!("Enter one company per line as name[|cin[|website]] (Ctrl-D to finish)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(input) = parse_line(&line) else {
            continue;
        };

        warn_website(&input);
        let ticket = session.submit();
        eprintln!("[#{}] Analyzing {}...", ticket.seq(), input.name);

        let client = Arc::clone(&client);
        let session = Arc::clone(&session);
        in_flight.spawn(async move {
            let outcome = client.analyze(&input).await;
            if session.resolve(ticket, outcome) {
                print_state(ticket, &session.state());
            }
        });
    }

    while in_flight.join_next().await.is_some() {}
    Ok(())
}

fn print_state(ticket: Ticket, state: &SessionState) {
    match state {
        SessionState::Success(_, view) => println!("[#{}]\n{}\n", ticket.seq(), view),
        SessionState::Failed(_, message) => {
            println!("[#{}] Analysis failed: {}\n", ticket.seq(), message)
        }
        SessionState::Idle | SessionState::Submitting(_) => {}
    }
}

fn warn_website(input: &CompanyInput) {
    if let Some(issue) = input.website_issue() {
        tracing::warn!("{}", issue);
        eprintln!("Warning: {} (sending anyway)", issue);
    }
}

/// `name[|cin[|website]]`; blank lines are skipped.
fn parse_line(line: &str) -> Option<CompanyInput> {
    let mut parts = line.splitn(3, '|').map(str::trim);
    let name = parts.next().filter(|n| !n.is_empty())?;

    let mut input = CompanyInput::new(name);
    if let Some(cin) = parts.next() {
        input = input.with_cin(cin);
    }
    if let Some(website) = parts.next() {
        input = input.with_website(website);
    }
    Some(input)
}
