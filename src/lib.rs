use anyhow::Context;
use github_client::{GithubClientBuilder, GithubMetricsClient};
use log::{info, warn};
use repo_roster::roster::{seed_roster, SourceStudent, StudentRecord};
use repo_roster::scheduler::{BatchPacing, BatchScheduler};
use secrecy::SecretString;
use tokio::sync::mpsc::Receiver;

mod args;
pub use args::Args;

/// Seeds the roster file and runs the batch pipeline against the live API.
///
/// Returns the stream of merged roster snapshots; the last received snapshot
/// is the complete result.
pub async fn track_roster(args: Args) -> anyhow::Result<Receiver<Vec<StudentRecord>>> {
    let rows = read_roster(&args)?;
    let seeded = seed_roster(rows, &args.roster_id);
    if !seeded.duplicate_warnings.is_empty() {
        warn!(
            "Dropped duplicate roster rows: {}",
            seeded.duplicate_warnings.join(", ")
        );
    }
    info!("Tracking {} students", seeded.students.len());

    let authenticated = args.api_token.is_some();
    let client = build_client(&args.api_url, args.api_token)?;
    let scheduler = BatchScheduler::new(client, BatchPacing::for_tier(authenticated));
    Ok(scheduler.process_roster(seeded.students, args.loc_mode))
}

pub async fn print_rate_limit(args: Args) -> anyhow::Result<()> {
    let client = build_client(&args.api_url, args.api_token)?;
    let limits = client.rate_limit().await?;
    println!(
        "core: {}/{} remaining (resets at {})",
        limits.core.remaining, limits.core.limit, limits.core.reset
    );
    println!(
        "search: {}/{} remaining (resets at {})",
        limits.search.remaining, limits.search.limit, limits.search.reset
    );
    Ok(())
}

fn read_roster(args: &Args) -> anyhow::Result<Vec<SourceStudent>> {
    let raw = std::fs::read_to_string(&args.roster)
        .with_context(|| format!("Failed to read roster file {}", args.roster.display()))?;
    serde_json::from_str(&raw).context("Roster file is not a JSON array of students")
}

fn build_client(api_url: &str, token: Option<SecretString>) -> anyhow::Result<GithubMetricsClient> {
    let mut builder = GithubClientBuilder::default().with_api_url(api_url);
    if let Some(token) = token {
        builder = builder.try_with_token(token)?;
    }
    Ok(builder.build()?)
}
