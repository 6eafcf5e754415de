use clap::Parser;
use repo_roster::roster::StudentRecord;
use repo_roster_app::{print_rate_limit, track_roster, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let args = Args::parse();

    if args.rate_limit {
        return print_rate_limit(args).await;
    }

    let mut snapshots = track_roster(args).await?;
    let mut latest = Vec::new();
    while let Some(snapshot) = snapshots.recv().await {
        let resolved = snapshot.iter().filter(|row| !row.loading).count();
        eprintln!("{}/{} students resolved", resolved, snapshot.len());
        latest = snapshot;
    }

    for row in &latest {
        println!("{}", format_row(row));
    }
    Ok(())
}

fn format_row(row: &StudentRecord) -> String {
    if let Some(error) = &row.error {
        return format!("{}\tcommits: {}\terror: {}", row.name, row.total_commits, error);
    }
    let last = row
        .recent_commit
        .as_ref()
        .map(|commit| format!("{} {}", commit.sha, commit.date.format("%Y-%m-%d")))
        .unwrap_or_else(|| "-".to_string());
    let lines = row
        .total_lines_of_code
        .map(|lines| lines.to_string())
        .unwrap_or_else(|| "?".to_string());
    format!(
        "{}\tcommits: {}\tlast: {}\tlines: {}",
        row.name, row.total_commits, last, lines
    )
}
