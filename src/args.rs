use clap::Parser;
use repo_roster::api::LocMode;
use secrecy::SecretString;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the roster file (a JSON array of students)
    #[clap(short, long, env)]
    pub roster: PathBuf,

    /// Roster identifier, used for positional runtime ids of rows without
    /// natural identity fields
    #[clap(long, env, default_value = "roster")]
    pub roster_id: String,

    /// API OAuth access token
    #[clap(short, long, env)]
    pub api_token: Option<SecretString>,

    /// Repository API URL
    #[clap(long, env, default_value = "https://api.github.com")]
    pub api_url: String,

    /// Lines-of-code fetch mode: "loc" includes the estimate, "noloc" skips it
    #[clap(short, long, env, default_value = "loc")]
    pub loc_mode: LocMode,

    /// Print the current API quota and exit
    #[clap(long)]
    pub rate_limit: bool,
}
