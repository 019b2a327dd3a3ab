//! Attach regional games to group members via the platform API.
use clap::{Parser, ValueEnum};
use envconfig::Envconfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use attach_worker::client::ApiClient;
use attach_worker::config::Config;
use attach_worker::error::RunError;
use attach_worker::pipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Job {
    /// Process every regional game.
    Cron,
    /// Process only the users of one group.
    Group,
}

#[derive(Debug, Parser)]
#[command(about = "Attach regional games to group members via the platform API")]
struct Args {
    /// Base API URI.
    #[arg(long, env = "API_URI")]
    uri: String,

    /// Which job to run.
    #[arg(long, value_enum, default_value_t = Job::Cron)]
    job: Job,

    /// Group id to process when running a group job.
    #[arg(long)]
    group: Option<String>,

    /// Turn on debug logging.
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), RunError> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::init_from_env().expect("cannot make api requests with missing options");
    let client = ApiClient::new(
        &args.uri,
        &config.api_user,
        &config.api_pass,
        config.request_timeout.0,
    )?;

    match args.job {
        Job::Cron => {
            info!("processing cron for all games");
            pipeline::run_cron(&client).await?;
        }
        Job::Group => {
            let Some(group_id) = args.group.as_deref() else {
                error!("no group id supplied for a group job");
                return Err(RunError::MissingGroup);
            };
            info!("processing all games for group {}", group_id);
            pipeline::run_group(&client, group_id).await?;
        }
    }

    Ok(())
}
