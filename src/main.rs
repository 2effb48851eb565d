use chrono::Utc;
use clap::{Parser, Subcommand};
use glamr_ingest::digest::LogEmailSender;
use glamr_ingest::webfinger::WebfingerClient;
use glamr_ingest::{
    drain_queue, run_announcement_sweep, send_weekly_digest, Config, FeedFetcher, FetchConfig,
    HttpStatusApi, IngestionEngine, PgStore, SourceKinds,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "glamr-ingest", about = "GLAMR directory ingestion and announcement jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll every active feed for new posts and editions.
    CheckFeeds {
        /// Only check blog feeds.
        #[arg(long, conflicts_with = "newsletters")]
        blogs: bool,
        /// Only check newsletter feeds.
        #[arg(long)]
        newsletters: bool,
    },
    /// Queue welcome announcements for new listings and reminders for
    /// upcoming events and open CFPs.
    QueueAnnouncements,
    /// Publish the oldest queued announcement to the status API.
    Announce,
    /// Send the weekly digest email to confirmed subscribers.
    SendWeeklyEmail,
    /// Resolve the follow link for a fediverse account handle.
    ResolveFollow {
        /// Handle in the form @user@domain.tld.
        handle: String,
    },
}

// Per-source and per-announcement failures are logged and absorbed inside the
// jobs; only setup errors (bad config, unreachable database) exit non-zero.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    // resolve-follow is a pure webfinger lookup; only the job arms connect.
    match cli.command {
        Command::CheckFeeds { blogs, newsletters } => {
            let kinds = match (blogs, newsletters) {
                (true, false) => SourceKinds::Blogs,
                (false, true) => SourceKinds::Newsletters,
                _ => SourceKinds::Both,
            };
            let store = PgStore::connect(&config.database_url).await?;
            let fetcher = FeedFetcher::new(&FetchConfig::new(&config.user_agent))?;
            let engine = IngestionEngine::new(&store, &fetcher);
            let summary = engine.run_pass(kinds, Utc::now()).await?;
            info!(
                "checked {} feeds, ingested {} entries",
                summary.sources_checked, summary.entries_ingested
            );
        }
        Command::QueueAnnouncements => {
            let store = PgStore::connect(&config.database_url).await?;
            run_announcement_sweep(&store, Utc::now()).await?;
        }
        Command::Announce => {
            let api = HttpStatusApi::new(config.require_status_api()?, &config.user_agent)?;
            let store = PgStore::connect(&config.database_url).await?;
            drain_queue(&store, &api).await?;
        }
        Command::SendWeeklyEmail => {
            let store = PgStore::connect(&config.database_url).await?;
            let sent = send_weekly_digest(&store, &LogEmailSender, Utc::now()).await?;
            info!("digest handed off for {} subscribers", sent);
        }
        Command::ResolveFollow { handle } => {
            let client =
                WebfingerClient::new(&FetchConfig::new(&config.user_agent), &config.service_account)?;
            match client.subscribe_uri(&handle).await? {
                Some(uri) => println!("{uri}"),
                None => info!("{handle} does not expose a subscribe link"),
            }
        }
    }

    Ok(())
}
