mod app;
mod commands;
mod redmine;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};

use app::App;
use commands::book::Booking;
use commands::edit::Changes;
use commands::new::NewEntry;

#[derive(Parser)]
#[command(name = "redcal")]
#[command(about = "Book calendar appointments as Redmine time entries")]
struct Cli {
    /// Show all appointments and log engine activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration paths and connection settings
    Config,
    /// Set the Redmine URL and API key
    Login {
        /// Redmine base URL (e.g. "https://redmine.example.com")
        #[arg(long)]
        url: Option<String>,
    },
    /// Show appointments waiting to be pushed
    Status,
    /// Show appointments in a date range
    List {
        /// First day (YYYY-MM-DD or e.g. "last monday")
        #[arg(long)]
        from: Option<String>,

        /// Last day
        #[arg(long)]
        to: Option<String>,
    },
    /// Push local changes to Redmine
    Push {
        /// Do not ask before deleting time entries
        #[arg(short, long)]
        yes: bool,
    },
    /// Discard local changes and reload time entries from Redmine
    Revert {
        /// First day, defaults to the earliest pending appointment
        #[arg(long)]
        from: Option<String>,

        /// Last day, defaults to the latest pending appointment
        #[arg(long)]
        to: Option<String>,

        #[arg(short, long)]
        yes: bool,
    },
    /// Create an appointment
    New {
        subject: Option<String>,

        /// Start date/time (e.g. "today 9am", "2024-05-06 13:15")
        #[arg(short, long)]
        start: Option<String>,

        /// End time or duration (e.g. "17:00", "90m")
        #[arg(short, long, conflicts_with = "duration")]
        end: Option<String>,

        /// Duration (e.g. "1h 30m")
        #[arg(short, long)]
        duration: Option<String>,

        /// Redmine issue id; otherwise taken from "#123" in the subject
        #[arg(short, long)]
        issue: Option<i64>,
    },
    /// Change an appointment
    Edit {
        /// Appointment id (or a unique prefix)
        id: String,

        #[arg(long)]
        subject: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(short, long)]
        issue: Option<i64>,

        #[arg(short, long)]
        activity: Option<i64>,
    },
    /// Delete an appointment
    Delete {
        /// Appointment id (or a unique prefix)
        id: String,
    },
    /// Book the same slot on every day of a range
    Book {
        /// Redmine issue id
        #[arg(short, long)]
        issue: i64,

        /// Subject of the appointments
        description: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Daily start time (e.g. "08:00")
        #[arg(long)]
        start_time: String,

        /// Daily end time (e.g. "09:00")
        #[arg(long)]
        end_time: String,

        /// Also book Saturdays and Sundays
        #[arg(long)]
        weekends: bool,
    },
    /// Show favorite and last used issues
    Issues {
        /// Search known issues by name or id
        search: Option<String>,

        /// Replace the favorite issues
        #[arg(long, value_delimiter = ',')]
        favorites: Option<Vec<i64>>,
    },
    /// Show time entry activities
    Activities,
    /// Open an issue or project in the browser
    Open {
        issue: Option<i64>,

        #[arg(short, long)]
        project: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { "info" } else { "warn" })?;

    match cli.command {
        Commands::Config => commands::config::run(),
        Commands::Login { url } => commands::login::run(url).await,
        Commands::Status => commands::status::run(&App::open()?, cli.verbose),
        Commands::List { from, to } => commands::list::run(&App::open()?, from, to, cli.verbose),
        Commands::Push { yes } => commands::push::run(&App::open()?, yes, cli.verbose).await,
        Commands::Revert { from, to, yes } => {
            commands::revert::run(&App::open()?, from, to, yes).await
        }
        Commands::New {
            subject,
            start,
            end,
            duration,
            issue,
        } => {
            let entry = NewEntry {
                subject,
                start,
                end,
                duration,
                issue,
            };
            commands::new::run(&App::open()?, entry).await
        }
        Commands::Edit {
            id,
            subject,
            start,
            end,
            issue,
            activity,
        } => {
            let changes = Changes {
                subject,
                start,
                end,
                issue,
                activity,
            };
            commands::edit::run(&App::open()?, &id, changes).await
        }
        Commands::Delete { id } => commands::delete::run(&App::open()?, &id),
        Commands::Book {
            issue,
            description,
            from,
            to,
            start_time,
            end_time,
            weekends,
        } => {
            let booking = Booking {
                issue,
                description,
                from,
                to,
                start_time,
                end_time,
                weekends,
            };
            commands::book::run(&App::open()?, booking).await
        }
        Commands::Issues { search, favorites } => {
            commands::issues::run(&App::open()?, search, favorites).await
        }
        Commands::Activities => commands::issues::run_activities(&App::open()?).await,
        Commands::Open { issue, project } => {
            commands::open::run(&App::open()?, issue, project).await
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}
