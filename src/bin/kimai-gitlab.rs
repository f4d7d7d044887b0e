use clap::{Parser, Subcommand, ValueEnum};
use kimai_gitlab::{
    KimaiGitlab, SettingsProvider, SyncOutcome, SyncReport, SyncStatus, TimesheetEntry,
    TimesheetEvent,
};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "kimai-gitlab", about = "Sync Kimai timesheets to GitLab issue timelogs")]
struct Cli {
    /// Database path (default: ~/.kimai-gitlab/kimai-gitlab.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Progress reporter that writes to stderr.
struct StderrProgress;

impl kimai_gitlab::SyncProgress for StderrProgress {
    fn on_entry_start(&self, timesheet_id: i64, index: usize, total: usize) {
        eprintln!("[{}/{}] Syncing timesheet {}...", index + 1, total, timesheet_id);
    }

    fn on_entry_complete(&self, report: &SyncReport) {
        match (&report.status, &report.outcome) {
            (SyncStatus::Failed, _) => eprintln!(
                "  Failed: {}",
                report.error.as_deref().unwrap_or("unknown error")
            ),
            (_, Some(outcome)) => eprintln!("  {}", describe(outcome)),
            (_, None) => {}
        }
    }
}

fn describe(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Skipped { reason } => format!("Skipped ({reason:?})"),
        SyncOutcome::Unchanged { timelog_id } => format!("Up to date: {timelog_id}"),
        SyncOutcome::Applied { deleted, created } => {
            let mut parts = Vec::new();
            if !deleted.is_empty() {
                parts.push(format!("deleted {}", deleted.join(", ")));
            }
            if let Some(id) = created {
                parts.push(format!("created {id}"));
            }
            if parts.is_empty() {
                "Nothing to do".to_string()
            } else {
                format!("Done: {}", parts.join("; "))
            }
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile timesheet entries from a JSON file with GitLab
    Sync {
        /// File with one timesheet entry object or an array of them
        file: String,
        /// Lifecycle event to dispatch
        #[arg(long, value_enum, default_value = "updated")]
        event: EventKind,
        /// Output reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the GitLab issue reference found in a text
    Extract {
        text: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage per-user GitLab access tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Show configuration status
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum EventKind {
    Created,
    Updated,
    Stopped,
    Delete,
    BulkUpdate,
    BulkDelete,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// Remove a config value
    Unset { key: String },
    /// List all config values
    List,
}

#[derive(Subcommand)]
enum TokenAction {
    /// Store the GitLab access token of a Kimai user
    Set { user: String, token: String },
    /// Remove the GitLab access token of a Kimai user
    Remove { user: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryFile {
    Many(Vec<TimesheetEntry>),
    One(Box<TimesheetEntry>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => kimai_gitlab::Database::open_at(path).await?,
        None => kimai_gitlab::Database::open().await?,
    };
    let app = KimaiGitlab::new(db, reqwest::Client::new());

    match cli.command {
        Commands::Sync { file, event, json } => {
            let failed = handle_sync(&app, &file, event, json).await?;
            if failed > 0 {
                anyhow::bail!("{failed} timesheet(s) failed to sync");
            }
        }
        Commands::Extract { text, json } => {
            let found = app.extract(&text).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else {
                println!(
                    "project: {}",
                    found.project_path.as_deref().unwrap_or("(none)")
                );
                match found.issue_id {
                    Some(id) => println!("issue:   #{id}"),
                    None => println!("issue:   (none)"),
                }
            }
        }
        Commands::Config { action } => {
            handle_config(&app, action).await?;
        }
        Commands::Token { action } => {
            handle_token(&app, action).await?;
        }
        Commands::Status => {
            print_status(&app).await?;
        }
    }

    Ok(())
}

async fn handle_sync(
    app: &KimaiGitlab,
    file: &str,
    kind: EventKind,
    json: bool,
) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(file)?;
    let entries = match serde_json::from_str::<EntryFile>(&raw)? {
        EntryFile::Many(entries) => entries,
        EntryFile::One(entry) => vec![*entry],
    };

    let event = match kind {
        EventKind::BulkUpdate => TimesheetEvent::BulkUpdated(entries),
        EventKind::BulkDelete => TimesheetEvent::BulkDeleteRequested(entries),
        single => {
            let mut entries = entries.into_iter();
            let entry = match (entries.next(), entries.next()) {
                (Some(entry), None) => entry,
                _ => anyhow::bail!(
                    "a single-entry event needs exactly one timesheet; use bulk-update or bulk-delete"
                ),
            };
            match single {
                EventKind::Created => TimesheetEvent::Created(entry),
                EventKind::Stopped => TimesheetEvent::Stopped(entry),
                EventKind::Delete => TimesheetEvent::DeleteRequested(entry),
                _ => TimesheetEvent::Updated(entry),
            }
        }
    };

    let reports = if json {
        app.handle(&event, &kimai_gitlab::NoopProgress).await?
    } else {
        app.handle(&event, &StderrProgress).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        let count = |status: SyncStatus| reports.iter().filter(|r| r.status == status).count();
        println!(
            "{} event: {} synced, {} skipped, {} failed",
            event.name(),
            count(SyncStatus::Success),
            count(SyncStatus::Skipped),
            count(SyncStatus::Failed)
        );
    }

    Ok(reports
        .iter()
        .filter(|r| r.status == SyncStatus::Failed)
        .count())
}

async fn handle_config(app: &KimaiGitlab, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match app.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            app.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::Unset { key } => {
            if app.config_unset(&key).await? {
                println!("Removed {key}.");
            } else {
                println!("{key} is not set");
            }
        }
        ConfigAction::List => {
            let items = app.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

async fn handle_token(app: &KimaiGitlab, action: TokenAction) -> anyhow::Result<()> {
    match action {
        TokenAction::Set { user, token } => {
            app.token_set(&user, &token).await?;
            println!("Token stored for {user}.");
        }
        TokenAction::Remove { user } => {
            if app.token_remove(&user).await? {
                println!("Token removed for {user}.");
            } else {
                println!("No token stored for {user}.");
            }
        }
    }
    Ok(())
}

async fn print_status(app: &KimaiGitlab) -> anyhow::Result<()> {
    let settings = app.settings().await?;
    let users = app.token_users().await?;

    println!("GitLab Sync Status");
    println!(
        "  Instance: {}",
        settings
            .base_url()
            .unwrap_or_else(|| "not configured".to_string())
    );
    if users.is_empty() {
        println!("  Tokens:   none");
    } else {
        println!("  Tokens:");
        for user in users {
            let token = settings.access_token(&user).unwrap_or_default();
            println!("    {user}: {}", mask(&token));
        }
    }
    Ok(())
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
