//! Command-line surface and the handlers behind each subcommand.

use crate::config::{ConfigError, ConfigManager};
use crate::remote::{HttpTaskStore, RemoteError};
use crate::session::{Navigation, Session, SessionError, SessionGuard, View};
use crate::shell::{self, Exit, Shell, ShellError};
use crate::storage::JsonKeyValueStore;
use crate::task_list::{SyncError, TaskList};
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Terminal client for a remote to-do list.
#[derive(Parser)]
#[command(name = "trtodo-client", version, about = "Remote to-do list client")]
pub struct Cli {
    /// Path to the JSON config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with the fixed local credentials.
    Login {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        password: String,
    },
    /// Clear the stored session.
    Logout,
    /// Show whether a session is active.
    Status,
    /// Fetch tasks from the remote store and print them.
    Fetch {
        /// Only show tasks whose text contains this term (case-insensitive).
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Create a task in the remote store.
    Add {
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        text: String,
        /// Category label; falls back to the configured default.
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Open an interactive session over the task list.
    Shell,
    /// Manage configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a configured value.
    Get { key: String },
    /// Set a value.
    Set { key: String, value: String },
    /// Remove a value, restoring its default.
    Unset { key: String },
    /// List every key with its effective value.
    List,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Shell(#[from] ShellError),
    #[error("Not logged in. Run `trtodo-client login` first.")]
    NotLoggedIn,
}

pub fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = ConfigManager::new(cli.config.as_deref())?;
    debug!(path = %config.path().display(), "using config");
    let session = Session::new(JsonKeyValueStore::new(config.session_path()));

    match cli.command {
        Commands::Login { user, password } => {
            session.login(&user, &password)?;
            println!("Logged in as {}.", user);
        }
        Commands::Logout => {
            SessionGuard::new(&session).logout()?;
            println!("Logged out.");
        }
        Commands::Status => {
            if session.is_logged_in() {
                println!("Logged in.");
            } else {
                println!("Not logged in.");
            }
        }
        Commands::Fetch { search } => {
            require_login(&session)?;
            let remote = HttpTaskStore::new(&config.base_url())?;
            let mut list = TaskList::new(config.default_category(), Some(config.fetch_limit()));
            list.load(&remote)?;
            if let Some(term) = search {
                list.set_search(term);
            }
            shell::render_tasks(&list, &mut io::stdout().lock()).map_err(ShellError::from)?;
        }
        Commands::Add { text, category } => {
            require_login(&session)?;
            let remote = HttpTaskStore::new(&config.base_url())?;
            let mut list = TaskList::new(config.default_category(), Some(config.fetch_limit()));
            let category = category.unwrap_or_else(|| list.default_category().to_string());
            if let Some(id) = list.add(&remote, text, category)?.applied() {
                println!("Added task {}.", id);
            }
        }
        Commands::Shell => {
            require_login(&session)?;
            let remote = HttpTaskStore::new(&config.base_url())?;
            let list = TaskList::new(config.default_category(), Some(config.fetch_limit()));
            let mut shell = Shell::new(list, &remote, &session);
            let exit = shell.run(io::stdin().lock(), &mut io::stdout().lock())?;
            if exit == Exit::NotLoggedIn {
                return Err(AppError::NotLoggedIn);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Get { key } => match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => println!("{} is not set", key),
            },
            ConfigAction::Set { key, value } => {
                config.set(&key, &value)?;
                println!("Set {} = {}", key, value);
            }
            ConfigAction::Unset { key } => {
                config.unset(&key)?;
                println!("Unset {}", key);
            }
            ConfigAction::List => {
                for (key, value, is_default) in config.list() {
                    if is_default {
                        println!("{} = {} (default)", key, value);
                    } else {
                        println!("{} = {}", key, value);
                    }
                }
            }
        },
    }

    Ok(())
}

fn require_login(session: &Session<JsonKeyValueStore>) -> Result<(), AppError> {
    match SessionGuard::new(session).check(View::Main) {
        Navigation::Stay => Ok(()),
        Navigation::RedirectTo(_) => Err(AppError::NotLoggedIn),
    }
}
