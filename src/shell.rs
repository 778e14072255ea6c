//! Interactive front end over a `TaskList`.
//!
//! The list lives only for the duration of one shell session. Every command
//! that changes it is followed by a re-render of the filtered view.

use crate::models::{Task, TaskId};
use crate::remote::RemoteTaskStore;
use crate::session::{Navigation, Session, SessionError, SessionGuard, View};
use crate::storage::KeyValueStore;
use crate::task_list::{Applied, TaskList};
use std::io::{BufRead, Write};
use thiserror::Error;
use tracing::debug;

const PROMPT: &str = "todo> ";

const HELP: &str = "\
Commands:
  load                     fetch tasks from the remote store (replaces the list)
  add <text> [@category]   create a task remotely and prepend it
  done <id>                toggle completion of a task
  rm <id>                  remove a task from the list
  search [term]            filter by text; no term clears the filter
  list                     show the list again
  logout                   end the session and leave
  help                     show this help
  quit                     leave";

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Load,
    Add { text: String, category: Option<String> },
    Done(TaskId),
    Remove(TaskId),
    Search(String),
    List,
    Logout,
    Help,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb {
            "load" => Ok(ShellCommand::Load),
            "add" => parse_add(rest),
            "done" | "complete" => parse_id(rest).map(ShellCommand::Done),
            "rm" | "remove" => parse_id(rest).map(ShellCommand::Remove),
            "search" => Ok(ShellCommand::Search(rest.to_string())),
            "list" | "ls" => Ok(ShellCommand::List),
            "logout" => Ok(ShellCommand::Logout),
            "help" | "?" => Ok(ShellCommand::Help),
            "quit" | "exit" => Ok(ShellCommand::Quit),
            other => Err(format!("Unknown command: {} (try `help`)", other)),
        }
    }
}

fn parse_add(rest: &str) -> Result<ShellCommand, String> {
    let (text, category) = match rest.rsplit_once(char::is_whitespace) {
        Some((text, last)) if last.len() > 1 && last.starts_with('@') => {
            (text.trim(), Some(last[1..].to_string()))
        }
        _ if rest.starts_with('@') => ("", Some(rest[1..].to_string())),
        _ => (rest, None),
    };
    if text.is_empty() {
        return Err("Task text cannot be empty".to_string());
    }
    Ok(ShellCommand::Add {
        text: text.to_string(),
        category,
    })
}

fn parse_id(rest: &str) -> Result<TaskId, String> {
    rest.parse::<TaskId>().map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Quit,
    LoggedOut,
    /// The session guard refused entry.
    NotLoggedIn,
}

pub struct Shell<'a, R: RemoteTaskStore + ?Sized, S: KeyValueStore> {
    list: TaskList,
    remote: &'a R,
    session: &'a Session<S>,
}

impl<'a, R: RemoteTaskStore + ?Sized, S: KeyValueStore> Shell<'a, R, S> {
    pub fn new(list: TaskList, remote: &'a R, session: &'a Session<S>) -> Self {
        Self {
            list,
            remote,
            session,
        }
    }

    pub fn run<I: BufRead, O: Write>(&mut self, input: I, out: &mut O) -> Result<Exit, ShellError> {
        let guard = SessionGuard::new(self.session);
        if guard.check(View::Main) != Navigation::Stay {
            return Ok(Exit::NotLoggedIn);
        }

        self.render(out)?;
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let mut exit = Exit::Quit;
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                write!(out, "{}", PROMPT)?;
                out.flush()?;
                continue;
            }

            match ShellCommand::parse(&line) {
                Ok(ShellCommand::Quit) => break,
                Ok(ShellCommand::Logout) => {
                    guard.logout()?;
                    writeln!(out, "Logged out.")?;
                    exit = Exit::LoggedOut;
                    break;
                }
                Ok(command) => self.execute(command, out)?,
                Err(message) => writeln!(out, "{}", message)?,
            }
            write!(out, "{}", PROMPT)?;
            out.flush()?;
        }

        self.list.teardown();
        Ok(exit)
    }

    fn execute<O: Write>(&mut self, command: ShellCommand, out: &mut O) -> Result<(), ShellError> {
        debug!(?command, "shell command");
        let before = self.list.revision();

        match command {
            ShellCommand::Load => match self.list.load(self.remote) {
                Ok(Applied::Applied(count)) => writeln!(out, "Loaded {} tasks.", count)?,
                Ok(Applied::Discarded) => {}
                Err(e) => writeln!(out, "Error: {}", e)?,
            },
            ShellCommand::Add { text, category } => {
                let category = category.unwrap_or_else(|| self.list.default_category().to_string());
                match self.list.add(self.remote, text, category) {
                    Ok(Applied::Applied(id)) => writeln!(out, "Added task {}.", id)?,
                    Ok(Applied::Discarded) => {}
                    Err(e) => writeln!(out, "Error: {}", e)?,
                }
            }
            ShellCommand::Done(id) => {
                if !self.list.toggle_complete(&id) {
                    writeln!(out, "No task with id {}.", id)?;
                }
            }
            ShellCommand::Remove(id) => {
                if self.list.remove(&id).is_none() {
                    writeln!(out, "No task with id {}.", id)?;
                }
            }
            ShellCommand::Search(term) => {
                self.list.set_search(term);
                self.render(out)?;
                return Ok(());
            }
            ShellCommand::List => {
                self.render(out)?;
                return Ok(());
            }
            ShellCommand::Help => {
                writeln!(out, "{}", HELP)?;
                return Ok(());
            }
            ShellCommand::Logout | ShellCommand::Quit => return Ok(()),
        }

        if self.list.revision() != before {
            self.render(out)?;
        }
        Ok(())
    }

    fn render<O: Write>(&self, out: &mut O) -> Result<(), ShellError> {
        render_tasks(&self.list, out)?;
        Ok(())
    }
}

/// Writes the filtered view of `list`.
pub fn render_tasks<O: Write>(list: &TaskList, out: &mut O) -> std::io::Result<()> {
    if list.is_empty() {
        return writeln!(out, "No tasks loaded.");
    }

    let visible = list.visible();
    if !list.search().is_empty() {
        writeln!(
            out,
            "Filter \"{}\": {} of {} tasks",
            list.search(),
            visible.len(),
            list.len()
        )?;
    }
    for task in visible {
        writeln!(out, "{}", format_task(task))?;
    }
    Ok(())
}

pub fn format_task(task: &Task) -> String {
    format!(
        "[{}] {:>4}  {} ({})",
        if task.is_completed { "x" } else { " " },
        task.id.to_string(),
        task.text,
        task.category
    )
}
