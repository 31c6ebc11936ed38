//! Line-oriented control surface on stdin.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

use ntfy_core::{SinceWindow, SubscriptionError, SubscriptionKey};
use ntfy_logging::{ntfy_debug, ntfy_warn};
use thiserror::Error;
use tokio::sync::oneshot;

use super::coordinator::Coordinator;

const HELP: &str = "commands: add <server/topic | server topic>, remove <server/topic>, \
start, stop, history [10m|1h|24h|all], clear, list, messages, show <id>, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { server: String, topic: String },
    Remove(SubscriptionKey),
    Start,
    Stop,
    History(SinceWindow),
    Clear,
    List,
    Messages,
    Show(String),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
    #[error(transparent)]
    Since(#[from] ntfy_core::UnknownSinceWindow),
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("add", [combined]) => {
            let key = SubscriptionKey::parse_combined(combined)?;
            Command::Add {
                server: key.server,
                topic: key.topic,
            }
        }
        ("add", [server, topic]) => Command::Add {
            server: server.to_string(),
            topic: topic.to_string(),
        },
        ("add", _) => return Err(CommandError::Usage("add <server/topic | server topic>")),
        ("remove", [combined]) => Command::Remove(SubscriptionKey::parse_combined(combined)?),
        ("remove", [server, topic]) => Command::Remove(SubscriptionKey::new(server, topic)?),
        ("remove", _) => return Err(CommandError::Usage("remove <server/topic>")),
        ("start", []) => Command::Start,
        ("stop", []) => Command::Stop,
        ("history", []) => Command::History(SinceWindow::default()),
        ("history", [since]) => Command::History(since.parse()?),
        ("clear", []) => Command::Clear,
        ("list", []) => Command::List,
        ("messages", []) => Command::Messages,
        ("show", [id]) => Command::Show(id.to_string()),
        ("show", _) => return Err(CommandError::Usage("show <id>")),
        ("help", _) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => return Err(CommandError::Unknown(line.trim().to_string())),
    };
    Ok(Some(command))
}

/// Runs a command and returns the text to show the user.
pub fn execute(coordinator: &Coordinator, command: Command, auto_reconnect: bool) -> String {
    match command {
        Command::Add { server, topic } => match coordinator.add_subscription(&server, &topic) {
            Ok(key) => format!("added {key}"),
            Err(err) => format!("cannot add: {err}"),
        },
        Command::Remove(key) => match coordinator.remove_subscription(&key) {
            Ok(()) => format!("removed {key}"),
            Err(err) => format!("cannot remove: {err}"),
        },
        Command::Start => match coordinator.start_listening(auto_reconnect) {
            Ok(()) => "listening".to_string(),
            Err(err) => format!("cannot start: {err}"),
        },
        Command::Stop => {
            coordinator.stop_listening();
            "stopped".to_string()
        }
        Command::History(since) => match coordinator.fetch_history(since) {
            Ok(()) => format!("fetching the last {}", since.label()),
            Err(err) => format!("cannot fetch history: {err}"),
        },
        Command::Clear => {
            coordinator.clear_messages();
            "messages cleared".to_string()
        }
        Command::List => {
            let view = coordinator.view();
            if view.subscriptions.is_empty() {
                return "no subscriptions".to_string();
            }
            view.subscriptions
                .iter()
                .map(|row| {
                    let mut line = format!(
                        "{}/{}  {}  ({} messages)",
                        row.server, row.topic, row.status_label, row.message_count
                    );
                    if let Some(error) = &row.last_error {
                        line.push_str(&format!("  last error: {error}"));
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Messages => {
            let view = coordinator.view();
            if view.messages.is_empty() {
                return "no messages".to_string();
            }
            view.messages
                .iter()
                .map(|row| {
                    format!(
                        "{}  {}  {:<8} {}  [{}]",
                        row.time, row.id, row.priority, row.topic, row.summary
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Command::Show(id) => coordinator
            .message_detail(&id)
            .unwrap_or_else(|| format!("no message with id {id}")),
        Command::Help => HELP.to_string(),
        Command::Quit => "bye".to_string(),
    }
}

/// Reads commands from stdin on its own thread. `quit` fires the returned
/// receiver; end of input only stops the reader.
pub fn spawn_console(coordinator: Arc<Coordinator>, auto_reconnect: bool) -> oneshot::Receiver<()> {
    let (quit_tx, quit_rx) = oneshot::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    ntfy_warn!("Console input failed: {}", err);
                    break;
                }
            };
            match parse_command(&line) {
                Ok(None) => {}
                Ok(Some(Command::Quit)) => {
                    let _ = quit_tx.send(());
                    return;
                }
                Ok(Some(command)) => println!("{}", execute(&coordinator, command, auto_reconnect)),
                Err(err) => println!("{err}\n{HELP}"),
            }
        }
        ntfy_debug!("Console input closed");
    });
    quit_rx
}
