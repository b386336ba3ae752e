use std::str::FromStr;

use thiserror::Error;

use super::{CoordinatorSnapshot, Registration, SessionPointsCoordinator, SessionState};

pub const HELP: &str = "commands: start | end | greet <name> | status | move | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    End,
    Greet(String),
    Status,
    /// Explicit pointer-movement signal.
    Move,
    Help,
    Quit,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("enter a command, or `help` for the list")]
    Empty,
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        let (word, rest) = match input.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (input, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandParseError::Empty),
            "start" => Ok(Command::Start),
            "end" | "stop" => Ok(Command::End),
            "greet" => Ok(Command::Greet(rest.to_string())),
            "status" => Ok(Command::Status),
            "move" => Ok(Command::Move),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Render(String),
    Quit,
}

pub async fn dispatch(coordinator: &SessionPointsCoordinator, command: Command) -> CommandOutcome {
    let line = match command {
        Command::Start => match coordinator.start_session().await {
            Ok(true) => "Session started".to_string(),
            Ok(false) => "Session not started".to_string(),
            Err(err) => err.to_string(),
        },
        Command::End => {
            coordinator.end_session().await;
            "Session ended".to_string()
        }
        Command::Greet(name) => coordinator
            .submit_greeting(&name)
            .await
            .unwrap_or_else(|err| err.to_string()),
        Command::Status => render(&coordinator.get_snapshot().await),
        Command::Move => {
            coordinator.on_presence_detected().await;
            "Phone usage recorded".to_string()
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return CommandOutcome::Quit,
    };

    CommandOutcome::Render(line)
}

/// Text rendering of the page: user id, session, points and greeting.
pub fn render(snapshot: &CoordinatorSnapshot) -> String {
    let state = &snapshot.state;

    let user = match (&state.registration, &state.user_id) {
        (Registration::Registered, Some(user_id)) => user_id.to_string(),
        (Registration::Failed { reason }, _) => {
            format!("unavailable (session features disabled: {reason})")
        }
        _ => "registering...".to_string(),
    };

    let session = match state.session {
        SessionState::Active => "active",
        SessionState::Inactive => "inactive",
    };

    let mut lines = vec![
        format!("User ID: {user}"),
        format!("Session: {session}"),
        format!("Current Points: {}", state.points),
    ];
    if let Some(greeting) = &state.greeting {
        lines.push(greeting.clone());
    }

    lines.join("\n")
}
