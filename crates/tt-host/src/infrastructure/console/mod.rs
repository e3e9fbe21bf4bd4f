//! Operator console: parses the line commands typed on stdin.
//!
//! ```text
//! list              show the activity catalog
//! start <index>     start an activity
//! update <text>     push text to all clients
//! end               end the running activity
//! clients           show connected clients
//! status            show the running activity
//! leave [reason]    stop sending, keep receiving until the backend closes
//! quit              close the session and exit
//! help              show this text
//! ```

use thiserror::Error;

/// Help text printed by the `help` command.
pub const HELP_TEXT: &str = "\
commands:
  list              show the activity catalog
  start <index>     start an activity
  update <text>     push text to all clients
  end               end the running activity
  clients           show connected clients
  status            show the running activity
  leave [reason]    stop sending, keep receiving until the backend closes
  quit              close the session and exit
  help              show this text";

/// One parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Start(usize),
    Update(String),
    End,
    Clients,
    Status,
    Leave(Option<String>),
    Quit,
    Help,
}

/// Why a console line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}`; type `help` for a list")]
    Unknown(String),

    #[error("`{command}` needs an argument: {usage}")]
    MissingArgument {
        command: &'static str,
        usage: &'static str,
    },

    #[error("`{0}` is not a valid activity index")]
    InvalidIndex(String),
}

/// Parses one console line.
///
/// Leading and trailing whitespace is ignored.  For `update` and `leave` the
/// rest of the line after the command word is taken verbatim.
///
/// # Errors
///
/// Returns a [`CommandError`] describing the first problem found.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Err(CommandError::Empty),
        "list" => Ok(Command::List),
        "start" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "start",
                    usage: "start <index>",
                });
            }
            rest.parse::<usize>()
                .map(Command::Start)
                .map_err(|_| CommandError::InvalidIndex(rest.to_string()))
        }
        "update" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "update",
                    usage: "update <text>",
                });
            }
            Ok(Command::Update(rest.to_string()))
        }
        "end" => Ok(Command::End),
        "clients" => Ok(Command::Clients),
        "status" => Ok(Command::Status),
        "leave" => Ok(Command::Leave((!rest.is_empty()).then(|| rest.to_string()))),
        "quit" | "exit" => Ok(Command::Quit),
        "help" | "?" => Ok(Command::Help),
        _ => Err(CommandError::Unknown(word.to_string())),
    }
}
