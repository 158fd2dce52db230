//! Console commands.

use std::str::FromStr;

/// One line typed on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Someone wants in (the messaging bot's role).
    Request,
    /// Press the local push-button.
    Push,
    /// Lift the handset.
    Pickup,
    /// Dial a number on the rotary dial.
    Dial(Vec<u8>),
    /// Print the controller status.
    Status,
    /// Stop the process.
    Exit,
}

/// A line that is not a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseCommandError(String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next().map(str::to_ascii_lowercase).as_deref() {
            Some("request") => Command::Request,
            Some("push") => Command::Push,
            Some("pickup") => Command::Pickup,
            Some("status") => Command::Status,
            Some("exit" | "quit") => Command::Exit,
            Some("dial") => {
                let number = words
                    .next()
                    .ok_or_else(|| ParseCommandError("usage: dial <digits>".to_string()))?;
                let digits = number
                    .chars()
                    .map(|c| c.to_digit(10).map(|d| d as u8))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| ParseCommandError(format!("not a number: {number}")))?;
                Command::Dial(digits)
            }
            Some(other) => return Err(ParseCommandError(format!("unknown command: {other}"))),
            None => return Err(ParseCommandError("empty line".to_string())),
        };

        if let Some(extra) = words.next() {
            return Err(ParseCommandError(format!("unexpected argument: {extra}")));
        }
        Ok(command)
    }
}

/// Help text listing the commands.
pub const HELP: &str = "commands: request | push | pickup | dial <digits> | status | exit";

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("request", Command::Request)]
    #[case("  push ", Command::Push)]
    #[case("PICKUP", Command::Pickup)]
    #[case("status", Command::Status)]
    #[case("exit", Command::Exit)]
    #[case("quit", Command::Exit)]
    #[case("dial 423", Command::Dial(vec![4, 2, 3]))]
    #[case("dial 0", Command::Dial(vec![0]))]
    fn test_parse_command(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>().unwrap(), expected);
    }

    #[rstest]
    #[case("", "empty line")]
    #[case("ring", "unknown command: ring")]
    #[case("dial", "usage: dial <digits>")]
    #[case("dial 4a2", "not a number: 4a2")]
    #[case("push now", "unexpected argument: now")]
    fn test_parse_command_errors(#[case] line: &str, #[case] message: &str) {
        let err = line.parse::<Command>().unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_parse_error_converts_to_anyhow() {
        let err: anyhow::Error = "ring".parse::<Command>().unwrap_err().into();
        assert_eq!(err.to_string(), "unknown command: ring");
        assert!(err.downcast_ref::<ParseCommandError>().is_some());
    }
}
