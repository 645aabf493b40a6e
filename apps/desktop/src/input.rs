//! Terminal stand-in for the panel widgets: one operator action per line.

use client_core::Intent;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  <0-100>    move the speed slider (sent after 1s without changes)
  + / -      nudge speed by 1%
  start      run at the start speed
  stop       stop the motor
  fwd / rev  set direction
  status     print the current motor state
  help       show this text
  quit       exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Intent(Intent),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("empty input")]
    Empty,
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),
}

pub fn parse_line(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    let command = match line.to_ascii_lowercase().as_str() {
        "" => return Err(InputError::Empty),
        "+" | "up" => Command::Intent(Intent::Increment),
        "-" | "down" => Command::Intent(Intent::Decrement),
        "start" => Command::Intent(Intent::Start),
        "stop" | "s" => Command::Intent(Intent::Stop),
        "fwd" | "forward" => Command::Intent(Intent::SetForward),
        "rev" | "reverse" => Command::Intent(Intent::SetReverse),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => {
            let value = other.strip_prefix("set ").unwrap_or(other).trim();
            let value = value
                .parse::<i64>()
                .map_err(|_| InputError::Unknown(line.to_string()))?;
            Command::Intent(Intent::SliderMoved(value))
        }
    };
    Ok(command)
}
