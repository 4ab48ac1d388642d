//! Line-oriented console input for the headless driver.
//!
//! A reader thread parses stdin lines and posts them into a bounded
//! `embassy-sync` channel.  The event loop drains it without blocking.
//!
//! ```text
//! ┌──────────────┐  ConsoleCommand  ┌──────────────┐
//! │ stdin thread │────────────────▶│  Event loop  │
//! │  (blocking)  │  CONSOLE_CHANNEL │  (try_recv)  │
//! └──────────────┘                  └──────────────┘
//! ```

use core::fmt;
use std::io::BufRead;
use std::thread::{self, JoinHandle};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{debug, warn};

use crate::app::commands::SessionCommand;
use crate::model::{Coordinate, Pose, TapInput};
use crate::presence::Authorization;

/// Where a bare `tap` lands: one metre in front of the camera.
pub const DEFAULT_TAP_POSE: Pose = Pose {
    position: [0.0, 0.0, -1.0],
    yaw: 0.0,
};

const CONSOLE_DEPTH: usize = 8;

/// Parsed stdin line → event loop.
pub static CONSOLE_CHANNEL: Channel<CriticalSectionRawMutex, ConsoleCommand, CONSOLE_DEPTH> =
    Channel::new();

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Forwarded to the session unchanged.
    Session(SessionCommand),
    /// Print a snapshot of the session.
    Status,
    /// Tear down and exit the loop.
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    BadArgument(&'static str),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::UnknownCommand(word) => write!(f, "unknown command '{}'", word),
            Self::BadArgument(usage) => write!(f, "usage: {}", usage),
        }
    }
}

impl std::error::Error for ParseError {}

pub const HELP: &str = "commands: pos <lat> <lon> | auth granted|denied | tap [x y z] | miss | \
                        feed | refill | snap | teardown | status | quit";

fn parse_f64(word: Option<&str>, usage: &'static str) -> Result<f64, ParseError> {
    word.and_then(|w| w.parse().ok())
        .ok_or(ParseError::BadArgument(usage))
}

fn parse_f32(word: Option<&str>, usage: &'static str) -> Result<f32, ParseError> {
    word.and_then(|w| w.parse().ok())
        .ok_or(ParseError::BadArgument(usage))
}

pub fn parse_line(line: &str) -> Result<ConsoleCommand, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Empty);
    };

    let cmd = match head.to_ascii_lowercase().as_str() {
        "pos" => {
            const USAGE: &str = "pos <lat> <lon>";
            let latitude = parse_f64(words.next(), USAGE)?;
            let longitude = parse_f64(words.next(), USAGE)?;
            SessionCommand::PositionUpdated(Coordinate::new(latitude, longitude))
        }
        "auth" => {
            let authorization = match words.next() {
                Some("granted") => Authorization::Granted,
                Some("denied") => Authorization::Denied,
                _ => return Err(ParseError::BadArgument("auth granted|denied")),
            };
            SessionCommand::AuthorizationChanged(authorization)
        }
        "tap" => {
            const USAGE: &str = "tap [x y z]";
            let pose = match words.next() {
                None => DEFAULT_TAP_POSE,
                Some(x) => {
                    let x = parse_f32(Some(x), USAGE)?;
                    let y = parse_f32(words.next(), USAGE)?;
                    let z = parse_f32(words.next(), USAGE)?;
                    Pose::at(x, y, z)
                }
            };
            SessionCommand::Tap(TapInput::on_surface(pose))
        }
        "miss" => SessionCommand::Tap(TapInput::miss()),
        "feed" => SessionCommand::Feed,
        "refill" => SessionCommand::RefillNiboshi,
        "snap" => SessionCommand::Capture,
        "teardown" => SessionCommand::Teardown,
        "status" => return Ok(ConsoleCommand::Status),
        "quit" | "exit" => return Ok(ConsoleCommand::Quit),
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(ConsoleCommand::Session(cmd))
}

/// Spawns the stdin reader.  EOF posts [`ConsoleCommand::Quit`].
pub fn spawn_stdin_reader() -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("console".into())
        .spawn(|| {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("console: read failed: {}", e);
                        break;
                    }
                };
                match parse_line(&line) {
                    Ok(cmd) => {
                        let quit = cmd == ConsoleCommand::Quit;
                        futures_lite::future::block_on(CONSOLE_CHANNEL.send(cmd));
                        if quit {
                            return;
                        }
                    }
                    Err(ParseError::Empty) => {}
                    Err(e) => {
                        warn!("console: {}", e);
                        debug!("{}", HELP);
                    }
                }
            }
            futures_lite::future::block_on(CONSOLE_CHANNEL.send(ConsoleCommand::Quit));
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_position() {
        assert_eq!(
            parse_line("pos 35.6580 139.7016"),
            Ok(ConsoleCommand::Session(SessionCommand::PositionUpdated(
                Coordinate::new(35.6580, 139.7016)
            )))
        );
    }

    #[test]
    fn position_needs_two_numbers() {
        assert!(matches!(parse_line("pos 35.0"), Err(ParseError::BadArgument(_))));
        assert!(matches!(parse_line("pos a b"), Err(ParseError::BadArgument(_))));
    }

    #[test]
    fn bare_tap_hits_default_pose() {
        assert_eq!(
            parse_line("tap"),
            Ok(ConsoleCommand::Session(SessionCommand::Tap(
                TapInput::on_surface(DEFAULT_TAP_POSE)
            )))
        );
    }

    #[test]
    fn tap_with_coordinates() {
        let Ok(ConsoleCommand::Session(SessionCommand::Tap(tap))) = parse_line("tap 0.5 0 -2")
        else {
            panic!("expected tap");
        };
        assert_eq!(tap.hit, Some(Pose::at(0.5, 0.0, -2.0)));
    }

    #[test]
    fn partial_tap_coordinates_are_rejected() {
        assert!(matches!(parse_line("tap 1 2"), Err(ParseError::BadArgument(_))));
    }

    #[test]
    fn miss_has_no_hit() {
        assert_eq!(
            parse_line("miss"),
            Ok(ConsoleCommand::Session(SessionCommand::Tap(TapInput::miss())))
        );
    }

    #[test]
    fn authorization_words() {
        assert_eq!(
            parse_line("auth denied"),
            Ok(ConsoleCommand::Session(SessionCommand::AuthorizationChanged(
                Authorization::Denied
            )))
        );
        assert!(parse_line("auth maybe").is_err());
    }

    #[test]
    fn simple_words_are_case_insensitive() {
        assert_eq!(
            parse_line("  FEED "),
            Ok(ConsoleCommand::Session(SessionCommand::Feed))
        );
        assert_eq!(parse_line("status"), Ok(ConsoleCommand::Status));
        assert_eq!(parse_line("exit"), Ok(ConsoleCommand::Quit));
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse_line("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_line("dance"),
            Err(ParseError::UnknownCommand("dance".to_string()))
        );
    }
}
