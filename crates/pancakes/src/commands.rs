//! # Text Commands
//!
//! One line of input maps onto one tracker operation. The empty line
//! toggles the timer, like the space bar.

use std::fmt;
use std::str::FromStr;

use pancakes_economy::Ingredient;
use thiserror::Error;

use crate::config::BulkConfig;

/// Errors from parsing a command line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// First word is not a command.
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),

    /// A required argument is missing.
    #[error("usage: {0}")]
    MissingArgument(&'static str),

    /// Ingredient name not recognised.
    #[error("unknown ingredient '{0}' (flour, egg, milk, sugar, butter)")]
    UnknownIngredient(String),

    /// Quantity is not a positive whole number or a bulk modifier.
    #[error("invalid quantity '{0}' (a positive number, xN, shift or alt)")]
    InvalidQuantity(String),

    /// Extra words after a complete command.
    #[error("unexpected '{0}'")]
    TrailingInput(String),
}

/// A parsed command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the timer.
    Start,
    /// Pause the timer.
    Pause,
    /// Pause if running, otherwise start.
    Toggle,
    /// Discard the current session.
    ResetSession,
    /// Ask to wipe everything.
    Wipe,
    /// Answer yes to a pending question.
    Confirm,
    /// Buy ingredients.
    Buy {
        /// What to buy.
        ingredient: Ingredient,
        /// How many.
        quantity: u32,
    },
    /// Cook one pancake.
    Cook,
    /// Cook as many pancakes as possible.
    CookMax,
    /// Add a note.
    Note(String),
    /// Save now.
    Save,
    /// Show the dashboard.
    Status,
    /// The window was hidden.
    Hide,
    /// The window is visible again.
    Show,
    /// List commands.
    Help,
    /// Leave.
    Quit,
}

/// Help text listing every command.
pub const HELP: &str = "\
commands:
  <enter> / toggle         start or pause the timer
  start | pause            start / pause the timer
  reset                    clear the current session (total time kept)
  wipe                     reset ALL progress (asks for 'yes')
  buy <item> [n|xN|shift|alt]
                           buy ingredients (flour, egg, milk, sugar, butter)
  cook | cookmax           cook one pancake / as many as possible
  note <text>              add a note
  save                     save progress now
  status                   show the dashboard
  hide | show              simulate the window being hidden / shown
  help | quit";

impl Command {
    /// Parses one input line.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] naming what was wrong.
    pub fn parse(line: &str, bulk: BulkConfig) -> Result<Self, ParseError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "" | "toggle" | "space" => Self::Toggle,
            "start" => Self::Start,
            "pause" | "stop" => Self::Pause,
            "reset" => Self::ResetSession,
            "wipe" => Self::Wipe,
            "yes" | "y" => Self::Confirm,
            "buy" => return parse_buy(rest, bulk),
            "cook" => Self::Cook,
            "cookmax" | "cook-max" => Self::CookMax,
            "note" | "lap" => {
                if rest.is_empty() {
                    return Err(ParseError::MissingArgument("note <text>"));
                }
                return Ok(Self::Note(rest.to_string()));
            }
            "save" => Self::Save,
            "status" | "s" => Self::Status,
            "hide" => Self::Hide,
            "show" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => return Err(ParseError::UnknownCommand(word.to_string())),
        };

        if rest.is_empty() {
            Ok(command)
        } else {
            Err(ParseError::TrailingInput(rest.to_string()))
        }
    }

    /// True for commands that answer a pending confirmation.
    #[must_use]
    pub fn is_confirmation(&self) -> bool {
        matches!(self, Self::Confirm)
    }
}

fn parse_buy(args: &str, bulk: BulkConfig) -> Result<Command, ParseError> {
    const USAGE: &str = "buy <ingredient> [n|xN|shift|alt]";

    let mut words = args.split_whitespace();
    let name = words.next().ok_or(ParseError::MissingArgument(USAGE))?;
    let ingredient =
        Ingredient::from_str(name).map_err(|_| ParseError::UnknownIngredient(name.to_string()))?;

    let quantity = match words.next() {
        None => 1,
        Some(word) => parse_quantity(word, bulk)?,
    };

    if let Some(extra) = words.next() {
        return Err(ParseError::TrailingInput(extra.to_string()));
    }

    Ok(Command::Buy {
        ingredient,
        quantity,
    })
}

fn parse_quantity(word: &str, bulk: BulkConfig) -> Result<u32, ParseError> {
    let lowered = word.to_ascii_lowercase();
    let quantity = match lowered.as_str() {
        "shift" => bulk.shift,
        "alt" => bulk.alt,
        other => other
            .strip_prefix('x')
            .unwrap_or(other)
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidQuantity(word.to_string()))?,
    };
    if quantity == 0 {
        return Err(ParseError::InvalidQuantity(word.to_string()));
    }
    Ok(quantity)
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Pause => f.write_str("pause"),
            Self::Toggle => f.write_str("toggle"),
            Self::ResetSession => f.write_str("reset"),
            Self::Wipe => f.write_str("wipe"),
            Self::Confirm => f.write_str("yes"),
            Self::Buy {
                ingredient,
                quantity,
            } => write!(f, "buy {ingredient} {quantity}"),
            Self::Cook => f.write_str("cook"),
            Self::CookMax => f.write_str("cookmax"),
            Self::Note(text) => write!(f, "note {text}"),
            Self::Save => f.write_str("save"),
            Self::Status => f.write_str("status"),
            Self::Hide => f.write_str("hide"),
            Self::Show => f.write_str("show"),
            Self::Help => f.write_str("help"),
            Self::Quit => f.write_str("quit"),
        }
    }
}
