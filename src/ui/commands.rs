use crate::history::{DEFAULT_HISTORY_SIZE, MAX_HISTORY_SIZE, MIN_HISTORY_SIZE};
use crate::inference::Modality;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Message(String),
}

impl FromStr for Command {
    type Err = ();

    /// Only an empty line or exactly `q` quits. Message text is kept as typed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        Ok(match line {
            "" | "q" => Command::Quit,
            _ => Command::Message(line.to_string()),
        })
    }
}

/// Parse the mode menu answer. Anything other than `2` means text chat.
pub fn parse_mode(input: &str) -> Modality {
    match input.trim() {
        "2" => Modality::Image,
        _ => Modality::Text,
    }
}

/// Parse the history size answer; `None` when it is not a number in range.
pub fn parse_history_size(input: &str) -> Option<usize> {
    input
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (MIN_HISTORY_SIZE..=MAX_HISTORY_SIZE).contains(n))
}

pub const MODE_MENU: &str = "\
┌──────────────────────────────────────┐\n\
│             Choose a mode            │\n\
├──────────────────────────────────────┤\n\
│    `1` - Text chat (default)         │\n\
├──────────────────────────────────────┤\n\
│    `2` - Image generation            │\n\
└──────────────────────────────────────┘";

pub fn history_menu() -> String {
    (MIN_HISTORY_SIZE..=MAX_HISTORY_SIZE)
        .map(|n| {
            if n == DEFAULT_HISTORY_SIZE {
                format!("{n}. History size: {n} (default)")
            } else {
                format!("{n}. History size: {n}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}
