//! Stdin Commands
//!
//! One command per line, standing in for the page events:
//!
//! ```text
//! points <text>        loyalty points input changed
//! card <message>       card element reports a validation error
//! card ok              card element is valid again
//! submit <form.json>   submit the checkout form
//! quit
//! ```

use std::path::PathBuf;

use checkout_core::CardChangeEvent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Points(String),
    Card(CardChangeEvent),
    Submit(PathBuf),
    Quit,
}

impl Command {
    /// Parse one input line; `None` for blank or unknown lines
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (name, arg) = line
            .trim_start()
            .split_once(' ')
            .unwrap_or((line.trim(), ""));

        match name {
            // Points text is passed through untouched, the controller parses it
            "points" => Some(Command::Points(arg.to_string())),
            "card" if arg.trim() == "ok" => Some(Command::Card(CardChangeEvent {
                complete: true,
                error: None,
            })),
            "card" if !arg.trim().is_empty() => Some(Command::Card(CardChangeEvent {
                complete: false,
                error: Some(arg.trim().to_string()),
            })),
            "submit" if !arg.trim().is_empty() => Some(Command::Submit(PathBuf::from(arg.trim()))),
            "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}
