//! Interactive answers for values missing from the command line.

use anyhow::{bail, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const FEED_PROMPT: &str =
    "Enter the feed URL (e.g., https://m.post.naver.com/my.naver?memberNo=37024524): ";

const INDEX_PROMPT: &str = "Prefix folder names with the post number? (y/n): ";

/// Parse a yes/no answer. Anything else is `None`.
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Read one line from the terminal.
pub fn ask(prompt: &str) -> Result<String> {
    let mut rl = DefaultEditor::new()?;
    match rl.readline(prompt) {
        Ok(line) => Ok(line.trim().to_string()),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => bail!("input cancelled"),
        Err(e) => Err(e.into()),
    }
}

/// The feed URL from the argument, or asked for. Empty input is an error.
pub fn resolve_feed_url(arg: Option<String>) -> Result<String> {
    let url = match arg {
        Some(url) => url.trim().to_string(),
        None => ask(FEED_PROMPT)?,
    };
    if url.is_empty() {
        bail!("No URL entered.");
    }
    Ok(url)
}

/// The indexing choice from the flag, or asked for. Invalid choices are errors.
pub fn resolve_indexed(flag: Option<&str>) -> Result<bool> {
    let answer = match flag {
        Some(choice) => choice.to_string(),
        None => ask(INDEX_PROMPT)?,
    };
    match parse_yes_no(&answer) {
        Some(indexed) => Ok(indexed),
        None => bail!("Invalid choice '{answer}': expected y or n."),
    }
}
