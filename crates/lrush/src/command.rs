//! Command line parser using nom
//!
//! One command per line, verbs are case-insensitive:
//! ```text
//! GET <key>
//! PEEK <key>
//! SET <key> <value...>
//! EXISTS <key>
//! LEN | KEYS | STATS | PING
//! ```
//! Blank lines and lines starting with `#` are skipped.

use nom::{
    bytes::complete::take_till1,
    character::complete::{space0, space1},
    combinator::{all_consuming, rest},
    sequence::{pair, preceded, terminated},
    IResult,
};

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read a key, promoting it
    Get(String),
    /// Read a key without promoting it
    Peek(String),
    /// Insert or overwrite a key
    Set {
        /// Key to write
        key: String,
        /// Remainder of the line
        value: String,
    },
    /// Membership check without promotion
    Exists(String),
    /// Number of live entries
    Len,
    /// Keys from most to least recently used
    Keys,
    /// Hit/miss/eviction counters
    Stats,
    /// Liveness check
    Ping,
}

fn word(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

fn argument(input: &str) -> IResult<&str, &str> {
    preceded(space1, word)(input)
}

fn single_key(input: &str) -> IResult<&str, &str> {
    all_consuming(terminated(argument, space0))(input)
}

fn key_and_value(input: &str) -> IResult<&str, (&str, &str)> {
    all_consuming(pair(argument, preceded(space1, rest)))(input)
}

fn arity_error(verb: &str) -> String {
    format!(
        "wrong number of arguments for '{}' command",
        verb.to_ascii_lowercase()
    )
}

/// Parse one input line
///
/// Returns `Ok(None)` for blank and comment lines.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (args, verb) = word(line).map_err(|_| format!("invalid command '{}'", line))?;

    let key = |args: &str| {
        single_key(args)
            .map(|(_, key)| key.to_string())
            .map_err(|_| arity_error(verb))
    };
    let no_args = |args: &str| {
        if args.trim().is_empty() {
            Ok(())
        } else {
            Err(arity_error(verb))
        }
    };

    let command = match verb.to_ascii_uppercase().as_str() {
        "GET" => Command::Get(key(args)?),
        "PEEK" => Command::Peek(key(args)?),
        "EXISTS" => Command::Exists(key(args)?),
        "SET" => {
            let (_, (key, value)) = key_and_value(args).map_err(|_| arity_error(verb))?;
            Command::Set {
                key: key.to_string(),
                value: value.trim_end().to_string(),
            }
        }
        "LEN" => no_args(args).map(|_| Command::Len)?,
        "KEYS" => no_args(args).map(|_| Command::Keys)?,
        "STATS" => no_args(args).map(|_| Command::Stats)?,
        "PING" => no_args(args).map(|_| Command::Ping)?,
        other => return Err(format!("unknown command '{}'", other)),
    };

    Ok(Some(command))
}
