//! Parsing of input lines

use crate::state_machine::SlotId;

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank line
    Empty,
    /// Text to send to the model
    Prompt(String),
    /// Select choice `index` of the reply at `slot`, or of the latest reply
    Choose { slot: Option<SlotId>, index: usize },
    /// Print every choice of a reply
    Show(SlotId),
    /// Print the whole transcript again
    History,
    Help,
    Quit,
}

/// Parse one line. `Err` carries a usage message for the user.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Input::Prompt(line.to_string()));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (name, args.as_slice()) {
        ("quit" | "exit" | "q", []) => Ok(Input::Quit),
        ("help" | "h" | "?", []) => Ok(Input::Help),
        ("history", []) => Ok(Input::History),
        ("choose", [index]) => Ok(Input::Choose {
            slot: None,
            index: parse_index(index)?,
        }),
        ("choose", [slot, index]) => Ok(Input::Choose {
            slot: Some(parse_slot(slot)?),
            index: parse_index(index)?,
        }),
        ("choose", _) => Err("Usage: /choose [slot] <n>".to_string()),
        ("show", [slot]) => Ok(Input::Show(parse_slot(slot)?)),
        ("show", _) => Err("Usage: /show <slot>".to_string()),
        _ => Err(format!(
            "Unknown command: /{name}. Type /help for available commands"
        )),
    }
}

fn parse_index(arg: &str) -> Result<usize, String> {
    arg.parse()
        .map_err(|_| format!("Not a choice number: {arg}"))
}

/// Slots are shown as `#n`; the `#` is optional when typing them
fn parse_slot(arg: &str) -> Result<SlotId, String> {
    arg.strip_prefix('#')
        .unwrap_or(arg)
        .parse()
        .map(SlotId)
        .map_err(|_| format!("Not a slot: {arg}"))
}
