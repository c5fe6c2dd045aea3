//! Transcript rendering
//!
//! Rendering produces plain [`Line`]s; colour is applied only when they are
//! printed.

use crate::llm::{Choice, Message, ModelDef, Role};
use crate::state_machine::{ChatError, CompletionItem, HistoryItem, SlotId};
use crossterm::style::{Color, Stylize};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

const UNSUPPORTED: &str = "<unsupported type>";
const NO_CHOICE: &str = "<no choice selected>";
const AWAITING: &str = "One moment please...";

/// One line of terminal output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub color: Option<Color>,
}

impl Line {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::colored(text, Color::Red)
    }
}

/// Write lines to stdout
pub fn print_lines(lines: &[Line]) {
    let mut out = io::stdout().lock();
    for line in lines {
        let written = match line.color {
            Some(color) => writeln!(out, "{}", line.text.as_str().with(color)),
            None => writeln!(out, "{}", line.text),
        };
        if written.is_err() {
            return;
        }
    }
    let _ = out.flush();
}

fn role_label(role: Role) -> (&'static str, Option<Color>) {
    match role {
        Role::System => ("Instructions", Some(Color::Red)),
        Role::User => ("You", Some(Color::Blue)),
        Role::Assistant => ("Assistant", Some(Color::Green)),
        _ => ("Unknown", None),
    }
}

fn label_line(text: String, color: Option<Color>) -> Line {
    Line { text, color }
}

/// "Preferred" for the first choice, "Alternative N" for the rest
pub fn choice_label(index: usize) -> String {
    if index == 0 {
        "Preferred".to_string()
    } else {
        format!("Alternative {index}")
    }
}

fn message_text(message: &Message) -> String {
    message
        .content
        .as_text()
        .map_or_else(|| UNSUPPORTED.to_string(), str::to_string)
}

pub fn banner(model: &ModelDef, candidate_count: u8) -> Vec<Line> {
    vec![
        Line::colored("Welcome to OpenAI chat.", Color::Green),
        Line::plain(format!(
            "Model: {} - {} ({} token context), {} choice(s) per prompt.",
            model.id, model.description, model.context_window, candidate_count
        )),
        Line::plain("Enter a prompt to begin chatting. Type /help for commands, Ctrl-D to quit."),
        Line::plain(""),
    ]
}

pub fn help() -> Vec<Line> {
    [
        "Commands:",
        "  /choose <n>          - Continue with choice n of the latest reply",
        "  /choose <slot> <n>   - Continue with choice n of the reply at slot",
        "  /show <slot>         - Show every choice of the reply at slot",
        "  /history             - Print the whole conversation again",
        "  /help                - Show this help",
        "  /quit                - Exit (or Ctrl-D)",
    ]
    .into_iter()
    .map(Line::plain)
    .collect()
}

pub fn awaiting() -> Line {
    Line::colored(AWAITING, Color::Green)
}

/// Animated indicator shown while a reply is outstanding.
///
/// Falls back to a single static line when stdout is not a terminal.
pub struct Spinner {
    target: fn() -> ProgressDrawTarget,
    bar: Option<ProgressBar>,
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            target: ProgressDrawTarget::stdout,
            bar: None,
        }
    }

    pub fn start(&mut self) {
        if self.bar.is_some() {
            return;
        }
        let bar = ProgressBar::with_draw_target(None, (self.target)());
        if bar.is_hidden() {
            print_lines(&[awaiting()]);
        }
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg:.green}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(AWAITING);
        bar.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(bar);
    }

    pub fn stop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.bar.is_some()
    }

    /// Print above the spinner without tearing it
    pub fn print(&self, lines: &[Line]) {
        match &self.bar {
            Some(bar) => bar.suspend(|| print_lines(lines)),
            None => print_lines(lines),
        }
    }
}

pub fn error(err: &ChatError) -> Line {
    Line::error(err.to_string())
}

/// Render one history slot. `updated` marks a slot printed before whose
/// selected choice has since changed.
pub fn render_item(slot: SlotId, item: &HistoryItem, updated: bool) -> Vec<Line> {
    let suffix = if updated { " (updated)" } else { "" };
    match item {
        HistoryItem::Message(message) => {
            let (label, color) = role_label(message.role);
            vec![
                label_line(format!("{label} {slot}{suffix}"), color),
                Line::plain(message_text(message)),
                Line::plain(""),
            ]
        }
        HistoryItem::Completion(item) => {
            let (label, color) = role_label(Role::Assistant);
            let mut lines = vec![label_line(format!("{label} {slot}{suffix}"), color)];
            lines.extend(selection(item));
            lines.push(Line::plain(""));
            lines
        }
    }
}

fn selection(item: &CompletionItem) -> Vec<Line> {
    let choices = &item.completion.choices;
    let mut lines = Vec::new();

    if choices.len() > 1 {
        let options = choices
            .iter()
            .map(|choice| {
                let marker = if choice.index == item.selected_index { "*" } else { "" };
                format!("{}{marker}", choice_label(choice.index))
            })
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(Line::plain(format!("Choose the reply: {options}")));
    }

    match item.selected_choice() {
        Some(choice) => {
            if choices.len() > 1 {
                lines.push(Line::colored(choice_label(choice.index), Color::Green));
            }
            lines.push(Line::plain(message_text(&choice.message)));
        }
        None => lines.push(Line::plain(NO_CHOICE)),
    }
    lines
}

/// Every choice of a reply, selected one marked
pub fn render_choices(slot: SlotId, item: &CompletionItem) -> Vec<Line> {
    let mut lines = vec![Line::colored(format!("Assistant {slot}"), Color::Green)];
    for Choice { index, message } in &item.completion.choices {
        let marker = if *index == item.selected_index {
            " (selected)"
        } else {
            ""
        };
        lines.push(Line::colored(
            format!("{}{marker}", choice_label(*index)),
            Color::Green,
        ));
        lines.push(Line::plain(message_text(message)));
        lines.push(Line::plain(""));
    }
    lines
}

pub fn render_history(history: &[HistoryItem]) -> Vec<Line> {
    history
        .iter()
        .enumerate()
        .flat_map(|(i, item)| render_item(SlotId(i), item, false))
        .collect()
}

/// Tracks which history slots have been printed
#[derive(Debug, Default)]
pub struct Transcript {
    shown: Vec<HistoryItem>,
}

impl Transcript {
    /// Lines for slots that are new or changed since the last update
    pub fn update(&mut self, history: &[HistoryItem]) -> Vec<Line> {
        let mut lines = Vec::new();
        for (i, item) in history.iter().enumerate() {
            match self.shown.get(i) {
                Some(previous) if previous == item => {}
                Some(_) => lines.extend(render_item(SlotId(i), item, true)),
                None => lines.extend(render_item(SlotId(i), item, false)),
            }
        }
        self.shown = history.to_vec();
        lines
    }
}
