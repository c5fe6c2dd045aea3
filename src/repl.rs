//! Interactive terminal chat
//!
//! Input is read line by line from stdin and turned into store operations.
//! A separate task prints the transcript as the store's selectors change,
//! so replies show up while the user is free to type.
//!
//! `/quit` leaves at once. End of input first waits for an outstanding
//! reply, so `echo hi | term-chat` prints the answer.

mod input;
mod render;

use crate::llm::ModelDef;
use crate::runtime::{ChatStore, Selector};
use crate::state_machine::{ChatError, HistoryItem, SlotId};
use input::{parse_input, Input};
use render::{print_lines, Line, Spinner, Transcript};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Quit,
    EndOfInput,
}

/// Run the chat until `/quit` or end of input, then shut the store down
pub async fn run(store: ChatStore, model: &ModelDef, candidate_count: u8) -> std::io::Result<()> {
    print_lines(&render::banner(model, candidate_count));
    let renderer = spawn_renderer(&store);

    let exit = read_input(&store).await;
    if matches!(exit, Ok(Exit::EndOfInput)) {
        store.wait_idle().await;
    }

    // The renderer drains the final snapshot once the store closes
    store.shutdown().await;
    if let Err(e) = renderer.await {
        tracing::error!(error = %e, "Renderer task failed");
    }

    print_lines(&[Line::plain("Bye!")]);
    exit.map(|_| ())
}

async fn read_input(store: &ChatStore) -> std::io::Result<Exit> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Ok(Input::Quit) => return Ok(Exit::Quit),
            Ok(input) => handle_input(store, input),
            Err(usage) => print_lines(&[Line::error(usage)]),
        }
    }
    Ok(Exit::EndOfInput)
}

fn handle_input(store: &ChatStore, input: Input) {
    match input {
        Input::Empty | Input::Quit => {}
        Input::Prompt(text) => store.add_prompt(&text),
        Input::Choose { slot, index } => {
            let slot = slot.or_else(|| store.state().get().latest_completion_slot());
            match slot {
                Some(slot) if is_completion(&store.history().get(), slot) => {
                    tracing::debug!(%slot, index, "Selecting choice");
                    store.select_choice(slot, index);
                }
                Some(slot) => print_lines(&[Line::error(format!("{slot} is not a reply"))]),
                None => print_lines(&[Line::error("No reply to choose from yet")]),
            }
        }
        Input::Show(slot) => {
            let history = store.history().get();
            match history.get(slot.0) {
                Some(HistoryItem::Completion(item)) => {
                    print_lines(&render::render_choices(slot, item));
                }
                Some(item) => print_lines(&render::render_item(slot, item, false)),
                None => print_lines(&[Line::error(format!("No such slot: {slot}"))]),
            }
        }
        Input::History => print_lines(&render::render_history(&store.history().get())),
        Input::Help => print_lines(&render::help()),
    }
}

fn is_completion(history: &[HistoryItem], slot: SlotId) -> bool {
    matches!(history.get(slot.0), Some(HistoryItem::Completion(_)))
}

fn spawn_renderer(store: &ChatStore) -> JoinHandle<()> {
    tokio::spawn(render_updates(
        store.history(),
        store.awaiting(),
        store.error(),
    ))
}

/// Print transcript changes until the store shuts down
async fn render_updates(
    mut history: Selector<Arc<Vec<HistoryItem>>>,
    mut awaiting: Selector<bool>,
    mut error: Selector<Option<Arc<ChatError>>>,
) {
    let mut transcript = Transcript::default();
    let mut spinner = Spinner::new();
    spinner.print(&transcript.update(&history.get()));

    // Keep going until every selector has closed, so the last snapshot is
    // printed in full after shutdown
    let (mut history_open, mut awaiting_open, mut error_open) = (true, true, true);
    while history_open || awaiting_open || error_open {
        // History first, so a prompt is printed before its spinner
        tokio::select! {
            biased;

            next = history.changed(), if history_open => match next {
                Some(items) => spinner.print(&transcript.update(&items)),
                None => history_open = false,
            },

            next = awaiting.changed(), if awaiting_open => match next {
                Some(true) => spinner.start(),
                Some(false) => spinner.stop(),
                None => awaiting_open = false,
            },

            next = error.changed(), if error_open => match next {
                Some(Some(err)) => spinner.print(&[render::error(&err)]),
                Some(None) => {}
                None => error_open = false,
            },
        }
    }
    spinner.stop();
}
