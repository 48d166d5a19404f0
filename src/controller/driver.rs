//! Tokio event loop around a [`SearchController`].
//!
//! The UI sends [`SearchCommand`]s through a [`SearchHandle`] and watches
//! [`SearchSnapshot`]s. One task owns the controller, so commands are applied
//! strictly in order and a new query always supersedes the pending one.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{SearchController, SearchSnapshot};
use crate::catalog::Catalog;
use crate::core::suggestions::SearchSuggestion;
use crate::services::storage::KeyValueStore;

/// Messages accepted by the search loop.
#[derive(Debug, Clone)]
pub enum SearchCommand {
    Search(String),
    SelectSuggestion(SearchSuggestion),
    ToggleFavorite(String),
    ClearHistory,
    ReplaceCatalog(Catalog),
}

/// Returned when the search loop has stopped.
pub type SendError = mpsc::error::SendError<SearchCommand>;

/// Cloneable handle to a running search loop. The loop stops once every
/// handle is dropped.
#[derive(Clone)]
pub struct SearchHandle {
    commands: mpsc::UnboundedSender<SearchCommand>,
    snapshots: watch::Receiver<SearchSnapshot>,
}

impl SearchHandle {
    pub fn send(&self, command: SearchCommand) -> Result<(), SendError> {
        self.commands.send(command)
    }

    pub fn search(&self, query: impl Into<String>) -> Result<(), SendError> {
        self.send(SearchCommand::Search(query.into()))
    }

    pub fn select_suggestion(&self, suggestion: SearchSuggestion) -> Result<(), SendError> {
        self.send(SearchCommand::SelectSuggestion(suggestion))
    }

    pub fn toggle_favorite(&self, utility_id: impl Into<String>) -> Result<(), SendError> {
        self.send(SearchCommand::ToggleFavorite(utility_id.into()))
    }

    pub fn clear_history(&self) -> Result<(), SendError> {
        self.send(SearchCommand::ClearHistory)
    }

    pub fn replace_catalog(&self, catalog: Catalog) -> Result<(), SendError> {
        self.send(SearchCommand::ReplaceCatalog(catalog))
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SearchSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A fresh receiver for state changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.snapshots.clone()
    }
}

/// Run `controller` on a new tokio task.
///
/// Must be called from within a tokio runtime.
pub fn spawn<S>(controller: SearchController<S>) -> (SearchHandle, JoinHandle<()>)
where
    S: KeyValueStore + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

    let task = tokio::spawn(search_loop(controller, command_rx, snapshot_tx));

    (
        SearchHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        },
        task,
    )
}

async fn search_loop<S: KeyValueStore>(
    mut controller: SearchController<S>,
    mut commands: mpsc::UnboundedReceiver<SearchCommand>,
    snapshots: watch::Sender<SearchSnapshot>,
) {
    loop {
        let deadline = controller.next_deadline().map(Instant::from_std);

        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => apply(&mut controller, command),
                None => break,
            },
            _ = sleep_until(deadline) => {
                controller.poll_at(Instant::now().into_std());
            }
        }

        snapshots.send_replace(controller.snapshot());
    }

    tracing::debug!("Search loop stopped");
}

fn apply<S: KeyValueStore>(controller: &mut SearchController<S>, command: SearchCommand) {
    let now = Instant::now().into_std();
    match command {
        SearchCommand::Search(query) => controller.perform_search_at(&query, now),
        SearchCommand::SelectSuggestion(suggestion) => {
            controller.handle_suggestion_select_at(&suggestion, now)
        }
        SearchCommand::ToggleFavorite(id) => {
            controller.toggle_favorite(&id);
        }
        SearchCommand::ClearHistory => controller.clear_history(),
        SearchCommand::ReplaceCatalog(catalog) => controller.replace_catalog(catalog),
    }
}

/// Sleep until `deadline`, or forever when nothing is pending.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
