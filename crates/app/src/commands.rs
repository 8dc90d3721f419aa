//! Built-in commands.
//!
//! Shortcuts never call command handlers directly: pressing one emits
//! `command.requested` with the command id, and the session decides
//! whether and when to execute it.

use std::sync::Arc;

use runi_application::ports::HistoryBackend;
use runi_application::{
    Command, CommandRegistry, EventBus, HandlerResult, LoadOutcome, Shortcut, WindowedHistory,
};
use runi_domain::event::types;
use serde_json::Value;
use tracing::info;

/// Refreshes the history window.
pub const HISTORY_REFRESH: &str = "history.refresh";
/// Loads the next history page.
pub const HISTORY_LOAD_MORE: &str = "history.loadMore";
/// Lists every registered command.
pub const PALETTE_OPEN: &str = "palette.open";

/// Registers the built-in commands on `registry`.
///
/// # Errors
///
/// Fails if one of the ids is already registered.
pub fn register_builtins<B>(
    registry: &Arc<CommandRegistry>,
    bus: &EventBus,
    history: &Arc<WindowedHistory<B>>,
) -> runi_application::ApplicationResult<()>
where
    B: HistoryBackend + ?Sized + 'static,
{
    let refresh = {
        let history = Arc::clone(history);
        Command::new(HISTORY_REFRESH, "Refresh History", move |_| {
            let history = Arc::clone(&history);
            async move { outcome_to_result(history.refresh().await) }
        })
        .with_category("History")
        .with_shortcut(Shortcut::parse("Ctrl+R", request(bus, HISTORY_REFRESH))?)
    };

    let load_more = {
        let history = Arc::clone(history);
        Command::new(HISTORY_LOAD_MORE, "Load More History", move |_| {
            let history = Arc::clone(&history);
            async move { outcome_to_result(history.load_more().await) }
        })
        .with_category("History")
        .with_shortcut(Shortcut::parse("Ctrl+Down", request(bus, HISTORY_LOAD_MORE))?)
    };

    let palette = {
        let weak = Arc::downgrade(registry);
        Command::from_fn(PALETTE_OPEN, "Show All Commands", move |_| {
            if let Some(registry) = weak.upgrade() {
                for command in registry.all() {
                    let shortcut = command.shortcut.as_ref().map(Shortcut::display);
                    info!(id = %command.id, title = %command.title, shortcut = ?shortcut, "command");
                }
            }
            Ok(())
        })
        .with_category("View")
        .with_shortcut(Shortcut::parse("Ctrl+Shift+P", request(bus, PALETTE_OPEN))?)
    };

    registry.register(refresh)?;
    registry.register(load_more)?;
    registry.register(palette)?;
    Ok(())
}

fn request(bus: &EventBus, id: &'static str) -> impl Fn() -> HandlerResult + Send + Sync + 'static {
    let bus = bus.clone();
    move || {
        bus.emit_from(types::COMMAND_REQUESTED, Value::from(id), Some("shortcut"));
        Ok(())
    }
}

fn outcome_to_result(outcome: LoadOutcome) -> HandlerResult {
    match outcome {
        LoadOutcome::Failed(message) => Err(message.into()),
        LoadOutcome::Loaded { .. } | LoadOutcome::Skipped | LoadOutcome::Superseded => Ok(()),
    }
}
