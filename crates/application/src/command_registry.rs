//! Command registry
//!
//! Backs the command palette and global keyboard shortcuts: a table from
//! command id to an executable action, kept in registration order.
//!
//! Unlike the event bus, failures here are not swallowed. Registering a
//! duplicate id, executing an unknown id, or a handler returning an error
//! all surface to the caller, which is expected to report them (for
//! example as a toast).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use runi_domain::{DomainError, DomainResult, KeyChord};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{HandlerError, HandlerResult};

/// Boxed future returned by command handlers.
pub type CommandFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// A command's primary action. Receives the optional free-form argument.
pub type CommandHandler = Arc<dyn Fn(Option<Value>) -> CommandFuture + Send + Sync>;

/// A shortcut's own action, independent of the command handler.
pub type ShortcutHandler = Arc<dyn Fn() -> HandlerResult + Send + Sync>;

/// Errors raised by the command registry.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A command with this id already exists.
    #[error("Command \"{0}\" is already registered")]
    AlreadyRegistered(String),

    /// No command with this id exists.
    #[error("Command \"{0}\" not found")]
    NotFound(String),

    /// The command definition is invalid.
    #[error("invalid command: {0}")]
    Invalid(#[from] DomainError),

    /// The command handler returned an error.
    #[error("Command \"{id}\" failed: {source}")]
    Failed {
        /// Id of the failing command.
        id: String,
        /// Error returned by the handler.
        source: HandlerError,
    },

    /// The shortcut handler of a command returned an error.
    #[error("Shortcut {chord} of command \"{id}\" failed: {source}")]
    ShortcutFailed {
        /// Id of the command owning the shortcut.
        id: String,
        /// The chord that was pressed.
        chord: String,
        /// Error returned by the shortcut handler.
        source: HandlerError,
    },
}

/// A keyboard shortcut attached to a command.
///
/// The shortcut carries its own handler, which may differ from the
/// command's handler.
#[derive(Clone)]
pub struct Shortcut {
    chord: KeyChord,
    handler: ShortcutHandler,
}

impl Shortcut {
    /// Creates a shortcut for `chord`.
    pub fn new<F>(chord: KeyChord, handler: F) -> Self
    where
        F: Fn() -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            chord,
            handler: Arc::new(handler),
        }
    }

    /// Creates a shortcut from a descriptor such as `"Ctrl+Shift+P"`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidShortcut` if the descriptor is malformed.
    pub fn parse<F>(descriptor: &str, handler: F) -> DomainResult<Self>
    where
        F: Fn() -> HandlerResult + Send + Sync + 'static,
    {
        Ok(Self::new(descriptor.parse()?, handler))
    }

    /// The key chord that triggers this shortcut.
    #[must_use]
    pub const fn chord(&self) -> &KeyChord {
        &self.chord
    }

    /// Human-readable form, e.g. `Ctrl+S`.
    #[must_use]
    pub fn display(&self) -> String {
        self.chord.to_string()
    }

    /// Runs the shortcut's handler.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler returns.
    pub fn trigger(&self) -> HandlerResult {
        (self.handler)()
    }
}

impl fmt::Debug for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shortcut")
            .field("chord", &self.chord.to_string())
            .finish_non_exhaustive()
    }
}

/// A named, UI-invocable action.
#[derive(Clone)]
pub struct Command {
    /// Unique key.
    pub id: String,
    /// Label shown in the command palette.
    pub title: String,
    /// Optional grouping.
    pub category: Option<String>,
    /// Optional keyboard shortcut.
    pub shortcut: Option<Shortcut>,
    handler: CommandHandler,
}

impl Command {
    /// Creates a command with an asynchronous handler.
    pub fn new<F, Fut>(id: impl Into<String>, title: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            id: id.into(),
            title: title.into(),
            category: None,
            shortcut: None,
            handler: Arc::new(move |args| -> CommandFuture { Box::pin(handler(args)) }),
        }
    }

    /// Creates a command with a synchronous handler.
    pub fn from_fn<F>(id: impl Into<String>, title: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Option<Value>) -> HandlerResult + Send + Sync + 'static,
    {
        Self::new(id, title, move |args| {
            let result = handler(args);
            async move { result }
        })
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attaches a keyboard shortcut.
    #[must_use]
    pub fn with_shortcut(mut self, shortcut: Shortcut) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    /// Invokes the handler with `args`.
    #[must_use]
    pub fn invoke(&self, args: Option<Value>) -> CommandFuture {
        (self.handler)(args)
    }

    /// Case-insensitive match against id, title and category.
    #[must_use]
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.to_lowercase();
        self.id.to_lowercase().contains(&filter)
            || self.title.to_lowercase().contains(&filter)
            || self
                .category
                .as_deref()
                .is_some_and(|category| category.to_lowercase().contains(&filter))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("category", &self.category)
            .field("shortcut", &self.shortcut)
            .finish_non_exhaustive()
    }
}

/// Lookup table from command id to [`Command`], in registration order.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: RwLock<IndexMap<String, Command>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::AlreadyRegistered` if the id is taken (the
    /// existing command is left untouched) or `CommandError::Invalid` for a
    /// blank id.
    pub fn register(&self, command: Command) -> Result<(), CommandError> {
        if command.id.trim().is_empty() {
            return Err(DomainError::InvalidIdentifier("command id must not be empty".into()).into());
        }

        let mut commands = self.commands.write();
        if commands.contains_key(&command.id) {
            warn!(command = %command.id, "duplicate command registration rejected");
            return Err(CommandError::AlreadyRegistered(command.id));
        }

        debug!(command = %command.id, "command registered");
        commands.insert(command.id.clone(), command);
        Ok(())
    }

    /// Removes a command. Returns whether it existed.
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self.commands.write().shift_remove(id).is_some();
        if removed {
            debug!(command = id, "command unregistered");
        }
        removed
    }

    /// Runs the command `id` with `args`, waiting for its handler to finish.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::NotFound` for an unknown id (no handler runs)
    /// and `CommandError::Failed` when the handler returns an error.
    pub async fn execute(&self, id: &str, args: Option<Value>) -> Result<(), CommandError> {
        let command = self
            .get(id)
            .ok_or_else(|| CommandError::NotFound(id.to_string()))?;

        debug!(command = id, "executing command");
        command
            .invoke(args)
            .await
            .map_err(|source| CommandError::Failed {
                id: id.to_string(),
                source,
            })
    }

    /// Returns the command registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Command> {
        self.commands.read().get(id).cloned()
    }

    /// Returns every command in registration order.
    #[must_use]
    pub fn all(&self) -> Vec<Command> {
        self.commands.read().values().cloned().collect()
    }

    /// Returns the commands in `category`, in registration order.
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<Command> {
        self.commands
            .read()
            .values()
            .filter(|command| command.category.as_deref() == Some(category))
            .cloned()
            .collect()
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.commands.read().contains_key(id)
    }

    /// Returns the shortcut of command `id`, if it exists and has one.
    #[must_use]
    pub fn shortcut(&self, id: &str) -> Option<Shortcut> {
        self.commands
            .read()
            .get(id)
            .and_then(|command| command.shortcut.clone())
    }

    /// Palette filtering: commands matching `filter`, in registration order.
    #[must_use]
    pub fn search(&self, filter: &str) -> Vec<Command> {
        self.commands
            .read()
            .values()
            .filter(|command| command.matches(filter))
            .cloned()
            .collect()
    }

    /// Returns the first command whose shortcut is bound to `chord`.
    #[must_use]
    pub fn find_by_chord(&self, chord: &KeyChord) -> Option<Command> {
        self.commands
            .read()
            .values()
            .find(|command| {
                command
                    .shortcut
                    .as_ref()
                    .is_some_and(|shortcut| shortcut.chord() == chord)
            })
            .cloned()
    }

    /// Runs the shortcut handler bound to `chord`. Returns false when no
    /// command claims the chord.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::ShortcutFailed` if the shortcut handler fails.
    pub fn trigger_shortcut(&self, chord: &KeyChord) -> Result<bool, CommandError> {
        let Some(command) = self.find_by_chord(chord) else {
            return Ok(false);
        };
        let Some(shortcut) = command.shortcut else {
            return Ok(false);
        };

        debug!(command = %command.id, chord = %chord, "shortcut triggered");
        shortcut
            .trigger()
            .map(|()| true)
            .map_err(|source| CommandError::ShortcutFailed {
                id: command.id,
                chord: chord.to_string(),
                source,
            })
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.read().len()
    }

    /// Returns true if no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.read().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop(id: &str) -> Command {
        Command::from_fn(id, id.to_uppercase(), |_| Ok(()))
    }

    fn ids(commands: &[Command]) -> Vec<&str> {
        commands.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_execute_passes_args() {
        let registry = CommandRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry
            .register(Command::from_fn("file.save", "Save", move |args| {
                sink.lock().push(args);
                Ok(())
            }))
            .unwrap();

        registry.execute("file.save", None).await.unwrap();
        registry
            .execute("file.save", Some(json!({"path": "/tmp/a"})))
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec![None, Some(json!({"path": "/tmp/a"}))]);
    }

    #[tokio::test]
    async fn test_async_handler_is_awaited() {
        let registry = CommandRegistry::new();
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        registry
            .register(Command::new("request.send", "Send", move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    tokio::task::yield_now().await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }))
            .unwrap();

        registry.execute("request.send", None).await.unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_duplicate_registration_keeps_original() {
        let registry = CommandRegistry::new();
        registry
            .register(Command::from_fn("file.save", "Save", |_| Ok(())))
            .unwrap();

        let err = registry
            .register(Command::from_fn("file.save", "Overwrite", |_| Ok(())))
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("file.save"));
        assert!(message.contains("already registered"));
        assert_eq!(registry.get("file.save").unwrap().title, "Save");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_blank_id_rejected() {
        let registry = CommandRegistry::new();
        let err = registry.register(noop("  ")).unwrap_err();
        assert!(matches!(err, CommandError::Invalid(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_execute_unknown_id() {
        let registry = CommandRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        registry
            .register(Command::from_fn("known", "Known", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();

        let err = registry.execute("missing", None).await.unwrap_err();
        assert!(matches!(err, CommandError::NotFound(ref id) if id == "missing"));
        assert!(err.to_string().contains("missing"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let registry = CommandRegistry::new();
        registry
            .register(Command::new("request.send", "Send", |_| async {
                Err::<(), HandlerError>("backend unreachable".into())
            }))
            .unwrap();

        let err = registry.execute("request.send", None).await.unwrap_err();
        match err {
            CommandError::Failed { id, source } => {
                assert_eq!(id, "request.send");
                assert_eq!(source.to_string(), "backend unreachable");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_registration_order_and_categories() {
        let registry = CommandRegistry::new();
        registry.register(noop("b").with_category("file")).unwrap();
        registry.register(noop("a").with_category("view")).unwrap();
        registry.register(noop("c").with_category("file")).unwrap();

        assert_eq!(ids(&registry.all()), vec!["b", "a", "c"]);
        assert_eq!(ids(&registry.by_category("file")), vec!["b", "c"]);
        assert!(registry.by_category("nope").is_empty());
    }

    #[test]
    fn test_unregister() {
        let registry = CommandRegistry::new();
        registry.register(noop("a")).unwrap();
        registry.register(noop("b")).unwrap();
        registry.register(noop("c")).unwrap();

        assert!(registry.unregister("b"));
        assert!(!registry.unregister("b"));
        assert!(!registry.has("b"));
        assert!(registry.get("b").is_none());
        assert_eq!(ids(&registry.all()), vec!["a", "c"]);

        // Id is free again after unregistering.
        registry.register(noop("b")).unwrap();
        assert_eq!(ids(&registry.all()), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_shortcut_lookup() {
        let registry = CommandRegistry::new();
        let shortcut = Shortcut::parse("Ctrl+S", || Ok(())).unwrap();
        registry
            .register(noop("file.save").with_shortcut(shortcut))
            .unwrap();
        registry.register(noop("plain")).unwrap();

        assert_eq!(registry.shortcut("file.save").unwrap().display(), "Ctrl+S");
        assert!(registry.shortcut("plain").is_none());
        assert!(registry.shortcut("missing").is_none());
    }

    #[tokio::test]
    async fn test_shortcut_handler_is_independent() {
        let registry = CommandRegistry::new();
        let command_calls = Arc::new(AtomicUsize::new(0));
        let shortcut_calls = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&command_calls);
        let s = Arc::clone(&shortcut_calls);
        registry
            .register(
                Command::from_fn("palette.open", "Open Palette", move |_| {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .with_shortcut(
                    Shortcut::parse("Ctrl+Shift+P", move || {
                        s.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .unwrap(),
                ),
            )
            .unwrap();

        let chord: KeyChord = "shift+ctrl+p".parse().unwrap();
        assert_eq!(registry.find_by_chord(&chord).unwrap().id, "palette.open");
        assert!(registry.trigger_shortcut(&chord).unwrap());
        assert_eq!(shortcut_calls.load(Ordering::SeqCst), 1);
        assert_eq!(command_calls.load(Ordering::SeqCst), 0);

        registry.execute("palette.open", None).await.unwrap();
        assert_eq!(command_calls.load(Ordering::SeqCst), 1);
        assert_eq!(shortcut_calls.load(Ordering::SeqCst), 1);

        let unbound: KeyChord = "Ctrl+Q".parse().unwrap();
        assert!(!registry.trigger_shortcut(&unbound).unwrap());
    }

    #[test]
    fn test_failing_shortcut() {
        let registry = CommandRegistry::new();
        registry
            .register(noop("x").with_shortcut(Shortcut::parse("Alt+X", || Err("nope".into())).unwrap()))
            .unwrap();

        let err = registry
            .trigger_shortcut(&"Alt+X".parse().unwrap())
            .unwrap_err();
        assert!(matches!(err, CommandError::ShortcutFailed { ref id, .. } if id == "x"));
    }

    #[test]
    fn test_search() {
        let registry = CommandRegistry::new();
        registry
            .register(Command::from_fn("file.save", "Save Request", |_| Ok(())).with_category("File"))
            .unwrap();
        registry
            .register(Command::from_fn("history.clear", "Clear History", |_| Ok(())))
            .unwrap();

        assert_eq!(ids(&registry.search("SAVE")), vec!["file.save"]);
        assert_eq!(ids(&registry.search("file")), vec!["file.save"]);
        assert_eq!(ids(&registry.search("")), vec!["file.save", "history.clear"]);
        assert!(registry.search("zzz").is_empty());
    }
}
