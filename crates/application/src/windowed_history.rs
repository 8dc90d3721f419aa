//! Windowed history loading.
//!
//! Presents a growable view over the backend-owned history collection
//! without ever holding the whole collection in memory. The first page is
//! fetched as count, then ids, then a hydration batch for exactly those
//! ids; later pages append to the view.
//!
//! State is observable through [`WindowedHistory::subscribe`], which
//! yields a new [`HistoryWindow`] on every transition. Fetch failures are
//! recorded in [`HistoryWindow::error`] instead of being returned, and
//! never discard entries that are already loaded.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use runi_domain::{DomainError, DomainResult, HistoryEntry};
use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::correlation::{current_correlation_id, ensure_correlation_id};
use crate::ports::{HistoryBackend, HistoryBackendError};

/// Snapshot of the loaded window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryWindow {
    /// Hydrated entries, in backend order (newest first). Ids are unique.
    pub entries: Vec<HistoryEntry>,
    /// Last total reported by the backend's count call.
    pub total_count: usize,
    /// Fetch granularity.
    pub page_size: usize,
    /// True while a fetch is in flight.
    pub is_loading: bool,
    /// Message of the most recent failure, cleared by the next success.
    pub error: Option<String>,
    /// The backend returned a short id page: nothing more to fetch until refresh.
    exhausted: bool,
    /// Bumped by every (re)load; stale fetches compare against it.
    generation: u64,
}

impl HistoryWindow {
    fn new(page_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            total_count: 0,
            page_size,
            is_loading: true,
            error: None,
            exhausted: false,
            generation: 0,
        }
    }

    /// True while more entries can be fetched with `load_more`.
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.exhausted && self.entries.len() < self.total_count
    }

    /// Number of loaded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a `load_more` or `refresh` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetch completed and was merged.
    Loaded {
        /// Entries added (load more) or now present (refresh).
        added: usize,
    },
    /// Nothing to do: no more entries, or another fetch is in flight.
    Skipped,
    /// A newer refresh started while this fetch was in flight; its result was dropped.
    Superseded,
    /// The fetch failed; the message is also stored in the window's `error`.
    Failed(String),
}

/// A fetched page, ordered and deduplicated.
struct Page {
    entries: Vec<HistoryEntry>,
    exhausted: bool,
}

/// Paginated controller over a [`HistoryBackend`].
pub struct WindowedHistory<B: ?Sized> {
    backend: Arc<B>,
    page_size: usize,
    state: watch::Sender<HistoryWindow>,
}

impl<B: HistoryBackend + ?Sized> WindowedHistory<B> {
    /// Creates a loader without fetching anything yet. The window starts
    /// empty and loading; call [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPageSize` if `page_size` is zero.
    pub fn new(backend: Arc<B>, page_size: usize) -> DomainResult<Self> {
        if page_size == 0 {
            return Err(DomainError::InvalidPageSize(page_size));
        }

        Ok(Self {
            backend,
            page_size,
            state: watch::Sender::new(HistoryWindow::new(page_size)),
        })
    }

    /// Creates a loader and runs the initial load.
    ///
    /// A failed initial load is reported through the window's `error`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPageSize` if `page_size` is zero.
    pub async fn open(backend: Arc<B>, page_size: usize) -> DomainResult<Self> {
        let history = Self::new(backend, page_size)?;
        history.initialize().await;
        Ok(history)
    }

    /// Runs the initial count, first id page and first batch.
    pub async fn initialize(&self) -> LoadOutcome {
        self.reload("initialize").await
    }

    /// Re-reads the count and replaces the entries with a fresh first page.
    ///
    /// The current entries stay visible until the new page is ready.
    pub async fn refresh(&self) -> LoadOutcome {
        self.reload("refresh").await
    }

    /// Fetches and appends the next page.
    ///
    /// A no-op returning [`LoadOutcome::Skipped`] when there is nothing more
    /// to load or another fetch is already in flight.
    pub async fn load_more(&self) -> LoadOutcome {
        let mut ticket = None;
        self.state.send_if_modified(|window| {
            if window.is_loading || !window.has_more() {
                return false;
            }
            window.is_loading = true;
            ticket = Some((window.generation, window.entries.len()));
            true
        });

        let Some((generation, offset)) = ticket else {
            debug!("load_more skipped");
            return LoadOutcome::Skipped;
        };

        let span = info_span!("history", op = "load_more", offset, correlation_id = tracing::field::Empty);
        ensure_correlation_id(
            async {
                record_correlation_id(&tracing::Span::current());
                let result = self.fetch_page(offset).await;
                self.merge_page(generation, result)
            }
            .instrument(span),
        )
        .await
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> HistoryWindow {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HistoryWindow> {
        self.state.subscribe()
    }

    /// Loaded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.state.borrow().entries.clone()
    }

    /// Last known total.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.state.borrow().total_count
    }

    /// True while a fetch is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    /// True while more entries can be loaded.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.state.borrow().has_more()
    }

    /// Message of the most recent failure.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Fetch granularity.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    async fn reload(&self, op: &'static str) -> LoadOutcome {
        let mut generation = 0;
        self.state.send_modify(|window| {
            window.generation += 1;
            window.is_loading = true;
            generation = window.generation;
        });

        let span = info_span!("history", op, correlation_id = tracing::field::Empty);
        ensure_correlation_id(
            async {
                record_correlation_id(&tracing::Span::current());
                let result = self.fetch_first_page().await;
                self.replace_window(generation, result)
            }
            .instrument(span),
        )
        .await
    }

    async fn fetch_first_page(&self) -> Result<(usize, Page), HistoryBackendError> {
        let total = self.backend.count().await?;
        if total == 0 {
            return Ok((
                0,
                Page {
                    entries: Vec::new(),
                    exhausted: true,
                },
            ));
        }

        let page = self.fetch_page(0).await?;
        Ok((total, page))
    }

    async fn fetch_page(&self, offset: usize) -> Result<Page, HistoryBackendError> {
        let ids = self.backend.ids(offset, self.page_size).await?;
        let exhausted = ids.len() < self.page_size;
        if ids.is_empty() {
            return Ok(Page {
                entries: Vec::new(),
                exhausted,
            });
        }

        let mut hydrated: HashMap<String, HistoryEntry> = self
            .backend
            .batch(&ids)
            .await?
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();

        // Keep the id order; removing from the map also drops repeated ids.
        let entries: Vec<HistoryEntry> = ids.iter().filter_map(|id| hydrated.remove(id)).collect();
        if entries.len() < ids.len() {
            warn!(
                requested = ids.len(),
                hydrated = entries.len(),
                "batch returned fewer entries than ids"
            );
        }

        Ok(Page { entries, exhausted })
    }

    fn replace_window(
        &self,
        generation: u64,
        result: Result<(usize, Page), HistoryBackendError>,
    ) -> LoadOutcome {
        let mut outcome = LoadOutcome::Superseded;
        self.state.send_if_modified(|window| {
            if window.generation != generation {
                return false;
            }
            window.is_loading = false;
            outcome = match result {
                Ok((total, page)) => {
                    window.total_count = total;
                    window.entries = page.entries;
                    window.exhausted = page.exhausted;
                    window.error = None;
                    info!(total, loaded = window.entries.len(), "history window replaced");
                    LoadOutcome::Loaded {
                        added: window.entries.len(),
                    }
                }
                Err(err) => record_failure(window, &err),
            };
            true
        });

        if outcome == LoadOutcome::Superseded {
            debug!("reload superseded by a newer one");
        }
        outcome
    }

    fn merge_page(&self, generation: u64, result: Result<Page, HistoryBackendError>) -> LoadOutcome {
        let mut outcome = LoadOutcome::Superseded;
        self.state.send_if_modified(|window| {
            if window.generation != generation {
                return false;
            }
            window.is_loading = false;
            outcome = match result {
                Ok(page) => {
                    let known: HashSet<String> =
                        window.entries.iter().map(|entry| entry.id.clone()).collect();
                    let before = window.entries.len();
                    window
                        .entries
                        .extend(page.entries.into_iter().filter(|entry| !known.contains(&entry.id)));
                    window.exhausted = page.exhausted;
                    window.error = None;

                    let added = window.entries.len() - before;
                    info!(added, loaded = window.entries.len(), total = window.total_count, "history page appended");
                    LoadOutcome::Loaded { added }
                }
                Err(err) => record_failure(window, &err),
            };
            true
        });

        if outcome == LoadOutcome::Superseded {
            debug!("page dropped: a refresh started while it was loading");
        }
        outcome
    }
}

fn record_failure(window: &mut HistoryWindow, err: &HistoryBackendError) -> LoadOutcome {
    let message = err.to_string();
    warn!(error = %message, "history fetch failed");
    window.error = Some(message.clone());
    LoadOutcome::Failed(message)
}

fn record_correlation_id(span: &tracing::Span) {
    if let Some(id) = current_correlation_id() {
        span.record("correlation_id", tracing::field::display(id));
    }
}
