//! Task-scoped correlation ids.
//!
//! A correlation id is bound to the current task for the duration of a
//! scope and read back anywhere below it without threading a parameter
//! through every call. Leaving the scope restores whatever was bound
//! before, including when the scope exits through an error or a panic.

use std::future::Future;

use runi_domain::CorrelationId;

tokio::task_local! {
    static CORRELATION_ID: CorrelationId;
}

/// Runs `fut` with `id` bound as the current correlation id.
pub async fn with_correlation_id<F: Future>(id: CorrelationId, fut: F) -> F::Output {
    CORRELATION_ID.scope(id, fut).await
}

/// Runs `fut` under the current correlation id, or a fresh one if none is bound.
pub async fn ensure_correlation_id<F: Future>(fut: F) -> F::Output {
    match current_correlation_id() {
        Some(_) => fut.await,
        None => with_correlation_id(CorrelationId::generate(), fut).await,
    }
}

/// Runs the synchronous closure `f` with `id` bound as the current correlation id.
pub fn sync_scope<R>(id: CorrelationId, f: impl FnOnce() -> R) -> R {
    CORRELATION_ID.sync_scope(id, f)
}

/// Returns the correlation id bound to the current task, if any.
#[must_use]
pub fn current_correlation_id() -> Option<CorrelationId> {
    CORRELATION_ID.try_with(Clone::clone).ok()
}
