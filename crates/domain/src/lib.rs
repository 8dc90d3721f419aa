//! Runi Domain - Core data types
//!
//! This crate defines the data model shared by the frontend core:
//! events, history records, keyboard chords, structured backend errors and
//! settings. All types here are pure Rust with no I/O dependencies.

pub mod backend_error;
pub mod correlation;
pub mod error;
pub mod event;
pub mod history;
pub mod http;
pub mod id;
pub mod keyboard;
pub mod settings;

pub use backend_error::{AppError, RawBackendError, UNKNOWN_ERROR_CODE, normalize_backend_error};
pub use correlation::CorrelationId;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use history::{HistoryEntry, HistoryNotification};
pub use http::{HttpResponse, RequestParams, RequestTiming};
pub use id::{generate_history_id, generate_id};
pub use keyboard::{KeyChord, KeyModifier};
pub use settings::AppSettings;
