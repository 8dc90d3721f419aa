//! Runi - Main Entry Point
//!
//! Headless driver for the frontend core. Loads settings, initializes
//! logging, wires one event bus, one command registry and one history
//! loader against an in-process backend, then runs a short scripted
//! session.

mod commands;

use std::sync::Arc;

use runi_application::{
    CommandRegistry, EventBus, WindowedHistory, handler, with_correlation_id,
};
use runi_domain::event::types;
use runi_domain::{
    CorrelationId, HistoryEntry, HttpResponse, KeyChord, RequestParams, RequestTiming,
};
use runi_infrastructure::{
    InMemoryHistoryBackend, LoggingConfig, SettingsRepository, SystemClock, init_logging,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

const DEMO_ENTRIES: usize = 120;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = SettingsRepository::new().load().await?;
    init_logging(&LoggingConfig::from_settings(&settings)?);
    info!("Starting Runi v{}", env!("CARGO_PKG_VERSION"));

    let bus = EventBus::new(Arc::new(SystemClock::new()));
    let backend = Arc::new(
        InMemoryHistoryBackend::with_entries(demo_entries(DEMO_ENTRIES)).with_event_bus(bus.clone()),
    );

    let _new_entries = bus.on(
        types::HISTORY_NEW,
        handler(|event| {
            let entry: HistoryEntry = event.payload_as()?;
            info!(summary = %entry.summary(), "history entry added");
            Ok(())
        }),
    );

    let history = Arc::new(WindowedHistory::open(Arc::clone(&backend), settings.history_page_size).await?);
    let window = history.snapshot();
    info!(loaded = window.len(), total = window.total_count, "history opened");

    let registry = Arc::new(CommandRegistry::new());
    commands::register_builtins(&registry, &bus, &history)?;

    let (requests_tx, mut requests_rx) = mpsc::unbounded_channel::<String>();
    let _requests = bus.on(
        types::COMMAND_REQUESTED,
        handler(move |event| {
            let id: String = event.payload_as()?;
            requests_tx.send(id)?;
            Ok(())
        }),
    );

    // Scripted session: a few key presses and one backend-side change.
    press(&registry, "Ctrl+Shift+P")?;
    press(&registry, "Ctrl+Down")?;
    backend.append(HistoryEntry::new(
        RequestParams::new("POST", "https://api.example.com/login")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"user":"demo"}"#),
        response(201, "Created", 87),
    ));
    press(&registry, "Ctrl+R")?;
    press(&registry, "Ctrl+Alt+Q")?;

    while let Ok(id) = requests_rx.try_recv() {
        let correlation_id = CorrelationId::generate();
        info!(command = %id, correlation_id = %correlation_id, "running command");
        if let Err(err) = with_correlation_id(correlation_id, registry.execute(&id, None)).await {
            warn!(command = %id, error = %err, "command failed");
        }
    }

    let window = history.snapshot();
    for entry in window.entries.iter().take(5) {
        info!("{} ({})", entry.summary(), entry.time_ago());
    }
    info!(
        loaded = window.len(),
        total = window.total_count,
        has_more = window.has_more(),
        error = ?window.error,
        "session finished"
    );

    Ok(())
}

fn press(registry: &CommandRegistry, descriptor: &str) -> Result<(), Box<dyn std::error::Error>> {
    let chord: KeyChord = descriptor.parse()?;
    if !registry.trigger_shortcut(&chord)? {
        info!(chord = %chord, "no command bound");
    }
    Ok(())
}

fn demo_entries(count: usize) -> Vec<HistoryEntry> {
    (0..count)
        .map(|n| {
            let status = if n % 7 == 0 { 404 } else { 200 };
            let text = if status == 200 { "OK" } else { "Not Found" };
            HistoryEntry::new(
                RequestParams::new("GET", format!("https://api.example.com/items/{n}")),
                response(status, text, 40 + (n as u64 % 13) * 17),
            )
        })
        .collect()
}

fn response(status: u16, status_text: &str, total_ms: u64) -> HttpResponse {
    HttpResponse {
        status,
        status_text: status_text.to_string(),
        headers: std::collections::BTreeMap::new(),
        body: String::new(),
        timing: RequestTiming {
            total_ms,
            ..RequestTiming::default()
        },
    }
}
