use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    cli::config::{AppConfig, resolve_scanner_config},
    error::InspectorError,
    form::form_model::FormSnapshot,
    page::page_model::{FiberGraph, Page},
    relay::{
        badge::{Badge, BadgeBoard},
        coordinator::Coordinator,
        message::ClientMessage,
        registry::TabId,
        source::ExtensionContext,
    },
    runtime::{
        coordinator_task::spawn_coordinator, page_task::spawn_page,
        source_task::spawn_relay_source,
    },
    scanner::scanner::Scanner,
    trace::logger::TraceLogger,
};

/// Extra time granted after each scheduled scan before looking at results.
const SETTLE_MARGIN: Duration = Duration::from_millis(50);

pub fn load_page(path: &str) -> Result<Page, InspectorError> {
    let raw = std::fs::read_to_string(path)?;
    Page::from_json(&raw)
}

pub fn load_graph(path: &str) -> Result<FiberGraph, InspectorError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// `scan`: one scan over a page fixture.
pub fn cmd_scan(
    page_path: &str,
    fingerprint: Option<&str>,
    config: &AppConfig,
) -> Result<Vec<FormSnapshot>, InspectorError> {
    let page = load_page(page_path)?;
    let scanner = Scanner::new(resolve_scanner_config(config, fingerprint)?);
    let forms = scanner.scan(&page)?;
    info!(forms = forms.len(), page = page_path, "scan finished");
    Ok(forms)
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub tab: TabId,
    /// Every state-update the inspector received, in order.
    pub updates: Vec<ClientMessage>,
    /// Badge as it stood before teardown.
    pub badge: Option<Badge>,
}

/// `simulate`: page → Relay-Source → Coordinator → Inspector Client.
pub async fn cmd_simulate(
    page_path: &str,
    commit_paths: &[String],
    tab: u32,
    fingerprint: Option<&str>,
    trace: Option<&str>,
    config: &AppConfig,
) -> Result<SimulationReport, InspectorError> {
    let tab = TabId(tab);
    let scanner_config = resolve_scanner_config(config, fingerprint)?;
    let page = load_page(page_path)?;
    let commits = commit_paths
        .iter()
        .map(|p| load_graph(p))
        .collect::<Result<Vec<_>, _>>()?;

    let board = BadgeBoard::new();
    let trace_logger = trace
        .or(config.relay.trace_file.as_deref())
        .map(TraceLogger::new)
        .unwrap_or_else(TraceLogger::disabled);
    let (coordinator, coordinator_task) =
        spawn_coordinator(Coordinator::new(board.clone()).with_trace(trace_logger));
    coordinator.set_active_tab(Some(tab));

    let settle = scanner_config.settle_delay() + SETTLE_MARGIN;
    let debounce = scanner_config.max_wait() + SETTLE_MARGIN;

    let (window_tx, window_rx) = mpsc::unbounded_channel();
    let (page_handle, page_task) = spawn_page(page, scanner_config, window_tx)?;
    let context = ExtensionContext::new();
    let source_task = spawn_relay_source(
        tab,
        coordinator.clone(),
        page_handle.clone(),
        window_rx,
        Arc::new(context.clone()),
        Duration::from_millis(config.relay.retry_delay_ms),
    );

    tokio::time::sleep(settle).await;

    let mut client = coordinator.connect_client()?;
    tokio::time::sleep(SETTLE_MARGIN).await;

    for graph in commits {
        page_handle.commit(graph);
        tokio::time::sleep(debounce).await;
    }

    client.refresh()?;
    tokio::time::sleep(SETTLE_MARGIN).await;

    let mut updates = Vec::new();
    while let Some(update) = client.try_next_update() {
        updates.push(update);
    }

    let badge = board.get(tab);

    page_handle.teardown();
    let page = page_task
        .await
        .map_err(|e| InspectorError::Task(e.to_string()))?;
    context.invalidate();
    source_task
        .await
        .map_err(|e| InspectorError::Task(e.to_string()))?;
    coordinator.shutdown();
    coordinator_task
        .await
        .map_err(|e| InspectorError::Task(e.to_string()))?;

    info!(updates = updates.len(), injected = page.is_injected(), "simulation finished");

    Ok(SimulationReport {
        tab,
        updates,
        badge,
    })
}
