use std::sync::Arc;

use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    error::InspectorError,
    page::{commit::CommitSubscription, page_model::{FiberGraph, Page}},
    relay::message::{PageEnvelope, PageMessage},
    runtime::now,
    scanner::{scanner::Scanner, scanner_model::ScannerConfig},
};

#[derive(Debug)]
pub enum PageControl {
    /// The framework commits a new render tree.
    Commit(FiberGraph),
    DomMutation,
    /// A window message posted into the page.
    Window(PageEnvelope),
    Teardown,
}

#[derive(Debug, Clone)]
pub struct PageHandle {
    tx: mpsc::UnboundedSender<PageControl>,
}

impl PageHandle {
    pub fn commit(&self, nodes: FiberGraph) {
        let _ = self.tx.send(PageControl::Commit(nodes));
    }

    pub fn dom_mutation(&self) {
        let _ = self.tx.send(PageControl::DomMutation);
    }

    /// `window.postMessage` into the page.
    pub fn post_window(&self, envelope: PageEnvelope) {
        if self.tx.send(PageControl::Window(envelope)).is_err() {
            debug!("page gone, window message dropped");
        }
    }

    pub fn teardown(&self) {
        let _ = self.tx.send(PageControl::Teardown);
    }
}

/// Inject the scanner into `page` and run it. Scanner output is posted to
/// `window` as tagged envelopes.
///
/// The task returns the page, with the original commit callback restored,
/// after [`PageHandle::teardown`].
pub fn spawn_page(
    mut page: Page,
    config: ScannerConfig,
    window: mpsc::UnboundedSender<PageEnvelope>,
) -> Result<(PageHandle, JoinHandle<Page>), InspectorError> {
    page.mark_injected()?;

    let Some(hook) = page.hook.as_mut() else {
        warn!("devtools hook not found; no inspection");
        return Err(InspectorError::HookMissing);
    };

    let commit_signal = Arc::new(Notify::new());
    let notify = Arc::clone(&commit_signal);
    let subscription = CommitSubscription::install(hook, move || notify.notify_one());

    let (tx, rx) = mpsc::unbounded_channel();
    let mut scanner = Scanner::new(config);
    scanner.injected(now());

    let task = tokio::spawn(run(page, scanner, subscription, commit_signal, rx, window));
    Ok((PageHandle { tx }, task))
}

async fn run(
    mut page: Page,
    mut scanner: Scanner,
    subscription: CommitSubscription,
    commit_signal: Arc<Notify>,
    mut rx: mpsc::UnboundedReceiver<PageControl>,
    window: mpsc::UnboundedSender<PageEnvelope>,
) -> Page {
    info!("scanner ready");

    loop {
        let deadline = scanner.next_deadline();
        let wake = tokio::time::Instant::from_std(deadline.unwrap_or_else(now));

        tokio::select! {
            control = rx.recv() => match control {
                Some(PageControl::Commit(nodes)) => {
                    // The framework's own callback failing is not ours to handle.
                    if let Err(e) = page.commit(nodes) {
                        debug!(error = %e, "original commit callback failed");
                    }
                }
                Some(PageControl::DomMutation) => scanner.on_dom_mutation(now()),
                Some(PageControl::Window(envelope)) => {
                    if envelope.is_ours() && envelope.message == PageMessage::RefreshRequest {
                        post(&window, scanner.refresh(&page));
                    }
                }
                Some(PageControl::Teardown) | None => break,
            },
            _ = commit_signal.notified() => scanner.on_commit(now()),
            _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                post(&window, scanner.poll(now(), &page));
            }
        }
    }

    if let Some(hook) = page.hook.as_mut() {
        subscription.uninstall(hook);
    }
    info!(scans = scanner.scans_run(), "scanner torn down");
    page
}

fn post(window: &mpsc::UnboundedSender<PageEnvelope>, messages: Vec<PageMessage>) {
    for message in messages {
        if window.send(PageEnvelope::new(message)).is_err() {
            debug!("no relay listening, page message dropped");
        }
    }
}
