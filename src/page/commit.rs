use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::page::page_model::{CallbackError, CommitCallback, CommitInfo, DevtoolsHook};

/// Registration of the inspector against the hook's commit slot.
///
/// The callback that occupied the slot before installation is kept aside,
/// always invoked first by the wrapper, and put back by [`uninstall`].
///
/// [`uninstall`]: CommitSubscription::uninstall
pub struct CommitSubscription {
    original: Arc<Mutex<Option<CommitCallback>>>,
}

impl CommitSubscription {
    pub fn install<F>(hook: &mut DevtoolsHook, mut notify: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let original = Arc::new(Mutex::new(hook.on_commit.take()));
        let shared = Arc::clone(&original);

        let wrapper: CommitCallback = Box::new(move |info: &CommitInfo| {
            let mut slot = shared.lock().unwrap_or_else(PoisonError::into_inner);
            let outcome = match slot.as_mut() {
                Some(callback) => panic::catch_unwind(AssertUnwindSafe(|| callback(info))),
                None => Ok(Ok(())),
            };
            drop(slot);

            // The scan is scheduled whatever the original did.
            notify();

            outcome.unwrap_or_else(|payload| {
                let reason = panic_message(payload.as_ref());
                warn!(reason = %reason, "original commit callback panicked");
                Err(CallbackError(format!("original commit callback panicked: {}", reason)))
            })
        });

        hook.on_commit = Some(wrapper);
        debug!("commit subscription installed");

        Self { original }
    }

    /// Put the original callback back into the slot.
    pub fn uninstall(self, hook: &mut DevtoolsHook) {
        let original = self
            .original
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        hook.on_commit = original;
        debug!("commit subscription removed");
    }
}

impl std::fmt::Debug for CommitSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitSubscription").finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
