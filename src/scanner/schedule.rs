use std::time::{Duration, Instant};

/// Debounce-with-reset, capped by a maximum wait.
///
/// Every request pushes the deadline to `now + window`, but never past
/// `first_request + max_wait`, so a continuous burst still fires.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    max_wait: Duration,
    first_request: Option<Instant>,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration, max_wait: Duration) -> Self {
        Self {
            window,
            max_wait: max_wait.max(window),
            first_request: None,
            deadline: None,
        }
    }

    pub fn request(&mut self, now: Instant) {
        let first = *self.first_request.get_or_insert(now);
        let cap = first + self.max_wait;
        self.deadline = Some((now + self.window).min(cap));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once per pending window, when `now` reaches the deadline.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.first_request = None;
        self.deadline = None;
    }
}

/// One-shot timer, used for the settle delay after injection.
#[derive(Debug, Clone, Default)]
pub struct OneShot {
    deadline: Option<Instant>,
}

impl OneShot {
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
