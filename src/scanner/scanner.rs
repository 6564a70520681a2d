use std::time::Instant;

use tracing::{debug, warn};

use crate::{
    error::InspectorError,
    form::form_model::FormSnapshot,
    page::surface::InspectionSurface,
    relay::message::{PageMessage, timestamp_ms},
    scanner::{
        fingerprint::{ScanSignature, signature},
        matcher::{Classification, FormMatcher, NamedShapeMatcher},
        roots::discover_roots,
        schedule::{Debouncer, OneShot},
        scanner_model::{ScanTrigger, ScannerConfig},
        traverse::walk,
    },
};

/// In-page extraction engine.
///
/// Time is passed in by the caller, so the scheduling rules are the same
/// whether the scanner is driven by a tokio task or by a test.
pub struct Scanner {
    config: ScannerConfig,
    matcher: Box<dyn FormMatcher>,
    last_signature: Option<ScanSignature>,
    last_count: usize,
    settle: OneShot,
    commits: Debouncer,
    mutations: Debouncer,
    scans_run: u64,
}

impl Scanner {
    pub fn new(config: ScannerConfig) -> Self {
        let matcher = Box::new(NamedShapeMatcher::new(&config.name_pattern));
        Self::with_matcher(config, matcher)
    }

    pub fn with_matcher(config: ScannerConfig, matcher: Box<dyn FormMatcher>) -> Self {
        let commits = Debouncer::new(config.commit_debounce(), config.max_wait());
        let mutations = Debouncer::new(config.mutation_debounce(), config.max_wait());
        Self {
            config,
            matcher,
            last_signature: None,
            last_count: 0,
            settle: OneShot::default(),
            commits,
            mutations,
            scans_run: 0,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn scans_run(&self) -> u64 {
        self.scans_run
    }

    /// Arm the settle timer for the initial scan.
    pub fn injected(&mut self, now: Instant) {
        self.settle.arm(now, self.config.settle_delay());
    }

    pub fn on_commit(&mut self, now: Instant) {
        self.commits.request(now);
    }

    pub fn on_dom_mutation(&mut self, now: Instant) {
        self.mutations.request(now);
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.settle.deadline(),
            self.commits.deadline(),
            self.mutations.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Run at most one scan for every timer that has come due.
    pub fn poll<S: InspectionSurface + ?Sized>(
        &mut self,
        now: Instant,
        surface: &S,
    ) -> Vec<PageMessage> {
        let settle = self.settle.fire(now);
        let commit = self.commits.fire(now);
        let mutation = self.mutations.fire(now);

        let trigger = if settle {
            ScanTrigger::Settle
        } else if commit {
            ScanTrigger::Commit
        } else if mutation {
            ScanTrigger::DomMutation
        } else {
            return vec![];
        };

        self.run(surface, trigger)
    }

    /// Immediate scan on an explicit refresh.
    pub fn refresh<S: InspectionSurface + ?Sized>(&mut self, surface: &S) -> Vec<PageMessage> {
        self.run(surface, ScanTrigger::Manual)
    }

    /// Discover, classify and serialize every form container on the page.
    pub fn scan<S: InspectionSurface + ?Sized>(
        &self,
        surface: &S,
    ) -> Result<Vec<FormSnapshot>, InspectorError> {
        let roots = discover_roots(surface);
        let mut forms = Vec::new();

        let stats = walk(surface, &roots, self.config.max_visited_nodes, |node| {
            if let Classification::Matched { payload, reason } = self.matcher.classify(node) {
                debug!(node = %node.id, ?reason, "form container matched");
                forms.push(FormSnapshot::from_payload(payload, forms.len())?);
            }
            Ok(())
        })?;

        debug!(
            roots = roots.len(),
            visited = stats.visited,
            forms = forms.len(),
            "scan complete"
        );
        Ok(forms)
    }

    /// One scan cycle. Failures are contained here and skip the emission.
    fn run<S: InspectionSurface + ?Sized>(
        &mut self,
        surface: &S,
        trigger: ScanTrigger,
    ) -> Vec<PageMessage> {
        self.scans_run += 1;

        let forms = match self.scan(surface) {
            Ok(forms) => forms,
            Err(e) => {
                warn!(error = %e, ?trigger, "scan failed");
                return vec![];
            }
        };

        let current = signature(&forms, self.config.fingerprint);
        let unchanged = current.is_some() && current == self.last_signature;
        self.last_signature = current;

        if unchanged && trigger != ScanTrigger::Manual {
            debug!(?trigger, "scan unchanged, emission suppressed");
            return vec![];
        }

        let count = forms.len();
        let mut out = vec![PageMessage::FormsUpdate {
            forms,
            timestamp: timestamp_ms(),
        }];

        if count != self.last_count {
            self.last_count = count;
            out.push(PageMessage::BadgeUpdate { count });
        }

        out
    }
}
