use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::relay::registry::TabId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    Active,
    Neutral,
}

impl BadgeColor {
    pub fn hex(&self) -> &'static str {
        match self {
            BadgeColor::Active => "#007bff",
            BadgeColor::Neutral => "#6c757d",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: String,
    pub color: BadgeColor,
}

impl Badge {
    /// Purely a function of how many forms are cached for the tab.
    pub fn for_count(count: usize) -> Self {
        if count > 0 {
            Badge {
                text: count.to_string(),
                color: BadgeColor::Active,
            }
        } else {
            Badge::neutral()
        }
    }

    pub fn neutral() -> Self {
        Badge {
            text: String::new(),
            color: BadgeColor::Neutral,
        }
    }
}

/// Where badge updates are painted. Set-only: the coordinator never reads back.
pub trait BadgeSink: Send {
    fn set_badge(&mut self, tab: TabId, badge: &Badge);
}

/// In-memory badge table, shareable with whoever displays it.
#[derive(Debug, Clone, Default)]
pub struct BadgeBoard {
    inner: Arc<Mutex<BTreeMap<TabId, Badge>>>,
}

impl BadgeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tab: TabId) -> Option<Badge> {
        self.inner.lock().ok().and_then(|map| map.get(&tab).cloned())
    }

    pub fn snapshot(&self) -> BTreeMap<TabId, Badge> {
        self.inner.lock().map(|map| map.clone()).unwrap_or_default()
    }
}

impl BadgeSink for BadgeBoard {
    fn set_badge(&mut self, tab: TabId, badge: &Badge) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(tab, badge.clone());
        }
    }
}
