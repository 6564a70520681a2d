//! Live form-state inspection.
//!
//! The scanner walks a page's render tree through the framework's devtools
//! hook, turns every form state container it recognises into a
//! [`FormSnapshot`](form::form_model::FormSnapshot), and emits a batch only
//! when something changed. The relay carries those batches from the page,
//! through a Relay-Source, to a Coordinator that caches the latest batch per
//! tab and pushes it to an Inspector Client while one is open.

pub mod cli;
pub mod error;
pub mod form;
pub mod page;
pub mod relay;
pub mod runtime;
pub mod scanner;
pub mod trace;

pub use error::{InspectorError, Result};
