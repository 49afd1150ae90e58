use std::sync::Arc;

use crate::error::PagerError;
use crate::record::{Cursor, Record};

/// Lifecycle of the stateful reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No page has been fetched yet
    #[default]
    Loading,

    /// The last fetch succeeded
    Success,

    /// The last fetch failed; see [`ReadState::error`]
    Error,
}

/// Observable state of an accumulating read.
///
/// `items` only grows. `cursor` always points at the last accumulated
/// record, and `has_more` turns false once a page comes back short.
#[derive(Debug, Clone)]
pub struct ReadState<T> {
    pub items: Vec<Record<T>>,
    pub phase: Phase,
    pub cursor: Option<Cursor>,
    pub has_more: bool,
    pub error: Option<Arc<PagerError>>,
}

impl<T> ReadState<T> {
    /// Fresh state: nothing loaded, more pages assumed.
    pub fn initial() -> Self {
        Self {
            items: Vec::new(),
            phase: Phase::Loading,
            cursor: None,
            has_more: true,
            error: None,
        }
    }

    /// Append a fetched page.
    pub(crate) fn apply_page(
        &mut self,
        records: Vec<Record<T>>,
        last: Option<Cursor>,
        page_size: u32,
    ) {
        self.has_more = records.len() == page_size as usize;
        self.items.extend(records);
        if last.is_some() {
            self.cursor = last;
        }
        self.phase = Phase::Success;
        self.error = None;
    }

    /// Record a failure, keeping everything loaded so far.
    pub(crate) fn apply_error(&mut self, error: PagerError) {
        self.phase = Phase::Error;
        self.error = Some(Arc::new(error));
    }
}

impl<T> Default for ReadState<T> {
    fn default() -> Self {
        Self::initial()
    }
}
