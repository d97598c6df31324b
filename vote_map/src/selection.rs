// Tracking of the current year selection.

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::config::*;

/// A handle on one year selection.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct SelectionTicket {
    pub year: i32,
    generation: u64,
}

/// The currently selected year of a map.
///
/// Every call to `select` supersedes the previous selections. Results that
/// are computed for a superseded selection are discarded by `accept`, even if
/// they complete after the result of the current selection: the computation
/// itself is not interrupted.
///
/// The tracker can be shared between threads.
#[derive(Debug)]
pub struct YearSelection {
    granularity: Granularity,
    latest: AtomicU64,
}

impl YearSelection {
    pub fn new(granularity: &Granularity) -> YearSelection {
        YearSelection {
            granularity: granularity.clone(),
            latest: AtomicU64::new(0),
        }
    }

    pub fn granularity(&self) -> &Granularity {
        &self.granularity
    }

    /// Selects a new year. Years outside of the granularity are refused and do
    /// not supersede the current selection.
    pub fn select(&self, year: i32) -> Result<SelectionTicket, MapError> {
        self.granularity.check_year(year)?;
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("select: year {} generation {}", year, generation);
        Ok(SelectionTicket { year, generation })
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.generation
    }

    /// Returns the model if it was computed for the current selection.
    pub fn accept(&self, ticket: &SelectionTicket, model: RenderModel) -> Option<RenderModel> {
        if self.is_current(ticket) {
            Some(model)
        } else {
            debug!(
                "accept: discarding stale result for year {} (generation {})",
                ticket.year, ticket.generation
            );
            None
        }
    }
}
