//! Skip / limit window
//!
//! Sits between a plan and the caller's sink. Counts only records that
//! already passed the predicate and stops the scan once the limit is hit.

use std::ops::ControlFlow;
use std::sync::Arc;

use super::sink::Sink;

/// Skip/limit state for one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    skip: u64,
    limit: Option<u64>,
    skipped: u64,
    emitted: u64,
}

impl Window {
    pub fn new(skip: u64, limit: Option<u64>) -> Self {
        Self {
            skip,
            limit,
            skipped: 0,
            emitted: 0,
        }
    }

    /// Returns true once the limit has been reached
    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.emitted >= limit)
    }

    /// Offers one matching record; `Break` means stop scanning
    pub fn offer<R, S: Sink<R> + ?Sized>(&mut self, record: &R, sink: &mut S) -> ControlFlow<()> {
        if self.is_full() {
            return ControlFlow::Break(());
        }
        if self.skipped < self.skip {
            self.skipped += 1;
            return ControlFlow::Continue(());
        }

        sink.put(record);
        self.emitted += 1;

        if self.is_full() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Offers buffered records in order until the window closes
    pub fn drain<R, S: Sink<R> + ?Sized>(&mut self, records: &[Arc<R>], sink: &mut S) {
        for record in records {
            if self.offer(&**record, sink).is_break() {
                break;
            }
        }
    }
}
