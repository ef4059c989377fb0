//! Decides when and what to convert, and which results may reach the display.

use crate::core::currency::{ConversionRequest, ConversionResult};
use crate::core::display::parse_amount;
use crate::core::state::{ConverterState, Side};
use tracing::debug;

/// The active side's raw text once input has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebouncedAmount {
    pub source: Side,
    pub text: String,
}

/// What the inactive side is derived from.
#[derive(Debug, Clone, PartialEq)]
pub enum Derived {
    /// Nothing validated yet.
    Pending,
    /// The settled amount was zero or empty.
    Cleared,
    Converted(ConversionResult),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Idle,
    Cleared,
    /// Identity pair; the result is known without a lookup.
    Synthesized(ConversionResult),
    Request(ConversionRequest),
}

pub struct ConversionOrchestrator {
    debounced: DebouncedAmount,
    derived: Derived,
    awaiting: Option<ConversionRequest>,
}

impl ConversionOrchestrator {
    pub fn new(initial: DebouncedAmount) -> Self {
        Self {
            debounced: initial,
            derived: Derived::Pending,
            awaiting: None,
        }
    }

    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn debounced(&self) -> &DebouncedAmount {
        &self.debounced
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting.is_some()
    }

    pub fn settle(&mut self, debounced: DebouncedAmount) {
        self.debounced = debounced;
    }

    /// Runs trigger evaluation against the current state.
    pub fn evaluate(&mut self, state: &ConverterState) -> Trigger {
        if self.debounced.source != state.active {
            debug!(
                settled = %self.debounced.source,
                active = %state.active,
                "Settled amount belongs to the inactive side, waiting"
            );
            return Trigger::Idle;
        }

        let amount = parse_amount(&self.debounced.text);
        if amount <= 0.0 {
            self.derived = Derived::Cleared;
            self.awaiting = None;
            return Trigger::Cleared;
        }

        let (from, to) = state.pair();
        let request = ConversionRequest::new(from, to, amount);
        if self.awaiting.as_ref() == Some(&request) {
            return Trigger::Idle;
        }
        self.awaiting = Some(request.clone());

        if request.is_identity() {
            return Trigger::Synthesized(ConversionResult {
                request,
                value: amount,
            });
        }
        Trigger::Request(request)
    }

    /// Applies `result` if it still matches the live pair and the latest
    /// issued request. Returns whether it was applied.
    pub fn accept(&mut self, state: &ConverterState, result: ConversionResult) -> bool {
        let (from, to) = state.pair();
        let matches_pair = result.request.from == from && result.request.to == to;
        if !matches_pair || self.awaiting.as_ref() != Some(&result.request) {
            debug!(request = ?result.request, "Discarding stale conversion result");
            return false;
        }
        self.awaiting = None;
        self.derived = Derived::Converted(result);
        true
    }

    /// Records a failed lookup. The previously derived value stays.
    /// Returns false when `request` was already superseded.
    pub fn reject(&mut self, request: &ConversionRequest) -> bool {
        if self.awaiting.as_ref() != Some(request) {
            debug!(?request, "Discarding failure of a superseded request");
            return false;
        }
        self.awaiting = None;
        true
    }
}
