//! Two-sided converter state and the transitions that mutate it.
//!
//! State changes only through [`reduce`], which is total: every intent
//! yields a new state (possibly identical to the old one) plus the effects
//! the event loop has to schedule. Nothing here touches timers or I/O.

use crate::core::display::parse_amount;
use std::collections::HashSet;
use std::fmt::Display;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Side::First => "first",
                Side::Second => "second",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterState {
    pub first_amount: String,
    pub second_amount: String,
    pub first_currency: String,
    pub second_currency: String,
    pub active: Side,
}

impl ConverterState {
    pub fn new(first_currency: &str, second_currency: &str, first_amount: &str) -> Self {
        Self {
            first_amount: first_amount.to_string(),
            second_amount: String::new(),
            first_currency: first_currency.to_string(),
            second_currency: second_currency.to_string(),
            active: Side::First,
        }
    }

    pub fn amount(&self, side: Side) -> &str {
        match side {
            Side::First => &self.first_amount,
            Side::Second => &self.second_amount,
        }
    }

    pub fn currency(&self, side: Side) -> &str {
        match side {
            Side::First => &self.first_currency,
            Side::Second => &self.second_currency,
        }
    }

    pub fn inactive(&self) -> Side {
        self.active.other()
    }

    /// The `(from, to)` pair oriented from the active side.
    pub fn pair(&self) -> (&str, &str) {
        (self.currency(self.active), self.currency(self.inactive()))
    }

    fn amount_mut(&mut self, side: Side) -> &mut String {
        match side {
            Side::First => &mut self.first_amount,
            Side::Second => &mut self.second_amount,
        }
    }

    fn currency_mut(&mut self, side: Side) -> &mut String {
        match side {
            Side::First => &mut self.first_currency,
            Side::Second => &mut self.second_currency,
        }
    }
}

/// A user intent, as raised by the input surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SetAmount { source: Side, text: String },
    /// `committed` is the inactive side's amount as currently displayed.
    SetCurrency {
        source: Side,
        code: String,
        committed: String,
    },
    Clear { source: Side },
}

/// Work the event loop must carry out after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Restart the debounce timer for `source` with its latest raw text.
    Debounce { source: Side, text: String },
    /// Drop any pending debounce and take `text` as the settled amount now.
    Rebase { source: Side, text: String },
    /// Currencies changed; re-run trigger evaluation with the settled amount.
    Reevaluate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NegativeAmount(String),
    UnknownCurrency(String),
}

impl Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NegativeAmount(text) => write!(f, "negative amount: {text}"),
            Rejection::UnknownCurrency(code) => write!(f, "unknown currency: {code}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Cleared,
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ConverterState,
    pub effects: Vec<Effect>,
    pub outcome: Outcome,
}

impl Transition {
    fn unchanged(state: &ConverterState, rejection: Rejection) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
            outcome: Outcome::Rejected(rejection),
        }
    }
}

/// True for a signed positive amount, and for a sign not yet followed by
/// digits (`"-"`, `"-."`). A signed zero such as `"-0"` is not negative.
pub fn is_negative(text: &str) -> bool {
    let Some(rest) = text.trim_start().strip_prefix('-') else {
        return false;
    };
    !rest.chars().any(|c| c.is_ascii_digit()) || parse_amount(rest) > 0.0
}

/// Applies `intent` to `state`. Currency codes are checked against `known`
/// only when a code list is available.
pub fn reduce(state: &ConverterState, intent: Intent, known: &HashSet<String>) -> Transition {
    match intent {
        Intent::Clear { source } => clear(state, source),
        Intent::SetAmount { source, text } => {
            if text.is_empty() {
                return clear(state, source);
            }
            if is_negative(&text) {
                return Transition::unchanged(state, Rejection::NegativeAmount(text));
            }
            let mut next = state.clone();
            *next.amount_mut(source) = text.clone();
            next.active = source;
            Transition {
                state: next,
                effects: vec![Effect::Debounce { source, text }],
                outcome: Outcome::Applied,
            }
        }
        Intent::SetCurrency {
            source,
            code,
            committed,
        } => {
            if code.is_empty() || (!known.is_empty() && !known.contains(&code)) {
                return Transition::unchanged(state, Rejection::UnknownCurrency(code));
            }
            let mut next = state.clone();
            let inactive = state.inactive();
            *next.amount_mut(inactive) = committed.clone();
            next.active = source;
            *next.currency_mut(source) = code;

            let effect = if source == inactive {
                Effect::Rebase {
                    source,
                    text: committed,
                }
            } else {
                Effect::Reevaluate
            };
            Transition {
                state: next,
                effects: vec![effect],
                outcome: Outcome::Applied,
            }
        }
    }
}

fn clear(state: &ConverterState, source: Side) -> Transition {
    let mut next = state.clone();
    next.first_amount.clear();
    next.second_amount.clear();
    next.active = source;
    Transition {
        state: next,
        effects: vec![Effect::Rebase {
            source,
            text: String::new(),
        }],
        outcome: Outcome::Cleared,
    }
}

/// Owner of the live [`ConverterState`].
#[derive(Debug)]
pub struct ConversionStateStore {
    state: ConverterState,
    known_codes: HashSet<String>,
}

impl ConversionStateStore {
    pub fn new(state: ConverterState) -> Self {
        Self {
            state,
            known_codes: HashSet::new(),
        }
    }

    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    pub fn set_known_codes<I: IntoIterator<Item = String>>(&mut self, codes: I) {
        self.known_codes = codes.into_iter().collect();
    }

    pub fn dispatch(&mut self, intent: Intent) -> (Outcome, Vec<Effect>) {
        debug!(?intent, "Dispatching intent");
        let transition = reduce(&self.state, intent, &self.known_codes);
        if let Outcome::Rejected(reason) = &transition.outcome {
            debug!(%reason, "Intent rejected");
        }
        self.state = transition.state;
        (transition.outcome, transition.effects)
    }

    pub fn set_amount(&mut self, source: Side, text: &str) -> (Outcome, Vec<Effect>) {
        self.dispatch(Intent::SetAmount {
            source,
            text: text.to_string(),
        })
    }

    pub fn set_currency(
        &mut self,
        source: Side,
        code: &str,
        committed: &str,
    ) -> (Outcome, Vec<Effect>) {
        self.dispatch(Intent::SetCurrency {
            source,
            code: code.to_string(),
            committed: committed.to_string(),
        })
    }

    pub fn clear(&mut self, source: Side) -> (Outcome, Vec<Effect>) {
        self.dispatch(Intent::Clear { source })
    }
}
