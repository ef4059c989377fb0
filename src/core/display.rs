//! Rendering helpers: amount parsing/formatting and the projection of
//! converter state onto the two displayed fields and the rate label.

use crate::core::orchestrator::Derived;
use crate::core::state::{ConverterState, Side};

/// Parses user text the lenient way: the longest numeric prefix wins,
/// anything unparseable is zero and negatives clamp to zero.
pub fn parse_amount(text: &str) -> f64 {
    let trimmed = text.trim();
    let value = trimmed
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .rev()
        .find_map(|end| trimmed[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);
    value.max(0.0)
}

pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub first_amount: String,
    pub second_amount: String,
    pub rate_label: Option<String>,
}

impl Projection {
    pub fn amount(&self, side: Side) -> &str {
        match side {
            Side::First => &self.first_amount,
            Side::Second => &self.second_amount,
        }
    }
}

/// Computes what the two fields and the rate label show right now.
///
/// The active side always shows its raw text. The inactive side shows the
/// latest validated result when it belongs to the current pair, an empty
/// string after a clear, and otherwise its own last raw value.
pub fn project(state: &ConverterState, derived: &Derived) -> Projection {
    let active = state.active;
    let inactive = state.inactive();
    let (from, to) = state.pair();

    let derived_amount = match derived {
        Derived::Converted(result) if result.request.from == from && result.request.to == to => {
            format_amount(result.value)
        }
        Derived::Cleared => String::new(),
        _ => state.amount(inactive).to_string(),
    };

    let (first_amount, second_amount) = match active {
        Side::First => (state.first_amount.clone(), derived_amount),
        Side::Second => (derived_amount, state.second_amount.clone()),
    };

    let rate_label = rate_label(state, &first_amount, &second_amount);
    Projection {
        first_amount,
        second_amount,
        rate_label,
    }
}

fn rate_label(state: &ConverterState, first_amount: &str, second_amount: &str) -> Option<String> {
    let first = &state.first_currency;
    let second = &state.second_currency;
    if first == second {
        return Some(format!("1 {first} = {} {second}", format_amount(1.0)));
    }
    if first_amount.trim().is_empty() || second_amount.trim().is_empty() {
        return None;
    }

    let active_value = parse_amount(state.amount(state.active));
    let first_value = parse_amount(first_amount);
    if active_value == 0.0 || first_value == 0.0 {
        return None;
    }
    let rate = parse_amount(second_amount) / first_value;
    Some(format!("1 {first} = {} {second}", format_amount(rate)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::{ConversionRequest, ConversionResult};

    fn converted(from: &str, to: &str, amount: f64, value: f64) -> Derived {
        Derived::Converted(ConversionResult {
            request: ConversionRequest::new(from, to, amount),
            value,
        })
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100"), 100.0);
        assert_eq!(parse_amount(" 12.5 "), 12.5);
        assert_eq!(parse_amount("1."), 1.0);
        assert_eq!(parse_amount("12abc"), 12.0);
        assert_eq!(parse_amount(".5"), 0.5);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("-3"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
        assert_eq!(parse_amount("1€"), 1.0);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(92.0), "92.00");
        assert_eq!(format_amount(50.0 / 0.92), "54.35");
        assert_eq!(format_amount(0.0), "0.00");
    }

    #[test]
    fn test_projection_uses_converted_value_for_inactive_side() {
        let state = ConverterState::new("USD", "EUR", "100");
        let projection = project(&state, &converted("USD", "EUR", 100.0, 92.0));

        assert_eq!(projection.first_amount, "100");
        assert_eq!(projection.second_amount, "92.00");
        assert_eq!(projection.rate_label.as_deref(), Some("1 USD = 0.92 EUR"));
    }

    #[test]
    fn test_active_side_is_shown_verbatim() {
        let mut state = ConverterState::new("USD", "EUR", "1.");
        let projection = project(&state, &converted("USD", "EUR", 1.0, 0.92));
        assert_eq!(projection.first_amount, "1.");

        state.first_amount = "abc".to_string();
        let projection = project(&state, &Derived::Pending);
        assert_eq!(projection.first_amount, "abc");
    }

    #[test]
    fn test_result_for_other_pair_falls_back_to_raw_value() {
        let mut state = ConverterState::new("USD", "EUR", "100");
        state.second_amount = "50".to_string();
        state.active = Side::Second;

        let projection = project(&state, &converted("USD", "EUR", 100.0, 92.0));
        assert_eq!(projection.first_amount, "100");
        assert_eq!(projection.second_amount, "50");
    }

    #[test]
    fn test_rate_label_uses_first_to_second_direction() {
        let mut state = ConverterState::new("USD", "EUR", "100");
        state.second_amount = "50".to_string();
        state.active = Side::Second;

        let projection = project(&state, &converted("EUR", "USD", 50.0, 50.0 / 0.92));
        assert_eq!(projection.first_amount, "54.35");
        assert_eq!(projection.rate_label.as_deref(), Some("1 USD = 0.92 EUR"));
    }

    #[test]
    fn test_cleared_inactive_side_and_missing_label() {
        let state = ConverterState::new("USD", "EUR", "0");
        let projection = project(&state, &Derived::Cleared);
        assert_eq!(projection.second_amount, "");
        assert_eq!(projection.rate_label, None);
    }

    #[test]
    fn test_identity_pair_always_reports_one_to_one() {
        let state = ConverterState::new("PLN", "PLN", "");
        let projection = project(&state, &Derived::Cleared);
        assert_eq!(projection.rate_label.as_deref(), Some("1 PLN = 1.00 PLN"));
    }

    #[test]
    fn test_label_omitted_for_zero_active_amount() {
        let mut state = ConverterState::new("USD", "EUR", "abc");
        state.second_amount = "92.00".to_string();
        let projection = project(&state, &Derived::Pending);
        assert_eq!(projection.rate_label, None);
    }
}
