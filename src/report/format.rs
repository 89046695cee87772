//! Text rendering of the engine outputs.
//! All functions are pure -- they take computed values and return strings.

use crate::state::{GreeksResult, LegGreeks, PayoffSummary};
use std::fmt::Write;

/// `$280.00`, `$-1720.00`
#[inline]
pub fn format_currency(value: f64) -> String {
    format!("${value:.2}")
}

pub fn summary_lines(summary: &PayoffSummary) -> Vec<String> {
    vec![
        format!("Total Credit: {}", format_currency(summary.total_credit)),
        format!("Max Loss: {}", format_currency(summary.max_loss)),
        format!(
            "Break-even Range: {} to {}",
            format_currency(summary.break_even_low),
            format_currency(summary.break_even_high)
        ),
    ]
}

/// Fixed-width Greeks table, one row per leg plus an optional net row.
pub fn greeks_table(legs: &[LegGreeks], net: Option<&GreeksResult>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<10} {:>10} {:>10} {:>10} {:>10}", "Leg", "Delta", "Gamma", "Theta", "Vega");
    for leg in legs {
        push_row(&mut out, leg.leg, &leg.greeks);
    }
    if let Some(net) = net {
        push_row(&mut out, "Net", net);
    }
    out
}

fn push_row(out: &mut String, label: &str, g: &GreeksResult) {
    let _ = writeln!(
        out,
        "{:<10} {:>10.4} {:>10.6} {:>10.4} {:>10.4}",
        label, g.delta, g.gamma, g.theta, g.vega
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LegRole, OptionType};

    #[test]
    fn test_summary_lines_reference() {
        let summary = PayoffSummary {
            total_credit: 280.0,
            put_spread_width: 2_000.0,
            call_spread_width: 2_000.0,
            max_loss: 1_720.0,
            break_even_low: 101_720.0,
            break_even_high: 112_280.0,
        };
        assert_eq!(
            summary_lines(&summary),
            vec![
                "Total Credit: $280.00".to_string(),
                "Max Loss: $1720.00".to_string(),
                "Break-even Range: $101720.00 to $112280.00".to_string(),
            ]
        );
    }

    #[test]
    fn test_negative_currency() {
        assert_eq!(format_currency(-45.5), "$-45.50");
    }

    #[test]
    fn test_greeks_table_rows() {
        let legs = [LegGreeks {
            leg: "Put Sell",
            role: LegRole::PutSell,
            strike: 102_000.0,
            option_type: OptionType::Put,
            greeks: GreeksResult { delta: -0.0693, gamma: 0.000036, theta: -58.1234, vega: 19.8 },
        }];
        let table = greeks_table(&legs, None);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Leg"));
        assert!(lines[1].starts_with("Put Sell"));
        assert!(lines[1].contains("-0.0693"));
        assert!(lines[1].contains("0.000036"));
        assert!(lines[1].contains("19.8000"));
    }
}
