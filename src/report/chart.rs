use crate::state::{Condor, PayoffCurve};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReferenceLine {
    pub orientation: Orientation,
    pub value: f64,
    pub label: Option<&'static str>,
    pub color: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Profit,
    Loss,
}

/// Contiguous run of curve samples on one side of zero, indices inclusive.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ShadedRegion {
    pub kind: RegionKind,
    pub start: usize,
    pub end: usize,
    pub color: &'static str,
}

/// Renderer-agnostic description of the payoff chart.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChartSpec {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub series_label: &'static str,
    pub series_color: &'static str,
    pub reference_lines: Vec<ReferenceLine>,
    pub regions: Vec<ShadedRegion>,
    /// (min, max) pnl over the curve; None for an empty curve.
    pub y_range: Option<(f64, f64)>,
}

pub fn chart_spec(curve: &PayoffCurve, spot: f64, condor: &Condor) -> ChartSpec {
    ChartSpec {
        title: "Payoff at Expiry",
        x_label: "BTC Price",
        y_label: "Profit / Loss (USD)",
        series_label: "Payoff",
        series_color: "orange",
        reference_lines: vec![
            ReferenceLine { orientation: Orientation::Horizontal, value: 0.0, label: None, color: "gray" },
            ReferenceLine {
                orientation: Orientation::Vertical,
                value: spot,
                label: Some("Spot Price"),
                color: "blue",
            },
            ReferenceLine {
                orientation: Orientation::Vertical,
                value: condor.put_sell.strike,
                label: Some("Put Sell Strike"),
                color: "green",
            },
            ReferenceLine {
                orientation: Orientation::Vertical,
                value: condor.call_sell.strike,
                label: Some("Call Sell Strike"),
                color: "red",
            },
        ],
        regions: shaded_regions(curve),
        y_range: curve.min_pnl().zip(curve.max_pnl()),
    }
}

/// Profit runs (pnl > 0) shade green, loss runs (pnl < 0) red. Exact zeros
/// belong to neither and split runs.
pub fn shaded_regions(curve: &PayoffCurve) -> Vec<ShadedRegion> {
    let mut regions: Vec<ShadedRegion> = Vec::new();

    for (i, point) in curve.points.iter().enumerate() {
        let kind = if point.pnl > 0.0 {
            RegionKind::Profit
        } else if point.pnl < 0.0 {
            RegionKind::Loss
        } else {
            continue;
        };

        match regions.last_mut() {
            Some(r) if r.kind == kind && r.end + 1 == i => r.end = i,
            _ => regions.push(ShadedRegion {
                kind,
                start: i,
                end: i,
                color: match kind {
                    RegionKind::Profit => "green",
                    RegionKind::Loss => "red",
                },
            }),
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payoff;
    use crate::state::PayoffPoint;

    fn curve(pnls: &[f64]) -> PayoffCurve {
        PayoffCurve {
            points: pnls
                .iter()
                .enumerate()
                .map(|(i, &pnl)| PayoffPoint { price: i as f64, pnl })
                .collect(),
        }
    }

    #[test]
    fn test_regions_split_on_sign_and_zero() {
        let regions = shaded_regions(&curve(&[-2.0, -1.0, 0.0, 1.0, 2.0, -1.0, 3.0, 0.0, 0.0, 4.0]));
        let spans: Vec<(RegionKind, usize, usize)> = regions.iter().map(|r| (r.kind, r.start, r.end)).collect();
        assert_eq!(
            spans,
            vec![
                (RegionKind::Loss, 0, 1),
                (RegionKind::Profit, 3, 4),
                (RegionKind::Loss, 5, 5),
                (RegionKind::Profit, 6, 6),
                (RegionKind::Profit, 9, 9),
            ]
        );
    }

    #[test]
    fn test_reference_chart() {
        let condor = Condor::from_quotes(
            (100_000.0, 280.0),
            (102_000.0, 420.0),
            (112_000.0, 400.0),
            (114_000.0, 260.0),
        );
        let c = payoff::compute_payoff_curve(&condor, &payoff::price_range(107_200.0, 10_000.0, 500));
        let spec = chart_spec(&c, 107_200.0, &condor);
        assert_eq!(spec.reference_lines.len(), 4);
        assert_eq!(spec.reference_lines[1].value, 107_200.0);
        assert_eq!(spec.reference_lines[2].value, 102_000.0);
        assert_eq!(spec.reference_lines[3].value, 112_000.0);
        // profit in the middle, loss ramps on each side
        assert!(spec.regions.iter().any(|r| r.kind == RegionKind::Profit && r.start <= 250 && r.end >= 250));
        assert!(spec.regions.iter().any(|r| r.kind == RegionKind::Loss));
        // window ends at 97200 and 117200, where the curve has climbed back up
        let (lo, hi) = spec.y_range.unwrap();
        assert!(lo < 0.0 && lo >= -1_720.0, "lo={lo}");
        assert_eq!(hi, 1_480.0);
    }

    #[test]
    fn test_empty_curve_has_no_range() {
        let condor = Condor::from_quotes(
            (100_000.0, 280.0),
            (102_000.0, 420.0),
            (112_000.0, 400.0),
            (114_000.0, 260.0),
        );
        let spec = chart_spec(&PayoffCurve::default(), 107_200.0, &condor);
        assert_eq!(spec.y_range, None);
        assert!(spec.regions.is_empty());
    }
}
