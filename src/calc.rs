use serde::Serialize;

use crate::store::{Document, Evaluation};

pub const SCORE_MIN: f64 = 1.0;
pub const SCORE_MAX: f64 = 7.0;
pub const WEIGHT_MAX: f64 = 100.0;

/// Weights must sum to 100 within this tolerance; it absorbs rounding from
/// hand-entered percentages without accepting incomplete weighting.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.5;

/// Parses user-entered score text. Accepts ',' or '.' as the decimal
/// separator; rejects empty, non-numeric, and out-of-range input.
pub fn parse_score(text: &str) -> Option<f64> {
    let n = parse_decimal(text)?;
    if !(SCORE_MIN..=SCORE_MAX).contains(&n) {
        return None;
    }
    Some(n)
}

/// Parses user-entered weight text; valid weights lie in (0, 100].
pub fn parse_weight(text: &str) -> Option<f64> {
    let n = parse_decimal(text)?;
    if !(n > 0.0 && n <= WEIGHT_MAX) {
        return None;
    }
    Some(n)
}

fn parse_decimal(text: &str) -> Option<f64> {
    let t = text.trim().replace(',', ".");
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageStatus {
    Ok,
    NoData,
    Incomplete,
    InvalidWeights,
}

/// An average is either a number (status `Ok`) or an explicit refusal;
/// undefined averages are never reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Average {
    pub value: Option<f64>,
    pub status: AverageStatus,
}

impl Average {
    fn ok(value: f64) -> Average {
        Average {
            value: Some(value),
            status: AverageStatus::Ok,
        }
    }

    fn undefined(status: AverageStatus) -> Average {
        Average {
            value: None,
            status,
        }
    }
}

/// Average of one subject's evaluation list.
///
/// Entries must be all weighted or all unweighted; a mixed list is refused
/// as `Incomplete`. Weighted lists additionally require the weights to sum
/// to ~100, else `InvalidWeights`.
pub fn weighted_average(evaluations: &[Evaluation]) -> Average {
    if evaluations.is_empty() {
        return Average::undefined(AverageStatus::NoData);
    }

    let weighted: Vec<&Evaluation> = evaluations.iter().filter(|e| e.weight.is_some()).collect();
    if !weighted.is_empty() && weighted.len() < evaluations.len() {
        return Average::undefined(AverageStatus::Incomplete);
    }

    if weighted.is_empty() {
        let sum: f64 = evaluations.iter().map(|e| e.score).sum();
        return Average::ok(sum / evaluations.len() as f64);
    }

    let total: f64 = weighted.iter().filter_map(|e| e.weight).sum();
    if (total - 100.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Average::undefined(AverageStatus::InvalidWeights);
    }

    let value = weighted
        .iter()
        .map(|e| e.score * e.weight.unwrap_or(0.0) / 100.0)
        .sum();
    Average::ok(value)
}

/// Arithmetic mean of the per-subject averages that computed to `Ok`.
/// Subjects with no data or refused averages are excluded, not zeroed.
pub fn global_average(doc: &Document) -> Average {
    let values: Vec<f64> = doc
        .subjects
        .values()
        .filter_map(|s| {
            let avg = weighted_average(&s.evaluations);
            match avg.status {
                AverageStatus::Ok => avg.value,
                _ => None,
            }
        })
        .collect();

    if values.is_empty() {
        return Average::undefined(AverageStatus::NoData);
    }
    Average::ok(values.iter().sum::<f64>() / values.len() as f64)
}
