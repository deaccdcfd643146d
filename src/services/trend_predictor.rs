use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::models::task::TaskRecord;
use crate::models::trend::{MonthlyDatum, TrendConfidence, TrendDirection, TrendResult};
use crate::utils::rounding::{clamp_score, round_half_up, round_to};

const MIN_COMPLETED_TASKS: usize = 5;
const MIN_DISTINCT_MONTHS: usize = 2;
const MIN_HISTORICAL_MONTHS: usize = 2;
const HIGH_CONFIDENCE_MONTHS: usize = 4;
const SLOPE_THRESHOLD: f64 = 1.5;
const COMPLETION_WEIGHT: f64 = 0.6;
const COMPLEXITY_WEIGHT: f64 = 0.4;
const MAX_COMPLEXITY: f64 = 5.0;

pub const COLLECTING_DATA_MESSAGE: &str = "Collecting more data to predict trends.";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Default)]
struct MonthBucket {
    total: usize,
    completed: usize,
    complexity_sum: i64,
}

/// Forecast an employee's next-month performance from their task history.
///
/// `today` decides which month is still in progress; that month is reported in
/// `monthly_data` but kept out of the regression.
pub fn predict_trend(tasks: &[TaskRecord], today: NaiveDate) -> TrendResult {
    let completed_total = tasks.iter().filter(|task| task.is_completed()).count();
    if completed_total < MIN_COMPLETED_TASKS {
        debug!(target: "app::trend", completed_total, "not enough completed tasks for a trend");
        return insufficient_data(Vec::new(), Some(COLLECTING_DATA_MESSAGE));
    }

    let mut by_month: BTreeMap<String, MonthBucket> = BTreeMap::new();
    for task in tasks {
        let bucket = by_month.entry(month_key(task.created_at)).or_default();
        bucket.total += 1;
        bucket.complexity_sum += task.complexity;
        if task.is_completed() {
            bucket.completed += 1;
        }
    }

    if by_month.len() < MIN_DISTINCT_MONTHS {
        debug!(target: "app::trend", months = by_month.len(), "not enough distinct months for a trend");
        return insufficient_data(Vec::new(), Some(COLLECTING_DATA_MESSAGE));
    }

    let monthly_data: Vec<MonthlyDatum> = by_month
        .into_iter()
        .enumerate()
        .map(|(idx, (month, bucket))| MonthlyDatum {
            score: month_score(&bucket),
            task_count: bucket.total,
            completed_count: bucket.completed,
            month,
            idx,
        })
        .collect();

    let current_month = today.format("%Y-%m").to_string();
    let points: Vec<(f64, f64)> = monthly_data
        .iter()
        .filter(|datum| datum.month != current_month)
        .map(|datum| (datum.idx as f64, datum.score as f64))
        .collect();

    if points.len() < MIN_HISTORICAL_MONTHS {
        debug!(
            target: "app::trend",
            historical_months = points.len(),
            "not enough finished months for a regression"
        );
        return insufficient_data(monthly_data, None);
    }

    let fit = linear_regression(&points);
    let next_idx = monthly_data.last().map(|datum| datum.idx + 1).unwrap_or(0);
    let predicted = round_half_up(clamp_score(fit.predict(next_idx as f64))) as i64;

    let trend = classify_slope(fit.slope);
    let confidence = if points.len() >= HIGH_CONFIDENCE_MONTHS {
        TrendConfidence::High
    } else {
        TrendConfidence::Medium
    };

    debug!(
        target: "app::trend",
        slope = fit.slope,
        intercept = fit.intercept,
        predicted,
        trend = %trend,
        confidence = %confidence,
        "fitted monthly trend"
    );

    TrendResult {
        trend,
        confidence,
        slope: round_to(fit.slope, 2),
        monthly_data,
        predicted_next_month: Some(predicted),
        message: None,
    }
}

/// Ordinary least squares over `(x, y)` points.
///
/// A zero denominator (all x equal) yields a flat line through the mean of y.
pub fn linear_regression(points: &[(f64, f64)]) -> LinearFit {
    if points.is_empty() {
        return LinearFit {
            slope: 0.0,
            intercept: 0.0,
        };
    }

    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_x2: f64 = points.iter().map(|(x, _)| x * x).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom == 0.0 {
        return LinearFit {
            slope: 0.0,
            intercept: sum_y / n,
        };
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    LinearFit { slope, intercept }
}

pub fn classify_slope(slope: f64) -> TrendDirection {
    if slope > SLOPE_THRESHOLD {
        TrendDirection::Improving
    } else if slope < -SLOPE_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

pub fn month_key(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m").to_string()
}

fn month_score(bucket: &MonthBucket) -> i64 {
    if bucket.total == 0 {
        return 0;
    }
    let completion_rate = bucket.completed as f64 / bucket.total as f64 * 100.0;
    let complexity = bucket.complexity_sum as f64 / bucket.total as f64 / MAX_COMPLEXITY * 100.0;
    round_half_up(completion_rate * COMPLETION_WEIGHT + complexity * COMPLEXITY_WEIGHT) as i64
}

fn insufficient_data(monthly_data: Vec<MonthlyDatum>, message: Option<&str>) -> TrendResult {
    TrendResult {
        trend: TrendDirection::Stable,
        confidence: TrendConfidence::InsufficientData,
        slope: 0.0,
        monthly_data,
        predicted_next_month: None,
        message: message.map(str::to_string),
    }
}
