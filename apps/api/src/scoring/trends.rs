//! Trend and streak analytics over daily series.
//!
//! A series is split into a first half (the first ⌈N/2⌉ points) and a second
//! half (the rest). Percentage trends compare the two averages; the overall
//! health score uses an absolute point threshold instead.

use serde::{Deserialize, Serialize};

use crate::models::logs::DailySummary;

/// Percentage change that separates a real trend from noise.
pub const PERCENT_THRESHOLD: f64 = 10.0;
/// Absolute overall-score change (points) for weekly comparisons.
pub const SCORE_POINT_THRESHOLD: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub metric: String,
    pub direction: TrendDirection,
    pub first_half_average: f64,
    pub second_half_average: f64,
    /// Percent for metric trends, points for the overall-score trend.
    pub change: f64,
}

fn split_averages(series: &[f64]) -> (f64, f64) {
    let split = series.len().div_ceil(2);
    let (first, second) = series.split_at(split);
    (average(first), average(second))
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// `(second − first) / first × 100`, or 0 when the first half averages zero.
pub fn change_percent(first_avg: f64, second_avg: f64) -> f64 {
    if first_avg == 0.0 {
        0.0
    } else {
        (second_avg - first_avg) / first_avg * 100.0
    }
}

pub fn classify_percent(change_pct: f64) -> TrendDirection {
    if change_pct > PERCENT_THRESHOLD {
        TrendDirection::Improving
    } else if change_pct < -PERCENT_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

pub fn classify_points(delta: f64) -> TrendDirection {
    if delta > SCORE_POINT_THRESHOLD {
        TrendDirection::Improving
    } else if delta < -SCORE_POINT_THRESHOLD {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Percentage trend for a series ordered oldest first.
pub fn analyze_series(metric: &str, series: &[f64]) -> Trend {
    let (first, second) = split_averages(series);
    // A single-point series has nothing to compare against.
    let change = if series.len() < 2 {
        0.0
    } else {
        change_percent(first, second)
    };
    Trend {
        metric: metric.to_string(),
        direction: classify_percent(change),
        first_half_average: first,
        second_half_average: second,
        change,
    }
}

/// Overall-score trend using the absolute point threshold.
pub fn analyze_score_series(metric: &str, scores: &[f64]) -> Trend {
    let (first, second) = split_averages(scores);
    let change = if scores.len() < 2 { 0.0 } else { second - first };
    Trend {
        metric: metric.to_string(),
        direction: classify_points(change),
        first_half_average: first,
        second_half_average: second,
        change,
    }
}

/// Consecutive active days counting back from the most recent summary.
/// `summaries` must be ordered oldest first.
pub fn activity_streak(summaries: &[DailySummary]) -> u32 {
    summaries
        .iter()
        .rev()
        .take_while(|day| day.has_activity())
        .count() as u32
}

/// The standard trend set: calories, exercise minutes, sleep hours, water.
/// Days without a sleep entry are skipped for the sleep series.
pub fn metric_trends(summaries: &[DailySummary]) -> Vec<Trend> {
    let calories: Vec<f64> = summaries.iter().map(|d| d.total_calories).collect();
    let exercise: Vec<f64> = summaries.iter().map(|d| d.exercise_minutes).collect();
    let sleep: Vec<f64> = summaries.iter().filter_map(|d| d.sleep_hours).collect();
    let water: Vec<f64> = summaries.iter().map(|d| d.water_ml).collect();

    vec![
        analyze_series("calories", &calories),
        analyze_series("exerciseMinutes", &exercise),
        analyze_series("sleepHours", &sleep),
        analyze_series("waterMl", &water),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn summary(day: u32, calories: f64, minutes: f64) -> DailySummary {
        DailySummary {
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            total_calories: calories,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
            exercise_minutes: minutes,
            calories_burned: 0.0,
            sleep_hours: None,
            sleep_quality: None,
            water_ml: 0.0,
        }
    }

    #[test]
    fn test_strictly_increasing_series_is_improving() {
        let series = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0];
        let trend = analyze_series("steps", &series);
        // 11.5 → 15.5
        assert_eq!(trend.first_half_average, 11.5);
        assert_eq!(trend.second_half_average, 15.5);
        assert_eq!(trend.direction, TrendDirection::Improving);
    }

    #[test]
    fn test_flat_series_is_stable() {
        let trend = analyze_series("water", &[2000.0; 8]);
        assert_eq!(trend.direction, TrendDirection::Stable);
        assert_eq!(trend.change, 0.0);
    }

    #[test]
    fn test_decreasing_series_is_declining() {
        let trend = analyze_series("sleep", &[8.0, 8.0, 6.0, 6.0]);
        assert_eq!(trend.direction, TrendDirection::Declining);
        assert!((trend.change + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_odd_length_puts_extra_point_in_first_half() {
        let trend = analyze_series("x", &[1.0, 2.0, 3.0, 10.0, 10.0]);
        assert_eq!(trend.first_half_average, 2.0);
        assert_eq!(trend.second_half_average, 10.0);
    }

    #[test]
    fn test_zero_first_half_guards_division() {
        let trend = analyze_series("exercise", &[0.0, 0.0, 30.0, 45.0]);
        assert_eq!(trend.change, 0.0);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_single_and_empty_series_are_stable() {
        assert_eq!(analyze_series("x", &[5.0]).direction, TrendDirection::Stable);
        assert_eq!(analyze_series("x", &[]).direction, TrendDirection::Stable);
    }

    #[test]
    fn test_score_series_uses_point_threshold() {
        // +4 points: a 10% percentage rule would say improving, points say stable
        let stable = analyze_score_series("overall", &[40.0, 40.0, 44.0, 44.0]);
        assert_eq!(stable.direction, TrendDirection::Stable);

        let up = analyze_score_series("overall", &[60.0, 60.0, 66.0, 66.0]);
        assert_eq!(up.direction, TrendDirection::Improving);

        let down = analyze_score_series("overall", &[70.0, 70.0, 60.0, 60.0]);
        assert_eq!(down.direction, TrendDirection::Declining);
    }

    #[test]
    fn test_streak_counts_from_most_recent_day() {
        let days = vec![
            summary(1, 2000.0, 0.0),
            summary(2, 0.0, 0.0),
            summary(3, 1800.0, 0.0),
            summary(4, 0.0, 30.0),
            summary(5, 2100.0, 45.0),
        ];
        assert_eq!(activity_streak(&days), 3);
    }

    #[test]
    fn test_streak_zero_when_today_inactive() {
        let days = vec![summary(1, 2000.0, 30.0), summary(2, 0.0, 0.0)];
        assert_eq!(activity_streak(&days), 0);
    }

    #[test]
    fn test_metric_trends_skip_days_without_sleep() {
        let mut days: Vec<DailySummary> = (1..=4).map(|d| summary(d, 2000.0, 30.0)).collect();
        days[0].sleep_hours = Some(6.0);
        days[3].sleep_hours = Some(8.0);
        let trends = metric_trends(&days);
        let sleep = trends.iter().find(|t| t.metric == "sleepHours").unwrap();
        assert_eq!(sleep.first_half_average, 6.0);
        assert_eq!(sleep.second_half_average, 8.0);
        assert_eq!(sleep.direction, TrendDirection::Improving);
    }
}
