use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodEntry {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub consumed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExerciseEntry {
    pub duration_minutes: f64,
    pub calories_burned: f64,
    pub intensity: String,
    pub exercise_type: String,
    pub exercise_date: NaiveDate,
}

impl ExerciseEntry {
    /// `high` and `very_high` count as vigorous; spacing and case are ignored.
    pub fn is_vigorous(&self) -> bool {
        let normalized = self.intensity.trim().to_lowercase().replace([' ', '-'], "_");
        normalized == "high" || normalized == "very_high"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SleepEntry {
    pub total_sleep_hours: f64,
    /// 1-10
    pub sleep_quality: i32,
    pub sleep_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WaterEntry {
    pub amount_ml: f64,
    pub consumed_at: DateTime<Utc>,
}

/// Read-only snapshot of a user's logs, fetched once per request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogCollection {
    pub food: Vec<FoodEntry>,
    pub exercise: Vec<ExerciseEntry>,
    pub sleep: Vec<SleepEntry>,
    pub water: Vec<WaterEntry>,
}

/// The subset of a `LogCollection` that falls on one calendar day (UTC).
#[derive(Debug, Clone, Copy)]
pub struct DayLogs<'a> {
    pub date: NaiveDate,
    logs: &'a LogCollection,
}

impl<'a> DayLogs<'a> {
    pub fn food(&self) -> impl Iterator<Item = &'a FoodEntry> + '_ {
        let date = self.date;
        self.logs
            .food
            .iter()
            .filter(move |f| f.consumed_at.date_naive() == date)
    }

    pub fn exercise(&self) -> impl Iterator<Item = &'a ExerciseEntry> + '_ {
        let date = self.date;
        self.logs
            .exercise
            .iter()
            .filter(move |e| e.exercise_date == date)
    }

    /// The most recently logged sleep entry for the day, if any.
    pub fn sleep(&self) -> Option<&'a SleepEntry> {
        self.logs
            .sleep
            .iter()
            .filter(|s| s.sleep_date == self.date)
            .last()
    }

    pub fn water(&self) -> impl Iterator<Item = &'a WaterEntry> + '_ {
        let date = self.date;
        self.logs
            .water
            .iter()
            .filter(move |w| w.consumed_at.date_naive() == date)
    }
}

/// Per-day totals derived from a `LogCollection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub exercise_minutes: f64,
    pub calories_burned: f64,
    pub sleep_hours: Option<f64>,
    pub sleep_quality: Option<i32>,
    pub water_ml: f64,
}

impl DailySummary {
    /// A day counts towards a streak when anything was exercised or eaten.
    pub fn has_activity(&self) -> bool {
        self.exercise_minutes > 0.0 || self.total_calories > 0.0
    }
}

impl LogCollection {
    pub fn day(&self, date: NaiveDate) -> DayLogs<'_> {
        DayLogs { date, logs: self }
    }

    pub fn is_empty(&self) -> bool {
        self.food.is_empty() && self.exercise.is_empty() && self.sleep.is_empty() && self.water.is_empty()
    }

    pub fn summarize_day(&self, date: NaiveDate) -> DailySummary {
        let day = self.day(date);
        let (mut calories, mut protein, mut carbs, mut fat) = (0.0, 0.0, 0.0, 0.0);
        for f in day.food() {
            calories += f.calories;
            protein += f.protein_g;
            carbs += f.carbs_g;
            fat += f.fat_g;
        }
        let (mut minutes, mut burned) = (0.0, 0.0);
        for e in day.exercise() {
            minutes += e.duration_minutes;
            burned += e.calories_burned;
        }
        let sleep = day.sleep();

        DailySummary {
            date,
            total_calories: calories,
            protein_g: protein,
            carbs_g: carbs,
            fat_g: fat,
            exercise_minutes: minutes,
            calories_burned: burned,
            sleep_hours: sleep.map(|s| s.total_sleep_hours),
            sleep_quality: sleep.map(|s| s.sleep_quality),
            water_ml: day.water().map(|w| w.amount_ml).sum(),
        }
    }

    /// One summary per day over `days` days ending at `end` (inclusive), oldest first.
    pub fn daily_summaries(&self, end: NaiveDate, days: u32) -> Vec<DailySummary> {
        (0..days as i64)
            .rev()
            .map(|offset| self.summarize_day(end - Duration::days(offset)))
            .collect()
    }
}
