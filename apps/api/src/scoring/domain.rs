//! Domain scoring: deterministic 0-100 scores for nutrition, exercise, sleep and
//! hydration. Pure functions over a day's logs and the user's biometrics.
//!
//! Every scorer starts at 100 and subtracts penalties; the result is clamped to
//! [0, 100]. A day with no entries for a domain gets that domain's neutral
//! default (50, or 30 for exercise). Those defaults overlap with genuinely poor
//! scores and callers cannot tell the two apart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::logs::{DayLogs, ExerciseEntry, FoodEntry, LogCollection, SleepEntry, WaterEntry};
use crate::models::user::{Gender, UserBiometrics};

pub const NO_DATA_NUTRITION: i32 = 50;
pub const NO_DATA_EXERCISE: i32 = 30;
pub const NO_DATA_SLEEP: i32 = 50;
pub const NO_DATA_WATER: i32 = 50;

/// ml of water per kg of body weight per day.
pub const WATER_ML_PER_KG: f64 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Nutrition,
    Exercise,
    Sleep,
    Water,
}

impl Domain {
    pub fn label(self) -> &'static str {
        match self {
            Domain::Nutrition => "nutrition",
            Domain::Exercise => "exercise",
            Domain::Sleep => "sleep",
            Domain::Water => "hydration",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: Domain,
    pub value: u32,
}

/// The four domain scores plus their rounded mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScoreCard {
    pub nutrition_score: u32,
    pub exercise_score: u32,
    pub sleep_score: u32,
    pub water_score: u32,
    pub overall_score: u32,
}

impl HealthScoreCard {
    pub fn from_components(nutrition: i32, exercise: i32, sleep: i32, water: i32) -> Self {
        let nutrition_score = clamp_score(nutrition);
        let exercise_score = clamp_score(exercise);
        let sleep_score = clamp_score(sleep);
        let water_score = clamp_score(water);
        let sum = nutrition_score + exercise_score + sleep_score + water_score;
        let overall_score = clamp_score((f64::from(sum) / 4.0).round() as i32);

        Self {
            nutrition_score,
            exercise_score,
            sleep_score,
            water_score,
            overall_score,
        }
    }

    pub fn domain_scores(&self) -> [DomainScore; 4] {
        [
            DomainScore {
                domain: Domain::Nutrition,
                value: self.nutrition_score,
            },
            DomainScore {
                domain: Domain::Exercise,
                value: self.exercise_score,
            },
            DomainScore {
                domain: Domain::Sleep,
                value: self.sleep_score,
            },
            DomainScore {
                domain: Domain::Water,
                value: self.water_score,
            },
        ]
    }

    pub fn score_for(&self, domain: Domain) -> u32 {
        match domain {
            Domain::Nutrition => self.nutrition_score,
            Domain::Exercise => self.exercise_score,
            Domain::Sleep => self.sleep_score,
            Domain::Water => self.water_score,
        }
    }
}

fn clamp_score(value: i32) -> u32 {
    value.clamp(0, 100) as u32
}

/// Harris-Benedict basal metabolic rate in kcal/day.
pub fn basal_metabolic_rate(bio: &UserBiometrics) -> f64 {
    let age = f64::from(bio.age);
    match bio.gender {
        Gender::Male => 88.362 + 13.397 * bio.weight_kg + 4.799 * bio.height_cm - 5.677 * age,
        Gender::Female => 447.593 + 9.247 * bio.weight_kg + 3.098 * bio.height_cm - 4.330 * age,
    }
}

/// BMR scaled by the activity multiplier, rounded to whole kcal.
pub fn recommended_calories(bio: &UserBiometrics) -> f64 {
    (basal_metabolic_rate(bio) * bio.activity_level.multiplier()).round()
}

/// Daily water target in ml.
pub fn water_target_ml(bio: &UserBiometrics) -> f64 {
    bio.weight_kg * WATER_ML_PER_KG
}

pub fn nutrition_score<'a>(
    entries: impl IntoIterator<Item = &'a FoodEntry>,
    bio: &UserBiometrics,
) -> i32 {
    let mut count = 0usize;
    let (mut calories, mut protein, mut carbs, mut fat) = (0.0, 0.0, 0.0, 0.0);
    for entry in entries {
        count += 1;
        calories += entry.calories;
        protein += entry.protein_g;
        carbs += entry.carbs_g;
        fat += entry.fat_g;
    }
    if count == 0 {
        return NO_DATA_NUTRITION;
    }

    let mut score = 100;
    let recommended = recommended_calories(bio);
    if recommended > 0.0 {
        let deviation = (calories - recommended).abs() / recommended;
        if deviation > 0.3 {
            score -= 20;
        } else if deviation > 0.2 {
            score -= 15;
        } else if deviation > 0.1 {
            score -= 10;
        }
    }
    if protein < 50.0 {
        score -= 15;
    }
    if carbs < 100.0 {
        score -= 10;
    }
    if fat < 20.0 {
        score -= 10;
    }
    score.max(0)
}

pub fn exercise_score<'a>(entries: impl IntoIterator<Item = &'a ExerciseEntry>) -> i32 {
    let mut count = 0usize;
    let mut minutes = 0.0;
    let mut vigorous = false;
    for entry in entries {
        count += 1;
        minutes += entry.duration_minutes;
        vigorous |= entry.is_vigorous();
    }
    if count == 0 {
        return NO_DATA_EXERCISE;
    }

    let mut score = 100;
    if minutes < 15.0 {
        score -= 40;
    } else if minutes < 30.0 {
        score -= 20;
    } else if minutes < 45.0 {
        score -= 10;
    }
    if !vigorous {
        score -= 15;
    }
    score.max(0)
}

pub fn sleep_score(entry: Option<&SleepEntry>) -> i32 {
    let Some(entry) = entry else {
        return NO_DATA_SLEEP;
    };

    let mut score = 100;
    let hours = entry.total_sleep_hours;
    if hours < 6.0 {
        score -= 30;
    } else if hours < 7.0 {
        score -= 20;
    } else if hours < 8.0 {
        score -= 10;
    } else if hours > 9.0 {
        score -= 15;
    }

    let quality = entry.sleep_quality;
    if quality < 5 {
        score -= 25;
    } else if quality < 7 {
        score -= 15;
    } else if quality < 8 {
        score -= 10;
    }
    score.max(0)
}

pub fn water_score<'a>(
    entries: impl IntoIterator<Item = &'a WaterEntry>,
    bio: &UserBiometrics,
) -> i32 {
    let mut count = 0usize;
    let mut total = 0.0;
    for entry in entries {
        count += 1;
        total += entry.amount_ml;
    }
    if count == 0 {
        return NO_DATA_WATER;
    }

    let target = water_target_ml(bio);
    if target <= 0.0 {
        return NO_DATA_WATER;
    }

    let ratio = total / target;
    let mut score = 100;
    // Exactly half the target still lands in the lowest band.
    if ratio <= 0.5 {
        score -= 40;
    } else if ratio < 0.7 {
        score -= 25;
    } else if ratio < 0.9 {
        score -= 15;
    }
    if ratio > 1.5 {
        score -= 10;
    }
    score.max(0)
}

pub fn score_day_logs(day: DayLogs<'_>, bio: &UserBiometrics) -> HealthScoreCard {
    HealthScoreCard::from_components(
        nutrition_score(day.food(), bio),
        exercise_score(day.exercise()),
        sleep_score(day.sleep()),
        water_score(day.water(), bio),
    )
}

/// Scores a single calendar day of `logs`.
pub fn score_day(logs: &LogCollection, date: NaiveDate, bio: &UserBiometrics) -> HealthScoreCard {
    score_day_logs(logs.day(date), bio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::ActivityLevel;
    use chrono::{TimeZone, Utc};

    fn male_70kg() -> UserBiometrics {
        UserBiometrics {
            name: Some("Sam".to_string()),
            weight_kg: 70.0,
            height_cm: 170.0,
            age: 30,
            gender: Gender::Male,
            activity_level: ActivityLevel::Sedentary,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn food(calories: f64, protein: f64, carbs: f64, fat: f64) -> FoodEntry {
        FoodEntry {
            calories,
            protein_g: protein,
            carbs_g: carbs,
            fat_g: fat,
            consumed_at: Utc.from_utc_datetime(&day().and_hms_opt(12, 0, 0).unwrap()),
        }
    }

    fn workout(minutes: f64, intensity: &str) -> ExerciseEntry {
        ExerciseEntry {
            duration_minutes: minutes,
            calories_burned: minutes * 8.0,
            intensity: intensity.to_string(),
            exercise_type: "cycling".to_string(),
            exercise_date: day(),
        }
    }

    fn sleep(hours: f64, quality: i32) -> SleepEntry {
        SleepEntry {
            total_sleep_hours: hours,
            sleep_quality: quality,
            sleep_date: day(),
        }
    }

    fn water(ml: f64) -> WaterEntry {
        WaterEntry {
            amount_ml: ml,
            consumed_at: Utc.from_utc_datetime(&day().and_hms_opt(10, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_bmr_male_reference_value() {
        let bmr = basal_metabolic_rate(&male_70kg());
        assert!((bmr - 1671.672).abs() < 0.01, "BMR was {bmr}");
    }

    #[test]
    fn test_bmr_female_equation() {
        let bio = UserBiometrics {
            gender: Gender::Female,
            ..male_70kg()
        };
        // 447.593 + 647.29 + 526.66 - 129.9
        let bmr = basal_metabolic_rate(&bio);
        assert!((bmr - 1491.643).abs() < 0.01, "BMR was {bmr}");
    }

    #[test]
    fn test_recommended_calories_sedentary() {
        assert_eq!(recommended_calories(&male_70kg()), 2006.0);
    }

    #[test]
    fn test_recommended_calories_uses_activity_multiplier() {
        let bio = UserBiometrics {
            activity_level: ActivityLevel::VeryActive,
            ..male_70kg()
        };
        assert_eq!(recommended_calories(&bio), (1671.672_f64 * 1.725).round());
    }

    #[test]
    fn test_empty_day_uses_neutral_defaults() {
        let card = score_day(&LogCollection::default(), day(), &male_70kg());
        assert_eq!(card.nutrition_score, 50);
        assert_eq!(card.exercise_score, 30);
        assert_eq!(card.sleep_score, 50);
        assert_eq!(card.water_score, 50);
        assert_eq!(card.overall_score, 45);
    }

    #[test]
    fn test_nutrition_on_target_with_good_macros_is_perfect() {
        let entries = [food(2006.0, 120.0, 250.0, 60.0)];
        assert_eq!(nutrition_score(&entries, &male_70kg()), 100);
    }

    #[test]
    fn test_nutrition_deviation_bands() {
        let bio = male_70kg();
        // 2006 * 1.15 ≈ 2307 → >10% band
        assert_eq!(nutrition_score(&[food(2307.0, 120.0, 250.0, 60.0)], &bio), 90);
        // 2006 * 1.25 ≈ 2508 → >20% band
        assert_eq!(nutrition_score(&[food(2508.0, 120.0, 250.0, 60.0)], &bio), 85);
        // far under target → >30% band
        assert_eq!(nutrition_score(&[food(800.0, 120.0, 250.0, 60.0)], &bio), 80);
    }

    #[test]
    fn test_nutrition_worst_case_clamps_at_zero_floor() {
        let score = nutrition_score(&[food(0.0, 0.0, 0.0, 0.0)], &male_70kg());
        // 100 - 20 - 15 - 10 - 10
        assert_eq!(score, 45);
        assert!(score >= 0);
    }

    #[test]
    fn test_exercise_duration_bands_and_intensity() {
        assert_eq!(exercise_score(&[workout(10.0, "high")]), 60);
        assert_eq!(exercise_score(&[workout(20.0, "high")]), 80);
        assert_eq!(exercise_score(&[workout(40.0, "very_high")]), 90);
        assert_eq!(exercise_score(&[workout(60.0, "high")]), 100);
        assert_eq!(exercise_score(&[workout(60.0, "low")]), 85);
        assert_eq!(exercise_score(&[workout(5.0, "low")]), 45);
    }

    #[test]
    fn test_exercise_durations_are_summed() {
        let entries = [workout(20.0, "moderate"), workout(30.0, "high")];
        assert_eq!(exercise_score(&entries), 100);
    }

    #[test]
    fn test_sleep_hour_bands_only_one_applies() {
        assert_eq!(sleep_score(Some(&sleep(5.0, 9))), 70);
        assert_eq!(sleep_score(Some(&sleep(6.5, 9))), 80);
        assert_eq!(sleep_score(Some(&sleep(7.5, 9))), 90);
        assert_eq!(sleep_score(Some(&sleep(8.5, 9))), 100);
        assert_eq!(sleep_score(Some(&sleep(10.0, 9))), 85);
    }

    #[test]
    fn test_sleep_quality_bands() {
        assert_eq!(sleep_score(Some(&sleep(8.0, 3))), 75);
        assert_eq!(sleep_score(Some(&sleep(8.0, 6))), 85);
        assert_eq!(sleep_score(Some(&sleep(8.0, 7))), 90);
        assert_eq!(sleep_score(Some(&sleep(5.0, 2))), 45);
    }

    #[test]
    fn test_water_half_target_scores_sixty() {
        let bio = male_70kg();
        assert_eq!(water_target_ml(&bio), 2450.0);
        assert_eq!(water_score(&[water(1225.0)], &bio), 60);
    }

    #[test]
    fn test_water_bands() {
        let bio = male_70kg();
        assert_eq!(water_score(&[water(1500.0)], &bio), 75);
        assert_eq!(water_score(&[water(2000.0)], &bio), 85);
        assert_eq!(water_score(&[water(2450.0)], &bio), 100);
        assert_eq!(water_score(&[water(4000.0)], &bio), 90);
    }

    #[test]
    fn test_score_day_ignores_other_days() {
        let mut other_day = food(3000.0, 10.0, 10.0, 5.0);
        other_day.consumed_at = Utc.from_utc_datetime(
            &day().pred_opt().unwrap().and_hms_opt(12, 0, 0).unwrap(),
        );
        let logs = LogCollection {
            food: vec![other_day],
            ..Default::default()
        };
        let card = score_day(&logs, day(), &male_70kg());
        assert_eq!(card.nutrition_score, 50);
    }

    #[test]
    fn test_scores_always_within_bounds() {
        let bio = male_70kg();
        let hours = [0.0, 4.0, 6.5, 7.5, 8.5, 12.0];
        let qualities = [1, 4, 6, 7, 8, 10];
        let waters = [0.0, 500.0, 1600.0, 2300.0, 5000.0];
        for &h in &hours {
            for &q in &qualities {
                for &w in &waters {
                    let logs = LogCollection {
                        food: vec![food(w, h, q as f64, 0.0)],
                        exercise: vec![workout(h * 5.0, "low")],
                        sleep: vec![sleep(h, q)],
                        water: vec![water(w)],
                    };
                    let card = score_day(&logs, day(), &bio);
                    for score in card.domain_scores() {
                        assert!(score.value <= 100);
                    }
                    assert!(card.overall_score <= 100);
                }
            }
        }
    }

    #[test]
    fn test_overall_is_rounded_mean() {
        let card = HealthScoreCard::from_components(100, 85, 90, 60);
        // 335 / 4 = 83.75
        assert_eq!(card.overall_score, 84);
    }

    #[test]
    fn test_components_are_clamped() {
        let card = HealthScoreCard::from_components(-20, 150, 50, 50);
        assert_eq!(card.nutrition_score, 0);
        assert_eq!(card.exercise_score, 100);
    }
}
