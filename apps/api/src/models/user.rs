use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Unrecognised values score with the female equation.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            _ => Gender::Female,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtremelyActive,
}

impl ActivityLevel {
    /// Unknown levels fall back to `Sedentary`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "lightly_active" => ActivityLevel::LightlyActive,
            "moderately_active" => ActivityLevel::ModeratelyActive,
            "very_active" => ActivityLevel::VeryActive,
            "extremely_active" => ActivityLevel::ExtremelyActive,
            _ => ActivityLevel::Sedentary,
        }
    }

    /// Harris-Benedict activity multiplier.
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtremelyActive => 1.9,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::LightlyActive => "lightly_active",
            ActivityLevel::ModeratelyActive => "moderately_active",
            ActivityLevel::VeryActive => "very_active",
            ActivityLevel::ExtremelyActive => "extremely_active",
        }
    }
}

/// Per-request scoring input. Never mutated by the scoring code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBiometrics {
    pub name: Option<String>,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

/// Raw `users` row as stored; converted into `UserBiometrics` by the store.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub name: Option<String>,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: i32,
    pub gender: String,
    pub activity_level: String,
}

impl From<UserRow> for UserBiometrics {
    fn from(row: UserRow) -> Self {
        UserBiometrics {
            name: row.name,
            weight_kg: row.weight_kg,
            height_cm: row.height_cm,
            age: row.age.max(0) as u32,
            gender: Gender::parse(&row.gender),
            activity_level: ActivityLevel::parse(&row.activity_level),
        }
    }
}

/// Optional daily targets a user has set for themselves.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct HealthGoals {
    pub daily_calories: Option<i32>,
    pub daily_water_ml: Option<i32>,
    pub sleep_hours: Option<f64>,
    pub exercise_minutes: Option<i32>,
}
