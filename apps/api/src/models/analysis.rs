use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::scoring::domain::Domain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Comprehensive,
    Nutrition,
    Exercise,
    Sleep,
    Hydration,
}

impl AnalysisType {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisType::Comprehensive => "comprehensive",
            AnalysisType::Nutrition => "nutrition",
            AnalysisType::Exercise => "exercise",
            AnalysisType::Sleep => "sleep",
            AnalysisType::Hydration => "hydration",
        }
    }

    /// The single domain this analysis concentrates on, if any.
    pub fn focus(self) -> Option<Domain> {
        match self {
            AnalysisType::Comprehensive => None,
            AnalysisType::Nutrition => Some(Domain::Nutrition),
            AnalysisType::Exercise => Some(Domain::Exercise),
            AnalysisType::Sleep => Some(Domain::Sleep),
            AnalysisType::Hydration => Some(Domain::Water),
        }
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "comprehensive" | "overall" => Ok(AnalysisType::Comprehensive),
            "nutrition" => Ok(AnalysisType::Nutrition),
            "exercise" | "fitness" => Ok(AnalysisType::Exercise),
            "sleep" => Ok(AnalysisType::Sleep),
            "hydration" | "water" => Ok(AnalysisType::Hydration),
            other => Err(format!("unknown analysis type '{other}'")),
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Day,
    Week,
    Month,
}

impl Timeframe {
    pub fn days(self) -> u32 {
        match self {
            Timeframe::Day => 1,
            Timeframe::Week => 7,
            Timeframe::Month => 30,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Day => "day",
            Timeframe::Week => "week",
            Timeframe::Month => "month",
        }
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" | "today" => Ok(Timeframe::Day),
            "week" | "weekly" => Ok(Timeframe::Week),
            "month" | "monthly" => Ok(Timeframe::Month),
            other => Err(format!("unknown timeframe '{other}'")),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim().to_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            "urgent" | "critical" => Priority::Urgent,
            _ => Priority::Medium,
        })
    }
}

fn default_true() -> bool {
    true
}

/// A single recommendation, AI-produced or templated. `description` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_true")]
    pub actionable: bool,
    #[serde(default)]
    pub estimated_impact: String,
    #[serde(default)]
    pub time_to_implement: String,
}
