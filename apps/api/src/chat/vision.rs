//! Structured nutrition breakdown returned by the deep image-analysis mode.

use serde::Deserialize;

use crate::llm_client::{parse_json_reply, LlmError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub name: String,
    #[serde(default)]
    pub portion: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionBreakdown {
    pub foods: Vec<FoodItem>,
    #[serde(default)]
    pub total_calories: f64,
    #[serde(default)]
    pub total_protein_g: f64,
    #[serde(default)]
    pub total_carbs_g: f64,
    #[serde(default)]
    pub total_fat_g: f64,
    /// 1-10, 0 when no food was detected.
    #[serde(default)]
    pub health_score: Option<u8>,
    #[serde(default)]
    pub notes: String,
}

impl NutritionBreakdown {
    /// Parses the model's JSON reply. Missing totals are summed from the items.
    pub fn parse(text: &str) -> Result<Self, LlmError> {
        let mut breakdown: NutritionBreakdown = parse_json_reply(text)?;
        if breakdown.foods.iter().any(|f| f.name.trim().is_empty()) {
            return Err(LlmError::MalformedResponse(
                "food item without a name".to_string(),
            ));
        }
        if breakdown.total_calories <= 0.0 {
            breakdown.total_calories = breakdown.foods.iter().map(|f| f.calories).sum();
            breakdown.total_protein_g = breakdown.foods.iter().map(|f| f.protein_g).sum();
            breakdown.total_carbs_g = breakdown.foods.iter().map(|f| f.carbs_g).sum();
            breakdown.total_fat_g = breakdown.foods.iter().map(|f| f.fat_g).sum();
        }
        Ok(breakdown)
    }

    /// Chat-ready rendering of the breakdown.
    pub fn render(&self) -> String {
        if self.foods.is_empty() {
            let notes = self.notes.trim();
            return if notes.is_empty() || notes.eq_ignore_ascii_case("no food detected") {
                "I couldn't spot any food in this photo. Try a closer shot of your plate.".to_string()
            } else {
                format!("I couldn't spot any food in this photo. {notes}")
            };
        }

        let mut lines = vec!["Here's my estimate for this meal:".to_string()];
        for food in &self.foods {
            let portion = if food.portion.trim().is_empty() {
                String::new()
            } else {
                format!(" ({})", food.portion.trim())
            };
            lines.push(format!(
                "- {}{portion}: {:.0} kcal, {:.0} g protein, {:.0} g carbs, {:.0} g fat",
                food.name.trim(),
                food.calories,
                food.protein_g,
                food.carbs_g,
                food.fat_g
            ));
        }
        lines.push(format!(
            "Total: about {:.0} kcal ({:.0} g protein, {:.0} g carbs, {:.0} g fat).",
            self.total_calories, self.total_protein_g, self.total_carbs_g, self.total_fat_g
        ));
        if let Some(score) = self.health_score.filter(|s| *s > 0) {
            lines.push(format!("Meal score: {score}/10."));
        }
        if !self.notes.trim().is_empty() {
            lines.push(self.notes.trim().to_string());
        }
        lines.join("\n")
    }
}
