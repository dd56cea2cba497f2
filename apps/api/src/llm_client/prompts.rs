// Prompt construction for every completion mode.
// Each prompt is exactly [system, user]. The mode is chosen by the caller and a
// prompt never mixes modes.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::llm_client::{CompletionParams, PromptMessage};
use crate::models::analysis::{AnalysisType, Timeframe};
use crate::models::chat::ChatMessage;
use crate::models::logs::DailySummary;
use crate::models::user::{Gender, HealthGoals, UserBiometrics};
use crate::scoring::domain::HealthScoreCard;
use crate::scoring::trends::Trend;

/// Persona shared by every system prompt.
pub const COACH_PERSONA: &str = "You are a supportive, evidence-informed personal health coach. \
    You give practical guidance on nutrition, exercise, sleep and hydration. \
    You are not a doctor: never diagnose, and suggest a professional for anything medical.";

/// System prompt header. Replace: {name}, {age}, {gender}, {height}, {weight}, {activity}, {goals}
const PROFILE_TEMPLATE: &str = "USER PROFILE:
- Name: {name}
- Age: {age}
- Gender: {gender}
- Height: {height} cm
- Weight: {weight} kg
- Activity level: {activity}
- Goals: {goals}";

const ANALYSIS_TASK: &str = "TASK: Write a concise health analysis ({analysis_type}, last {timeframe}) \
    from the scores, trends and daily logs provided. Reference concrete numbers, call out what is \
    going well, name the weakest area, and finish with two or three specific next steps. \
    Plain prose, no more than 250 words.";

const RECOMMENDATIONS_TASK: &str = r#"TASK: Produce 3 to 5 personalised recommendations from the data provided.
Return a JSON ARRAY only, no prose, no markdown fences:
[
  {
    "type": "nutrition | exercise | sleep | hydration | general",
    "title": "Short imperative title",
    "description": "One or two sentences with a concrete, measurable action",
    "priority": "low | medium | high | urgent",
    "actionable": true,
    "estimatedImpact": "What improves and roughly by how much",
    "timeToImplement": "e.g. 1 week"
  }
]
Prioritise the lowest-scoring domains."#;

const CHAT_TASK: &str = "TASK: Reply to the user's latest message as their health coach. \
    Use the recent activity and conversation for context, stay conversational, \
    keep it under 150 words, and only give numbers you can ground in their data.";

const IMAGE_DESCRIBE_TASK: &str = "TASK: Describe the attached image literally: what is visible, \
    colours, arrangement, any text. Do NOT estimate calories, nutrients or portion sizes and \
    do NOT give health advice.";

const IMAGE_CASUAL_TASK: &str = "TASK: Reply casually to the user's message about the attached image, \
    like a friendly coach glancing at a photo. Light health commentary is welcome; \
    detailed nutrition numbers are not. Keep it under 100 words.";

const IMAGE_NUTRITION_TASK: &str = r#"TASK: Analyse the food in the attached image and return a JSON object only, no prose, no markdown fences:
{
  "foods": [
    {"name": "grilled chicken breast", "portion": "150 g", "calories": 248, "proteinG": 46, "carbsG": 0, "fatG": 5}
  ],
  "totalCalories": 248,
  "totalProteinG": 46,
  "totalCarbsG": 0,
  "totalFatG": 5,
  "healthScore": 8,
  "notes": "One or two sentences relating the meal to the user's goals"
}
healthScore is 1-10. If no food is visible return {"foods": [], "totalCalories": 0, "totalProteinG": 0, "totalCarbsG": 0, "totalFatG": 0, "healthScore": 0, "notes": "No food detected"}."#;

const TITLE_SYSTEM: &str = "You are a title generation assistant. Generate a short, descriptive title \
    (maximum 6 words) for a health coaching conversation that starts with the given message. \
    Respond with ONLY the title, no quotes, no explanation.";

/// How an attached image should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePolicy {
    /// Literal description only, no nutrition claims.
    Describe,
    /// Conversational reply, light health commentary allowed.
    Casual,
    /// Full structured nutrition breakdown (JSON).
    NutritionBreakdown,
}

/// Recent activity injected into chat prompts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    pub days: Vec<DailySummary>,
    pub today: HealthScoreCard,
    pub streak: u32,
}

/// The user-side context shared by all modes.
#[derive(Debug, Clone, Copy)]
pub struct PromptProfile<'a> {
    pub biometrics: &'a UserBiometrics,
    pub goals: Option<&'a HealthGoals>,
}

pub enum PromptMode<'a> {
    Analysis {
        analysis_type: AnalysisType,
        timeframe: Timeframe,
        scores: &'a HealthScoreCard,
        trends: &'a [Trend],
        days: &'a [DailySummary],
    },
    Recommendations {
        scores: &'a HealthScoreCard,
        trends: &'a [Trend],
        days: &'a [DailySummary],
    },
    Chat {
        message: &'a str,
        history: &'a [ChatMessage],
        activity: &'a ActivitySnapshot,
    },
    Image {
        policy: ImagePolicy,
        message: &'a str,
        image_url: &'a str,
    },
}

impl PromptMode<'_> {
    pub fn params(&self) -> CompletionParams {
        match self {
            PromptMode::Analysis { .. } => CompletionParams::new(0.7, 800),
            PromptMode::Recommendations { .. } => CompletionParams::new(0.6, 900),
            PromptMode::Chat { .. } => CompletionParams::new(0.8, 500),
            PromptMode::Image { policy, .. } => match policy {
                ImagePolicy::Describe => CompletionParams::new(0.3, 400).with_vision(),
                ImagePolicy::Casual => CompletionParams::new(0.8, 400).with_vision(),
                ImagePolicy::NutritionBreakdown => CompletionParams::new(0.2, 900).with_vision(),
            },
        }
    }
}

pub const TITLE_PARAMS: CompletionParams = CompletionParams::new(0.5, 20);

/// Builds the `[system, user]` message pair for `mode`.
pub fn build_prompt(profile: PromptProfile<'_>, mode: &PromptMode<'_>) -> Vec<PromptMessage> {
    let task = match mode {
        PromptMode::Analysis {
            analysis_type,
            timeframe,
            ..
        } => ANALYSIS_TASK
            .replace("{analysis_type}", analysis_type.as_str())
            .replace("{timeframe}", timeframe.as_str()),
        PromptMode::Recommendations { .. } => RECOMMENDATIONS_TASK.to_string(),
        PromptMode::Chat { .. } => CHAT_TASK.to_string(),
        PromptMode::Image { policy, .. } => match policy {
            ImagePolicy::Describe => IMAGE_DESCRIBE_TASK.to_string(),
            ImagePolicy::Casual => IMAGE_CASUAL_TASK.to_string(),
            ImagePolicy::NutritionBreakdown => IMAGE_NUTRITION_TASK.to_string(),
        },
    };
    let system = format!("{COACH_PERSONA}\n\n{}\n\n{task}", render_profile(profile));

    let user = match mode {
        PromptMode::Analysis {
            analysis_type,
            timeframe,
            scores,
            trends,
            days,
        } => PromptMessage::user(format!(
            "Here is my health data. Please analyse it.\n\n{}",
            pretty(&json!({
                "analysisType": analysis_type,
                "timeframe": timeframe,
                "scores": scores,
                "trends": trends,
                "dailyLogs": days,
            }))
        )),
        PromptMode::Recommendations {
            scores,
            trends,
            days,
        } => PromptMessage::user(format!(
            "Here is my recent health data. What should I focus on?\n\n{}",
            pretty(&json!({
                "scores": scores,
                "trends": trends,
                "dailyLogs": days,
            }))
        )),
        PromptMode::Chat {
            message,
            history,
            activity,
        } => PromptMessage::user(format!(
            "RECENT ACTIVITY:\n{}\n\nRECENT CONVERSATION:\n{}\n\nMY MESSAGE:\n{message}",
            render_activity(activity),
            render_history(history),
        )),
        PromptMode::Image {
            policy,
            message,
            image_url,
        } => {
            let instruction = match policy {
                ImagePolicy::Describe => "Describe this image.",
                ImagePolicy::Casual => "Take a look at this.",
                ImagePolicy::NutritionBreakdown => "Break down the nutrition of this meal.",
            };
            let text = if message.trim().is_empty() {
                instruction.to_string()
            } else {
                format!("{instruction}\n\n{}", message.trim())
            };
            PromptMessage::user_with_image(text, *image_url)
        }
    };

    vec![PromptMessage::system(system), user]
}

/// Prompt for naming a chat session after its first message.
pub fn build_title_prompt(first_message: &str) -> Vec<PromptMessage> {
    let preview: String = first_message.chars().take(500).collect();
    vec![
        PromptMessage::system(TITLE_SYSTEM),
        PromptMessage::user(format!("Generate a title for this conversation:\n\n{preview}")),
    ]
}

fn render_profile(profile: PromptProfile<'_>) -> String {
    let bio = profile.biometrics;
    PROFILE_TEMPLATE
        .replace("{name}", bio.name.as_deref().unwrap_or("not provided"))
        .replace("{age}", &bio.age.to_string())
        .replace(
            "{gender}",
            match bio.gender {
                Gender::Male => "male",
                Gender::Female => "female",
            },
        )
        .replace("{height}", &format!("{:.0}", bio.height_cm))
        .replace("{weight}", &format!("{:.1}", bio.weight_kg))
        .replace("{activity}", bio.activity_level.as_str())
        .replace("{goals}", &render_goals(profile.goals))
}

fn render_goals(goals: Option<&HealthGoals>) -> String {
    let Some(goals) = goals else {
        return "none set".to_string();
    };
    let mut parts = Vec::new();
    if let Some(kcal) = goals.daily_calories {
        parts.push(format!("{kcal} kcal/day"));
    }
    if let Some(ml) = goals.daily_water_ml {
        parts.push(format!("{ml} ml water/day"));
    }
    if let Some(hours) = goals.sleep_hours {
        parts.push(format!("{hours:.1} h sleep"));
    }
    if let Some(minutes) = goals.exercise_minutes {
        parts.push(format!("{minutes} min exercise/day"));
    }
    if parts.is_empty() {
        "none set".to_string()
    } else {
        parts.join(", ")
    }
}

fn render_activity(activity: &ActivitySnapshot) -> String {
    let mut lines = vec![format!(
        "Today's scores: overall {}/100 (nutrition {}, exercise {}, sleep {}, hydration {}). Activity streak: {} day(s).",
        activity.today.overall_score,
        activity.today.nutrition_score,
        activity.today.exercise_score,
        activity.today.sleep_score,
        activity.today.water_score,
        activity.streak,
    )];
    for day in &activity.days {
        let sleep = day
            .sleep_hours
            .map(|h| format!("{h:.1} h sleep"))
            .unwrap_or_else(|| "no sleep logged".to_string());
        lines.push(format!(
            "- {}: {:.0} kcal eaten, {:.0} min exercise, {sleep}, {:.0} ml water",
            day.date, day.total_calories, day.exercise_minutes, day.water_ml
        ));
    }
    lines.join("\n")
}

fn render_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "(this is the start of the conversation)".to_string();
    }
    history
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::Role;
    use crate::models::chat::MessageRole;
    use crate::models::user::ActivityLevel;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn bio() -> UserBiometrics {
        UserBiometrics {
            name: Some("Riley".to_string()),
            weight_kg: 68.0,
            height_cm: 165.0,
            age: 34,
            gender: Gender::Female,
            activity_level: ActivityLevel::ModeratelyActive,
        }
    }

    fn card() -> HealthScoreCard {
        HealthScoreCard::from_components(80, 60, 70, 90)
    }

    fn snapshot() -> ActivitySnapshot {
        ActivitySnapshot {
            days: vec![DailySummary {
                date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
                total_calories: 1800.0,
                protein_g: 90.0,
                carbs_g: 200.0,
                fat_g: 60.0,
                exercise_minutes: 35.0,
                calories_burned: 300.0,
                sleep_hours: Some(7.5),
                sleep_quality: Some(8),
                water_ml: 2100.0,
            }],
            today: card(),
            streak: 4,
        }
    }

    #[test]
    fn test_system_message_embeds_biometrics_and_goals() {
        let bio = bio();
        let goals = HealthGoals {
            daily_water_ml: Some(2500),
            ..Default::default()
        };
        let profile = PromptProfile {
            biometrics: &bio,
            goals: Some(&goals),
        };
        let scores = card();
        let messages = build_prompt(
            profile,
            &PromptMode::Recommendations {
                scores: &scores,
                trends: &[],
                days: &[],
            },
        );

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        let system = messages[0].text();
        assert!(system.contains("Riley"));
        assert!(system.contains("Age: 34"));
        assert!(system.contains("female"));
        assert!(system.contains("moderately_active"));
        assert!(system.contains("2500 ml water/day"));
        assert!(system.contains("JSON ARRAY"));
    }

    #[test]
    fn test_analysis_prompt_contains_json_dump() {
        let bio = bio();
        let scores = card();
        let messages = build_prompt(
            PromptProfile {
                biometrics: &bio,
                goals: None,
            },
            &PromptMode::Analysis {
                analysis_type: AnalysisType::Sleep,
                timeframe: Timeframe::Week,
                scores: &scores,
                trends: &[],
                days: &snapshot().days,
            },
        );
        let user = messages[1].text();
        assert!(user.contains("\"analysisType\": \"sleep\""));
        assert!(user.contains("\"overallScore\": 75"));
        assert!(user.contains("\"dailyLogs\""));
        assert!(messages[0].text().contains("last week"));
        assert!(!messages[1].has_image());
    }

    #[test]
    fn test_chat_prompt_includes_history_and_activity() {
        let bio = bio();
        let history = vec![ChatMessage {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            role: MessageRole::Assistant,
            content: "Nice work on the run yesterday!".to_string(),
            rating: None,
            created_at: Utc::now(),
        }];
        let activity = snapshot();
        let mode = PromptMode::Chat {
            message: "Should I rest today?",
            history: &history,
            activity: &activity,
        };
        let messages = build_prompt(
            PromptProfile {
                biometrics: &bio,
                goals: None,
            },
            &mode,
        );
        let user = messages[1].text();
        assert!(user.contains("assistant: Nice work on the run yesterday!"));
        assert!(user.contains("Activity streak: 4 day(s)"));
        assert!(user.contains("35 min exercise"));
        assert!(user.ends_with("Should I rest today?"));
        assert_eq!(mode.params(), CompletionParams::new(0.8, 500));
    }

    #[test]
    fn test_image_policies_never_mix_instructions() {
        let bio = bio();
        let profile = PromptProfile {
            biometrics: &bio,
            goals: None,
        };
        let describe = build_prompt(
            profile,
            &PromptMode::Image {
                policy: ImagePolicy::Describe,
                message: "",
                image_url: "data:image/jpeg;base64,xyz",
            },
        );
        let system = describe[0].text();
        assert!(system.contains("Do NOT estimate calories"));
        assert!(!system.contains("totalCalories"));
        assert!(!system.contains("Reply casually"));
        assert!(describe[1].has_image());

        let nutrition = build_prompt(
            profile,
            &PromptMode::Image {
                policy: ImagePolicy::NutritionBreakdown,
                message: "lunch",
                image_url: "data:image/jpeg;base64,xyz",
            },
        );
        let system = nutrition[0].text();
        assert!(system.contains("totalCalories"));
        assert!(!system.contains("Describe the attached image literally"));
        assert!(nutrition[1].text().ends_with("lunch"));
    }

    #[test]
    fn test_image_modes_use_vision_model() {
        let mode = PromptMode::Image {
            policy: ImagePolicy::Casual,
            message: "",
            image_url: "http://x",
        };
        assert!(mode.params().vision);
    }

    #[test]
    fn test_title_prompt_truncates_long_messages() {
        let long = "a".repeat(2000);
        let messages = build_title_prompt(&long);
        assert!(messages[1].text().len() < 600);
        assert_eq!(TITLE_PARAMS.max_tokens, 20);
    }
}
