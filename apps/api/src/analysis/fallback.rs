//! Deterministic, template-based text used whenever the AI path fails.
//!
//! Pure functions of their inputs: the same scores always produce the same
//! recommendations and narrative. Every description is non-empty.

use crate::models::analysis::{AnalysisType, Priority, Recommendation, Timeframe};
use crate::models::user::UserBiometrics;
use crate::scoring::domain::{recommended_calories, water_target_ml, Domain, HealthScoreCard};
use crate::scoring::trends::{Trend, TrendDirection};

/// Domain scores below this get a targeted recommendation.
const ATTENTION_THRESHOLD: u32 = 70;

/// Replies used when a chat completion fails. One is picked per failed message.
pub const CHAT_APOLOGIES: [&str; 4] = [
    "Sorry, I'm having trouble thinking right now. Could you try asking again in a moment?",
    "Apologies, I couldn't put together a proper answer just now. Please try again shortly.",
    "I'm briefly unable to reach my coaching brain. Your message is saved, so feel free to ask again in a minute.",
    "Something went wrong on my side while preparing a reply. Give it another go in a little while.",
];

pub fn chat_apology(index: usize) -> &'static str {
    CHAT_APOLOGIES[index % CHAT_APOLOGIES.len()]
}

fn priority_for(score: u32) -> Priority {
    match score {
        0..=19 => Priority::Urgent,
        20..=39 => Priority::High,
        40..=59 => Priority::Medium,
        _ => Priority::Low,
    }
}

fn domain_recommendation(domain: Domain, score: u32, bio: &UserBiometrics) -> Recommendation {
    let priority = priority_for(score);
    match domain {
        Domain::Nutrition => Recommendation {
            kind: "nutrition".to_string(),
            title: "Balance your daily intake".to_string(),
            description: format!(
                "Aim for about {:.0} kcal a day with at least 50 g of protein, 100 g of carbohydrates \
                 and 20 g of fat. Logging every meal makes the gaps easy to spot.",
                recommended_calories(bio)
            ),
            priority,
            actionable: true,
            estimated_impact: "Steadier energy and a nutrition score gain of 10-20 points".to_string(),
            time_to_implement: "1-2 weeks".to_string(),
        },
        Domain::Exercise => Recommendation {
            kind: "exercise".to_string(),
            title: "Build up to 45 active minutes".to_string(),
            description: "Work towards at least 45 minutes of movement a day and include one \
                          higher-intensity session, such as intervals or a brisk hill walk."
                .to_string(),
            priority,
            actionable: true,
            estimated_impact: "Better cardiovascular fitness and mood".to_string(),
            time_to_implement: "2-4 weeks".to_string(),
        },
        Domain::Sleep => Recommendation {
            kind: "sleep".to_string(),
            title: "Protect 7-9 hours of sleep".to_string(),
            description: "Keep a consistent bedtime, aim for 7-9 hours, and cut screens and \
                          caffeine in the hour before bed to lift sleep quality."
                .to_string(),
            priority,
            actionable: true,
            estimated_impact: "Improved recovery, focus and appetite regulation".to_string(),
            time_to_implement: "1 week".to_string(),
        },
        Domain::Water => Recommendation {
            kind: "hydration".to_string(),
            title: "Hit your hydration target".to_string(),
            description: format!(
                "Drink roughly {:.0} ml of water a day. Keep a bottle nearby and have a glass with every meal.",
                water_target_ml(bio)
            ),
            priority,
            actionable: true,
            estimated_impact: "Better energy and concentration".to_string(),
            time_to_implement: "A few days".to_string(),
        },
    }
}

/// Templated recommendations for every domain scoring below 70, most urgent first.
/// When everything is on track a single maintenance recommendation is returned.
pub fn fallback_recommendations(card: &HealthScoreCard, bio: &UserBiometrics) -> Vec<Recommendation> {
    let mut recs: Vec<Recommendation> = card
        .domain_scores()
        .iter()
        .filter(|s| s.value < ATTENTION_THRESHOLD)
        .map(|s| domain_recommendation(s.domain, s.value, bio))
        .collect();

    if recs.is_empty() {
        recs.push(Recommendation {
            kind: "general".to_string(),
            title: "Keep your routine going".to_string(),
            description: format!(
                "Every area is on track with an overall score of {}/100. Keep logging daily so \
                 small slips are caught early.",
                card.overall_score
            ),
            priority: Priority::Low,
            actionable: true,
            estimated_impact: "Sustained health gains".to_string(),
            time_to_implement: "Ongoing".to_string(),
        });
    }

    // stable: equal priorities keep domain order
    recs.sort_by(|a, b| b.priority.cmp(&a.priority));
    recs
}

fn band(score: u32) -> &'static str {
    match score {
        80..=100 => "excellent",
        60..=79 => "good",
        40..=59 => "fair",
        _ => "in need of attention",
    }
}

fn weakest_domain(card: &HealthScoreCard) -> Domain {
    let scores = card.domain_scores();
    let mut weakest = scores[0];
    for score in &scores[1..] {
        if score.value < weakest.value {
            weakest = *score;
        }
    }
    weakest.domain
}

fn describe_metric(metric: &str) -> &str {
    match metric {
        "calories" => "calorie intake",
        "exerciseMinutes" => "exercise time",
        "sleepHours" => "sleep duration",
        "waterMl" => "water intake",
        "overallScore" => "overall score",
        other => other,
    }
}

/// Narrative analysis built from scores, trends and the activity streak.
pub fn fallback_narrative(
    analysis_type: AnalysisType,
    timeframe: Timeframe,
    card: &HealthScoreCard,
    trends: &[Trend],
    streak: u32,
) -> String {
    let mut parts = Vec::new();

    parts.push(format!(
        "Your overall health score is {}/100, which is {}.",
        card.overall_score,
        band(card.overall_score)
    ));

    match analysis_type.focus() {
        Some(domain) => {
            let score = card.score_for(domain);
            parts.push(format!(
                "Your {} score is {score}/100 ({}).",
                domain.label(),
                band(score)
            ));
        }
        None => parts.push(format!(
            "Nutrition {}, exercise {}, sleep {} and hydration {}.",
            card.nutrition_score, card.exercise_score, card.sleep_score, card.water_score
        )),
    }

    let period = match timeframe {
        Timeframe::Day => "today",
        Timeframe::Week => "over the past week",
        Timeframe::Month => "over the past month",
    };
    for trend in trends {
        let what = describe_metric(&trend.metric);
        match trend.direction {
            TrendDirection::Improving => parts.push(format!("Your {what} is improving {period}.")),
            TrendDirection::Declining => parts.push(format!("Your {what} has been declining {period}.")),
            TrendDirection::Stable => {}
        }
    }

    if streak > 1 {
        parts.push(format!("You're on a {streak}-day logging streak. Keep it going!"));
    }

    let focus = analysis_type.focus().unwrap_or_else(|| weakest_domain(card));
    if card.score_for(focus) < ATTENTION_THRESHOLD {
        parts.push(format!(
            "The biggest opportunity right now is {}; small, consistent changes there will move your overall score the most.",
            focus.label()
        ));
    } else {
        parts.push("You're doing well. Keep up the consistent habits.".to_string());
    }

    parts.join(" ")
}
