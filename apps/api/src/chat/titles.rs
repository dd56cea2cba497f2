//! Session titles for when the AI title call fails or returns nothing usable.

use chrono::{DateTime, Utc};

const MAX_TITLE_CHARS: usize = 60;

/// Topic keywords, matched as word prefixes. First match wins.
const TOPICS: [(&[&str], &str); 4] = [
    (&["sleep", "insomnia", "nap"], "Sleep Chat"),
    (&["water", "hydrat", "drink"], "Hydration Chat"),
    (
        &["food", "meal", "eat", "nutrition", "calorie", "diet", "protein", "breakfast", "lunch", "dinner"],
        "Nutrition Chat",
    ),
    (&["exercise", "workout", "run", "training", "gym", "walk"], "Exercise Chat"),
];

/// Keyword-matched title, or a dated one such as `Chat - Oct 18, 2026`.
pub fn fallback_title(first_message: &str, now: DateTime<Utc>) -> String {
    let lower = first_message.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    for (keywords, title) in TOPICS {
        if words
            .iter()
            .any(|word| keywords.iter().any(|k| word.starts_with(k)))
        {
            return title.to_string();
        }
    }

    format!("Chat - {}", now.format("%b %-d, %Y"))
}

/// Normalises an AI-generated title: first line, quotes stripped, length capped.
/// Returns `None` when nothing usable remains.
pub fn clean_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .trim_start_matches(|c| c == '"' || c == '\'' || c == '#' || c == '*')
        .trim_end_matches(|c| c == '"' || c == '\'' || c == '.' || c == '*')
        .trim();
    let line = line.strip_prefix("Title:").map(str::trim).unwrap_or(line);
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(MAX_TITLE_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_keyword_titles() {
        assert_eq!(fallback_title("I keep waking up at 3am, is my sleep ok?", now()), "Sleep Chat");
        assert_eq!(fallback_title("Am I hydrated enough?", now()), "Hydration Chat");
        assert_eq!(fallback_title("What should I eat after training?", now()), "Nutrition Chat");
        assert_eq!(fallback_title("Planning my next WORKOUT", now()), "Exercise Chat");
    }

    #[test]
    fn test_keywords_match_word_prefixes_only() {
        // "great" contains "eat" but is not a nutrition word
        assert_eq!(fallback_title("Feeling great today", now()), "Chat - Oct 18, 2026");
    }

    #[test]
    fn test_dated_title_without_keywords() {
        assert_eq!(fallback_title("hello there", now()), "Chat - Oct 18, 2026");
        assert_eq!(fallback_title("", now()), "Chat - Oct 18, 2026");
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("\"Better Sleep Habits\"\n").as_deref(), Some("Better Sleep Habits"));
        assert_eq!(clean_title("Title: Post-run fuel").as_deref(), Some("Post-run fuel"));
        assert_eq!(clean_title("  \n \"\" "), None);
        assert_eq!(clean_title(&"x".repeat(100)).map(|t| t.len()), Some(60));
    }
}
