use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::literal::parse_literal;

/// Genre tags the classifier is asked to choose from
pub const GENRE_VOCABULARY: [&str; 6] = [
    "fun",
    "scary",
    "fantasy",
    "realistic",
    "educational",
    "adventure",
];

/// Lesson recorded when the classifier output could not be decoded
pub const FALLBACK_LESSON: &str = "Could not parse.";

/// Genre tags and lesson extracted from a finished story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub genres: Vec<String>,
    pub lesson: String,
}

/// Result of decoding classifier output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome {
    StructuredOk(Classification),
    ParseFailed(String),
}

#[derive(Deserialize)]
struct RawClassification {
    genres: Vec<String>,
    lesson: String,
}

impl From<RawClassification> for Classification {
    fn from(raw: RawClassification) -> Self {
        Classification::new(raw.genres, raw.lesson)
    }
}

impl Classification {
    /// Build a classification, collapsing duplicate tags (first occurrence wins)
    pub fn new(genres: Vec<String>, lesson: impl Into<String>) -> Self {
        let mut unique: Vec<String> = Vec::with_capacity(genres.len());
        for genre in genres {
            if !unique.contains(&genre) {
                unique.push(genre);
            }
        }
        Self {
            genres: unique,
            lesson: lesson.into(),
        }
    }

    pub fn fallback() -> Self {
        Self {
            genres: Vec::new(),
            lesson: FALLBACK_LESSON.to_string(),
        }
    }

    /// Decode classifier output, falling back instead of failing
    pub fn parse(raw: &str) -> Self {
        ClassificationOutcome::parse(raw).into_classification()
    }

    /// Tags outside the genre vocabulary. They are kept, not rejected.
    pub fn unknown_genres(&self) -> Vec<&str> {
        self.genres
            .iter()
            .map(String::as_str)
            .filter(|g| !GENRE_VOCABULARY.contains(g))
            .collect()
    }

    /// Printable two-line summary
    pub fn summary(&self) -> String {
        format!("Genres: {}\nLesson: {}", self.genres.join(", "), self.lesson)
    }
}

impl ClassificationOutcome {
    /// Decode classifier output.
    ///
    /// Tries strict JSON first, then a permissive Python-literal decode. A
    /// single surrounding markdown code fence is ignored.
    pub fn parse(raw: &str) -> Self {
        let body = strip_code_fence(raw);

        match serde_json::from_str::<RawClassification>(body) {
            Ok(parsed) => {
                debug!("Parsed classification as JSON");
                return ClassificationOutcome::StructuredOk(parsed.into());
            }
            Err(e) => debug!(error = %e, "Classification is not strict JSON"),
        }

        let literal = parse_literal(body)
            .map_err(|e| e.to_string())
            .and_then(|value| {
                serde_json::from_value::<RawClassification>(value).map_err(|e| e.to_string())
            });

        match literal {
            Ok(parsed) => {
                debug!("Parsed classification as literal");
                ClassificationOutcome::StructuredOk(parsed.into())
            }
            Err(e) => {
                debug!(error = %e, "Classification could not be decoded");
                ClassificationOutcome::ParseFailed(raw.to_string())
            }
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, ClassificationOutcome::StructuredOk(_))
    }

    pub fn into_classification(self) -> Classification {
        match self {
            ClassificationOutcome::StructuredOk(classification) => classification,
            ClassificationOutcome::ParseFailed(_) => Classification::fallback(),
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "python") on the opening line
    match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim(),
        None => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json() {
        let raw = r#"{"genres":["fun","educational"],"lesson":"Share with friends."}"#;
        let classification = Classification::parse(raw);
        assert_eq!(classification.genres, vec!["fun", "educational"]);
        assert_eq!(classification.lesson, "Share with friends.");
    }

    #[test]
    fn test_not_json_falls_back() {
        let outcome = ClassificationOutcome::parse("not json at all");
        assert_eq!(
            outcome,
            ClassificationOutcome::ParseFailed("not json at all".to_string())
        );
        let classification = outcome.into_classification();
        assert!(classification.genres.is_empty());
        assert_eq!(classification.lesson, "Could not parse.");
    }

    #[test]
    fn test_parse_is_total() {
        for raw in [
            "",
            "   ",
            "{",
            r#"{"genres": ["fun""#,
            r#"{"genres": "fun", "lesson": "x"}"#,
            r#"{"lesson": "missing genres"}"#,
            "[1, 2, 3]",
            "null",
            "```json\n{\"genres\": [",
        ] {
            let classification = Classification::parse(raw);
            assert_eq!(classification, Classification::fallback(), "input {raw:?}");
        }
    }

    #[test]
    fn test_deeply_nested_input_falls_back() {
        for depth in [200, 3_000, 50_000] {
            for open in ["[", "(", "{'a': "] {
                let raw = open.repeat(depth);
                assert!(!ClassificationOutcome::parse(&raw).is_structured());
                assert_eq!(Classification::parse(&raw), Classification::fallback());
            }
        }
    }

    #[test]
    fn test_python_literal() {
        let raw = "{'genres': ['fantasy', 'adventure'], 'lesson': 'Courage grows when shared.'}";
        let outcome = ClassificationOutcome::parse(raw);
        assert!(outcome.is_structured());
        let classification = outcome.into_classification();
        assert_eq!(classification.genres, vec!["fantasy", "adventure"]);
        assert_eq!(classification.lesson, "Courage grows when shared.");
    }

    #[test]
    fn test_code_fence_is_ignored() {
        let raw = "```json\n{\"genres\": [\"scary\"], \"lesson\": \"Face your fears.\"}\n```";
        let classification = Classification::parse(raw);
        assert_eq!(classification.genres, vec!["scary"]);
        assert_eq!(classification.lesson, "Face your fears.");
    }

    #[test]
    fn test_duplicates_collapse_in_order() {
        let raw = r#"{"genres":["fun","fantasy","fun","fantasy"],"lesson":"x"}"#;
        assert_eq!(Classification::parse(raw).genres, vec!["fun", "fantasy"]);
    }

    #[test]
    fn test_unknown_genres_are_kept() {
        let raw = r#"{"genres":["fun","whimsical"],"lesson":"x"}"#;
        let classification = Classification::parse(raw);
        assert_eq!(classification.genres, vec!["fun", "whimsical"]);
        assert_eq!(classification.unknown_genres(), vec!["whimsical"]);
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let raw = r#"{"genres":[],"lesson":"Rest well.","confidence":0.9}"#;
        let classification = Classification::parse(raw);
        assert!(classification.genres.is_empty());
        assert_eq!(classification.lesson, "Rest well.");
    }

    #[test]
    fn test_summary() {
        let classification =
            Classification::new(vec!["fun".into(), "educational".into()], "Share.");
        assert_eq!(classification.summary(), "Genres: fun, educational\nLesson: Share.");
        assert_eq!(
            Classification::fallback().summary(),
            "Genres: \nLesson: Could not parse."
        );
    }
}
