use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Text returned by one call to the generation capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    /// The generated text
    pub text: String,
    /// Model that produced the text, as reported by the service
    pub model: String,
    /// Completion tokens consumed, when the service reports usage
    pub output_tokens: Option<u32>,
    /// Wall-clock time of the call
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl Generation {
    pub fn new(text: String, model: String, duration: Duration) -> Self {
        Self {
            text,
            model,
            output_tokens: None,
            duration,
        }
    }

    pub fn with_output_tokens(mut self, tokens: u32) -> Self {
        self.output_tokens = Some(tokens);
        self
    }

    /// Count words in the generated text
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let generation = Generation::new(
            "Once upon a time\nthere was a fox.".to_string(),
            "gpt-3.5-turbo".to_string(),
            Duration::from_millis(1500),
        );
        assert_eq!(generation.word_count(), 8);
        assert_eq!(generation.output_tokens, None);
    }

    #[test]
    fn test_duration_serializes_as_seconds() {
        let generation = Generation::new(
            "story".to_string(),
            "m".to_string(),
            Duration::from_millis(2500),
        )
        .with_output_tokens(12);
        let json = serde_json::to_value(&generation).unwrap();
        assert_eq!(json["duration"], 2.5);
        assert_eq!(json["output_tokens"], 12);
    }
}
