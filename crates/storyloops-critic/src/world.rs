use serde::{Deserialize, Serialize};

/// User-authored fantasy setting applied to every generation in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldContext {
    pub name: String,
    pub characters: Vec<String>,
    pub rules: String,
}

impl WorldContext {
    pub fn new(name: impl Into<String>, characters: Vec<String>, rules: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            characters: characters
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            rules: rules.into(),
        }
    }

    /// Build a world from a comma-separated character list
    pub fn from_character_list(
        name: impl Into<String>,
        characters: &str,
        rules: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            characters.split(',').map(str::to_string).collect(),
            rules,
        )
    }

    pub fn characters_joined(&self) -> String {
        self.characters.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_list_is_split_and_trimmed() {
        let world = WorldContext::from_character_list("Glimmerwood", " Pip,Moss the Owl , ,", "x");
        assert_eq!(world.characters, vec!["Pip", "Moss the Owl"]);
        assert_eq!(world.characters_joined(), "Pip, Moss the Owl");
    }

    #[test]
    fn test_serialized_shape() {
        let world = WorldContext::new("Glimmerwood", vec!["Pip".into()], "Trees talk");
        let json = serde_json::to_value(&world).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Glimmerwood", "characters": ["Pip"], "rules": "Trees talk"})
        );
    }
}
