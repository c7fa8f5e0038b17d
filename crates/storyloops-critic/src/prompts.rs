use crate::WorldContext;

/// Role instruction for the storyteller
const STORYTELLER_ROLE: &str = "You are a master storyteller for children aged 5-10. Use age-appropriate language, a clear story arc, and embed a fun or meaningful lesson. Respond ONLY with the story, no extra commentary.";

/// Prompt templates for the storyteller, critic and classifier roles
pub struct StoryPrompts;

impl StoryPrompts {
    /// Build the storytelling prompt for a request, optionally set in a world
    pub fn build_story_prompt(user_request: &str, world: Option<&WorldContext>) -> String {
        match world {
            Some(world) => format!(
                "{role}\nStory set in the fantasy world: {name}. The main characters are: {characters}. Special rules: {rules}. \nUser Request: {request}",
                role = STORYTELLER_ROLE,
                name = world.name,
                characters = world.characters_joined(),
                rules = world.rules,
                request = user_request,
            ),
            None => format!(
                "{role}\nUser Request: {request}",
                role = STORYTELLER_ROLE,
                request = user_request,
            ),
        }
    }

    /// Build the critic prompt for a story draft
    pub fn build_judge_prompt(story: &str) -> String {
        format!(
            r#"You are the Grimm Brothers, world-famous story critics. Rate the following story for:
1. Structure (beginning, middle, end)
2. Engagement (is it fun/scary etc for kids 5-10?)
3. Moral/Lesson (is it clear/age-appropriate?)
4. Appropriateness (well-suited for a child age 5-10?)
List points that need improvement. Give a final verdict: Accept, Minor Revisions, or Major Revisions.

STORY:
{story}"#,
            story = story,
        )
    }

    /// Build the genre/lesson classification prompt for a finished story
    pub fn build_classification_prompt(story: &str) -> String {
        format!(
            r#"Classify the following story (choose ALL that apply): fun, scary, fantasy, realistic, educational, adventure.
Then, in 1 short sentence, state the main lesson or moral. Respond as JSON with keys 'genres' (list), 'lesson' (string).

STORY:
{story}"#,
            story = story,
        )
    }

    /// Build the system message that opens a co-creation chat
    pub fn build_world_system_prompt(world: &WorldContext) -> String {
        format!(
            "You are a storyteller inside the fantasy world '{name}' with rules: {rules}. Main characters: {characters}. Always keep the world logic and rules!",
            name = world.name,
            rules = world.rules,
            characters = world.characters_joined(),
        )
    }
}
