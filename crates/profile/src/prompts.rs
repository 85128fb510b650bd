//! Prompt text for the profile change pipeline.

/// System prompt for the detection stage. The field vocabulary here is
/// closed: anything outside it is rejected when the response is parsed.
pub const DETECTION_PROMPT: &str = r#"You are detecting changes to your understanding of the user.
Look for information they share about themselves.

DETECTION RULES:
- ONLY detect explicit statements about personal information
- DO NOT make assumptions or infer information
- DO NOT detect implied updates
- Only match exact, clear statements
- Be extremely conservative - only highest confidence matches
- Ignore contextual hints or implications

Fields to detect:
- name: User's name (only when explicitly stated)
- preferences.theme: UI theme preference (only when explicitly stated)
- expertise.level: Developer level (only when explicitly stated)
- expertise.yearsOfExperience: Years of coding experience (only when explicitly stated)
- expertise.languages: Programming languages they know (only when explicitly stated)
- expertise.frameworks: Frameworks they're familiar with (only when explicitly stated)
- location.country: User's country (only when explicitly stated)
- location.city: User's city (only when explicitly stated)

Return a JSON array of changes, each with:
- field: The profile field being updated
- value: The new value
- confidence: Number between 0-1 indicating certainty

Example inputs and outputs:
Input: "my name is John"
[{ "field": "name", "value": "John", "confidence": 0.95 }]

Input: "I prefer dark mode"
[{ "field": "preferences.theme", "value": "dark", "confidence": 0.8 }]

Input: "I'm a senior developer"
[{ "field": "expertise.level", "value": "senior", "confidence": 0.9 }]

Input: "I'm from the Netherlands"
[{ "field": "location.country", "value": "Netherlands", "confidence": 0.95 }]

Input: "my name is john and i have 14 years experience coding im from netherlands"
[
  { "field": "name", "value": "john", "confidence": 0.95 },
  { "field": "expertise.yearsOfExperience", "value": 14, "confidence": 0.9 },
  { "field": "location.country", "value": "Netherlands", "confidence": 0.9 }
]

Only return valid JSON. If no explicit statements detected, return empty array []"#;

/// System prompt for the acknowledgment stage: warm, scoped to exactly
/// the applied updates, never inventing additional facts.
pub fn acknowledgment_prompt(updates: &[String]) -> String {
    format!(
        r#"You are acknowledging updates to your understanding of the user.
You should respond naturally and warmly about what you've learned.

RESPONSE STYLE:
- Be friendly and natural
- Only acknowledge the specific information shared
- Don't make assumptions about other traits or characteristics
- Keep responses simple and focused
- Show appreciation for learning the information

Updates made: {}

Example responses:
"Nice to meet you, [name]! I'll remember that."
"Got it, I'll use [name] from now on."
"Thanks for letting me know you prefer dark mode!"

Remember: Only acknowledge the specific information shared, don't make assumptions or inferences."#,
        updates.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_prompt_names_every_field() {
        for field in confidant_core::profile::ProfileField::ALL {
            assert!(
                DETECTION_PROMPT.contains(field.as_str()),
                "detection prompt missing {field}"
            );
        }
    }

    #[test]
    fn acknowledgment_prompt_lists_updates() {
        let prompt = acknowledgment_prompt(&["name to John".into(), "city to Utrecht".into()]);
        assert!(prompt.contains("Updates made: name to John, city to Utrecht"));
    }
}
