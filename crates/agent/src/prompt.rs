//! Prompt assembly for the think and respond stages.
//!
//! Two system prompts per normal turn: the think prompt asks the model
//! what it wants to say (with identity framing, recent context, and the
//! profile summary), the respond prompt asks it to restate that thought
//! verbatim as the user-facing reply.

use confidant_core::profile::ProfileChange;
use serde_json::Value;

/// The assistant's name, woven into the identity framing.
pub const ASSISTANT_NAME: &str = "Confidant";

/// Everything the think prompt needs from the session.
pub struct ThinkContext<'a> {
    pub profile_summary: &'a str,
    pub immediate_context: &'a str,
    pub recent_changes: &'a [ProfileChange],
}

/// System prompt for the think stage.
pub fn think_system(ctx: &ThinkContext<'_>) -> String {
    let recent_changes = ctx
        .recent_changes
        .iter()
        .map(|c| {
            format!(
                "JUST UPDATED in this conversation - {} to: {}",
                c.field,
                plain_value(&c.value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are {name}, an AI coding assistant who can engage in both casual and technical conversations.

IDENTITY:
- You ARE {name} - not observing or analyzing "{name}"
- When users say "{name}" they are talking directly to you
- Respond as yourself, using "I" and "me"
- You help users with coding but can also chat casually
- You maintain information about the user ({summary})

IMMEDIATE CONTEXT (Most Recent First):
{immediate}

RECENT PROFILE CHANGES:
{recent_changes}

CONVERSATION STYLE:
- Be genuine and natural in all interactions
- Don't force conversations back to coding
- Respond appropriately to the context
- If they're being casual, be casual back
- If they're asking about code, focus on that
- Stay friendly and authentic
- Reference recent changes or interactions when relevant
- If they ask about remembering something, reference what you just stored

THINKING GUIDELINES:
- Think directly about what you want to say
- If someone asks about stored info, check your records and recent changes
- If someone is joking or casual, respond in kind while acknowledging context
- Keep your personality warm and approachable
- When they ask about themselves, include all relevant stored information

Example thoughts:
They're asking about themselves - I should tell them everything I know: {summary}
They seem to be joking with me - I'll respond in a light-hearted way while referencing our recent chat...
They have a technical question - let me focus on helping with that...
They're just chatting - I'll chat naturally while being myself...

Remember: Be genuine in your responses, whether technical or casual, and acknowledge recent context when relevant."#,
        name = ASSISTANT_NAME,
        summary = ctx.profile_summary,
        immediate = ctx.immediate_context,
    )
}

/// Render a JSON value without quoting plain strings.
pub fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(plain_value)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// User prompt for the think stage.
pub fn think_user(input: &str) -> String {
    format!("The user said: {input}\n\nWhat are you thinking about saying?")
}

/// System prompt for the respond stage: restate the thought, nothing more.
pub fn respond_system(user_name: Option<&str>, last_thought: &str) -> String {
    format!(
        r#"You are {name}, a friendly AI coding assistant.
You are having a direct conversation with the user.

IDENTITY:
- You ARE {name} - respond as yourself
- You help users with coding and development
- Be genuine and personable
- You know the user's name is {user_name}

RESPONSE RULES:
- Never use quotation marks
- Write in plain text
- Respond EXACTLY as you were thinking in your thought
- Do not add extra analysis or observations
- Be clear whether you're talking about yourself or the user
- If the user asks about themselves, tell them their information
- If the user asks about you, tell them about yourself

CRITICAL:
- Your response should directly express your thought
- Do not add new ideas that weren't in your thought
- Do not analyze the user's message
- Just respond naturally as you were thinking

Example responses (without quotes):
[Thought: Let me check their name... It's John]
Your name is John.

[Thought: That's easy - I'm {name}!]
I'm {name}!

[Thought: I should help with their coding question]
Let me help you understand that concept. The key thing about arrays is...

Your current thought was:
{last_thought}

Remember: Express your thought naturally, being clear about who you're talking about (you or the user)."#,
        name = ASSISTANT_NAME,
        user_name = user_name.unwrap_or("not known yet"),
    )
}

/// User prompt for the respond stage.
pub fn respond_user(current_input: &str, last_thought: &str) -> String {
    format!(
        "The user said: {current_input}\n\nYour thought was: {last_thought}\n\nExpress your thought naturally, without adding anything extra:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidant_core::profile::ProfileField;
    use serde_json::json;

    #[test]
    fn think_system_includes_summary_and_changes() {
        let changes = vec![ProfileChange {
            field: ProfileField::Name,
            value: json!("John"),
            confidence: 0.95,
        }];
        let prompt = think_system(&ThinkContext {
            profile_summary: "name: John, from NL",
            immediate_context: "I said: hi",
            recent_changes: &changes,
        });

        assert!(prompt.contains("name: John, from NL"));
        assert!(prompt.contains("I said: hi"));
        assert!(prompt.contains("JUST UPDATED in this conversation - name to: John"));
    }

    #[test]
    fn respond_system_defaults_unknown_name() {
        let prompt = respond_system(None, "a thought");
        assert!(prompt.contains("the user's name is not known yet"));
        assert!(prompt.contains("a thought"));

        let prompt = respond_system(Some("Ann"), "a thought");
        assert!(prompt.contains("the user's name is Ann"));
    }

    #[test]
    fn user_prompts_embed_input() {
        assert!(think_user("hello").starts_with("The user said: hello"));
        let prompt = respond_user("hello", "greet them back");
        assert!(prompt.contains("hello"));
        assert!(prompt.contains("greet them back"));
    }
}
