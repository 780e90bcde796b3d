use lunar_llm::{ChatMessage, ChatRole};
use serde::Deserialize;
use serde_json::Value;

/// Message Normalizer: turns the client's loosely-typed message objects
/// into the canonical role/content sequence.
///
/// Two strategies run in order. The structured conversion understands the
/// richer client shapes (multi-part content arrays); if it fails or yields
/// nothing, a direct field-by-field projection is tried. Only when both
/// fail does the request die, before any external call. Neither path ever
/// drops a message: an unrepresentable element fails the whole attempt.
pub fn normalize_messages(raw: &[Value]) -> Result<Vec<ChatMessage>, String> {
    match try_structured(raw) {
        Some(messages) if !messages.is_empty() => return Ok(messages),
        _ => {
            tracing::debug!("structured message conversion failed, trying direct projection");
        }
    }

    match try_projection(raw) {
        Some(messages) if !messages.is_empty() => Ok(messages),
        _ => Err("messages could not be converted to role/content form".to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct StructuredMessage {
    role: ChatRole,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    parts: Option<Vec<StructuredPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StructuredPart {
    Text { text: String },
}

/// Structured conversion: string content is taken as-is; `parts` arrays
/// have their text segments extracted and joined (an all-empty parts list
/// is the one way an empty content survives). Anything else fails the
/// attempt.
fn try_structured(raw: &[Value]) -> Option<Vec<ChatMessage>> {
    let mut out = Vec::with_capacity(raw.len());

    for value in raw {
        let msg: StructuredMessage = serde_json::from_value(value.clone()).ok()?;

        let content = match (&msg.content, &msg.parts) {
            (Some(Value::String(s)), _) => s.clone(),
            (_, Some(parts)) => parts
                .iter()
                .map(|StructuredPart::Text { text }| text.as_str())
                .collect::<Vec<_>>()
                .join(""),
            _ => return None,
        };

        out.push(ChatMessage::new(msg.role, content));
    }

    Some(out)
}

/// Fallback projection: read `role` and stringify `content` directly.
/// Missing or null content is rejected rather than coerced to "".
fn try_projection(raw: &[Value]) -> Option<Vec<ChatMessage>> {
    let mut out = Vec::with_capacity(raw.len());

    for value in raw {
        let obj = value.as_object()?;
        let role: ChatRole = obj.get("role")?.as_str()?.parse().ok()?;

        let content = match obj.get("content")? {
            Value::String(s) => s.clone(),
            Value::Null => return None,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => serde_json::to_string(other).ok()?,
        };

        out.push(ChatMessage::new(role, content));
    }

    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_role_content_passes_through() {
        let raw = vec![
            json!({"role": "user", "content": "hello"}),
            json!({"role": "assistant", "content": "hi"}),
        ];

        let out = normalize_messages(&raw).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], ChatMessage::user("hello"));
        assert_eq!(out[1], ChatMessage::assistant("hi"));
    }

    #[test]
    fn roles_and_count_are_preserved() {
        // Every well-formed input keeps its length and roles
        let raw = vec![
            json!({"role": "system", "content": "rules"}),
            json!({"role": "user", "content": "q"}),
            json!({"role": "assistant", "content": "a"}),
            json!({"role": "data", "content": "{}"}),
        ];

        let out = normalize_messages(&raw).unwrap();
        assert_eq!(out.len(), raw.len());
        let roles: Vec<_> = out.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::Data]
        );
    }

    #[test]
    fn parts_arrays_are_flattened() {
        let raw = vec![json!({
            "role": "user",
            "parts": [
                {"type": "text", "text": "first "},
                {"type": "text", "text": "second"}
            ]
        })];

        let out = normalize_messages(&raw).unwrap();
        assert_eq!(out[0].content, "first second");
    }

    #[test]
    fn empty_content_allowed_only_via_parts() {
        let with_parts = vec![json!({"role": "user", "parts": []})];
        let out = normalize_messages(&with_parts).unwrap();
        assert_eq!(out[0].content, "");

        let without = vec![json!({"role": "user", "content": null})];
        assert!(normalize_messages(&without).is_err());
    }

    #[test]
    fn fallback_stringifies_scalar_content() {
        // Unknown extra fields push this through the fallback path
        let raw = vec![json!({"role": "user", "content": 42})];
        let out = normalize_messages(&raw).unwrap();
        assert_eq!(out[0].content, "42");
    }

    #[test]
    fn unknown_role_fails_both_paths() {
        let raw = vec![json!({"role": "tool", "content": "x"})];
        assert!(normalize_messages(&raw).is_err());
    }

    #[test]
    fn one_bad_message_fails_the_batch() {
        // Count preservation: nothing is silently dropped
        let raw = vec![
            json!({"role": "user", "content": "fine"}),
            json!({"content": "no role"}),
        ];
        assert!(normalize_messages(&raw).is_err());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(normalize_messages(&[]).is_err());
    }
}
