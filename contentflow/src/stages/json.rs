//! Pulling JSON objects out of model replies.

use serde::de::DeserializeOwned;

/// Returns the text between the first `{` and the last `}` inclusive.
///
/// Models often wrap JSON in prose or markdown fences. If no ordered pair of
/// braces exists the trimmed reply is returned unchanged.
#[must_use]
pub fn extract_json(reply: &str) -> &str {
    match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if end > start => &reply[start..=end],
        _ => reply.trim(),
    }
}

/// Extracts and deserializes a JSON object from a model reply.
pub fn parse_reply<T: DeserializeOwned>(reply: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(extract_json(reply))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ImageBrief;

    #[test]
    fn test_extract_from_fenced_reply() {
        let reply = "Sure!\n```json\n{\"prompt\": \"a {nested} cat\"}\n```";
        assert_eq!(extract_json(reply), "{\"prompt\": \"a {nested} cat\"}");
    }

    #[test]
    fn test_extract_without_braces_trims() {
        assert_eq!(extract_json("  no json here \n"), "no json here");
        assert_eq!(extract_json("} backwards {"), "} backwards {");
    }

    #[test]
    fn test_parse_reply() {
        let brief: ImageBrief = parse_reply("Here: {\"prompt\": \"sunset\"} done").unwrap();
        assert_eq!(brief.prompt, "sunset");
        assert!(parse_reply::<ImageBrief>("not json").is_err());
    }
}
