//! Prompt text for the stage agents.
//!
//! Every full prompt is `SYSTEM + "\n\nUser: " + user`.

use crate::core::{ContentDraft, Platform, ResearchPoints, Tone};

/// Research instructions without search context.
pub const RESEARCH_SYSTEM: &str = r#"You are a meticulous Research Agent. For a given topic, produce 5-7 concise, factual bullet points suitable for downstream content generation.
- Avoid speculation; be neutral and verifiable.
- Prefer recent, general facts that won't quickly go stale.
- Each bullet point should be maximum 25 words.
- No marketing language or opinions.
- Focus on key facts, statistics, benefits, or notable aspects.
- Output ONLY valid JSON matching the exact schema below.

Required JSON Schema:
{
  "points": ["string", "string", "string", "string", "string"],
  "sources": ["string (optional)"]
}"#;

/// Research instructions when web search results are supplied.
pub const RESEARCH_WITH_SEARCH_SYSTEM: &str = r#"You are a meticulous Research Agent with access to current web search results. For a given topic, produce 5-7 concise, factual bullet points suitable for downstream content generation.
- Ground every point in the supplied search results where possible.
- Avoid speculation; be neutral and verifiable.
- Each bullet point should be maximum 25 words.
- No marketing language or opinions.
- List the URLs you relied on in "sources".
- Output ONLY valid JSON matching the exact schema below.

Required JSON Schema:
{
  "points": ["string", "string", "string", "string", "string"],
  "sources": ["string"]
}"#;

/// Content drafting instructions.
pub const CONTENT_SYSTEM: &str = r#"You are a Content Agent. Transform the research into platform-specific content with the requested tone.

Platform Constraints:
- twitter: ≤ 280 characters total; 1-2 relevant hashtags; strong hook; concise and engaging
- linkedin: 3-5 short paragraphs; professional tone regardless of requested tone; meaningful insights; 1 CTA
- instagram: caption-style with line breaks; 2-3 friendly hashtags; engaging and visual language; 1 CTA
- blog: 300-500 words; clear structure with sections; intro, body, conclusion; 1 CTA; informative and comprehensive

Tone Guidelines:
- professional: formal, authoritative, business-focused
- casual: conversational, friendly, approachable
- playful: fun, energetic, creative, light-hearted
- authoritative: expert, confident, educational, fact-driven

Always reflect the requested tone exactly while respecting platform constraints.

Output ONLY valid JSON matching this schema:
{
  "platform": "string",
  "tone": "string",
  "headline": "string",
  "body": "string",
  "cta": "string"
}"#;

/// Image brief instructions.
pub const IMAGE_SYSTEM: &str = r#"You are an Image Agent that crafts precise image prompts from content drafts.

Requirements:
- Create a 1-2 sentence visual description based on the content
- Include style hints (e.g., editorial, vector, photo-realistic, illustration, modern, minimalist)
- Include composition details (subject, background, lighting, mood)
- Avoid text-in-image unless explicitly required
- Make it relevant to the content topic and appropriate for the platform

Output ONLY valid JSON matching this schema:
{
  "prompt": "string"
}"#;

/// Joins a system message and a user prompt.
#[must_use]
pub fn full_prompt(system: &str, user: &str) -> String {
    format!("{system}\n\nUser: {user}")
}

/// Asks for web search queries, one per line.
#[must_use]
pub fn search_queries(topic: &str) -> String {
    format!(
        "Generate up to 3 concise web search queries that would find current, factual information about: {topic}\n\n\
         Return one query per line with no numbering, quotes or extra text."
    )
}

/// The research user prompt.
#[must_use]
pub fn research_user(topic: &str) -> String {
    format!(
        "Research the topic: {topic}\n\n\
         Provide 5-7 factual bullet points about this topic in valid JSON format only."
    )
}

/// The research user prompt with search summaries attached.
#[must_use]
pub fn research_user_with_search(topic: &str, search_results: &str) -> String {
    format!(
        "Research the topic: {topic}\n\n\
         Web search results:\n{search_results}\n\
         Provide 5-7 factual bullet points about this topic in valid JSON format only."
    )
}

/// The content user prompt.
#[must_use]
pub fn content_user(research: &ResearchPoints, platform: Platform, tone: Tone) -> String {
    let points = research
        .points
        .iter()
        .map(|point| format!("• {point}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Transform this research into {platform} content with {tone} tone:\n\n\
         Research Points:\n{points}\n\n\
         Create platform-appropriate content in valid JSON format only."
    )
}

/// The image brief user prompt.
#[must_use]
pub fn image_user(content: &ContentDraft) -> String {
    format!(
        "Create an image prompt based on this content:\n\n\
         Platform: {}\nHeadline: {}\nContent: {}\n\n\
         Generate a precise image prompt in valid JSON format only.",
        content.platform, content.headline, content.body
    )
}
