//! Integration tests for pipeline runs.

use crate::core::{OrchestrationResult, Platform, ResearchPoints, Tone, TopicRequest};
use crate::events::{CollectingEventSink, EventSink, PipelineEvent};
use crate::pipeline::{Orchestrator, StageName};
use crate::config::ImageStorageConfig;
use crate::providers::{ImageTool, SearchResult, WebSearchResponse};
use crate::stages::{ContentAgent, ImageAgent, ResearchAgent};
use crate::testing::{
    agent_orchestrator, sample_draft, sample_image, FailingImageModel, FixedStage,
    PanickingStage, RecordingContentStage, ScriptedChatModel, StaticImageModel, StaticSearch,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn request() -> TopicRequest {
    TopicRequest::new("AI", Platform::Twitter, Tone::Casual)
}

#[tokio::test]
async fn test_full_run_with_agents() {
    let events = Arc::new(CollectingEventSink::new());
    let orchestrator = agent_orchestrator(
        Arc::new(ScriptedChatModel::happy_path()),
        Arc::new(StaticImageModel::default()),
    )
    .unwrap()
    .with_event_sink(events.clone());

    let result = orchestrator.run(&request()).await;

    assert_eq!(result.topic, "AI");
    assert!((5..=7).contains(&result.research.points.len()));
    assert_eq!(result.content.platform, "twitter");
    assert_eq!(result.content.tone, "casual");
    assert!(result.image.prompt.starts_with("Friendly robot"));
    assert_eq!(result.image.open_ai_image_urls, vec!["https://images.test/1.png"]);
    assert_eq!(result.id, None);
    assert_eq!(
        events.event_types(),
        vec![
            "pipeline.started",
            "stage.completed",
            "stage.completed",
            "stage.completed",
            "pipeline.completed"
        ]
    );
}

#[tokio::test]
async fn test_search_results_ground_research() {
    let chat = Arc::new(
        ScriptedChatModel::happy_path().on("Generate up to 3", "AI adoption 2024\nAI regulation"),
    );
    let search = StaticSearch::new(WebSearchResponse {
        results: vec![SearchResult::new(
            "AI Index",
            "Adoption doubled",
            "https://example.org/ai-index",
        )],
        ..WebSearchResponse::empty("")
    });
    let tool = ImageTool::new(
        Arc::new(StaticImageModel::default()),
        &ImageStorageConfig::default().without_download(),
    )
    .unwrap();
    let orchestrator = Orchestrator::new(
        Arc::new(ResearchAgent::new(chat.clone(), Arc::new(search))),
        Arc::new(ContentAgent::new(chat.clone())),
        Arc::new(ImageAgent::new(chat.clone(), tool)),
    );

    let result = orchestrator.run(&request()).await;

    assert_eq!(result.research.sources, vec!["https://example.org/ai-index"]);
    let research_prompt = chat
        .prompts()
        .into_iter()
        .find(|prompt| prompt.contains("Research the topic:"))
        .unwrap();
    assert!(research_prompt.contains("Web search results:"));
    assert!(research_prompt.contains("Adoption doubled"));
}

#[tokio::test]
async fn test_content_failure_falls_back_and_image_still_runs() {
    let events = Arc::new(CollectingEventSink::new());
    let chat = ScriptedChatModel::happy_path().failing("Transform this research into", "rate limited");
    let orchestrator = agent_orchestrator(Arc::new(chat), Arc::new(StaticImageModel::default()))
        .unwrap()
        .with_event_sink(events.clone());

    let result = orchestrator.run(&request()).await;

    assert_eq!(result.content.platform, "twitter");
    assert_eq!(result.content.tone, "casual");
    assert_eq!(result.content.headline, "Content Creation Error");
    assert!(!result.research.points.is_empty());
    assert!(!result.image.open_ai_image_urls.is_empty());
    assert!(events.events().iter().any(|event| matches!(
        event,
        PipelineEvent::StageFellBack { stage: StageName::Content, .. }
    )));
}

#[tokio::test]
async fn test_every_provider_failing_still_yields_result() {
    let chat = ScriptedChatModel::new();
    let orchestrator = agent_orchestrator(Arc::new(chat), Arc::new(FailingImageModel)).unwrap();

    let result = orchestrator
        .run(&TopicRequest::new("Quantum", Platform::Blog, Tone::Professional))
        .await;

    assert_eq!(
        result.research.points,
        vec!["Unable to complete research for the topic: Quantum".to_string()]
    );
    assert_eq!(result.content.platform, "blog");
    assert_eq!(result.content.headline, "Content Creation Error");
    assert_eq!(
        result.image.prompt,
        "Image generation failed for content: Content Creation Error"
    );
    assert!(result.image.open_ai_image_urls.is_empty());
}

#[tokio::test]
async fn test_panicking_stage_is_isolated() {
    let events = Arc::new(CollectingEventSink::new());
    let content = Arc::new(RecordingContentStage::new(sample_draft()));
    let image = Arc::new(FixedStage::new(ResearchPoints::default(), sample_draft(), sample_image()));
    let orchestrator = Orchestrator::new(
        Arc::new(PanickingStage::new("search index corrupted")),
        content.clone(),
        image,
    )
    .with_event_sink(events.clone());

    let result = orchestrator.run(&request()).await;

    assert!(result.research.is_empty());
    assert_eq!(content.seen(), vec![ResearchPoints::default()]);
    assert_eq!(result.content, sample_draft());
    assert_eq!(result.image, sample_image());
    assert!(events.events().iter().any(|event| matches!(
        event,
        PipelineEvent::StageFailed { stage: StageName::Research, error, .. }
            if error == "search index corrupted"
    )));
}

#[tokio::test]
async fn test_every_stage_panicking_yields_empty_slots() {
    let stage = Arc::new(PanickingStage::new("boom"));
    let orchestrator = Orchestrator::new(stage.clone(), stage.clone(), stage);

    let result = orchestrator.run(&request()).await;

    assert_eq!(result, OrchestrationResult::empty("AI"));
}

/// Panics when the run starts, outside any stage boundary.
#[derive(Default)]
struct ExplodingSink {
    seen: Mutex<Vec<&'static str>>,
}

impl EventSink for ExplodingSink {
    fn emit(&self, event: &PipelineEvent) {
        if matches!(event, PipelineEvent::PipelineStarted { .. }) {
            panic!("sink unavailable");
        }
        self.seen.lock().push(event.event_type());
    }
}

#[tokio::test]
async fn test_failure_outside_stages_returns_empty_result() {
    let sink = Arc::new(ExplodingSink::default());
    let stage = Arc::new(FixedStage::new(ResearchPoints::default(), sample_draft(), sample_image()));
    let orchestrator =
        Orchestrator::new(stage.clone(), stage.clone(), stage).with_event_sink(sink.clone());

    let result = orchestrator.run(&request()).await;

    assert_eq!(result, OrchestrationResult::empty("AI"));
    assert!(result.is_empty());
    assert_eq!(*sink.seen.lock(), vec!["pipeline.aborted"]);
}
