use std::time::Duration as StdDuration;

use httpmock::prelude::*;
use serde_json::json;
use workforce_analytics::error::AiErrorCode;
use workforce_analytics::models::insight::{InsightSource, InsightSubject, PerformanceTier};
use workforce_analytics::models::productivity::{ScoreBreakdown, ScoreResult};
use workforce_analytics::services::insight_generator::{
    build_insight_provider, InsightConfig, RemoteInsightProvider,
};

fn subject() -> InsightSubject {
    InsightSubject {
        name: "Bob Smith".to_string(),
        role: "Backend Engineer".to_string(),
        department: "Engineering".to_string(),
        skills: vec!["Node.js".to_string(), "PostgreSQL".to_string()],
    }
}

fn score(points: i64) -> ScoreResult {
    ScoreResult {
        score: points,
        breakdown: ScoreBreakdown {
            completion_rate: 87.5,
            speed_score: 100.0,
            complexity_score: 82.5,
        },
        total_tasks: 8,
        completed_tasks: 7,
    }
}

fn config(server: &MockServer, timeout: StdDuration) -> InsightConfig {
    InsightConfig {
        api_key: Some("test-key".to_string()),
        api_base_url: server.base_url(),
        http_timeout: timeout,
        ..InsightConfig::default()
    }
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [{
            "message": {"role": "assistant", "content": content}
        }]
    })
}

#[tokio::test]
async fn remote_insights_keep_local_tier() {
    let server = MockServer::start_async().await;
    let content = json!({
        "suggestedSkills": ["Kafka", "Observability", "gRPC"],
        "performanceSummary": "Bob ships reliable backend work."
    })
    .to_string();

    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key")
                .body_contains("\"temperature\":0.1")
                .body_contains("\"max_tokens\":500");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(completion_body(&content));
        })
        .await;

    let provider = build_insight_provider(&config(&server, StdDuration::from_secs(5)));
    let insights = provider.generate(&subject(), &score(83)).await;

    mock.assert_async().await;
    assert_eq!(insights.source, InsightSource::Remote);
    assert_eq!(insights.performance_tier, PerformanceTier::Exceptional);
    assert_eq!(
        insights.suggested_skills,
        vec!["Kafka".to_string(), "Observability".to_string(), "gRPC".to_string()]
    );
    assert_eq!(insights.performance_summary, "Bob ships reliable backend work.");
}

#[tokio::test]
async fn server_error_falls_back_to_templates() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let provider = build_insight_provider(&config(&server, StdDuration::from_secs(5)));
    let insights = provider.generate(&subject(), &score(65)).await;

    assert_eq!(insights.source, InsightSource::Template);
    assert_eq!(insights.performance_tier, PerformanceTier::Strong);
    assert!(insights
        .performance_summary
        .starts_with("Bob Smith demonstrates strong performance in Engineering."));
    assert_eq!(insights.suggested_skills[0], "Microservices");
}

#[tokio::test]
async fn malformed_content_falls_back_to_templates() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(completion_body("Sure! Bob is doing great."));
        })
        .await;

    let provider = build_insight_provider(&config(&server, StdDuration::from_secs(5)));
    let insights = provider.generate(&subject(), &score(45)).await;

    assert_eq!(insights.source, InsightSource::Template);
    assert_eq!(insights.performance_tier, PerformanceTier::Developing);
}

#[tokio::test]
async fn slow_provider_falls_back_to_templates() {
    let server = MockServer::start_async().await;
    let content = json!({
        "suggestedSkills": ["Kafka"],
        "performanceSummary": "Too late to matter."
    })
    .to_string();
    let _mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .delay(StdDuration::from_secs(2))
                .header("content-type", "application/json")
                .json_body(completion_body(&content));
        })
        .await;

    let provider = build_insight_provider(&config(&server, StdDuration::from_millis(200)));
    let insights = provider.generate(&subject(), &score(30)).await;

    assert_eq!(insights.source, InsightSource::Template);
    assert_eq!(insights.performance_tier, PerformanceTier::NeedsAttention);
}

#[tokio::test]
async fn request_errors_carry_ai_codes() {
    let server = MockServer::start_async().await;
    let _limited = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer limited-key");
            then.status(429);
        })
        .await;
    let _empty = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer empty-key");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"choices": []}));
        })
        .await;

    let base = config(&server, StdDuration::from_secs(5));

    let limited = RemoteInsightProvider::try_new(&base, "limited-key".to_string())
        .expect("client builds");
    let error = limited
        .request_insights(&subject(), &score(70))
        .await
        .expect_err("rate limited");
    assert_eq!(error.ai_code(), Some(AiErrorCode::RateLimited));

    let empty = RemoteInsightProvider::try_new(&base, "empty-key".to_string())
        .expect("client builds");
    let error = empty
        .request_insights(&subject(), &score(70))
        .await
        .expect_err("no content");
    assert_eq!(error.ai_code(), Some(AiErrorCode::InvalidResponse));
}

#[tokio::test]
async fn unreachable_provider_reports_unavailable() {
    let config = InsightConfig {
        api_key: Some("test-key".to_string()),
        api_base_url: "http://127.0.0.1:9".to_string(),
        http_timeout: StdDuration::from_secs(2),
        ..InsightConfig::default()
    };
    let provider = RemoteInsightProvider::try_new(&config, "test-key".to_string())
        .expect("client builds");

    let error = provider
        .request_insights(&subject(), &score(70))
        .await
        .expect_err("nothing listens on the discard port");
    assert!(matches!(
        error.ai_code(),
        Some(AiErrorCode::ProviderUnavailable) | Some(AiErrorCode::HttpTimeout)
    ));
}
