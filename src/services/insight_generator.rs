use std::sync::Arc;
use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AiErrorCode, AppError, AppResult};
use crate::models::insight::{EmployeeInsights, InsightSource, InsightSubject, PerformanceTier};
use crate::models::productivity::ScoreResult;

const MAX_SUGGESTED_SKILLS: usize = 4;
const DEFAULT_PROVIDER: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

const INSIGHT_SYSTEM_PROMPT: &str = "You are an HR analytics AI. Given an employee profile and productivity data, return a JSON object with exactly two fields: \"suggestedSkills\" (array of 3-5 skill strings the employee should learn based on their role and current gaps) and \"performanceSummary\" (2-3 sentence performance review). Return ONLY valid JSON, no markdown.";

/// Role keyword to skills worth growing into. Matched in order, so the first
/// key contained in the role wins.
const SKILL_CATALOGUE: &[(&str, &[&str])] = &[
    (
        "Frontend Developer",
        &[
            "Next.js",
            "GraphQL",
            "Testing (Jest/Cypress)",
            "Accessibility (WCAG)",
            "Performance Optimization",
            "Web3/dApps",
        ],
    ),
    (
        "Senior Frontend Developer",
        &[
            "System Design",
            "Micro-Frontend Architecture",
            "WebAssembly",
            "CI/CD Pipeline Design",
            "Mentoring",
        ],
    ),
    (
        "Backend Engineer",
        &[
            "Microservices",
            "gRPC",
            "Message Queues (Kafka/RabbitMQ)",
            "GraphQL",
            "System Design",
            "Observability",
        ],
    ),
    (
        "Product Manager",
        &[
            "Data Analytics",
            "A/B Testing",
            "Technical Writing",
            "Stakeholder Management",
            "Pricing Strategy",
            "Growth Hacking",
        ],
    ),
    (
        "DevOps Engineer",
        &[
            "Service Mesh (Istio)",
            "Chaos Engineering",
            "Security (SAST/DAST)",
            "Cost Optimization",
            "Platform Engineering",
        ],
    ),
    (
        "Data Analyst",
        &[
            "Machine Learning",
            "dbt",
            "Apache Spark",
            "Data Engineering",
            "Storytelling with Data",
            "A/B Testing",
        ],
    ),
    (
        "Designer",
        &[
            "Design Systems",
            "Motion Design",
            "User Research",
            "Accessibility",
            "Prototyping",
            "Design Tokens",
        ],
    ),
];

/// Strategy for turning a score into qualitative feedback. Implementations
/// never fail; degraded paths return template output instead.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    async fn generate(&self, subject: &InsightSubject, score: &ScoreResult) -> EmployeeInsights;
}

#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub api_key: Option<String>,
    pub provider: String,
    pub api_base_url: String,
    pub model: String,
    pub http_timeout: StdDuration,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: DEFAULT_PROVIDER.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            http_timeout: StdDuration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl InsightConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let http_timeout = read("WORKFORCE_AI_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .map(StdDuration::from_secs)
            .unwrap_or(defaults.http_timeout);

        Self {
            api_key: read("WORKFORCE_AI_API_KEY"),
            provider: read("WORKFORCE_AI_PROVIDER").unwrap_or(defaults.provider),
            api_base_url: read("WORKFORCE_AI_BASE_URL").unwrap_or(defaults.api_base_url),
            model: read("WORKFORCE_AI_MODEL").unwrap_or(defaults.model),
            http_timeout,
        }
    }
}

/// Pick the provider the configuration allows: remote when a key is set for a
/// supported provider, templates otherwise.
pub fn build_insight_provider(config: &InsightConfig) -> Arc<dyn InsightProvider> {
    let Some(api_key) = config.api_key.clone() else {
        info!(target: "app::insights", "no AI API key configured, using template insights");
        return Arc::new(TemplateInsightProvider);
    };

    if !config.provider.eq_ignore_ascii_case(DEFAULT_PROVIDER) {
        let error = AppError::ai(
            AiErrorCode::UnsupportedProvider,
            format!("unsupported insight provider: {}", config.provider),
        );
        warn!(target: "app::insights", %error, "falling back to template insights");
        return Arc::new(TemplateInsightProvider);
    }

    match RemoteInsightProvider::try_new(config, api_key) {
        Ok(provider) => Arc::new(provider),
        Err(error) => {
            warn!(target: "app::insights", %error, "falling back to template insights");
            Arc::new(TemplateInsightProvider)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateInsightProvider;

impl TemplateInsightProvider {
    pub fn insights(&self, subject: &InsightSubject, score: &ScoreResult) -> EmployeeInsights {
        let tier = PerformanceTier::from_score(score.score);
        EmployeeInsights {
            suggested_skills: suggest_skills(&subject.role, &subject.skills),
            performance_summary: performance_summary(tier, subject, score),
            performance_tier: tier,
            source: InsightSource::Template,
        }
    }
}

#[async_trait]
impl InsightProvider for TemplateInsightProvider {
    async fn generate(&self, subject: &InsightSubject, score: &ScoreResult) -> EmployeeInsights {
        self.insights(subject, score)
    }
}

pub fn suggest_skills(role: &str, current_skills: &[String]) -> Vec<String> {
    let role = role.to_lowercase();
    let catalogue = SKILL_CATALOGUE
        .iter()
        .find(|(key, _)| role.contains(&key.to_lowercase()))
        .or_else(|| SKILL_CATALOGUE.first())
        .map(|(_, skills)| *skills)
        .unwrap_or_default();

    catalogue
        .iter()
        .filter(|skill| {
            !current_skills
                .iter()
                .any(|owned| owned.to_lowercase() == skill.to_lowercase())
        })
        .take(MAX_SUGGESTED_SKILLS)
        .map(|skill| skill.to_string())
        .collect()
}

fn performance_summary(tier: PerformanceTier, subject: &InsightSubject, score: &ScoreResult) -> String {
    let name = &subject.name;
    let role = &subject.role;
    let points = score.score;
    let completed = score.completed_tasks;
    let total = score.total_tasks;
    let completion_rate = score.breakdown.completion_rate;

    match tier {
        PerformanceTier::Exceptional => format!(
            "{name} is performing exceptionally well as a {role}. With a {points}% productivity score and {completed}/{total} tasks completed, they consistently deliver before deadlines. They are ready for senior responsibilities and cross-functional leadership opportunities."
        ),
        PerformanceTier::Strong => format!(
            "{name} demonstrates strong performance in {department}. Their {points}% score reflects reliable task completion ({completed}/{total}) and solid time management. Investing in the suggested skills below would accelerate their trajectory toward a senior role.",
            department = subject.department
        ),
        PerformanceTier::Developing => format!(
            "{name} shows promise in their {role} position with a {points}% score. Their completion rate of {completion_rate}% suggests room for improvement in task execution. Consider pairing them with a senior mentor and prioritizing the skill gaps identified below."
        ),
        PerformanceTier::NeedsAttention => format!(
            "{name} requires immediate support. With a {points}% productivity score and {completion_rate}% completion rate, there may be systemic blockers affecting their output. Recommended: a 1-on-1 check-in to identify obstacles, adjusted workload, and a structured learning plan."
        ),
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInsightPayload {
    pub suggested_skills: Vec<String>,
    pub performance_summary: String,
}

/// OpenAI-compatible chat completion client. Any failure degrades to the
/// template provider.
pub struct RemoteInsightProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    timeout: StdDuration,
    fallback: TemplateInsightProvider,
}

impl RemoteInsightProvider {
    pub fn try_new(config: &InsightConfig, api_key: String) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Some(StdDuration::from_secs(90)))
            .build()
            .map_err(|err| AppError::other(format!("failed to build insight HTTP client: {err}")))?;

        let base_url = config.api_base_url.trim_end_matches('/');
        Ok(Self {
            client,
            api_key,
            endpoint: format!("{base_url}/v1/chat/completions"),
            model: config.model.clone(),
            timeout: config.http_timeout,
            fallback: TemplateInsightProvider,
        })
    }

    pub async fn request_insights(
        &self,
        subject: &InsightSubject,
        score: &ScoreResult,
    ) -> AppResult<RemoteInsightPayload> {
        let correlation_id = Uuid::new_v4().to_string();
        let request_body = self.build_request_body(subject, score);

        debug!(
            target: "app::insights::remote",
            correlation_id = %correlation_id,
            model = %self.model,
            "requesting remote insights"
        );

        let start = Instant::now();
        let call = async {
            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await
                .map_err(|err| Self::error_from_reqwest(err, &correlation_id))?;

            let status = response.status();
            if !status.is_success() {
                return Err(Self::map_http_error(status, &correlation_id));
            }

            response.json::<JsonValue>().await.map_err(|err| {
                AppError::ai_with_correlation(
                    AiErrorCode::InvalidResponse,
                    format!("insight provider returned a non-JSON body: {err}"),
                    Some(&correlation_id),
                )
            })
        };

        let body = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                AppError::ai_with_correlation(
                    AiErrorCode::HttpTimeout,
                    "insight provider timed out",
                    Some(&correlation_id),
                )
            })??;

        let content = body
            .pointer("/choices/0/message/content")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                AppError::ai_with_correlation(
                    AiErrorCode::InvalidResponse,
                    "insight provider response has no message content",
                    Some(&correlation_id),
                )
            })?;

        let payload = Self::parse_content(content, &correlation_id)?;

        debug!(
            target: "app::insights::remote",
            correlation_id = %correlation_id,
            latency_ms = start.elapsed().as_millis() as u64,
            skills = payload.suggested_skills.len(),
            "remote insights received"
        );

        Ok(payload)
    }

    fn build_request_body(&self, subject: &InsightSubject, score: &ScoreResult) -> JsonValue {
        let profile = json!({
            "name": subject.name,
            "role": subject.role,
            "department": subject.department,
            "currentSkills": subject.skills,
            "productivityScore": score.score,
            "breakdown": score.breakdown,
            "completedTasks": score.completed_tasks,
            "totalTasks": score.total_tasks,
        });

        json!({
            "model": self.model,
            "temperature": 0.1,
            "max_tokens": 500,
            "messages": [
                { "role": "system", "content": INSIGHT_SYSTEM_PROMPT },
                { "role": "user", "content": profile.to_string() }
            ]
        })
    }

    fn parse_content(content: &str, correlation_id: &str) -> AppResult<RemoteInsightPayload> {
        let trimmed = content.trim();
        let cleaned = if trimmed.starts_with("```") {
            trimmed
                .trim_start_matches("```json")
                .trim_start_matches("```JSON")
                .trim_start_matches("```")
                .trim_end_matches("```")
                .trim()
        } else {
            trimmed
        };

        let payload: RemoteInsightPayload = serde_json::from_str(cleaned).map_err(|err| {
            AppError::ai_with_correlation(
                AiErrorCode::InvalidResponse,
                format!("insight content is not the expected JSON object: {err}"),
                Some(correlation_id),
            )
        })?;

        if payload.performance_summary.trim().is_empty() {
            return Err(AppError::ai_with_correlation(
                AiErrorCode::InvalidResponse,
                "insight content has an empty performance summary",
                Some(correlation_id),
            ));
        }

        Ok(payload)
    }

    fn map_http_error(status: StatusCode, correlation_id: &str) -> AppError {
        let code = match status {
            StatusCode::TOO_MANY_REQUESTS => AiErrorCode::RateLimited,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AiErrorCode::MissingApiKey,
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => AiErrorCode::HttpTimeout,
            status if status.is_server_error() => AiErrorCode::ProviderUnavailable,
            _ => AiErrorCode::Unknown,
        };
        AppError::ai_with_correlation(
            code,
            format!("insight provider returned status {}", status.as_u16()),
            Some(correlation_id),
        )
    }

    fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> AppError {
        if err.is_timeout() {
            AppError::ai_with_correlation(
                AiErrorCode::HttpTimeout,
                "insight provider timed out",
                Some(correlation_id),
            )
        } else if err.is_connect() {
            AppError::ai_with_correlation(
                AiErrorCode::ProviderUnavailable,
                "insight provider is unreachable",
                Some(correlation_id),
            )
        } else if let Some(status) = err.status() {
            Self::map_http_error(status, correlation_id)
        } else {
            AppError::ai_with_correlation(
                AiErrorCode::Unknown,
                format!("insight request failed: {err}"),
                Some(correlation_id),
            )
        }
    }
}

#[async_trait]
impl InsightProvider for RemoteInsightProvider {
    async fn generate(&self, subject: &InsightSubject, score: &ScoreResult) -> EmployeeInsights {
        match self.request_insights(subject, score).await {
            Ok(payload) => EmployeeInsights {
                suggested_skills: payload.suggested_skills,
                performance_summary: payload.performance_summary,
                performance_tier: PerformanceTier::from_score(score.score),
                source: InsightSource::Remote,
            },
            Err(error) => {
                warn!(
                    target: "app::insights",
                    code = ?error.ai_code(),
                    %error,
                    "remote insights failed, using template fallback"
                );
                self.fallback.insights(subject, score)
            }
        }
    }
}
