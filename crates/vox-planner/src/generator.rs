use crate::error::PlanError;
use crate::plan::Plan;
use crate::policy::RoutingPolicy;
use crate::provider_registration::register_providers;
use crate::recovery::parse_response;
use crate::retry::retry_with_backoff;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use vox_config::{Config, PlannerConfig};
use vox_providers::{CompletionRequest, LLMProvider};

/// Plans are requested deterministically
const PLANNER_TEMPERATURE: f32 = 0.0;

/// Turns utterances into plans through a completion provider
pub struct PlanGenerator {
    provider: Box<dyn LLMProvider>,
    policy: RoutingPolicy,
    timeout: Duration,
    max_attempts: u32,
}

impl PlanGenerator {
    pub fn new(provider: Box<dyn LLMProvider>, policy: RoutingPolicy) -> Self {
        Self::with_planner_config(provider, policy, &PlannerConfig::default())
    }

    pub fn with_planner_config(
        provider: Box<dyn LLMProvider>,
        policy: RoutingPolicy,
        planner: &PlannerConfig,
    ) -> Self {
        Self {
            provider,
            policy,
            timeout: planner.timeout(),
            max_attempts: planner.max_retry_attempts.max(1),
        }
    }

    /// Build the default provider and the configured policy
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = register_providers(config)?;
        let provider = registry.take(None)?;
        let policy = RoutingPolicy::from_config(&config.planner)?;
        Ok(Self::with_planner_config(provider, policy, &config.planner))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Produce a plan, or "no plan" on any failure. Failures are logged here.
    pub async fn route_intent(&self, utterance: &str) -> Option<Plan> {
        match self.try_route_intent(utterance).await {
            Ok(plan) => Some(plan),
            Err(e @ (PlanError::Syntax { .. } | PlanError::Structure(_))) => {
                warn!("No plan for {:?}: {}", utterance, e);
                None
            }
            Err(e) => {
                error!("No plan for {:?}: {}", utterance, e);
                None
            }
        }
    }

    pub async fn try_route_intent(&self, utterance: &str) -> Result<Plan, PlanError> {
        let prompt = self.policy.build_prompt(utterance);
        info!(
            "Routing {:?} via {} ({}), policy {} [{}]",
            utterance,
            self.provider.name(),
            self.provider.model(),
            self.policy.short_fingerprint(),
            self.policy.source()
        );

        let this = self;
        let prompt_ref = prompt.as_str();
        let raw = retry_with_backoff(
            "plan completion",
            move || this.complete_once(prompt_ref),
            self.max_attempts,
        )
        .await?;
        debug!("Raw completion: {}", raw);

        let value = parse_response(&raw)?;
        let plan = Plan::from_value(&value)?;
        info!("Plan ({} steps): {}", plan.len(), plan.summary());
        Ok(plan)
    }

    async fn complete_once(&self, prompt: &str) -> Result<String, PlanError> {
        let request = CompletionRequest::single_prompt(prompt.to_string(), Some(PLANNER_TEMPERATURE));
        debug!("Sending {} byte prompt", prompt.len());

        let response = match tokio::time::timeout(self.timeout, self.provider.complete(request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(PlanError::Transport(e)),
            Err(_) => {
                return Err(PlanError::Timeout {
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        debug!(
            "Completion from {}: {} tokens",
            response.model, response.usage.total_tokens
        );

        let content = response.content.trim();
        if content.is_empty() {
            return Err(PlanError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Step;
    use crate::policy::PolicySource;
    use vox_providers::{MessageRole, MockProvider, MockResponse};

    fn generator(provider: MockProvider) -> PlanGenerator {
        PlanGenerator::new(
            Box::new(provider),
            RoutingPolicy::from_text("POLICY", PolicySource::BuiltIn),
        )
    }

    #[tokio::test]
    async fn test_prompt_and_temperature() {
        let provider = MockProvider::new().with_response(MockResponse::text(r#"{"steps": []}"#));
        let requests = provider.requests_handle();
        let generator = generator(provider);

        let plan = generator.try_route_intent("Open calculator").await.unwrap();
        assert!(plan.is_empty());

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, Some(0.0));
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[0].messages[0].role, MessageRole::User);
        assert_eq!(
            requests[0].messages[0].content,
            "POLICY\nUser: Open calculator\nOutput:"
        );
    }

    #[tokio::test]
    async fn test_empty_response() {
        let generator = generator(MockProvider::new().with_response(MockResponse::text("  \n")));
        let err = generator.try_route_intent("hi").await.unwrap_err();
        assert!(matches!(err, PlanError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_structure_error() {
        let generator =
            generator(MockProvider::new().with_response(MockResponse::text(r#"{"plan": []}"#)));
        let err = generator.try_route_intent("hi").await.unwrap_err();
        assert!(matches!(err, PlanError::Structure(_)));
    }

    #[tokio::test]
    async fn test_route_intent_swallows_errors() {
        let generator = generator(
            MockProvider::new().with_response(MockResponse::error("401 Invalid API key")),
        );
        assert!(generator.route_intent("hi").await.is_none());
    }

    #[tokio::test]
    async fn test_route_intent_returns_plan() {
        let generator = generator(MockProvider::new().with_response(MockResponse::text(
            r#"{"steps": [{"action": "OPEN_URL", "url": "ms-settings:bluetooth"}]}"#,
        )));
        let plan = generator.route_intent("Open bluetooth settings").await.unwrap();
        assert_eq!(
            plan.steps,
            vec![Step::OpenUrl {
                url: Some("ms-settings:bluetooth".into())
            }]
        );
    }

    #[test]
    fn test_reports_provider_and_model() {
        let provider = MockProvider::new()
            .with_name("gemini.default")
            .with_model("gemma-3-4b-it");
        let generator = generator(provider);
        assert_eq!(generator.provider_name(), "gemini.default");
        assert_eq!(generator.model(), "gemma-3-4b-it");
        assert_eq!(generator.policy().text(), "POLICY");
    }

    #[test]
    fn test_zero_attempts_means_one() {
        let generator = generator(MockProvider::new()).with_max_attempts(0);
        assert_eq!(generator.max_attempts, 1);
    }
}
