//! End-to-end planner tests against a scripted provider.

use std::time::Duration;
use vox_planner::{PlanError, PlanGenerator, RoutingPolicy, Step};
use vox_providers::{MockProvider, MockResponse};

fn planner(provider: MockProvider) -> PlanGenerator {
    PlanGenerator::new(Box::new(provider), RoutingPolicy::builtin())
}

// =============================================================================
// Policy-following responses
// =============================================================================

#[tokio::test]
async fn test_open_calculator() {
    let provider = MockProvider::new().with_response(MockResponse::text(
        r#"```json
{
  "steps": [
    {"action": "OPEN_APP", "app": "calc"},
    {"action": "WAIT", "seconds": 3}
  ]
}
```"#,
    ));
    let requests = provider.requests_handle();
    let plan = planner(provider).route_intent("Open calculator").await.unwrap();

    assert_eq!(
        plan.steps,
        vec![
            Step::OpenApp { app: Some("calc".into()) },
            Step::Wait { seconds: 3.0 },
        ]
    );

    let prompt = requests.lock().unwrap()[0].messages[0].content.clone();
    assert!(prompt.starts_with(RoutingPolicy::builtin().text()));
    assert!(prompt.ends_with("\nUser: Open calculator\nOutput:"));
}

#[tokio::test]
async fn test_search_for_funny_cats() {
    let provider = MockProvider::new().with_response(MockResponse::text(
        r#"{"steps": [{"action": "OPEN_URL", "url": "https://www.google.com/search?q=funny+cats"}]}"#,
    ));
    let plan = planner(provider).route_intent("Search for funny cats").await.unwrap();

    assert_eq!(
        plan.steps,
        vec![Step::OpenUrl {
            url: Some("https://www.google.com/search?q=funny+cats".into())
        }]
    );
}

#[tokio::test]
async fn test_take_a_screenshot() {
    let provider = MockProvider::new().with_response(MockResponse::text(
        r#"Output:
{"steps": [{"action": "PRESS", "keys": ["win", "printscreen"]}]}
Let me know if you need anything else."#,
    ));
    let plan = planner(provider).route_intent("Take a screenshot").await.unwrap();

    assert_eq!(
        plan.steps,
        vec![Step::Press {
            keys: vec!["win".into(), "printscreen".into()]
        }]
    );
}

#[tokio::test]
async fn test_compound_request_keeps_order() {
    let provider = MockProvider::new().with_response(MockResponse::text(
        r#"{"steps": [
            {"action": "OPEN_URL", "url": "https://www.youtube.com/results?search_query=tech+news"},
            {"action": "WAIT", "seconds": 3},
            {"action": "OPEN_APP", "app": "notepad"},
            {"action": "WAIT", "seconds": 3},
            {"action": "TYPE", "text": "hello"}
        ]}"#,
    ));
    let plan = planner(provider)
        .route_intent("Open YouTube and search for tech news and also open notepad and type hello")
        .await
        .unwrap();

    let actions: Vec<&str> = plan.steps.iter().map(|s| s.action()).collect();
    assert_eq!(actions, vec!["OPEN_URL", "WAIT", "OPEN_APP", "WAIT", "TYPE"]);
}

#[tokio::test]
async fn test_literal_style_response() {
    let provider = MockProvider::new().with_response(MockResponse::text(
        "{'steps': [{'action': 'OPEN_APP', 'app': 'notepad'}, {'action': 'WAIT', 'seconds': 3},]}",
    ));
    let plan = planner(provider).route_intent("Open notepad").await.unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan.steps[0], Step::OpenApp { app: Some("notepad".into()) });
}

// =============================================================================
// Failures become "no plan"
// =============================================================================

#[tokio::test]
async fn test_garbage_yields_no_plan() {
    let provider = MockProvider::new().with_response(MockResponse::text(
        "Sorry, I can't do that {because reasons}",
    ));
    let planner = planner(provider);
    assert!(planner.route_intent("Do something odd").await.is_none());
}

#[tokio::test]
async fn test_deeply_nested_response_yields_no_plan() {
    let nested = format!("{{'steps': {}", "[".repeat(4_000));
    let provider = MockProvider::new().with_response(MockResponse::text(&nested));
    assert!(planner(provider).route_intent("Open calculator").await.is_none());

    let closed = format!("{{\"steps\": {}{}}}", "[".repeat(500), "]".repeat(500));
    let provider = MockProvider::new().with_response(MockResponse::text(&closed));
    let err = planner(provider).try_route_intent("Open calculator").await.unwrap_err();
    assert!(matches!(err, PlanError::Syntax { .. }));
}

#[tokio::test]
async fn test_syntax_error_is_not_retried() {
    let provider = MockProvider::new()
        .with_response(MockResponse::text("not a plan"))
        .with_response(MockResponse::text(r#"{"steps": []}"#));
    let requests = provider.requests_handle();
    let err = planner(provider).try_route_intent("hi").await.unwrap_err();

    assert!(matches!(err, PlanError::Syntax { .. }));
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_recoverable_errors_are_retried() {
    let provider = MockProvider::new()
        .with_response(MockResponse::error("HTTP 503 Service Unavailable"))
        .with_response(MockResponse::error("Rate limit exceeded"))
        .with_response(MockResponse::text(r#"{"steps": [{"action": "WAIT", "seconds": 2}]}"#));
    let requests = provider.requests_handle();
    let plan = planner(provider).try_route_intent("wait a bit").await.unwrap();

    assert_eq!(plan.steps, vec![Step::Wait { seconds: 2.0 }]);
    assert_eq!(requests.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_retries_stop_at_max_attempts() {
    let provider =
        MockProvider::new().with_default_response(MockResponse::error("connection refused"));
    let requests = provider.requests_handle();
    let planner = planner(provider).with_max_attempts(2);

    let err = planner.try_route_intent("hi").await.unwrap_err();
    assert!(matches!(err, PlanError::Transport(_)));
    assert_eq!(requests.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_auth_error_is_not_retried() {
    let provider = MockProvider::new()
        .with_default_response(MockResponse::error("401 Unauthorized: invalid API key"));
    let requests = provider.requests_handle();

    assert!(planner(provider).route_intent("hi").await.is_none());
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_times_out() {
    let provider = MockProvider::new().with_default_response(
        MockResponse::text(r#"{"steps": []}"#).with_delay(Duration::from_secs(120)),
    );
    let requests = provider.requests_handle();
    let planner = planner(provider)
        .with_timeout(Duration::from_secs(5))
        .with_max_attempts(1);

    let err = planner.try_route_intent("hi").await.unwrap_err();
    assert!(matches!(err, PlanError::Timeout { seconds: 5 }));
    assert_eq!(requests.lock().unwrap().len(), 1);
}
