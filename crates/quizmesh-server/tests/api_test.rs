//! Integration test: run the orchestrator API against mock sibling agents.
//!
//! Each mock agent is a small axum app bound to a random local port that
//! serves an agent card, a health endpoint and the task endpoints.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use quizmesh_core::config::{AgentEndpoint, OrchestratorConfig, ROLE_MANUAL, ROLE_QUIZ};
use quizmesh_core::state::AppState;

#[derive(Clone, Copy, PartialEq)]
enum MockKind {
    Quiz,
    Manual,
    /// Serves a card but fails every task.
    Broken,
    /// Answers nothing within the probe timeout.
    Slow,
    /// Serves no card at all and fails every task.
    NoCard,
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn sample_quiz(topic: &str, count: u64) -> serde_json::Value {
    let questions: Vec<serde_json::Value> = (1..=count)
        .map(|i| {
            serde_json::json!({
                "id": i,
                "question": format!("Agent question {} about {}?", i, topic),
                "options": [
                    { "letter": "A", "text": "First" },
                    { "letter": "B", "text": "Second" },
                    { "letter": "C", "text": "Third" },
                    { "letter": "D", "text": "Fourth" }
                ],
                "correct_answer": "B",
                "explanation": "Because."
            })
        })
        .collect();
    serde_json::json!({
        "title": format!("{} Quiz", topic),
        "topic": topic,
        "difficulty": "medium",
        "questions": questions
    })
}

fn sample_manual(topic: &str) -> serde_json::Value {
    serde_json::json!({
        "title": format!("{} Manual", topic),
        "topic": topic,
        "sections": [{ "heading": "Basics", "body": format!("All about {}.", topic) }]
    })
}

fn completed_task(id: &str, artifact: &str, data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "status": { "state": "completed" },
        "artifacts": [{ "name": artifact, "parts": [{ "type": "data", "data": data }] }]
    })
}

async fn mock_card(
    State(kind): State<MockKind>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    if kind == MockKind::Slow {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
    let (name, skill) = match kind {
        MockKind::Quiz => ("Quiz Agent", "generate_quiz"),
        MockKind::Manual | MockKind::Broken => ("Manual Agent", "generate_manual"),
        MockKind::Slow => ("Slow Agent", "translate"),
        MockKind::NoCard => return Err(axum::http::StatusCode::NOT_FOUND),
    };
    Ok(Json(serde_json::json!({
        "name": name,
        "version": "1.0.0",
        "skills": [{ "id": skill, "tags": ["study"] }],
        "capabilities": { "streaming": false }
    })))
}

async fn mock_send(
    State(kind): State<MockKind>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    let id = body["id"].as_str().unwrap_or("task").to_string();
    let topic = body["input"]["topic"].as_str().unwrap_or("Topic").to_string();
    match kind {
        // The quiz agent answers asynchronously; the result arrives on poll.
        MockKind::Quiz => Ok(Json(serde_json::json!({
            "id": id,
            "status": { "state": "working" },
            "artifacts": []
        }))),
        MockKind::Manual => Ok(Json(completed_task(&id, "manual.json", sample_manual(&topic)))),
        MockKind::Broken | MockKind::Slow | MockKind::NoCard => {
            Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn mock_poll(Path(id): Path<String>) -> Json<serde_json::Value> {
    Json(completed_task(&id, "quiz.json", sample_quiz("Photosynthesis", 5)))
}

async fn mock_agent(kind: MockKind) -> String {
    let app = Router::new()
        .route("/.well-known/agent.json", get(mock_card))
        .route("/health", get(|| async { "ok" }))
        .route("/tasks/send", post(mock_send))
        .route("/tasks/{id}", get(mock_poll))
        .with_state(kind);
    serve(app).await
}

fn config(agents: Vec<AgentEndpoint>) -> OrchestratorConfig {
    OrchestratorConfig {
        agents,
        probe_timeout_ms: 500,
        request_timeout_ms: 3_000,
        poll_interval_ms: 50,
        retry_base_delay_ms: 10,
        ..OrchestratorConfig::default()
    }
}

async fn start_orchestrator(config: OrchestratorConfig) -> (String, AppState) {
    let state = quizmesh_server::create_app_state(config);
    let base_url = serve(quizmesh_server::app(state.clone())).await;
    (base_url, state)
}

async fn post_action(
    client: &reqwest::Client,
    base_url: &str,
    body: serde_json::Value,
) -> (u16, serde_json::Value) {
    let resp = client
        .post(format!("{}/api/orchestrator", base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (base_url, _) = start_orchestrator(config(vec![])).await;
    let body: serde_json::Value = reqwest::get(format!("{}/api/health", base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_discovery_marks_slow_agent_offline() {
    let quiz = mock_agent(MockKind::Quiz).await;
    let manual = mock_agent(MockKind::Manual).await;
    let slow = mock_agent(MockKind::Slow).await;
    let (base_url, _) = start_orchestrator(config(vec![
        AgentEndpoint::new(&quiz, Some(ROLE_QUIZ)),
        AgentEndpoint::new(&manual, Some(ROLE_MANUAL)),
        AgentEndpoint::new(&slow, None),
    ]))
    .await;

    let client = reqwest::Client::new();
    let (status, body) =
        post_action(&client, &base_url, serde_json::json!({ "action": "discover_agents" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["online"], 2);
    assert_eq!(body["offline"], 1);

    let agents = body["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 3);
    assert_eq!(agents[0]["status"], "online");
    assert_eq!(agents[0]["name"], "Quiz Agent");
    assert_eq!(agents[2]["status"], "offline");

    // The GET variant serves the same registry.
    let body: serde_json::Value = client
        .get(format!("{}/api/orchestrator?action=agents", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["agents"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let (base_url, _) = start_orchestrator(config(vec![])).await;
    let client = reqwest::Client::new();

    let (status, body) =
        post_action(&client, &base_url, serde_json::json!({ "action": "unknown_action" })).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("Unknown action"));

    let resp = client
        .get(format!("{}/api/orchestrator?action=bogus", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let (status, body) =
        post_action(&client, &base_url, serde_json::json!({ "action": "get_agent" })).await;
    assert_eq!(status, 400);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid parameters for get_agent"));
}

#[tokio::test]
async fn test_clear_chat_history_then_get_is_empty() {
    let (base_url, state) = start_orchestrator(config(vec![])).await;
    state
        .chat_log
        .append(quizmesh_core::models::ChatMessageType::System, "hello", None);
    let client = reqwest::Client::new();

    let (_, body) =
        post_action(&client, &base_url, serde_json::json!({ "action": "get_chat_history" })).await;
    assert_eq!(body["count"], 1);

    let (status, body) =
        post_action(&client, &base_url, serde_json::json!({ "action": "clear_chat_history" }))
            .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);

    let body: serde_json::Value = client
        .get(format!("{}/api/orchestrator?action=chat_history", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_quiz_falls_back_against_failing_backend() {
    let broken = mock_agent(MockKind::Broken).await;
    let (base_url, state) = start_orchestrator(config(vec![
        AgentEndpoint::new(&broken, Some(ROLE_QUIZ)),
        AgentEndpoint::new(&broken, Some(ROLE_MANUAL)),
    ]))
    .await;
    let client = reqwest::Client::new();

    let (status, body) = post_action(
        &client,
        &base_url,
        serde_json::json!({
            "action": "orchestrate_quiz_workflow",
            "topic": "Photosynthesis",
            "questionCount": 5
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["degraded"], true);
    assert_eq!(body["status"], "completed");

    let questions = body["quiz"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 5);
    for q in questions {
        assert!(!q["question"].as_str().unwrap().is_empty());
        let letters: Vec<&str> = q["options"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["letter"].as_str().unwrap())
            .collect();
        assert!(letters.contains(&q["correct_answer"].as_str().unwrap()));
    }

    // The failures were recorded against the broken agent.
    let snapshot = state.breakers.snapshot_of(&broken);
    assert!(snapshot.failure_count >= 1);

    let workflow_id = body["workflowId"].as_str().unwrap();
    let (status, body) = post_action(
        &client,
        &base_url,
        serde_json::json!({ "action": "get_workflow_chat_history", "workflowId": workflow_id }),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["count"].as_u64().unwrap() >= 3);
}

#[tokio::test]
async fn test_quiz_from_live_agents() {
    let quiz = mock_agent(MockKind::Quiz).await;
    let manual = mock_agent(MockKind::Manual).await;
    let (base_url, _) = start_orchestrator(config(vec![
        AgentEndpoint::new(&quiz, Some(ROLE_QUIZ)),
        AgentEndpoint::new(&manual, Some(ROLE_MANUAL)),
    ]))
    .await;
    let client = reqwest::Client::new();

    post_action(&client, &base_url, serde_json::json!({ "action": "discover_agents" })).await;

    let (status, body) = post_action(
        &client,
        &base_url,
        serde_json::json!({
            "action": "orchestrate_quiz_workflow",
            "data": { "topic": "Photosynthesis", "question_count": 5 }
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["source"], "agent");
    assert_eq!(body["degraded"], false);
    assert_eq!(body["manual"]["title"], "Photosynthesis Manual");
    assert_eq!(body["quiz"]["questions"][0]["correct_answer"], "B");

    let workflow_id = body["workflowId"].as_str().unwrap().to_string();
    let (status, body) = post_action(
        &client,
        &base_url,
        serde_json::json!({ "action": "get_workflow", "workflowId": workflow_id }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "completed");
    let steps = body["steps"].as_array().unwrap();
    assert!(steps.iter().all(|s| s["status"] == "completed" && s["fallback"] == false));
}

#[tokio::test]
async fn test_unknown_workflow_is_not_found() {
    let (base_url, _) = start_orchestrator(config(vec![])).await;
    let client = reqwest::Client::new();
    let (status, body) = post_action(
        &client,
        &base_url,
        serde_json::json!({ "action": "get_workflow", "workflowId": "missing" }),
    )
    .await;
    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn test_execute_with_resilience_against_live_agent() {
    let manual = mock_agent(MockKind::Manual).await;
    let (base_url, _) =
        start_orchestrator(config(vec![AgentEndpoint::new(&manual, Some(ROLE_MANUAL))])).await;
    let client = reqwest::Client::new();

    let (status, body) = post_action(
        &client,
        &base_url,
        serde_json::json!({
            "action": "execute_agent_with_resilience",
            "agentId": manual,
            "skill": "generate_manual",
            "input": { "topic": "Tides" },
            "artifact": "manual.json"
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["attempts"], 1);
    assert_eq!(body["result"]["topic"], "Tides");
}

#[tokio::test]
async fn test_status_and_health_queries() {
    let manual = mock_agent(MockKind::Manual).await;
    let (base_url, _) =
        start_orchestrator(config(vec![AgentEndpoint::new(&manual, Some(ROLE_MANUAL))])).await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!("{}/api/orchestrator", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["agentsTotal"], 1);

    let body: serde_json::Value = client
        .get(format!("{}/api/orchestrator?action=health", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["agents"][0]["reachable"], true);
}

#[tokio::test]
async fn test_event_stream_delivers_log_entries() {
    let (base_url, _) = start_orchestrator(config(vec![])).await;
    let client = reqwest::Client::new();

    let mut events = client
        .get(format!("{}/api/orchestrator/events", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(events.status(), 200);

    post_action(
        &client,
        &base_url,
        serde_json::json!({ "action": "handle_general_mcp_query", "query": "quiz me" }),
    )
    .await;

    let chunk = tokio::time::timeout(Duration::from_secs(5), events.chunk())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = String::from_utf8_lossy(&chunk);
    assert!(text.contains("event: chat"), "unexpected chunk: {}", text);
}

#[tokio::test]
async fn test_chat_without_llm_key_is_server_error() {
    let mut orchestrator = config(vec![]);
    orchestrator.llm.api_key = None;
    let (base_url, _) = start_orchestrator(orchestrator).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/chat", base_url))
        .json(&serde_json::json!({ "messages": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/api/chat", base_url))
        .json(&serde_json::json!({ "messages": [{ "role": "user", "content": "hi" }] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("API key"));
}

#[tokio::test]
async fn test_failed_task_keeps_offline_agent_offline() {
    let agent = mock_agent(MockKind::NoCard).await;
    let (base_url, state) = start_orchestrator(config(vec![
        AgentEndpoint::new(&agent, Some(ROLE_QUIZ)),
        AgentEndpoint::new(&agent, Some(ROLE_MANUAL)),
    ]))
    .await;
    let client = reqwest::Client::new();

    let (_, body) =
        post_action(&client, &base_url, serde_json::json!({ "action": "discover_agents" })).await;
    assert_eq!(body["offline"], 1);

    let (status, body) = post_action(
        &client,
        &base_url,
        serde_json::json!({ "action": "orchestrate_quiz_workflow", "topic": "Tides" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["source"], "fallback");

    // The agent answered with HTTP 500, which says nothing about liveness.
    let stored = state.registry.get(&agent).unwrap();
    assert_eq!(stored.status, quizmesh_core::models::AgentStatus::Offline);
    assert!(stored.last_seen.is_none());
}

#[tokio::test]
async fn test_unparseable_bodies_get_json_errors() {
    let (base_url, _) = start_orchestrator(config(vec![])).await;
    let client = reqwest::Client::new();

    for path in ["/api/orchestrator", "/api/chat"] {
        let resp = client
            .post(format!("{}{}", base_url, path))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

        let resp = client
            .post(format!("{}{}", base_url, path))
            .body(r#"{"action":"get_agents"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("Content-Type"));
    }
}
