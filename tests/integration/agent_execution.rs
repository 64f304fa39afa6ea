use crate::integration::support::{
    current_agent, registry, registry_with_llm, write_file, ScriptedLlmClient, PROMPTED_AGENT,
};
use agentry::agent::{AgentOptions, CallbackSink, LogLevel, LogRecord};
use agentry::error::FailureKind;
use agentry::llm::LlmError;
use agentry::usage::TokenUsage;
use parking_lot::Mutex;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const BRAND_VOICE: &str = r#"
factory = "prompted"
description = "Writes copy in the company voice"
prompt = "prompt.md"
system_prompt = "You write for {company_id}."
required_inputs = ["topic"]

[llm]
model = "gemini-2.5-pro"
temperature = 0.3
"#;

fn brand_voice_workspace(prompt: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "company_context", "brand_voice", BRAND_VOICE);
    write_file(
        &temp.path().join("teams/company_context/agents/brand_voice/prompt.md"),
        prompt,
    );
    temp
}

#[tokio::test]
async fn usage_accumulates_across_calls() {
    let temp = brand_voice_workspace("Write a headline about {topic}.");
    let client = Arc::new(
        ScriptedLlmClient::new()
            .reply("```json\n{\"headline\": \"Tides turn\"}\n```", TokenUsage::single(10, 5, 15))
            .reply("Plain answer", TokenUsage::single(20, 10, 30)),
    );
    let registry = registry_with_llm(temp.path(), client.clone());
    registry.discover_all().unwrap();

    let options = AgentOptions::new().with_identifier("company_id", "acme");
    let mut agent = registry
        .instantiate_agent("company_context", "brand_voice", options)
        .unwrap();

    let first = agent.execute(json!({"topic": "tides"})).await.unwrap();
    assert_eq!(first, json!({"headline": "Tides turn"}));
    assert_eq!(agent.usage().total_tokens, 15);

    let second = agent.execute(json!({"topic": "currents"})).await.unwrap();
    assert_eq!(second, json!("Plain answer"));

    let usage = agent.usage();
    assert_eq!(usage.prompt_tokens, 30);
    assert_eq!(usage.completion_tokens, 15);
    assert_eq!(usage.total_tokens, 45);
    assert_eq!(usage.llm_calls, 2);

    let prompts = client.prompts();
    assert_eq!(prompts[0].0, "Write a headline about tides.");
    assert_eq!(prompts[0].1.system.as_deref(), Some("You write for acme."));
    assert_eq!(prompts[0].1.model.as_deref(), Some("gemini-2.5-pro"));
    assert_eq!(prompts[1].0, "Write a headline about currents.");
}

#[tokio::test]
async fn llm_timeout_is_retryable() {
    let temp = brand_voice_workspace("Write about {topic}.");
    let client = Arc::new(
        ScriptedLlmClient::new().fail(LlmError::Timeout(Duration::from_secs(60))),
    );
    let registry = registry_with_llm(temp.path(), client);
    registry.discover_all().unwrap();

    let mut agent = registry
        .instantiate_agent(
            "company_context",
            "brand_voice",
            AgentOptions::new().with_identifier("company_id", "acme"),
        )
        .unwrap();
    let err = agent.execute(json!({"topic": "tides"})).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.kind, FailureKind::Retryable);
    assert_eq!(err.agent, "company_context.brand_voice");
    assert!(std::error::Error::source(&err).is_some());
    assert_eq!(agent.usage().llm_calls, 0);
}

#[tokio::test]
async fn server_errors_are_retryable_and_client_errors_are_not() {
    let temp = brand_voice_workspace("Write about {topic}.");
    let client = Arc::new(
        ScriptedLlmClient::new()
            .fail(LlmError::Status { status: 503, body: "overloaded".to_string() })
            .fail(LlmError::Status { status: 400, body: "bad request".to_string() }),
    );
    let registry = registry_with_llm(temp.path(), client);
    registry.discover_all().unwrap();
    let options = AgentOptions::new().with_identifier("company_id", "acme");
    let mut agent = registry
        .instantiate_agent("company_context", "brand_voice", options)
        .unwrap();

    assert!(agent.execute(json!({"topic": "a"})).await.unwrap_err().is_retryable());
    assert!(!agent.execute(json!({"topic": "b"})).await.unwrap_err().is_retryable());
}

#[tokio::test]
async fn missing_placeholder_is_not_retryable() {
    let temp = brand_voice_workspace("Write about {topic} for {audience}.");
    let client = Arc::new(ScriptedLlmClient::new().reply("unused", TokenUsage::default()));
    let registry = registry_with_llm(temp.path(), client.clone());
    registry.discover_all().unwrap();

    let mut agent = registry
        .instantiate_agent(
            "company_context",
            "brand_voice",
            AgentOptions::new().with_identifier("company_id", "acme"),
        )
        .unwrap();
    let err = agent.execute(json!({"topic": "tides"})).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::NonRetryable);
    assert!(err.message.contains("audience"));
    assert!(client.prompts().is_empty());
}

#[tokio::test]
async fn malformed_input_is_not_retryable() {
    let temp = brand_voice_workspace("Write about {topic}.");
    let registry = registry_with_llm(temp.path(), Arc::new(ScriptedLlmClient::new()));
    registry.discover_all().unwrap();
    let mut agent = registry
        .instantiate_agent("company_context", "brand_voice", AgentOptions::new())
        .unwrap();

    let missing = agent.execute(json!({"subject": "tides"})).await.unwrap_err();
    assert_eq!(missing.kind, FailureKind::NonRetryable);
    assert!(missing.message.contains("topic"));

    let not_object = agent.execute(json!(["tides"])).await.unwrap_err();
    assert_eq!(not_object.kind, FailureKind::NonRetryable);
}

#[tokio::test]
async fn missing_llm_client_is_a_configuration_failure() {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "sales", "pitch", PROMPTED_AGENT);
    let registry = registry(temp.path());
    registry.discover_all().unwrap();

    let mut agent = registry
        .instantiate_agent("sales", "pitch", AgentOptions::new())
        .unwrap();
    let err = agent.execute(json!({})).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::NonRetryable);

    let client = Arc::new(ScriptedLlmClient::new().reply("ok", TokenUsage::single(1, 1, 2)));
    let mut agent = registry
        .instantiate_agent("sales", "pitch", AgentOptions::new().with_llm_client(client))
        .unwrap();
    assert_eq!(agent.execute(json!({})).await.unwrap(), json!("ok"));
}

#[tokio::test]
async fn shared_prompts_resolve_through_import_roots() {
    let temp = TempDir::new().unwrap();
    current_agent(
        temp.path(),
        "sales",
        "pitch",
        "factory = \"prompted\"\nprompt = \"tone\"\n",
    );
    write_file(&temp.path().join("shared/prompts/tone.md"), "Keep it short: {product}");

    let client = Arc::new(ScriptedLlmClient::new().reply("Short.", TokenUsage::default()));
    let registry = registry_with_llm(temp.path(), client.clone());
    registry.discover_all().unwrap();

    let mut agent = registry
        .instantiate_agent("sales", "pitch", AgentOptions::new())
        .unwrap();
    agent.execute(json!({"product": "kayaks"})).await.unwrap();

    assert_eq!(client.prompts()[0].0, "Keep it short: kayaks");
}

#[tokio::test]
async fn each_agent_reads_its_own_prompts_dir() {
    let temp = TempDir::new().unwrap();
    for (agent, text) in [("alpha", "ALPHA PROMPT"), ("beta", "BETA PROMPT")] {
        current_agent(
            temp.path(),
            "content",
            agent,
            "factory = \"prompted\"\nprompt = \"generate\"\n",
        );
        write_file(
            &temp
                .path()
                .join("teams/content/agents")
                .join(agent)
                .join("prompts/generate.md"),
            text,
        );
    }

    let client = Arc::new(
        ScriptedLlmClient::new()
            .reply("a", TokenUsage::default())
            .reply("b", TokenUsage::default()),
    );
    let registry = registry_with_llm(temp.path(), client.clone());
    registry.discover_all().unwrap();

    let mut alpha = registry
        .instantiate_agent("content", "alpha", AgentOptions::new())
        .unwrap();
    let mut beta = registry
        .instantiate_agent("content", "beta", AgentOptions::new())
        .unwrap();
    alpha.execute(json!({})).await.unwrap();
    beta.execute(json!({})).await.unwrap();

    let prompts = client.prompts();
    assert_eq!(prompts[0].0, "ALPHA PROMPT");
    assert_eq!(prompts[1].0, "BETA PROMPT");
}

#[tokio::test]
async fn log_sink_receives_agent_records() {
    let temp = TempDir::new().unwrap();
    current_agent(temp.path(), "sales", "pitch", PROMPTED_AGENT);
    let records: Arc<Mutex<Vec<LogRecord>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&records);
    let sink = Arc::new(CallbackSink::new(move |record: &LogRecord| {
        captured.lock().push(record.clone())
    }));

    let client = Arc::new(ScriptedLlmClient::new().reply("ok", TokenUsage::default()));
    let registry = registry_with_llm(temp.path(), client);
    registry.discover_all().unwrap();
    let mut agent = registry
        .instantiate_agent("sales", "pitch", AgentOptions::new().with_log_sink(sink))
        .unwrap();
    agent.execute(json!({})).await.unwrap();

    let records = records.lock();
    assert!(records.iter().all(|r| r.agent == "sales.pitch"));
    assert!(records.iter().any(|r| r.level == LogLevel::Success));
}

fn content_team(root: &Path) {
    current_agent(root, "content", "research", PROMPTED_AGENT);
    current_agent(root, "content", "writer", PROMPTED_AGENT);
    write_file(
        &root.join("teams/content/team.toml"),
        "description = \"Research then write\"\nagents = [\"research\", \"writer\"]\n",
    );
}

#[tokio::test]
async fn team_runs_members_in_order() {
    let temp = TempDir::new().unwrap();
    content_team(temp.path());
    let client = Arc::new(
        ScriptedLlmClient::new()
            .reply("{\"facts\": [\"tides are lunar\"]}", TokenUsage::single(5, 5, 10))
            .reply("A story about tides", TokenUsage::single(7, 3, 10)),
    );
    let registry = registry_with_llm(temp.path(), client.clone());
    registry.discover_all().unwrap();

    let mut team = registry.instantiate_team("content", AgentOptions::new()).unwrap();
    assert_eq!(team.roster().len(), 2);

    let output = team.execute(json!({"topic": "tides"})).await.unwrap();
    assert_eq!(output["research"]["facts"][0], "tides are lunar");
    assert_eq!(output["writer"], "A story about tides");

    // The writer sees the research output alongside the base input
    let writer_prompt = &client.prompts()[1].0;
    assert!(writer_prompt.contains("tides are lunar"));
    assert!(writer_prompt.contains("\"topic\""));

    assert_eq!(team.usage().total_tokens, 20);
    assert_eq!(team.usage().llm_calls, 2);
}

#[tokio::test]
async fn team_stops_at_first_failure() {
    let temp = TempDir::new().unwrap();
    content_team(temp.path());
    let client = Arc::new(ScriptedLlmClient::new().fail(LlmError::Transport("reset".to_string())));
    let registry = registry_with_llm(temp.path(), client.clone());
    registry.discover_all().unwrap();

    let mut team = registry.instantiate_team("content", AgentOptions::new()).unwrap();
    let err = team.execute(json!({"topic": "tides"})).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.agent, "content.research");
    assert_eq!(client.prompts().len(), 1);
}
