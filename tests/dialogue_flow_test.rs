use httpmock::prelude::*;
use saphire::app::{report, scenarios};
use saphire::domain::ports::DialogueStore;
use saphire::{build_panel, ConversationEngine, CouncilConfig, ModelKind, Panel, SaphireError, SqliteStore};
use tempfile::TempDir;

const OPENAI_REPLY: &str = "Предлагаю облачную платформу с адаптивными курсами, где каждый ребёнок \
    получает задания по своему уровню, а учитель видит прогресс класса в реальном времени и может \
    быстро скорректировать программу обучения.";
const OLLAMA_REPLY: &str = "Важно строить обучение через игру и короткие проекты, чтобы дети учились \
    сотрудничать, задавать вопросы и самостоятельно находить ответы, а наставник мягко направлял их \
    к цели урока.";
const GIGACHAT_REPLY: &str = "Интерфейс должен быть простым и ярким, с крупными кнопками, понятными \
    подсказками и голосовым сопровождением, чтобы даже младшие школьники могли пользоваться \
    платформой без помощи взрослых.";

async fn mock_backends(server: &MockServer, ollama_reply: &str, gigachat_reply: &str) {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/openai/v1/chat/completions");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": OPENAI_REPLY}}]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200)
                .json_body(serde_json::json!({"response": ollama_reply, "done": true}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth");
            then.status(200).json_body(serde_json::json!({
                "access_token": "token",
                "expires_at": (chrono::Utc::now() + chrono::TimeDelta::hours(1)).timestamp_millis()
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/giga/chat/completions");
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": gigachat_reply}}]
            }));
        })
        .await;
}

fn config_for(server: &MockServer, db_path: &str) -> CouncilConfig {
    let toml_content = format!(
        r#"
[openai]
api_key = "sk-test"
base_url = "{openai}"

[ollama]
base_url = "{ollama}"

[gigachat]
credentials = "Y3JlZHM="
base_url = "{giga}"
auth_url = "{auth}"

[storage]
database_path = "{db}"

[dialogue]
rounds = 2

[retry]
attempts = 0
"#,
        openai = server.url("/openai/v1"),
        ollama = server.base_url(),
        giga = server.url("/giga"),
        auth = server.url("/oauth"),
        db = db_path.replace('\\', "/"),
    );

    CouncilConfig::from_toml_str(&toml_content).unwrap()
}

#[tokio::test]
async fn test_task_solving_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("saphire.db");
    let server = MockServer::start_async().await;
    mock_backends(&server, OLLAMA_REPLY, GIGACHAT_REPLY).await;

    let config = config_for(&server, db_path.to_str().unwrap());
    let panel = Panel::new(build_panel(&config).unwrap());
    let engine = ConversationEngine::new(SqliteStore::open(config.database_path()).unwrap(), panel);

    let report = engine.run(scenarios::task_solving(&config).as_ref()).await.unwrap();

    assert!(report.test_name.starts_with("task_solving_"));
    assert_eq!(report.entries, 7);

    let rows = engine.store().get_dialogue(&report.test_name).unwrap();
    let summary: Vec<(&str, &str)> = rows
        .iter()
        .map(|r| (r.model_name.as_str(), r.message_type.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("system", "task"),
            ("openai", "aspect_response"),
            ("ollama", "aspect_response"),
            ("gigachat", "aspect_response"),
            ("openai", "final_response"),
            ("ollama", "final_response"),
            ("gigachat", "final_response"),
        ]
    );
    assert_eq!(rows[3].aspect.as_deref(), Some("user experience aspect"));
    assert_eq!(rows[5].message_content, OLLAMA_REPLY);

    let rendered = report::view_latest(engine.store(), 5).unwrap();
    assert!(rendered.contains(&format!("=== Test: {} ===", report.test_name)));
    assert!(rendered.contains("Aspect: technical aspect of the platform"));
}

#[tokio::test]
async fn test_russian_dialogue_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("dialogues.db");
    let server = MockServer::start_async().await;
    mock_backends(&server, OLLAMA_REPLY, GIGACHAT_REPLY).await;

    let mut config = config_for(&server, db_path.to_str().unwrap());
    config.dialogue.models = Some(vec![ModelKind::Ollama, ModelKind::GigaChat]);

    let panel = Panel::new(build_panel(&config).unwrap());
    let engine = ConversationEngine::new(SqliteStore::open(config.database_path()).unwrap(), panel);

    let report = engine.run(scenarios::russian_dialogue(&config).as_ref()).await.unwrap();

    // topic + 2 rounds x 2 models
    assert_eq!(report.entries, 5);
    let rows = engine.store().get_dialogue(&report.test_name).unwrap();
    assert_eq!(rows[0].message_type, "topic");
    assert!(rows[1..].iter().all(|r| r.message_type == "response"));
    assert_eq!(rows[4].model_name, "gigachat");
}

#[tokio::test]
async fn test_english_reply_fails_run_and_nothing_is_stored() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("saphire.db");
    let server = MockServer::start_async().await;
    mock_backends(&server, "Sure, here is my idea in English.", GIGACHAT_REPLY).await;

    let config = config_for(&server, db_path.to_str().unwrap());
    let panel = Panel::new(build_panel(&config).unwrap());
    let engine = ConversationEngine::new(SqliteStore::open(config.database_path()).unwrap(), panel);

    let err = engine
        .run(scenarios::russian_dialogue(&config).as_ref())
        .await
        .unwrap_err();

    match err {
        SaphireError::CheckFailed { model, check, .. } => {
            assert_eq!(model, "ollama");
            assert_eq!(check, "has_cyrillic");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(engine.store().latest_runs(5).unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_is_reported_as_failed_check() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("saphire.db");

    let mut config = CouncilConfig::default();
    config.ollama.base_url = Some("http://127.0.0.1:9".to_string());
    config.storage.database_path = Some(db_path.to_str().unwrap().to_string());
    config.dialogue.models = Some(vec![ModelKind::Ollama]);
    config.retry.attempts = Some(0);

    let panel = Panel::new(build_panel(&config).unwrap());
    let engine = ConversationEngine::new(SqliteStore::open(config.database_path()).unwrap(), panel);

    let err = engine
        .run(scenarios::russian_dialogue(&config).as_ref())
        .await
        .unwrap_err();

    assert!(matches!(err, SaphireError::CheckFailed { .. }));
}

#[tokio::test]
async fn test_duplicate_final_replies_are_saved_then_reported() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("saphire.db");
    let server = MockServer::start_async().await;
    mock_backends(&server, OLLAMA_REPLY, OPENAI_REPLY).await;

    let config = config_for(&server, db_path.to_str().unwrap());
    let panel = Panel::new(build_panel(&config).unwrap());
    let engine = ConversationEngine::new(SqliteStore::open(config.database_path()).unwrap(), panel);

    let err = engine
        .run(scenarios::task_solving(&config).as_ref())
        .await
        .unwrap_err();

    match err {
        SaphireError::CheckFailed { model, check, .. } => {
            assert_eq!(model, "gigachat");
            assert_eq!(check, "all_unique");
        }
        other => panic!("unexpected error: {}", other),
    }

    let runs = engine.store().latest_runs(5).unwrap();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].test_name.starts_with("task_solving_"));
    assert_eq!(engine.store().get_dialogue(&runs[0].test_name).unwrap().len(), 7);
}

#[tokio::test]
async fn test_backend_error_in_russian_fails_run() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("saphire.db");
    let server = MockServer::start_async().await;
    let generate = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(500).body("Внутренняя ошибка сервера");
        })
        .await;

    let mut config = config_for(&server, db_path.to_str().unwrap());
    config.dialogue.models = Some(vec![ModelKind::Ollama]);
    config.dialogue.rounds = Some(1);

    let panel = Panel::new(build_panel(&config).unwrap());
    let engine = ConversationEngine::new(SqliteStore::open(config.database_path()).unwrap(), panel);

    let err = engine
        .run(scenarios::russian_dialogue(&config).as_ref())
        .await
        .unwrap_err();

    match err {
        SaphireError::CheckFailed { model, check, .. } => {
            assert_eq!(model, "ollama");
            assert_eq!(check, "backend_ok");
        }
        other => panic!("unexpected error: {}", other),
    }
    generate.assert_hits_async(1).await;
    assert!(engine.store().latest_runs(5).unwrap().is_empty());
}
