use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use gateway_adapters::traits::{ApiError, ApiResult, GeneratedImage, ImageModel, UserApi};
use gateway_primitives::Principal;
use gateway_session::builtin::default_catalog;
use gateway_session::SessionInitializer;
use gateway_tools::content::ContentBlock;
use gateway_tools::registry::{SessionRegistry, ToolError};
use serde_json::{Value, json};
use tokio::sync::Mutex;

struct MockUserApi {
    calls: AtomicUsize,
    seen_tokens: Mutex<Vec<String>>,
}

impl MockUserApi {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen_tokens: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl UserApi for MockUserApi {
    async fn authenticated_user(&self, token: &str) -> ApiResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().await.push(token.to_owned());
        Ok(json!({ "login": "octocat", "id": 583231 }))
    }
}

struct MockImageModel {
    calls: AtomicUsize,
    last_steps: AtomicI64,
}

impl MockImageModel {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_steps: AtomicI64::new(-1),
        }
    }
}

#[async_trait]
impl ImageModel for MockImageModel {
    async fn generate(&self, _prompt: &str, steps: i64) -> ApiResult<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_steps.store(steps, Ordering::SeqCst);
        Ok(GeneratedImage::new("aGVsbG8=", "image/jpeg"))
    }
}

struct Fixture {
    user_api: Arc<MockUserApi>,
    image_model: Arc<MockImageModel>,
    initializer: SessionInitializer,
}

fn fixture(allow_list: Option<&str>) -> Fixture {
    let user_api = Arc::new(MockUserApi::new());
    let image_model = Arc::new(MockImageModel::new());
    let catalog = default_catalog(
        Arc::clone(&user_api) as Arc<dyn UserApi>,
        Arc::clone(&image_model) as Arc<dyn ImageModel>,
    )
    .expect("catalog");
    Fixture {
        user_api,
        image_model,
        initializer: SessionInitializer::new(catalog, allow_list),
    }
}

fn session(fixture: &Fixture, login: &str) -> SessionRegistry {
    let principal = Principal::new(login, format!("token-{login}")).expect("principal");
    fixture.initializer.initialize(principal)
}

#[tokio::test]
async fn add_returns_single_text_block() {
    let fixture = fixture(None);
    let registry = session(&fixture, "anyone");

    let output = registry
        .invoke("add", json!({ "a": 2, "b": 3 }))
        .await
        .expect("invoke");

    assert_eq!(output.content(), &[ContentBlock::text("5")]);
}

#[tokio::test]
async fn gated_tool_is_absent_for_unlisted_login() {
    let fixture = fixture(Some("alice, bob"));
    let registry = session(&fixture, "mallory");

    let names: Vec<_> = registry
        .list()
        .into_iter()
        .map(|listing| listing.name().to_owned())
        .collect();
    assert_eq!(names, vec!["add", "user_info"]);

    let err = registry
        .invoke("generate_image", json!({ "prompt": "a cat" }))
        .await
        .expect_err("absent tool");
    assert!(matches!(err, ToolError::UnknownTool { .. }));
    assert_eq!(fixture.image_model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn gated_tool_is_invocable_for_listed_login() {
    let fixture = fixture(Some("alice, bob"));
    let registry = session(&fixture, "alice");

    assert!(registry.contains("generate_image"));

    let output = registry
        .invoke("generate_image", json!({ "prompt": "a cat", "steps": 8 }))
        .await
        .expect("invoke");

    assert_eq!(
        output.content(),
        &[ContentBlock::image("aGVsbG8=", "image/jpeg")]
    );
    assert_eq!(fixture.image_model.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.image_model.last_steps.load(Ordering::SeqCst), 8);
}

#[tokio::test]
async fn out_of_range_steps_never_reach_the_backend() {
    let fixture = fixture(Some("alice"));
    let registry = session(&fixture, "alice");

    for steps in [3, 9] {
        let err = registry
            .invoke("generate_image", json!({ "prompt": "a cat", "steps": steps }))
            .await
            .expect_err("out of range");
        match err {
            ToolError::Schema(violation) => assert_eq!(violation.field(), "steps"),
            other => panic!("expected schema violation, got {other}"),
        }
    }

    assert_eq!(fixture.image_model.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn omitted_steps_default_to_four() {
    let fixture = fixture(Some("alice"));
    let registry = session(&fixture, "alice");

    registry
        .invoke("generate_image", json!({ "prompt": "a cat" }))
        .await
        .expect("invoke");

    assert_eq!(fixture.image_model.last_steps.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn user_info_forwards_the_session_token() {
    let fixture = fixture(None);
    let registry = session(&fixture, "octocat");

    let output = registry
        .invoke("user_info", Value::Null)
        .await
        .expect("invoke");

    let [ContentBlock::Text { text }] = output.content() else {
        panic!("expected one text block");
    };
    let user: Value = serde_json::from_str(text).expect("json");
    assert_eq!(user["login"], "octocat");

    let tokens = fixture.user_api.seen_tokens.lock().await;
    assert_eq!(tokens.as_slice(), &["token-octocat".to_owned()]);
}

#[tokio::test]
async fn concurrent_invocations_produce_independent_results() {
    let fixture = fixture(None);
    let registry = Arc::new(session(&fixture, "anyone"));

    let mut handles = Vec::new();
    for (a, b) in [(1, 2), (10, 20), (100, 200), (7, 11)] {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let output = registry
                .invoke("add", json!({ "a": a, "b": b }))
                .await
                .expect("invoke");
            (a + b, output)
        }));
    }

    for handle in handles {
        let (expected, output) = handle.await.expect("join");
        assert_eq!(output.content(), &[ContentBlock::text(expected.to_string())]);
    }
}

struct FailingImageModel;

#[async_trait]
impl ImageModel for FailingImageModel {
    async fn generate(&self, _prompt: &str, _steps: i64) -> ApiResult<GeneratedImage> {
        Err(ApiError::Status {
            status: 503,
            body: "backend unavailable".into(),
        })
    }
}

#[tokio::test]
async fn downstream_failure_surfaces_as_execution_error() {
    let user_api = Arc::new(MockUserApi::new());
    let catalog = default_catalog(user_api, Arc::new(FailingImageModel)).expect("catalog");
    let initializer = SessionInitializer::new(catalog, Some("alice"));
    let registry = initializer.initialize(Principal::new("alice", "t").expect("principal"));

    let err = registry
        .invoke("generate_image", json!({ "prompt": "a cat" }))
        .await
        .expect_err("backend failure");
    assert!(matches!(err, ToolError::Execution { .. }));
}
