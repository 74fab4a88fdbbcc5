//! Shared harness for the HTTP-level tests: in-memory stand-ins for the store,
//! the generation endpoint and the PDF extractor, plus token and request helpers.

#![allow(dead_code)]

use api_lib::{
    adapters::{identity::SessionClaims, InMemoryUsageLimiter, JwtIdentityVerifier},
    config::{Config, IdentityKey},
    web::{self, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use documind_core::{
    domain::{
        Account, Document, DocumentPatch, Generation, Identity, NewDocument, Provisioned,
    },
    ports::{
        DatabaseService, PortError, PortResult, TextExtractionService, TextGenerationService,
        TextStream,
    },
    quota::QuotaPolicy,
};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "documind-test-secret";
pub const MULTIPART_BOUNDARY: &str = "documind-test-boundary";
pub const MINIMAL_PDF: &[u8] = b"%PDF-1.4\n%test\n";

//=========================================================================================
// Store
//=========================================================================================

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    documents: Vec<Document>,
    generations: Vec<Generation>,
}

/// Mirrors the Postgres schema's behaviour: owner-scoped lookups, a foreign
/// key from documents to users and cascading deletes.
#[derive(Default)]
pub struct FakeDb {
    tables: Mutex<Tables>,
}

impl FakeDb {
    pub fn account_count(&self) -> usize {
        self.tables.lock().unwrap().accounts.len()
    }

    pub fn account(&self, user_id: &str) -> Option<Account> {
        let tables = self.tables.lock().unwrap();
        tables.accounts.iter().find(|a| a.id == user_id).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.tables.lock().unwrap().documents.len()
    }

    pub fn generations(&self) -> Vec<Generation> {
        self.tables.lock().unwrap().generations.clone()
    }
}

fn not_found(document_id: Uuid) -> PortError {
    PortError::NotFound(format!("Document {} not found", document_id))
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn ensure_account(&self, identity: &Identity) -> PortResult<Provisioned> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(account) = tables.accounts.iter().find(|a| a.id == identity.user_id) {
            return Ok(Provisioned {
                account: account.clone(),
                created: false,
            });
        }
        let account = Account {
            id: identity.user_id.clone(),
            email: identity.email_or_sentinel().to_string(),
            is_pro: false,
            created_at: Utc::now(),
        };
        tables.accounts.push(account.clone());
        Ok(Provisioned {
            account,
            created: true,
        })
    }

    async fn delete_account(&self, user_id: &str) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.accounts.len();
        tables.accounts.retain(|a| a.id != user_id);
        if tables.accounts.len() == before {
            return Err(PortError::NotFound(format!("User {} not found", user_id)));
        }
        let owned: Vec<Uuid> = tables
            .documents
            .iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| d.id)
            .collect();
        tables.documents.retain(|d| d.user_id != user_id);
        tables.generations.retain(|g| !owned.contains(&g.document_id));
        Ok(())
    }

    async fn create_document(&self, owner: &str, document: &NewDocument) -> PortResult<Document> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.accounts.iter().any(|a| a.id == owner) {
            return Err(PortError::Unexpected(
                "insert violates foreign key documents_user_id_fkey".to_string(),
            ));
        }
        let doc = Document {
            id: Uuid::new_v4(),
            user_id: owner.to_string(),
            title: document.title().to_string(),
            content: document.content().to_string(),
            status: Default::default(),
            created_at: Utc::now(),
        };
        tables.documents.push(doc.clone());
        Ok(doc)
    }

    async fn list_documents(&self, owner: &str) -> PortResult<Vec<Document>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .documents
            .iter()
            .rev()
            .filter(|d| d.user_id == owner)
            .cloned()
            .collect())
    }

    async fn get_owned_document(&self, owner: &str, document_id: Uuid) -> PortResult<Document> {
        let tables = self.tables.lock().unwrap();
        tables
            .documents
            .iter()
            .find(|d| d.id == document_id && d.user_id == owner)
            .cloned()
            .ok_or_else(|| not_found(document_id))
    }

    async fn update_owned_document(
        &self,
        owner: &str,
        document_id: Uuid,
        patch: &DocumentPatch,
    ) -> PortResult<Document> {
        let mut tables = self.tables.lock().unwrap();
        let doc = tables
            .documents
            .iter_mut()
            .find(|d| d.id == document_id && d.user_id == owner)
            .ok_or_else(|| not_found(document_id))?;
        if let Some(title) = &patch.title {
            doc.title = title.clone();
        }
        if let Some(content) = &patch.content {
            doc.content = content.clone();
        }
        if let Some(status) = patch.status {
            doc.status = status;
        }
        Ok(doc.clone())
    }

    async fn delete_owned_document(&self, owner: &str, document_id: Uuid) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.documents.len();
        tables
            .documents
            .retain(|d| !(d.id == document_id && d.user_id == owner));
        if tables.documents.len() == before {
            return Err(not_found(document_id));
        }
        tables.generations.retain(|g| g.document_id != document_id);
        Ok(())
    }

    async fn create_generation(
        &self,
        owner: &str,
        document_id: Uuid,
        original_prompt: &str,
        ai_output: &str,
    ) -> PortResult<Generation> {
        let mut tables = self.tables.lock().unwrap();
        if !tables
            .documents
            .iter()
            .any(|d| d.id == document_id && d.user_id == owner)
        {
            return Err(not_found(document_id));
        }
        let generation = Generation {
            id: Uuid::new_v4(),
            document_id,
            original_prompt: original_prompt.to_string(),
            ai_output: ai_output.to_string(),
            created_at: Utc::now(),
        };
        tables.generations.push(generation.clone());
        Ok(generation)
    }

    async fn list_generations(
        &self,
        owner: &str,
        document_id: Uuid,
    ) -> PortResult<Vec<Generation>> {
        let tables = self.tables.lock().unwrap();
        let owned = tables
            .documents
            .iter()
            .any(|d| d.id == document_id && d.user_id == owner);
        if !owned {
            return Ok(Vec::new());
        }
        Ok(tables
            .generations
            .iter()
            .rev()
            .filter(|g| g.document_id == document_id)
            .cloned()
            .collect())
    }
}

//=========================================================================================
// Generation endpoint
//=========================================================================================

/// Replies with a fixed list of fragments, optionally failing after `fail_after` of them.
pub struct FakeGenerator {
    fragments: Vec<String>,
    fail_after: Option<usize>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
            fail_after: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_after(fragments: &[&str], sent: usize) -> Self {
        Self {
            fail_after: Some(sent),
            ..Self::replying(fragments)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerationService for FakeGenerator {
    async fn stream_completion(&self, prompt: &str) -> PortResult<TextStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        let mut items: Vec<PortResult<String>> = self.fragments.iter().cloned().map(Ok).collect();
        if let Some(sent) = self.fail_after {
            items.truncate(sent);
            items.push(Err(PortError::Upstream("connection reset".to_string())));
        }
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

//=========================================================================================
// Extraction
//=========================================================================================

pub struct FakeExtractor {
    text: Option<String>,
}

impl FakeExtractor {
    pub fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait]
impl TextExtractionService for FakeExtractor {
    async fn extract_text(&self, _payload: Vec<u8>) -> PortResult<String> {
        self.text
            .clone()
            .ok_or_else(|| PortError::Upstream("unreadable PDF".to_string()))
    }
}

//=========================================================================================
// App
//=========================================================================================

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        log_level: tracing::Level::DEBUG,
        redis_url: None,
        identity_key: IdentityKey::Secret(TEST_SECRET.to_string()),
        identity_issuer: None,
        llm_api_base: "http://127.0.0.1:9/unused".to_string(),
        llm_api_key: "unused".to_string(),
        completion_model: "test-model".to_string(),
        system_instruction: "test".to_string(),
        max_upload_bytes: 64 * 1024,
        quota: QuotaPolicy::default(),
        cors_origin: "http://localhost:3000".to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: Arc<FakeDb>,
    pub generator: Arc<FakeGenerator>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(
            FakeGenerator::replying(&["Hello", ", ", "world"]),
            FakeExtractor::returning("Quarterly report"),
        )
    }

    pub fn with(generator: FakeGenerator, extractor: FakeExtractor) -> Self {
        let config = Arc::new(test_config());
        let db = Arc::new(FakeDb::default());
        let generator = Arc::new(generator);
        let identity =
            JwtIdentityVerifier::from_config(&config.identity_key, None).expect("test key");

        let state = Arc::new(AppState {
            db: db.clone(),
            config: config.clone(),
            identity: Arc::new(identity),
            usage: Arc::new(InMemoryUsageLimiter::new(config.quota)),
            generator: generator.clone(),
            extractor: Arc::new(extractor),
        });

        Self {
            router: web::router(state),
            db,
            generator,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.map(|b| b.to_bytes());
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `Err` when the body was cut off mid-stream.
    pub body: Result<Bytes, axum::Error>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        let bytes = self.body.as_ref().expect("complete body");
        serde_json::from_slice(bytes).expect("json body")
    }

    pub fn text(&self) -> String {
        let bytes = self.body.as_ref().expect("complete body");
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

//=========================================================================================
// Requests
//=========================================================================================

pub fn token_for(user_id: &str, email: Option<&str>) -> String {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
        email: email.map(str::to_string),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn upload_request(
    token: &str,
    field: &str,
    file_name: Option<&str>,
    payload: &[u8],
) -> Request<Body> {
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
        None => format!("form-data; name=\"{}\"", field),
    };
    let mut body = format!(
        "--{}\r\nContent-Disposition: {}\r\nContent-Type: application/pdf\r\n\r\n",
        MULTIPART_BOUNDARY, disposition
    )
    .into_bytes();
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/documents/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Creates a blank document for `token`'s user and returns its id.
pub async fn create_document(app: &TestApp, token: &str, title: &str, content: &str) -> Uuid {
    let response = app
        .send(json_request(
            Method::POST,
            "/documents",
            Some(token),
            serde_json::json!({ "title": title, "content": content }),
        ))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    response.json()["id"].as_str().unwrap().parse().unwrap()
}
