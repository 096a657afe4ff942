#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use lectern::router::init_router;
use lectern::state::AppState;
use async_trait::async_trait;
use lectern_auth::{ExternalIdentity, IdentityError, IdentityProvider, create_access_token};
use lectern_config::{CookieConfig, CorsConfig, JwtConfig, StudioConfig};
use lectern_core::hash_password;
use lectern_db::{DocumentStore, MemoryStore};
use lectern_models::{Course, CreateCourseDto, User, UserRole};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "testpass123";

#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect()
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// Identity provider that accepts tokens of the form `valid:<subject>:<email>`.
pub struct StaticIdentityProvider;

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    fn provider(&self) -> &'static str {
        "google"
    }

    async fn verify(&self, token: &str) -> Result<ExternalIdentity, IdentityError> {
        match token.split(':').collect::<Vec<_>>().as_slice() {
            ["valid", subject, email] => Ok(ExternalIdentity {
                subject: subject.to_string(),
                email: email.to_string(),
                name: "Linked User".to_string(),
            }),
            _ => Err(IdentityError::Rejected("unrecognized token".to_string())),
        }
    }
}

pub fn identity_token(subject: &str, email: &str) -> String {
    format!("valid:{}:{}", subject, email)
}

pub fn test_state(store: Arc<dyn DocumentStore>) -> AppState {
    AppState {
        store,
        jwt_config: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiry: 3600,
        },
        cookie_config: CookieConfig {
            name: "token".to_string(),
            secure: false,
            max_age: 3600,
        },
        cors_config: CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        studio_config: StudioConfig {
            link_base: "http://localhost:5173/studio".to_string(),
        },
        identity_provider: Arc::new(StaticIdentityProvider),
    }
}

pub fn setup_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let state = test_state(store.clone());
    TestApp {
        router: init_router(state.clone()),
        store,
        state,
    }
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}

pub fn build_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn token_for(state: &AppState, user: &User, role: UserRole) -> String {
    create_access_token(user.id.into_inner(), role.as_str(), &state.jwt_config).unwrap()
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.send(build_request(method, uri, token, body)).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        send(&self.router, request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.request(Method::POST, uri, token, body).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub fn token_for(&self, user: &User) -> String {
        self.token_with_role(user, user.role)
    }

    /// A token whose `role` claim may disagree with the stored user.
    pub fn token_with_role(&self, user: &User, role: UserRole) -> String {
        token_for(&self.state, user, role)
    }

    /// Inserts a user without a password and returns it with a valid token.
    pub async fn create_user(&self, name: &str, role: UserRole) -> (User, String) {
        let user = User::new(name, generate_unique_email(), None, role);
        self.store.insert_user(&user).await.unwrap();
        let token = self.token_for(&user);
        (user, token)
    }

    /// Inserts a user that can log in with [`TEST_PASSWORD`].
    pub async fn create_user_with_password(&self, name: &str, role: UserRole) -> User {
        let hash = hash_password(TEST_PASSWORD).unwrap();
        let user = User::new(name, generate_unique_email(), Some(hash), role);
        self.store.insert_user(&user).await.unwrap();
        user
    }

    /// Inserts a course owned by `teacher` with both sides of the ownership written.
    pub async fn create_course(&self, teacher: &User, title: &str, category: &str) -> Course {
        let course = Course::new(
            teacher.id,
            CreateCourseDto {
                title: title.to_string(),
                description: format!("{} description", title),
                category: category.to_string(),
            },
        );
        self.store.insert_course(&course).await.unwrap();
        self.store
            .add_created_course(teacher.id, course.id)
            .await
            .unwrap();
        course
    }

    pub async fn stored_user(&self, user: &User) -> User {
        self.store.find_user(user.id).await.unwrap().unwrap()
    }

    pub async fn stored_course(&self, course: &Course) -> Option<Course> {
        self.store.find_course(course.id).await.unwrap()
    }
}
