use std::sync::Arc;
use std::time::Duration;

use auth::JwtHandler;
use auth::PasswordHasher;
use auth::WorkFactor;
use identity_service::domain::identity::models::AccessClaims;
use identity_service::domain::identity::models::Role;
use identity_service::domain::identity::service::AuthPolicy;
use identity_service::domain::identity::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::HttpOptions;
use identity_service::outbound::clock::SystemClock;
use identity_service::outbound::tokens::JwtTokenIssuer;
use identity_service::repositories::InMemoryUserRepository;
use serde_json::json;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const TEST_ISSUER: &str = "cm-api";
pub const TEST_AUDIENCE: &str = "cm-web";

/// Test application that spawns a real server backed by the in-memory store
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub jwt_handler: JwtHandler,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        // Cheap work factor keeps the suite fast
        let hasher = PasswordHasher::new(WorkFactor {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("Failed to create password hasher");
        let issuer = JwtTokenIssuer::new(TEST_SECRET, TEST_ISSUER, TEST_AUDIENCE)
            .expect("Failed to create token issuer");
        let policy = AuthPolicy {
            default_roles: vec![Role::Admin, Role::User],
            token_lifetime: chrono::Duration::hours(24),
            store_timeout: Duration::from_secs(5),
            hashing_timeout: Duration::from_secs(5),
        };

        let auth_service = Arc::new(AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(hasher),
            Arc::new(issuer),
            Arc::new(SystemClock),
            policy,
        ));

        let router = create_router(auth_service, HttpOptions::default());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::new(),
            jwt_handler: JwtHandler::new(TEST_SECRET).expect("Failed to create JWT handler"),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Register a user and return the raw response
    pub async fn register(&self, username: &str, email: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/register")
            .json(&json!({
                "username": username,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the raw response
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/api/auth/login")
            .json(&json!({
                "username": username,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log in and return the access token, panicking on failure
    pub async fn access_token(&self, username: &str, password: &str) -> String {
        let body: serde_json::Value = self
            .login(username, password)
            .await
            .json()
            .await
            .expect("Failed to parse response");

        body["data"]["access_token"]
            .as_str()
            .expect("Missing access token")
            .to_string()
    }

    /// Decode an access token with the server's signing key
    pub fn decode(&self, token: &str) -> AccessClaims {
        self.jwt_handler
            .decode(token, TEST_ISSUER, TEST_AUDIENCE)
            .expect("Failed to decode access token")
    }
}
