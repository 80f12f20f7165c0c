//! Pickup line backend HTTP client.

use pickup_core::{
    async_trait, ApiError, GenerateRequest, Generated, HistoryPage, HistoryQuery, ModelCatalog,
    ModelDescriptor, PickupApi, RecordUpdate, Settings, StatsSnapshot,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;

/// Error body returned by the backend.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Credentials for `/auth/login`.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Body for `/auth/register`.
#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Response of login and register.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    user_id: Option<String>,
}

/// The authenticated user, as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Client for the pickup line backend.
///
/// Thin facade over `reqwest`: attaches the bearer token, maps non-success
/// statuses to [`ApiError`] and decodes JSON bodies. No retries are made.
#[derive(Clone)]
pub struct PickupClient {
    http: Client,
    config: ClientConfig,
}

impl PickupClient {
    /// Create a client. No request is made until the first call.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        debug!("PickupClient created for {}", config.base_url);

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`ClientConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Log in and return a client carrying the issued token.
    pub async fn login(
        config: ClientConfig,
        username: &str,
        password: &str,
    ) -> Result<Self, ApiError> {
        let anonymous = Self::new(ClientConfig {
            token: None,
            ..config
        })?;
        let response: TokenResponse = anonymous
            .post("/auth/login", Some(&LoginRequest { username, password }))
            .await?;

        info!(
            "Logged in as {} (user id: {})",
            username,
            response.user_id.as_deref().unwrap_or("unknown")
        );
        Ok(anonymous.with_token(response.access_token))
    }

    /// Register a new account and return a client carrying its token.
    pub async fn register(
        config: ClientConfig,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, ApiError> {
        let anonymous = Self::new(ClientConfig {
            token: None,
            ..config
        })?;
        let response: TokenResponse = anonymous
            .post(
                "/auth/register",
                Some(&RegisterRequest {
                    username,
                    email,
                    password,
                }),
            )
            .await?;

        info!("Registered account {}", username);
        Ok(anonymous.with_token(response.access_token))
    }

    /// Same client with a different bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// The token currently attached to requests.
    pub fn token(&self) -> Option<&str> {
        self.config.token.as_deref()
    }

    /// Fetch the authenticated user.
    pub async fn me(&self) -> Result<CurrentUser, ApiError> {
        self.get("/auth/me").await
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `GET` a JSON resource.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let request = self.http.get(self.config.url(path));
        self.execute("GET", path, request).await
    }

    /// `GET` a JSON resource with query parameters.
    pub async fn get_with_query<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<R, ApiError> {
        let request = self.http.get(self.config.url(path)).query(query);
        self.execute("GET", path, request).await
    }

    /// `POST` an optional JSON body.
    pub async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<R, ApiError> {
        let mut request = self.http.post(self.config.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute("POST", path, request).await
    }

    /// `PUT` a JSON body.
    pub async fn put<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let request = self.http.put(self.config.url(path)).json(body);
        self.execute("PUT", path, request).await
    }

    /// `DELETE` a resource.
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let request = self.http.delete(self.config.url(path));
        self.execute("DELETE", path, request).await
    }

    /// Attach credentials, send, and decode the response.
    async fn execute<R: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        mut request: RequestBuilder,
    ) -> Result<R, ApiError> {
        if let Some(ref token) = self.config.token {
            request = request.bearer_auth(token);
        }

        debug!("{} {}", method, path);

        let response = request.send().await.map_err(|e| {
            warn!("{} {} failed: {}", method, path, e);
            transport_error(e)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!(
                "{} {} returned {}: {}",
                method,
                path,
                status.as_u16(),
                message.as_deref().unwrap_or("<no message>")
            );
            return Err(ApiError::from_status(status.as_u16(), message));
        }

        decode_body(&body)
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(err.to_string())
    }
}

/// Server message from an error body: `error`, then `message`.
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .or(parsed.message)
        .filter(|message| !message.trim().is_empty())
}

fn decode_body<R: DeserializeOwned>(body: &str) -> Result<R, ApiError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn encode(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl PickupApi for PickupClient {
    async fn generate(&self, request: GenerateRequest) -> Result<Generated, ApiError> {
        self.post("/pickup/generate", Some(&request)).await
    }

    async fn regenerate(&self, history_id: &str) -> Result<Generated, ApiError> {
        self.post::<(), _>(&format!("/pickup/regenerate/{}", encode(history_id)), None)
            .await
    }

    async fn update_record(&self, id: &str, update: RecordUpdate) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post(&format!("/pickup/rate/{}", encode(id)), Some(&update))
            .await?;
        Ok(())
    }

    async fn list_history(&self, query: &HistoryQuery) -> Result<HistoryPage, ApiError> {
        self.get_with_query("/history/", &query.to_pairs()).await
    }

    async fn delete_history(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self.delete(&format!("/history/{}", encode(id))).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<StatsSnapshot, ApiError> {
        self.get("/history/stats").await
    }

    async fn settings(&self) -> Result<Settings, ApiError> {
        self.get("/settings/").await
    }

    async fn update_settings(&self, settings: &Settings) -> Result<(), ApiError> {
        let _: serde_json::Value = self.put("/settings/", settings).await?;
        Ok(())
    }

    async fn models(&self) -> Result<Vec<ModelDescriptor>, ApiError> {
        let catalog: ModelCatalog = self.get("/settings/models").await?;
        Ok(catalog.models)
    }

    fn name(&self) -> &str {
        "PickupClient"
    }
}

impl std::fmt::Debug for PickupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickupClient")
            .field("config", &self.config)
            .finish()
    }
}
