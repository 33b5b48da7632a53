use crate::translation::{ChunkRequest, ChunkTranslator, LanguageCatalog, TranslationResult};
use crate::utils::{ApiConfig, Credentials, Result, TranslatorError};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// HTTP wrapper around the remote translation service.
///
/// The underlying client keeps a cookie store so the session established by
/// [`TranslationClient::login`] is sent with every later request.
#[derive(Clone)]
pub struct TranslationClient {
    client: Client,
    api: ApiConfig,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    target_language: &'a str,
    context: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated_text: String,
    original_length: usize,
    translated_length: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthStatus {
    authenticated: bool,
}

impl TranslationClient {
    pub fn new(api: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(api.timeout())
            .cookie_store(true)
            .build()
            .map_err(|e| TranslatorError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self { client, api })
    }

    /// One remote call, no retries. Fails with `Cancelled` as soon as
    /// `cancel` fires, even mid-request.
    pub async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
        context: &str,
        cancel: &CancellationToken,
    ) -> Result<(String, usize, usize)> {
        if cancel.is_cancelled() {
            return Err(TranslatorError::Cancelled);
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(TranslatorError::Cancelled),
            result = self.call_api(text, target_language, context) => result,
        }
    }

    async fn call_api(
        &self,
        text: &str,
        target_language: &str,
        context: &str,
    ) -> Result<(String, usize, usize)> {
        let request = TranslateRequest {
            text,
            target_language,
            context,
            model: self.api.model.as_deref(),
        };

        let response = self
            .client
            .post(self.api.url(&self.api.translate_path))
            .json(&request)
            .send()
            .await
            .map_err(|e| TranslatorError::TransportError(e.to_string()))?;

        let body: TranslateResponse = read_json(check_status(response).await?).await?;

        Ok((
            body.translated_text,
            body.original_length,
            body.translated_length,
        ))
    }

    pub async fn fetch_languages(&self) -> Result<LanguageCatalog> {
        let response = self
            .client
            .get(self.api.url(&self.api.languages_path))
            .send()
            .await
            .map_err(|e| TranslatorError::TransportError(e.to_string()))?;

        let catalog: LanguageCatalog = read_json(check_status(response).await?).await?;
        debug!(languages = catalog.len(), "Fetched language catalog");
        Ok(catalog)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let response = self
            .client
            .post(self.api.url(&self.api.login_path))
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| TranslatorError::TransportError(e.to_string()))?;

        check_status(response).await?;
        info!(username = %credentials.username, "Logged in to translation service");
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        let response = self
            .client
            .post(self.api.url(&self.api.logout_path))
            .send()
            .await
            .map_err(|e| TranslatorError::TransportError(e.to_string()))?;

        check_status(response).await?;
        Ok(())
    }

    pub async fn check_auth(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.api.url(&self.api.check_auth_path))
            .send()
            .await
            .map_err(|e| TranslatorError::TransportError(e.to_string()))?;

        let status: AuthStatus = read_json(check_status(response).await?).await?;
        Ok(status.authenticated)
    }

    /// Logs in with `credentials` unless the session is already authenticated.
    pub async fn ensure_session(&self, credentials: Option<&Credentials>) -> Result<()> {
        if self.check_auth().await? {
            return Ok(());
        }
        match credentials {
            Some(credentials) => self.login(credentials).await,
            None => {
                warn!("Translation service requires login but no credentials are configured");
                Err(TranslatorError::AuthenticationError(
                    "not logged in; set TRANSLATOR_USERNAME and TRANSLATOR_PASSWORD".to_string(),
                ))
            }
        }
    }
}

#[async_trait]
impl ChunkTranslator for TranslationClient {
    async fn translate(
        &self,
        request: &ChunkRequest,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult> {
        let (translated_text, original_length, translated_length) = self
            .translate_text(
                &request.text,
                &request.target_language,
                &request.context,
                cancel,
            )
            .await?;

        Ok(TranslationResult {
            chunk_index: request.chunk_index,
            translated_text,
            original_length,
            translated_length,
        })
    }
}

/// Maps non-success statuses onto the error taxonomy. 401/403 become
/// `AuthenticationError`; the body's `error` field is used when present.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| format!("request failed with status {}", status.as_u16()));

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(TranslatorError::AuthenticationError(message));
    }

    Err(TranslatorError::HttpError {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_json_media_type(&content_type) {
        return Err(TranslatorError::MalformedResponseError(format!(
            "expected a JSON response, got content type '{}'",
            content_type
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| TranslatorError::TransportError(e.to_string()))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| TranslatorError::MalformedResponseError(e.to_string()))
}

fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
