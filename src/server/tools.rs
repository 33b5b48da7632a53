use crate::state::AppState;
use crate::text_processor::analyze_text;
use crate::translation::{LanguageCatalog, TranslationClient};
use crate::utils::TranslatorError;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Document to analyze, given inline or as a file path")]
pub struct AnalyzeTextParams {
    #[schemars(description = "Document text (use this or file_path)")]
    pub text: Option<String>,
    #[schemars(description = "Path to a UTF-8 text file (use this or text)")]
    pub file_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters to start a translation job")]
pub struct TranslateTextParams {
    #[schemars(description = "Document text (use this or file_path)")]
    pub text: Option<String>,
    #[schemars(description = "Path to a UTF-8 text file (use this or text)")]
    pub file_path: Option<String>,
    #[schemars(description = "Target language code as listed by list_languages (e.g. 'french')")]
    pub target_language: String,
}

#[derive(Clone)]
pub struct TranslatorServer {
    state: AppState,
    client: Option<TranslationClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TranslatorServer {
    pub fn new(state: AppState, client: Option<TranslationClient>) -> Self {
        Self {
            state,
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "analyze_text",
        description = "Count words, paragraphs and sentences of a document and estimate how many chunks it will be split into. Makes no network call."
    )]
    async fn analyze_text(
        &self,
        params: Parameters<AnalyzeTextParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let text = read_source(params.text, params.file_path).await?;

        let analysis = analyze_text(&text, &self.state.config.chunking);
        json_result(&analysis)
    }

    #[tool(
        name = "list_languages",
        description = "List the target languages supported by the translation service as code -> display name."
    )]
    async fn list_languages(&self) -> Result<CallToolResult, McpError> {
        let client = self.client.as_ref().ok_or_else(|| {
            McpError::internal_error("No translation service configured", None)
        })?;

        let catalog = client.fetch_languages().await.map_err(to_mcp_error)?;
        json_result(&catalog)
    }

    #[tool(
        name = "translate_text",
        description = "Start translating a document in the background. Only one translation may run at a time. Poll get_translation_progress, then fetch get_translation_result."
    )]
    async fn translate_text(
        &self,
        params: Parameters<TranslateTextParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let text = read_source(params.text, params.file_path).await?;
        let catalog = self.language_catalog().await;

        let handle = self
            .state
            .start_translation(&text, &params.target_language, catalog.as_ref())
            .await
            .map_err(to_mcp_error)?;

        let analysis = analyze_text(&text, &self.state.config.chunking);
        let response = serde_json::json!({
            "job_id": handle.job_id,
            "status": "running",
            "word_count": analysis.word_count,
            "estimated_chunks": analysis.estimated_chunks,
            "message": "Translation started. Call get_translation_progress to follow it."
        });

        json_result(&response)
    }

    #[tool(
        name = "get_translation_progress",
        description = "Get status and chunk progress of the current or most recent translation job."
    )]
    async fn get_translation_progress(&self) -> Result<CallToolResult, McpError> {
        match self.state.jobs.snapshot().await {
            Some(snapshot) => json_result(&snapshot),
            None => Err(McpError::invalid_params("No translation job has been started", None)),
        }
    }

    #[tool(
        name = "cancel_translation",
        description = "Cancel the running translation job. Partial results are discarded."
    )]
    async fn cancel_translation(&self) -> Result<CallToolResult, McpError> {
        let job_id = self.state.jobs.cancel().await.map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Cancellation requested for job {}",
            job_id
        ))]))
    }

    #[tool(
        name = "get_translation_result",
        description = "Get the translated document and quality check of the last finished job, or its failure reason."
    )]
    async fn get_translation_result(&self) -> Result<CallToolResult, McpError> {
        if self.state.jobs.is_running().await {
            return Err(McpError::invalid_params(
                "Translation still running; check get_translation_progress",
                None,
            ));
        }

        match self.state.jobs.result().await {
            Some(result) => json_result(&result),
            None => Err(McpError::invalid_params("No finished translation job", None)),
        }
    }

    async fn language_catalog(&self) -> Option<LanguageCatalog> {
        let client = self.client.as_ref()?;
        match client.fetch_languages().await {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch language catalog, skipping validation");
                None
            }
        }
    }
}

#[tool_handler]
impl rmcp::handler::server::ServerHandler for TranslatorServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                r#"Long-form Translator MCP Server

Workflow:
1. list_languages - See supported target languages
2. analyze_text - Check word count (max 50,000 words) and chunk estimate
3. translate_text - Start a job with text or file_path and target_language
4. get_translation_progress - Poll until status is completed, failed or cancelled
5. get_translation_result - Fetch the translated document and quality verdict

cancel_translation stops a running job; its partial output is discarded."#
                    .to_string(),
            ),
        }
    }
}

async fn read_source(text: Option<String>, file_path: Option<String>) -> Result<String, McpError> {
    match (text, file_path) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| McpError::invalid_params(format!("Cannot read {}: {}", path, e), None)),
        (None, None) => Err(McpError::invalid_params(
            "Provide either text or file_path",
            None,
        )),
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn to_mcp_error(e: TranslatorError) -> McpError {
    match e {
        TranslatorError::InputTooLarge { .. }
        | TranslatorError::EmptyInputError
        | TranslatorError::UnsupportedLanguage(_)
        | TranslatorError::JobAlreadyRunning(_)
        | TranslatorError::JobNotFound => McpError::invalid_params(e.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}
