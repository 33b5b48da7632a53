use longform_translator::translation::{validate_language, Orchestrator, TranslationJob};
use longform_translator::utils::Credentials;
use longform_translator::{AppConfig, AppState, HttpState, TranslationClient, TranslatorServer};
use rmcp::{transport::stdio, ServiceExt};
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let config = AppConfig::load_or_default(Some("config.toml"));

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(
            format!("longform_translator={}", config.logging.level).parse()?,
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        "Loaded configuration: {} (endpoint {})",
        config.server.name,
        config.api.base_url
    );

    let client = TranslationClient::new(config.api.clone())?;
    let credentials = Credentials::from_env();
    if let Err(e) = client.ensure_session(credentials.as_ref()).await {
        tracing::warn!(error = %e, "Translation service session not established");
    }

    let app_state = AppState::new(config.clone(), Arc::new(client.clone()));

    match args.get(1).map(|s| s.as_str()) {
        Some("--http") => {
            let port = args
                .get(2)
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(9527);
            let bind_addr = args.get(3).map(|s| s.as_str()).unwrap_or("0.0.0.0");

            let state = HttpState {
                app: app_state,
                client: Some(client.clone()),
            };
            longform_translator::server::http::serve(state, bind_addr, port).await?;
        }
        Some("translate") => {
            let (Some(path), Some(language)) = (args.get(2), args.get(3)) else {
                anyhow::bail!("usage: longform-translator translate <file> <language>");
            };
            translate_file(&config, &client, path, language).await?;
        }
        _ => {
            tracing::info!("Starting MCP Server on stdio");
            let server = TranslatorServer::new(app_state, Some(client.clone()));
            let service = server.serve(stdio()).await?;
            service.waiting().await?;
        }
    }

    if credentials.is_some() {
        let _ = client.logout().await;
    }

    tracing::info!("Translator shutting down");
    Ok(())
}

/// Runs one job in the foreground and prints the translation to stdout.
async fn translate_file(
    config: &AppConfig,
    client: &TranslationClient,
    path: &str,
    language: &str,
) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(path).await?;

    match client.fetch_languages().await {
        Ok(catalog) => validate_language(&catalog, language)?,
        Err(e) => tracing::warn!(error = %e, "Could not fetch language catalog"),
    }

    let mut job = TranslationJob::new(&text, language);
    let orchestrator = Orchestrator::new(Arc::new(client.clone()), config.job_config(language));

    let cancel = job.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling translation");
            cancel.cancel();
        }
    });

    let assembled = orchestrator
        .run_with_progress(&mut job, |progress| {
            tracing::info!(
                "Translated {}/{} chunks",
                progress.completed_chunks,
                progress.total_chunks
            );
        })
        .await?;

    tracing::info!(
        ratio = assembled.quality.ratio,
        "Quality check: {}",
        assembled.quality.verdict
    );
    println!("{}", assembled.text);
    Ok(())
}
