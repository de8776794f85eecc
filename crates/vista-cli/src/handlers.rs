//! Command handlers.

use anyhow::{Context, anyhow};
use secrecy::ExposeSecret;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vista_api::{AppState, create_router};
use vista_auth::{AadTokenProvider, TokenProvider};
use vista_core::config::Settings;
use vista_core::{CallContext, DatasetId, Identifier, ReportId, WorkspaceId};
use vista_embed::EmbedService;

/// Load and validate settings, applying the `--timeout` override.
pub fn load_settings(path: Option<&Path>, timeout_secs: Option<u64>) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(path).context("Failed to load configuration")?;
    if let Some(secs) = timeout_secs {
        settings.server.request_timeout_secs = secs;
        settings.validate()?;
    }
    Ok(settings)
}

fn token_provider(settings: &Settings, http: reqwest::Client) -> AadTokenProvider {
    AadTokenProvider::new(Arc::new(settings.azure_ad.clone()), http)
        .with_cache_policy(settings.token_cache.policy())
}

fn embed_service(settings: &Settings) -> EmbedService {
    let http = reqwest::Client::new();
    EmbedService::new(
        Arc::new(token_provider(settings, http.clone())),
        Arc::new(settings.power_bi.clone()),
        http,
    )
}

/// Call context bounded by the configured budget and cancelled on Ctrl-C.
fn call_context(settings: &Settings) -> CallContext {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    CallContext::with_timeout(settings.server.request_timeout()).with_cancellation(cancel)
}

fn resolve_workspace(settings: &Settings, workspace: Option<WorkspaceId>) -> anyhow::Result<WorkspaceId> {
    workspace
        .or(settings.power_bi.default_workspace_id)
        .and_then(|id| id.non_nil())
        .ok_or_else(|| anyhow!("No workspace given and power_bi.default_workspace_id is not set"))
}

fn resolve_report(settings: &Settings, report: Option<ReportId>) -> anyhow::Result<ReportId> {
    report
        .or(settings.power_bi.default_report_id)
        .and_then(|id| id.non_nil())
        .ok_or_else(|| anyhow!("No report given and power_bi.default_report_id is not set"))
}

/// Run the HTTP API server until Ctrl-C.
pub async fn serve(settings: Settings, bind: Option<String>) -> anyhow::Result<()> {
    let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
    let state = AppState::new(
        Arc::new(embed_service(&settings)),
        settings.server.request_timeout(),
    );
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!(%bind, "Vista API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await?;
    Ok(())
}

/// Print embed parameters for one report.
pub async fn embed(
    settings: &Settings,
    workspace: Option<WorkspaceId>,
    report: Option<ReportId>,
    user: &str,
    additional_dataset: Option<DatasetId>,
) -> anyhow::Result<()> {
    let workspace_id = resolve_workspace(settings, workspace)?;
    let report_id = resolve_report(settings, report)?;

    let params = embed_service(settings)
        .embed_params_for_report(
            workspace_id,
            report_id,
            user,
            additional_dataset.and_then(|id| id.non_nil()),
            &call_context(settings),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

/// Print embed parameters for several reports under one token.
pub async fn embed_batch(
    settings: &Settings,
    workspace: Option<WorkspaceId>,
    reports: &[ReportId],
    additional_datasets: &[DatasetId],
) -> anyhow::Result<()> {
    let workspace_id = resolve_workspace(settings, workspace)?;

    let params = embed_service(settings)
        .embed_params_for_reports(
            workspace_id,
            reports,
            additional_datasets,
            &call_context(settings),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

/// Mint a service-principal token and describe it without printing it.
pub async fn token(settings: &Settings) -> anyhow::Result<()> {
    let provider = token_provider(settings, reqwest::Client::new());
    let token = provider.access_token(&call_context(settings)).await?;

    println!("provider:   {}", provider.name());
    println!("token_type: {}", token.token_type);
    println!("length:     {}", token.access_token().expose_secret().len());
    match token.expires_at {
        Some(expires_at) => println!("expires_at: {}", expires_at.to_rfc3339()),
        None => println!("expires_at: unknown"),
    }
    Ok(())
}

/// Print the effective configuration with secrets redacted.
pub fn show_config(settings: &Settings) -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(settings)?);
    Ok(())
}
