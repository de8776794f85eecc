//! Embed-parameter handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use vista_core::model::EmbedParams;
use vista_core::widget::WidgetConfig;
use vista_core::{DatasetId, Error, Identifier, ReportId, WorkspaceId};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportPath {
    pub workspace_id: String,
    pub report_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct EmbedQuery {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub additional_dataset_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEmbedRequest {
    pub report_ids: Vec<String>,
    #[serde(default)]
    pub additional_dataset_ids: Vec<String>,
}

/// Required identifier: malformed or nil is a bad request.
fn parse_id<T: Identifier>(raw: &str, what: &str) -> Result<T, ApiError> {
    optional_id(raw, what)?
        .ok_or_else(|| ApiError(Error::InvalidRequest(format!("{what} id is required"))))
}

/// Optional identifier: blank or nil means absent.
fn optional_id<T: Identifier>(raw: &str, what: &str) -> Result<Option<T>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(|id| id.non_nil())
        .map_err(|_| ApiError(Error::InvalidRequest(format!("invalid {what} id: {raw}"))))
}

fn rejected(body_text: String) -> ApiError {
    ApiError(Error::InvalidRequest(body_text))
}

async fn single_report(
    state: &AppState,
    path: ReportPath,
    query: EmbedQuery,
) -> Result<EmbedParams, ApiError> {
    let workspace_id: WorkspaceId = parse_id(&path.workspace_id, "workspace")?;
    let report_id: ReportId = parse_id(&path.report_id, "report")?;
    let additional_dataset_id: Option<DatasetId> = match query.additional_dataset_id.as_deref() {
        Some(raw) => optional_id(raw, "dataset")?,
        None => None,
    };
    let username = query.username.unwrap_or_default();

    let params = state
        .embed
        .embed_params_for_report(
            workspace_id,
            report_id,
            &username,
            additional_dataset_id,
            &state.call_context(),
        )
        .await?;

    info!(%workspace_id, %report_id, "Served embed params");
    Ok(params)
}

pub async fn get_embed_params(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ReportPath>,
    query: Result<Query<EmbedQuery>, QueryRejection>,
) -> Result<Json<EmbedParams>, ApiError> {
    let Query(query) = query.map_err(|e| rejected(e.body_text()))?;
    single_report(&state, path, query).await.map(Json)
}

pub async fn get_widget_config(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ReportPath>,
    query: Result<Query<EmbedQuery>, QueryRejection>,
) -> Result<Json<WidgetConfig>, ApiError> {
    let Query(query) = query.map_err(|e| rejected(e.body_text()))?;
    let params = single_report(&state, path, query).await?;
    WidgetConfig::for_report(&params, 0)
        .map(Json)
        .ok_or_else(|| {
            ApiError(Error::TokenGenerationFailure(
                "embed params carried no report".to_string(),
            ))
        })
}

pub async fn batch_embed_params(
    State(state): State<Arc<AppState>>,
    Path(workspace_id): Path<String>,
    request: Result<Json<BatchEmbedRequest>, JsonRejection>,
) -> Result<Json<EmbedParams>, ApiError> {
    let Json(request) = request.map_err(|e| rejected(e.body_text()))?;
    let workspace_id: WorkspaceId = parse_id(&workspace_id, "workspace")?;
    let report_ids = request
        .report_ids
        .iter()
        .map(|raw| parse_id::<ReportId>(raw, "report"))
        .collect::<Result<Vec<_>, _>>()?;
    let mut additional_dataset_ids = Vec::with_capacity(request.additional_dataset_ids.len());
    for raw in &request.additional_dataset_ids {
        additional_dataset_ids.extend(optional_id::<DatasetId>(raw, "dataset")?);
    }

    let params = state
        .embed
        .embed_params_for_reports(
            workspace_id,
            &report_ids,
            &additional_dataset_ids,
            &state.call_context(),
        )
        .await?;

    info!(%workspace_id, reports = report_ids.len(), "Served batch embed params");
    Ok(Json(params))
}
