//! Embed-credential orchestration.

use crate::client::PowerBiClient;
use crate::request::{TokenRequest, TokenRequestBody};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use vista_auth::TokenProvider;
use vista_core::config::PowerBiConfig;
use vista_core::model::{EffectiveIdentity, EmbedParams, EmbedToken, ReportKind};
use vista_core::{CallContext, DatasetId, Error, Identifier, ReportId, Result, WorkspaceId};

/// Issues embed parameters and embed tokens for reports.
///
/// The service holds no per-call state: every operation mints its own bearer
/// token and builds its own [`PowerBiClient`], so concurrent calls never share
/// a credential unless the token provider's cache policy says so.
pub struct EmbedService {
    tokens: Arc<dyn TokenProvider>,
    config: Arc<PowerBiConfig>,
    http: reqwest::Client,
}

impl EmbedService {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        config: Arc<PowerBiConfig>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            tokens,
            config,
            http,
        }
    }

    pub fn config(&self) -> &PowerBiConfig {
        &self.config
    }

    async fn client(&self, ctx: &CallContext) -> Result<PowerBiClient> {
        let bearer = self.tokens.access_token(ctx).await?;
        debug!(provider = self.tokens.name(), "Bearer token acquired");
        Ok(PowerBiClient::new(
            self.http.clone(),
            &self.config.api_url,
            bearer,
        ))
    }

    /// Embed parameters for one report, with an RLS identity for `user_name`
    /// when the report is dataset-bound.
    #[instrument(skip(self, user_name, ctx), fields(%workspace_id, %report_id))]
    pub async fn embed_params_for_report(
        &self,
        workspace_id: WorkspaceId,
        report_id: ReportId,
        user_name: &str,
        additional_dataset_id: Option<DatasetId>,
        ctx: &CallContext,
    ) -> Result<EmbedParams> {
        let client = self.client(ctx).await?;
        let report = ctx.run(client.get_report(workspace_id, report_id)).await?;
        debug!(kind = ?report.kind(), "Report classified");

        let request = match report.kind() {
            ReportKind::Paginated => TokenRequest::rdl(workspace_id, report_id, None),
            ReportKind::DatasetBound(dataset_id) => {
                if user_name.trim().is_empty() {
                    return Err(Error::InvalidRequest(
                        "a username is required for dataset-bound reports".to_string(),
                    ));
                }
                let mut dataset_ids = vec![dataset_id];
                dataset_ids.extend(additional_dataset_id.and_then(|id| id.non_nil()));

                let identity = EffectiveIdentity::new(user_name)
                    .with_role(self.config.rls_role.as_str())
                    .with_datasets(&dataset_ids);

                TokenRequest::single_report_rls(
                    report_id,
                    dataset_ids,
                    identity,
                    Some(workspace_id),
                )
            }
        };

        let embed_token = self.issue(&client, &request, ctx).await?;
        Ok(EmbedParams::reports(vec![report.to_embed_report()], embed_token))
    }

    /// Embed parameters for several reports under one token.
    ///
    /// Reports come back in input order. Any failed lookup aborts the whole
    /// batch before a token is requested.
    #[instrument(skip(self, report_ids, additional_dataset_ids, ctx), fields(%workspace_id, reports = report_ids.len()))]
    pub async fn embed_params_for_reports(
        &self,
        workspace_id: WorkspaceId,
        report_ids: &[ReportId],
        additional_dataset_ids: &[DatasetId],
        ctx: &CallContext,
    ) -> Result<EmbedParams> {
        if report_ids.is_empty() {
            return Err(Error::InvalidRequest(
                "at least one report id is required".to_string(),
            ));
        }

        let client = self.client(ctx).await?;

        let mut embed_reports = Vec::with_capacity(report_ids.len());
        let mut dataset_ids = Vec::with_capacity(report_ids.len() + additional_dataset_ids.len());
        for &report_id in report_ids {
            let report = ctx.run(client.get_report(workspace_id, report_id)).await?;
            debug!(%report_id, kind = ?report.kind(), "Report classified");
            match report.kind() {
                ReportKind::DatasetBound(dataset_id) => dataset_ids.push(dataset_id),
                ReportKind::Paginated => {
                    return Err(Error::TokenGenerationFailure(format!(
                        "report {report_id} is paginated and cannot share a multi-resource token"
                    )));
                }
            }
            embed_reports.push(report.to_embed_report());
        }
        dataset_ids.extend_from_slice(additional_dataset_ids);

        let request =
            TokenRequest::multi_report(report_ids.to_vec(), dataset_ids, Some(workspace_id));
        let embed_token = self.issue(&client, &request, ctx).await?;

        Ok(EmbedParams::reports(embed_reports, embed_token))
    }

    /// Embed token for an explicit request shape.
    pub async fn embed_token(&self, request: &TokenRequest, ctx: &CallContext) -> Result<EmbedToken> {
        let client = self.client(ctx).await?;
        self.issue(&client, request, ctx).await
    }

    async fn issue(
        &self,
        client: &PowerBiClient,
        request: &TokenRequest,
        ctx: &CallContext,
    ) -> Result<EmbedToken> {
        let variant = request.variant();
        debug!(variant, "Requesting embed token");

        let token = match request.body() {
            TokenRequestBody::MultiResource(body) => ctx.run(client.generate_token(&body)).await?,
            TokenRequestBody::ReportInGroup {
                workspace_id,
                report_id,
                body,
            } => {
                ctx.run(client.generate_token_in_group(workspace_id, report_id, &body))
                    .await?
            }
        };

        info!(
            variant,
            token_id = ?token.token_id,
            expiration = %token.expiration,
            "Issued embed token"
        );
        Ok(token)
    }
}
