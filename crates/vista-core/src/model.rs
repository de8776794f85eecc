//! Report and embed-credential model.

use crate::ids::{DatasetId, ReportId, blank_as_none};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag carried by every [`EmbedParams`].
pub const EMBED_TYPE_REPORT: &str = "Report";

/// Report metadata returned by the BI-service lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDescriptor {
    pub id: ReportId,
    pub name: String,
    pub embed_url: String,
    #[serde(default, deserialize_with = "blank_as_none::deserialize")]
    pub dataset_id: Option<DatasetId>,
}

/// How a report is bound to data, which decides the token request shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Paginated (RDL) report: no dataset, no RLS.
    Paginated,
    /// Report backed by an analytical dataset.
    DatasetBound(DatasetId),
}

impl ReportDescriptor {
    pub fn kind(&self) -> ReportKind {
        match self.dataset_id {
            Some(dataset_id) => ReportKind::DatasetBound(dataset_id),
            None => ReportKind::Paginated,
        }
    }

    pub fn to_embed_report(&self) -> EmbedReport {
        EmbedReport {
            report_id: self.id,
            report_name: self.name.clone(),
            embed_url: self.embed_url.clone(),
        }
    }
}

/// Row-level-security binding submitted with a token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveIdentity {
    pub username: String,
    pub roles: Vec<String>,
    pub datasets: Vec<String>,
}

impl EffectiveIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            roles: Vec::new(),
            datasets: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        let role = role.into();
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    #[must_use]
    pub fn with_datasets<'a>(mut self, datasets: impl IntoIterator<Item = &'a DatasetId>) -> Self {
        for dataset in datasets {
            let dataset = dataset.to_string();
            if !self.datasets.contains(&dataset) {
                self.datasets.push(dataset);
            }
        }
        self
    }
}

/// Access level for access-level-only (RDL) token requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    View,
    Edit,
    Create,
}

/// Embed credential issued by the BI service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedToken {
    pub token: String,
    #[serde(default)]
    pub token_id: Option<String>,
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for EmbedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedToken")
            .field("token", &"[REDACTED]")
            .field("token_id", &self.token_id)
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Embed metadata for one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedReport {
    pub report_id: ReportId,
    pub report_name: String,
    pub embed_url: String,
}

/// Everything the rendering widget needs for one or more reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedParams {
    #[serde(rename = "embedReport")]
    pub embed_reports: Vec<EmbedReport>,
    #[serde(rename = "type")]
    pub kind: String,
    pub embed_token: EmbedToken,
}

impl EmbedParams {
    pub fn reports(embed_reports: Vec<EmbedReport>, embed_token: EmbedToken) -> Self {
        Self {
            embed_reports,
            kind: EMBED_TYPE_REPORT.to_string(),
            embed_token,
        }
    }
}
