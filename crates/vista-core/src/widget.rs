//! Render configuration handed to the browser-side report widget.
//!
//! The widget needs the embed token, the embed URL and the report id; the
//! rest of the configuration is fixed: full permissions, filter pane hidden,
//! single-column mobile layout.

use crate::ids::ReportId;
use crate::model::EmbedParams;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Aad,
    Embed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permissions {
    Read,
    ReadWrite,
    Copy,
    Create,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutType {
    Master,
    Custom,
    MobilePortrait,
    MobileLandscape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneVisibility {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panes {
    pub filters: PaneVisibility,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    pub filter_pane_enabled: bool,
    pub nav_content_pane_enabled: bool,
    pub layout_type: LayoutType,
    pub page_view: String,
    pub panes: Panes,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            filter_pane_enabled: true,
            nav_content_pane_enabled: true,
            layout_type: LayoutType::MobilePortrait,
            page_view: "oneColumn".to_string(),
            panes: Panes {
                filters: PaneVisibility { visible: false },
            },
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub token_type: TokenType,
    pub access_token: String,
    pub embed_url: String,
    pub id: ReportId,
    pub permissions: Permissions,
    pub settings: WidgetSettings,
}

impl fmt::Debug for WidgetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetConfig")
            .field("kind", &self.kind)
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("embed_url", &self.embed_url)
            .field("id", &self.id)
            .field("permissions", &self.permissions)
            .field("settings", &self.settings)
            .finish()
    }
}

impl WidgetConfig {
    /// Widget configuration for the `index`-th report of `params`.
    pub fn for_report(params: &EmbedParams, index: usize) -> Option<Self> {
        let report = params.embed_reports.get(index)?;
        Some(Self {
            kind: "report".to_string(),
            token_type: TokenType::Embed,
            access_token: params.embed_token.token.clone(),
            embed_url: report.embed_url.clone(),
            id: report.report_id,
            permissions: Permissions::All,
            settings: WidgetSettings::default(),
        })
    }
}
