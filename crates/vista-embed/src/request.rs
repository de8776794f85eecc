//! Token-generation request shapes.
//!
//! All four request variants go through [`TokenRequest::body`], the single
//! builder that turns a variant into the wire body. Nil identifiers are
//! dropped there, and an empty target-workspace list is omitted rather than
//! sent as `[]`.

use serde::Serialize;
use vista_core::ids::dedup_non_nil;
use vista_core::model::{AccessLevel, EffectiveIdentity};
use vista_core::{DatasetId, ReportId, WorkspaceId};

/// Which embed token to ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRequest {
    /// One report, its datasets and an RLS identity.
    SingleReportRls {
        report_id: ReportId,
        dataset_ids: Vec<DatasetId>,
        identity: EffectiveIdentity,
        target_workspace: Option<WorkspaceId>,
    },
    /// Paginated report; access level only.
    Rdl {
        workspace_id: WorkspaceId,
        report_id: ReportId,
        access_level: AccessLevel,
    },
    /// Several reports and datasets, no identity.
    MultiReport {
        report_ids: Vec<ReportId>,
        dataset_ids: Vec<DatasetId>,
        target_workspace: Option<WorkspaceId>,
    },
    /// Several reports and datasets, several target workspaces.
    MultiReportMultiWorkspace {
        report_ids: Vec<ReportId>,
        dataset_ids: Vec<DatasetId>,
        target_workspaces: Option<Vec<WorkspaceId>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRef<T> {
    pub id: T,
}

/// Body of `POST /GenerateToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTokenRequestV2 {
    pub reports: Vec<ResourceRef<ReportId>>,
    pub datasets: Vec<ResourceRef<DatasetId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_workspaces: Option<Vec<ResourceRef<WorkspaceId>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identities: Option<Vec<EffectiveIdentity>>,
}

/// Body of `POST /groups/{ws}/reports/{id}/GenerateToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTokenRequest {
    pub access_level: AccessLevel,
}

/// Wire body plus the endpoint it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRequestBody {
    MultiResource(GenerateTokenRequestV2),
    ReportInGroup {
        workspace_id: WorkspaceId,
        report_id: ReportId,
        body: GenerateTokenRequest,
    },
}

impl TokenRequest {
    pub fn single_report_rls(
        report_id: ReportId,
        dataset_ids: Vec<DatasetId>,
        identity: EffectiveIdentity,
        target_workspace: Option<WorkspaceId>,
    ) -> Self {
        TokenRequest::SingleReportRls {
            report_id,
            dataset_ids,
            identity,
            target_workspace,
        }
    }

    /// Access-level request; `None` means [`AccessLevel::View`].
    pub fn rdl(
        workspace_id: WorkspaceId,
        report_id: ReportId,
        access_level: Option<AccessLevel>,
    ) -> Self {
        TokenRequest::Rdl {
            workspace_id,
            report_id,
            access_level: access_level.unwrap_or_default(),
        }
    }

    pub fn multi_report(
        report_ids: Vec<ReportId>,
        dataset_ids: Vec<DatasetId>,
        target_workspace: Option<WorkspaceId>,
    ) -> Self {
        TokenRequest::MultiReport {
            report_ids,
            dataset_ids,
            target_workspace,
        }
    }

    pub fn multi_report_multi_workspace(
        report_ids: Vec<ReportId>,
        dataset_ids: Vec<DatasetId>,
        target_workspaces: Option<Vec<WorkspaceId>>,
    ) -> Self {
        TokenRequest::MultiReportMultiWorkspace {
            report_ids,
            dataset_ids,
            target_workspaces,
        }
    }

    /// Variant name for logs.
    pub fn variant(&self) -> &'static str {
        match self {
            TokenRequest::SingleReportRls { .. } => "single_report_rls",
            TokenRequest::Rdl { .. } => "rdl",
            TokenRequest::MultiReport { .. } => "multi_report",
            TokenRequest::MultiReportMultiWorkspace { .. } => "multi_report_multi_workspace",
        }
    }

    /// Build the wire body for this request.
    pub fn body(&self) -> TokenRequestBody {
        match self {
            TokenRequest::Rdl {
                workspace_id,
                report_id,
                access_level,
            } => TokenRequestBody::ReportInGroup {
                workspace_id: *workspace_id,
                report_id: *report_id,
                body: GenerateTokenRequest {
                    access_level: *access_level,
                },
            },
            TokenRequest::SingleReportRls {
                report_id,
                dataset_ids,
                identity,
                target_workspace,
            } => TokenRequestBody::MultiResource(multi_resource(
                std::slice::from_ref(report_id),
                dataset_ids,
                target_workspace.map(|id| vec![id]),
                Some(identity),
            )),
            TokenRequest::MultiReport {
                report_ids,
                dataset_ids,
                target_workspace,
            } => TokenRequestBody::MultiResource(multi_resource(
                report_ids,
                dataset_ids,
                target_workspace.map(|id| vec![id]),
                None,
            )),
            TokenRequest::MultiReportMultiWorkspace {
                report_ids,
                dataset_ids,
                target_workspaces,
            } => TokenRequestBody::MultiResource(multi_resource(
                report_ids,
                dataset_ids,
                target_workspaces.clone(),
                None,
            )),
        }
    }
}

fn multi_resource(
    report_ids: &[ReportId],
    dataset_ids: &[DatasetId],
    target_workspaces: Option<Vec<WorkspaceId>>,
    identity: Option<&EffectiveIdentity>,
) -> GenerateTokenRequestV2 {
    let target_workspaces = target_workspaces
        .map(dedup_non_nil)
        .filter(|ids| !ids.is_empty())
        .map(|ids| ids.into_iter().map(|id| ResourceRef { id }).collect());

    GenerateTokenRequestV2 {
        reports: dedup_non_nil(report_ids.iter().copied())
            .into_iter()
            .map(|id| ResourceRef { id })
            .collect(),
        datasets: dedup_non_nil(dataset_ids.iter().copied())
            .into_iter()
            .map(|id| ResourceRef { id })
            .collect(),
        target_workspaces,
        identities: identity.map(|identity| vec![identity.clone()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn id<T: From<Uuid>>() -> T {
        T::from(Uuid::new_v4())
    }

    fn nil<T: From<Uuid>>() -> T {
        T::from(Uuid::nil())
    }

    fn json(request: &TokenRequest) -> serde_json::Value {
        match request.body() {
            TokenRequestBody::MultiResource(body) => serde_json::to_value(body).unwrap(),
            TokenRequestBody::ReportInGroup { body, .. } => serde_json::to_value(body).unwrap(),
        }
    }

    #[test]
    fn test_single_report_rls_body() {
        let report: ReportId = id();
        let dataset: DatasetId = id();
        let workspace: WorkspaceId = id();
        let identity = EffectiveIdentity::new("alice")
            .with_role("Role CurrUser")
            .with_datasets([dataset].iter());

        let request =
            TokenRequest::single_report_rls(report, vec![dataset], identity, Some(workspace));

        assert_eq!(
            json(&request),
            serde_json::json!({
                "reports": [{"id": report.to_string()}],
                "datasets": [{"id": dataset.to_string()}],
                "targetWorkspaces": [{"id": workspace.to_string()}],
                "identities": [{
                    "username": "alice",
                    "roles": ["Role CurrUser"],
                    "datasets": [dataset.to_string()],
                }],
            })
        );
    }

    #[test]
    fn test_absent_target_workspace_is_omitted() {
        let request = TokenRequest::single_report_rls(
            id(),
            vec![id()],
            EffectiveIdentity::new("alice"),
            None,
        );
        let body = json(&request);
        assert!(body.get("targetWorkspaces").is_none());

        let request = TokenRequest::multi_report(vec![id()], vec![id()], Some(nil()));
        let body = json(&request);
        assert!(body.get("targetWorkspaces").is_none());
    }

    #[test]
    fn test_empty_target_workspace_list_is_omitted() {
        let request =
            TokenRequest::multi_report_multi_workspace(vec![id()], vec![id()], Some(vec![nil()]));
        assert!(json(&request).get("targetWorkspaces").is_none());

        let request = TokenRequest::multi_report_multi_workspace(vec![id()], vec![id()], None);
        assert!(json(&request).get("targetWorkspaces").is_none());
    }

    #[test]
    fn test_multi_workspace_targets() {
        let (a, b): (WorkspaceId, WorkspaceId) = (id(), id());
        let request = TokenRequest::multi_report_multi_workspace(
            vec![id(), id()],
            vec![id()],
            Some(vec![a, nil(), b, a]),
        );
        let body = json(&request);
        assert_eq!(
            body["targetWorkspaces"],
            serde_json::json!([{"id": a.to_string()}, {"id": b.to_string()}])
        );
        assert_eq!(body["reports"].as_array().unwrap().len(), 2);
        assert!(body.get("identities").is_none());
    }

    #[test]
    fn test_nil_datasets_are_dropped() {
        let dataset: DatasetId = id();
        let request = TokenRequest::multi_report(vec![id()], vec![dataset, nil(), dataset], None);
        assert_eq!(
            json(&request)["datasets"],
            serde_json::json!([{"id": dataset.to_string()}])
        );
    }

    #[test]
    fn test_rdl_defaults_to_view() {
        let workspace: WorkspaceId = id();
        let report: ReportId = id();
        let request = TokenRequest::rdl(workspace, report, None);

        assert_eq!(request.variant(), "rdl");
        match request.body() {
            TokenRequestBody::ReportInGroup {
                workspace_id,
                report_id,
                body,
            } => {
                assert_eq!(workspace_id, workspace);
                assert_eq!(report_id, report);
                assert_eq!(
                    serde_json::to_value(body).unwrap(),
                    serde_json::json!({"accessLevel": "view"})
                );
            }
            TokenRequestBody::MultiResource(_) => panic!("expected access-level body"),
        }

        let request = TokenRequest::rdl(workspace, report, Some(AccessLevel::Edit));
        assert_eq!(json(&request), serde_json::json!({"accessLevel": "edit"}));
    }
}
