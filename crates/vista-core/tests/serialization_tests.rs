//! Wire-format tests for vista-core types against BI-service payloads.

use pretty_assertions::assert_eq;
use vista_core::ids::*;
use vista_core::model::*;

const REPORT_IN_GROUP: &str = r#"{
    "id": "5b218778-e7a5-4d73-8187-f10824047715",
    "reportType": "PowerBIReport",
    "name": "SalesMarketing",
    "webUrl": "https://app.powerbi.com/groups/f089354e/reports/5b218778",
    "embedUrl": "https://app.powerbi.com/reportEmbed?reportId=5b218778-e7a5-4d73-8187-f10824047715&groupId=f089354e",
    "isFromPbix": true,
    "isOwnedByMe": true,
    "datasetId": "cfafbeb1-8037-4d0c-896e-a46fb27ff229",
    "datasetWorkspaceId": "f089354e-8366-4e18-aea3-4cb4a3a50b48",
    "users": [],
    "subscriptions": []
}"#;

const PAGINATED_REPORT: &str = r#"{
    "id": "9b9f2f5c-0f0a-4b83-8a1e-2f7d0f3b6c11",
    "reportType": "PaginatedReport",
    "name": "Invoices",
    "embedUrl": "https://app.powerbi.com/rdlEmbed?reportId=9b9f2f5c-0f0a-4b83-8a1e-2f7d0f3b6c11",
    "datasetId": ""
}"#;

const GENERATED_TOKEN: &str = r#"{
    "token": "H4sIAAAAAAAEACXTtQ7FCgJE0X95rSOZKdIWZmZ2Z2ZmW",
    "tokenId": "49ae3742-54c0-4c29-af52-619ff93b5c80",
    "expiration": "2026-10-19T14:30:00Z"
}"#;

#[test]
fn test_report_lookup_payload() {
    let report: ReportDescriptor = serde_json::from_str(REPORT_IN_GROUP).expect("deserialize");

    assert_eq!(report.name, "SalesMarketing");
    assert_eq!(
        report.kind(),
        ReportKind::DatasetBound("cfafbeb1-8037-4d0c-896e-a46fb27ff229".parse().unwrap())
    );

    let embed = report.to_embed_report();
    assert_eq!(embed.report_id, report.id);
    assert_eq!(embed.embed_url, report.embed_url);
}

#[test]
fn test_paginated_report_payload() {
    let report: ReportDescriptor = serde_json::from_str(PAGINATED_REPORT).expect("deserialize");
    assert_eq!(report.dataset_id, None);
    assert_eq!(report.kind(), ReportKind::Paginated);
}

#[test]
fn test_generated_token_payload() {
    let token: EmbedToken = serde_json::from_str(GENERATED_TOKEN).expect("deserialize");
    assert_eq!(token.token_id.as_deref(), Some("49ae3742-54c0-4c29-af52-619ff93b5c80"));
    assert_eq!(token.expiration.to_rfc3339(), "2026-10-19T14:30:00+00:00");
}

#[test]
fn test_embed_params_roundtrip() {
    let report: ReportDescriptor = serde_json::from_str(REPORT_IN_GROUP).unwrap();
    let token: EmbedToken = serde_json::from_str(GENERATED_TOKEN).unwrap();
    let params = EmbedParams::reports(vec![report.to_embed_report()], token);

    let json = serde_json::to_string(&params).expect("serialize");
    let parsed: EmbedParams = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(params, parsed);
    assert_eq!(parsed.kind, EMBED_TYPE_REPORT);
}

#[test]
fn test_effective_identity_wire_shape() {
    let dataset: DatasetId = "cfafbeb1-8037-4d0c-896e-a46fb27ff229".parse().unwrap();
    let identity = EffectiveIdentity::new("alice")
        .with_role("Role CurrUser")
        .with_datasets([dataset].iter());

    assert_eq!(
        serde_json::to_value(&identity).unwrap(),
        serde_json::json!({
            "username": "alice",
            "roles": ["Role CurrUser"],
            "datasets": ["cfafbeb1-8037-4d0c-896e-a46fb27ff229"],
        })
    );
}
