#![allow(clippy::unwrap_used)]
// Integration tests for the sync engine against a wiremock controller.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vmanly_api::{TransportConfig, VmanageClient};
use vmanly_core::{
    ChangeOp, ControllerConfig, CoreError, Document, EntityKind, ExportOptions, PollConfig,
    SyncAction, SyncContext, SyncOptions, TlsVerification,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, SyncContext) {
    let server = MockServer::start().await;
    let client = VmanageClient::new(
        Url::parse(&server.uri()).unwrap(),
        &TransportConfig::default(),
    )
    .unwrap();
    let ctx = SyncContext::new(
        client,
        PollConfig {
            interval: Duration::ZERO,
            max_attempts: 3,
        },
    );
    (server, ctx)
}

fn ds(suffix: &str) -> String {
    format!("/dataservice/{suffix}")
}

async fn mount_get(server: &MockServer, suffix: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(ds(suffix)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, suffix: &str, data: Value) {
    mount_get(server, suffix, json!({ "data": data })).await;
}

/// Every definition type not mocked explicitly lists as empty.
async fn mount_empty_definitions(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/dataservice/template/policy/definition/[A-Za-z0-9]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Fail the test if any write reaches the controller.
async fn forbid_writes(server: &MockServer) {
    for verb in ["POST", "PUT", "DELETE"] {
        Mock::given(method(verb))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .named(format!("no {verb}"))
            .mount(server)
            .await;
    }
}

async fn mount_reattach(server: &MockServer, template_id: &str, action_id: &str, status: Value) {
    mount_listing(
        server,
        &format!("template/device/config/attached/{template_id}"),
        json!([{ "uuid": format!("dev-{template_id}"), "host-name": "edge" }]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(ds("template/device/config/input")))
        .and(body_partial_json(json!({ "templateId": template_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": { "columns": [
                { "property": "csv-deviceId", "editable": false },
                { "property": "//system/host-name", "editable": true }
            ]},
            "data": [{
                "csv-deviceId": format!("dev-{template_id}"),
                "csv-status": "complete",
                "//system/host-name": "edge"
            }]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(ds("template/device/config/attachfeature")))
        .and(body_partial_json(json!({
            "deviceTemplateList": [{
                "templateId": template_id,
                "device": [{ "csv-templateId": template_id }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": action_id })))
        .expect(1)
        .named(format!("attach {template_id}"))
        .mount(server)
        .await;
    mount_get(server, &format!("device/action/status/{action_id}"), status).await;
}

fn done() -> Value {
    json!({
        "summary": { "status": "done" },
        "data": [{ "statusId": "success", "activity": ["Done - Push Feature Template Configuration"] }]
    })
}

fn write_options() -> SyncOptions {
    SyncOptions {
        allow_update: true,
        ..SyncOptions::default()
    }
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_logs_in_and_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ds("client/token")))
        .respond_with(ResponseTemplate::new(200).set_body_string("xsrf-1"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ControllerConfig {
        url: Url::parse(&server.uri()).unwrap(),
        username: "admin".into(),
        password: "secret".to_owned().into(),
        tls: TlsVerification::SystemDefaults,
        timeout: Duration::from_secs(5),
        poll: PollConfig::default(),
    };
    let ctx = SyncContext::connect(&config).await.unwrap();
    assert!(ctx.client().has_xsrf_token());
    assert_eq!(ctx.poll_config(), PollConfig::default());
    ctx.disconnect().await;
}

#[tokio::test]
async fn test_connect_with_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/j_security_check"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>login</body></html>"))
        .mount(&server)
        .await;

    let config = ControllerConfig {
        url: Url::parse(&server.uri()).unwrap(),
        username: "admin".into(),
        password: "wrong".to_owned().into(),
        tls: TlsVerification::SystemDefaults,
        timeout: Duration::from_secs(5),
        poll: PollConfig::default(),
    };
    let err = SyncContext::connect(&config).await.err().unwrap();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
}

// ── Creation ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_new_list_is_created() {
    let (server, ctx) = setup().await;
    mount_listing(&server, "template/policy/list", json!([])).await;

    let desired = json!({ "name": "site-hq", "type": "site", "entries": [{ "siteId": "100" }] });
    Mock::given(method("POST"))
        .and(path(ds("template/policy/list/site")))
        .and(body_json(&desired))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listId": "l-new" })))
        .expect(1)
        .mount(&server)
        .await;

    let document = Document {
        lists: vec![desired],
        ..Document::default()
    };
    let report = ctx
        .sync_document(&document, &[], SyncOptions::default())
        .await;

    assert!(report.is_success());
    assert_eq!(report.changes.len(), 1);
    let change = &report.changes[0];
    assert_eq!(change.action, SyncAction::Create);
    assert_eq!(change.name, "site-hq");
    assert!(change.applied);
    assert!(change.changes.iter().all(|c| c.op == ChangeOp::Add));
}

#[tokio::test]
async fn test_dry_run_create_writes_nothing() {
    let (server, ctx) = setup().await;
    mount_listing(&server, "template/policy/list", json!([])).await;
    forbid_writes(&server).await;

    let options = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let change = ctx
        .sync_entity(
            EntityKind::Lists,
            &json!({ "name": "site-hq", "type": "site", "entries": [] }),
            options,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(change.action, SyncAction::Create);
    assert!(!change.applied);
}

// ── Updates ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_appended_entry_updates_list() {
    let (server, ctx) = setup().await;
    mount_listing(
        &server,
        "template/policy/list",
        json!([{
            "listId": "l-1",
            "name": "site-hq",
            "type": "site",
            "entries": [{ "siteId": "100" }],
            "lastUpdated": 1_700_000_000_000_u64,
            "referenceCount": 0,
            "readOnly": false
        }]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(ds("template/policy/list/site/l-1")))
        .and(body_partial_json(json!({
            "listId": "l-1",
            "entries": [{ "siteId": "100" }, { "siteId": "200" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let desired = json!({
        "name": "site-hq",
        "type": "site",
        "entries": [{ "siteId": "100" }, { "siteId": "200" }]
    });
    let change = ctx
        .sync_entity(EntityKind::Lists, &desired, write_options())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(change.action, SyncAction::Update);
    assert!(change.applied);
    assert_eq!(change.changes.len(), 1);
    assert_eq!(change.changes[0].op, ChangeOp::Add);
    assert_eq!(change.changes[0].path.to_string(), "entries[1]");
}

#[tokio::test]
async fn test_update_without_permission_is_reported_only() {
    let (server, ctx) = setup().await;
    mount_listing(
        &server,
        "template/policy/list",
        json!([{ "listId": "l-1", "name": "site-hq", "type": "site", "entries": [{ "siteId": "100" }] }]),
    )
    .await;
    forbid_writes(&server).await;

    let change = ctx
        .sync_entity(
            EntityKind::Lists,
            &json!({ "name": "site-hq", "type": "site", "entries": [{ "siteId": "300" }] }),
            SyncOptions::default(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(change.action, SyncAction::Update);
    assert!(!change.applied);
}

#[tokio::test]
async fn test_unchanged_check_run_reports_nothing() {
    let (server, ctx) = setup().await;
    mount_listing(
        &server,
        "template/policy/list",
        json!([{
            "listId": "l-1",
            "name": "site-hq",
            "type": "site",
            "entries": [{ "siteId": "100" }],
            "infoTag": "",
            "owner": "admin"
        }]),
    )
    .await;
    forbid_writes(&server).await;

    let document = Document {
        lists: vec![json!({ "name": "site-hq", "type": "site", "entries": [{ "siteId": "100" }] })],
        ..Document::default()
    };
    let options = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let report = ctx.sync_document(&document, &[], options).await;

    assert!(report.is_success());
    assert!(report.changes.is_empty());
    assert_eq!(report.unchanged, 1);
}

#[tokio::test]
async fn test_existing_description_is_kept() {
    let (server, ctx) = setup().await;
    mount_listing(
        &server,
        "template/policy/list",
        json!([{
            "listId": "l-1",
            "name": "site-hq",
            "type": "site",
            "description": "HQ sites",
            "entries": [{ "siteId": "100" }]
        }]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(ds("template/policy/list/site/l-1")))
        .and(body_partial_json(json!({ "description": "HQ sites" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let change = ctx
        .sync_entity(
            EntityKind::Lists,
            &json!({ "name": "site-hq", "type": "site", "entries": [{ "siteId": "101" }] }),
            write_options(),
        )
        .await
        .unwrap()
        .unwrap();
    // The description is not reported as removed.
    assert_eq!(change.changes.len(), 1);
    assert_eq!(change.changes[0].path.to_string(), "entries[0].siteId");
}

// ── Cascade ─────────────────────────────────────────────────────────

async fn mount_locked_list_update(server: &MockServer) {
    mount_listing(
        server,
        "template/policy/list",
        json!([{ "listId": "l-1", "name": "site-hq", "type": "site", "entries": [{ "siteId": "100" }] }]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(ds("template/policy/list/site/l-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processId": "lock-1",
            "masterTemplatesAffected": ["t1", "t2"]
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(ds("template/lock/lock-1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .named("release lock")
        .mount(server)
        .await;
}

fn changed_list() -> Value {
    json!({ "name": "site-hq", "type": "site", "entries": [{ "siteId": "100" }, { "siteId": "200" }] })
}

#[tokio::test]
async fn test_push_reattaches_every_affected_template() {
    let (server, ctx) = setup().await;
    mount_locked_list_update(&server).await;
    mount_reattach(&server, "t1", "push-t1", done()).await;
    mount_reattach(&server, "t2", "push-t2", done()).await;

    let options = SyncOptions {
        allow_update: true,
        push: true,
        ..SyncOptions::default()
    };
    let change = ctx
        .sync_entity(EntityKind::Lists, &changed_list(), options)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(change.affected_templates, vec!["t1", "t2"]);
    assert_eq!(change.reattached, vec!["t1", "t2"]);
}

#[tokio::test]
async fn test_without_push_lock_is_released_and_nothing_reattached() {
    let (server, ctx) = setup().await;
    mount_locked_list_update(&server).await;

    let change = ctx
        .sync_entity(EntityKind::Lists, &changed_list(), write_options())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(change.affected_templates, vec!["t1", "t2"]);
    assert!(change.reattached.is_empty());
}

#[tokio::test]
async fn test_failed_push_stops_cascade_and_releases_lock() {
    let (server, ctx) = setup().await;
    mount_locked_list_update(&server).await;
    mount_reattach(
        &server,
        "t1",
        "push-t1",
        json!({
            "summary": { "status": "done" },
            "data": [{
                "statusId": "failure",
                "activity": ["Pushing configuration", "Failed to update configuration: device offline"]
            }]
        }),
    )
    .await;
    // t2 must never be attached.
    Mock::given(method("POST"))
        .and(path(ds("template/device/config/attachfeature")))
        .and(body_partial_json(json!({ "deviceTemplateList": [{ "templateId": "t2" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "push-t2" })))
        .expect(0)
        .with_priority(1)
        .mount(&server)
        .await;

    let document = Document {
        lists: vec![changed_list()],
        ..Document::default()
    };
    let options = SyncOptions {
        allow_update: true,
        push: true,
        keep_going: true,
        ..SyncOptions::default()
    };
    let mut report = ctx.sync_document(&document, &[], options).await;

    // The list update landed before the push failed.
    assert_eq!(report.changes.len(), 1);
    let change = &report.changes[0];
    assert_eq!(change.action, SyncAction::Update);
    assert!(change.applied);
    assert_eq!(change.affected_templates, vec!["t1", "t2"]);
    assert!(change.reattached.is_empty());

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "site-hq");
    match report.failures.remove(0).error {
        CoreError::ActionFailed {
            action_id,
            activity,
        } => {
            assert_eq!(action_id, "push-t1");
            assert_eq!(
                activity,
                "Failed to update configuration: device offline"
            );
        }
        other => panic!("expected ActionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_action_polling_is_bounded() {
    let (server, ctx) = setup().await;
    Mock::given(method("GET"))
        .and(path(ds("device/action/status/push-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": { "status": "in_progress" },
            "data": [{ "statusId": "in_progress", "activity": ["Pushing"] }]
        })))
        .expect(3)
        .mount(&server)
        .await;

    let err = ctx.wait_for_action("push-1").await.unwrap_err();
    assert!(
        matches!(err, CoreError::ActionTimeout { ref action_id, attempts: 3 } if action_id == "push-1"),
        "expected ActionTimeout, got {err:?}"
    );
}

#[tokio::test]
async fn test_reattach_without_devices_is_a_no_op() {
    let (server, ctx) = setup().await;
    mount_listing(&server, "template/device/config/attached/t9", json!([])).await;
    forbid_writes(&server).await;

    assert_eq!(ctx.reattach("t9").await.unwrap(), None);
}

#[tokio::test]
async fn test_reattach_by_name() {
    let (server, ctx) = setup().await;
    mount_listing(
        &server,
        "template/device",
        json!([{ "templateId": "t1", "templateName": "branch", "deviceType": "vedge-cloud" }]),
    )
    .await;
    mount_reattach(&server, "t1", "push-t1", done()).await;

    assert_eq!(
        ctx.reattach_by_name("branch").await.unwrap().as_deref(),
        Some("push-t1")
    );
    let err = ctx.reattach_by_name("missing").await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { kind: EntityKind::DeviceTemplates, .. }));
}

// ── Resolution ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_name_id_round_trip_for_every_kind() {
    let (server, ctx) = setup().await;
    mount_listing(
        &server,
        "template/policy/list",
        json!([{ "listId": "l-1", "name": "site-hq", "type": "site" }]),
    )
    .await;
    mount_listing(
        &server,
        "template/policy/definition/data",
        json!([{ "definitionId": "d-1", "name": "drop-hq", "type": "data" }]),
    )
    .await;
    mount_empty_definitions(&server).await;
    for (scope, id) in [("vsmart", "cp-1"), ("vedge", "lp-1"), ("security", "sp-1")] {
        mount_listing(
            &server,
            &format!("template/policy/{scope}"),
            json!([{ "policyId": id, "policyName": format!("{scope}-policy"), "policyType": "feature" }]),
        )
        .await;
    }
    mount_listing(
        &server,
        "template/feature",
        json!([{ "templateId": "ft-1", "templateName": "system-base", "templateType": "cisco_system" }]),
    )
    .await;
    mount_listing(
        &server,
        "template/device",
        json!([{ "templateId": "dt-1", "templateName": "branch", "deviceType": "vedge-cloud" }]),
    )
    .await;

    let fixtures = [
        (EntityKind::Lists, Some("site"), "site-hq", "l-1"),
        (EntityKind::Definitions, Some("data"), "drop-hq", "d-1"),
        (EntityKind::CentralPolicies, None, "vsmart-policy", "cp-1"),
        (EntityKind::LocalPolicies, None, "vedge-policy", "lp-1"),
        (EntityKind::SecurityPolicies, None, "security-policy", "sp-1"),
        (EntityKind::FeatureTemplates, None, "system-base", "ft-1"),
        (EntityKind::DeviceTemplates, None, "branch", "dt-1"),
    ];
    for (kind, entity_type, name, id) in fixtures {
        let resolved = ctx.resolve_name_to_id(kind, entity_type, name).await.unwrap();
        assert_eq!(resolved.to_string(), id, "{kind}");
        assert_eq!(ctx.resolve_id_to_name(kind, &resolved).await.unwrap(), name);

        let err = ctx
            .resolve_name_to_id(kind, entity_type, "missing")
            .await
            .unwrap_err();
        assert!(
            matches!(err, CoreError::NotFound { kind: k, .. } if k == kind),
            "{kind}: {err:?}"
        );
    }

    // Lists are scoped by type.
    assert!(ctx.find(EntityKind::Lists, Some("vpn"), "site-hq").await.unwrap().is_none());
}

#[tokio::test]
async fn test_listing_is_cached_until_invalidated() {
    let (server, ctx) = setup().await;
    Mock::given(method("GET"))
        .and(path(ds("template/feature")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [
            { "templateId": "ft-1", "templateName": "system-base", "templateType": "cisco_system" }
        ]})))
        .expect(2)
        .mount(&server)
        .await;

    for _ in 0..3 {
        ctx.find(EntityKind::FeatureTemplates, None, "system-base")
            .await
            .unwrap()
            .unwrap();
    }
    ctx.invalidate(EntityKind::FeatureTemplates);
    assert_eq!(ctx.listing(EntityKind::FeatureTemplates).await.unwrap().len(), 1);
}

// ── Ordering and references ─────────────────────────────────────────

#[tokio::test]
async fn test_definition_with_unknown_list_fails_not_found() {
    let (server, ctx) = setup().await;
    mount_listing(&server, "template/policy/list", json!([])).await;
    mount_empty_definitions(&server).await;
    forbid_writes(&server).await;

    let document = Document {
        definitions: vec![json!({
            "name": "drop-hq",
            "type": "data",
            "sequences": [{ "match": { "entries": [
                { "field": "siteList", "listName": "site-hq", "listType": "site" }
            ]}}]
        })],
        ..Document::default()
    };
    let report = ctx
        .sync_document(&document, &[], SyncOptions::default())
        .await;

    assert!(report.aborted);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "drop-hq");
    assert!(matches!(
        report.failures[0].error,
        CoreError::NotFound { kind: EntityKind::Lists, ref value, .. } if value == "site-hq"
    ));
}

#[tokio::test]
async fn test_check_run_updates_definition_to_use_new_list() {
    let (server, ctx) = setup().await;
    mount_listing(
        &server,
        "template/policy/list",
        json!([{ "listId": "l-a", "name": "site-a", "type": "site", "entries": [{ "siteId": "100" }] }]),
    )
    .await;
    mount_listing(
        &server,
        "template/policy/definition/data",
        json!([{ "definitionId": "d-1", "name": "drop-hq", "type": "data" }]),
    )
    .await;
    mount_empty_definitions(&server).await;
    mount_get(
        &server,
        "template/policy/definition/data/d-1",
        json!({
            "definitionId": "d-1",
            "name": "drop-hq",
            "type": "data",
            "sequences": [{ "match": { "entries": [
                { "field": "siteList", "ref": "l-a" }
            ]}}]
        }),
    )
    .await;
    forbid_writes(&server).await;

    let document = Document {
        lists: vec![json!({ "name": "site-b", "type": "site", "entries": [{ "siteId": "200" }] })],
        definitions: vec![json!({
            "name": "drop-hq",
            "type": "data",
            "sequences": [{ "match": { "entries": [
                { "field": "siteList", "listName": "site-b", "listType": "site" }
            ]}}]
        })],
        ..Document::default()
    };

    let check = SyncOptions {
        dry_run: true,
        allow_update: true,
        ..SyncOptions::default()
    };
    let report = ctx.sync_document(&document, &[], check).await;
    assert!(report.is_success(), "failures: {:?}", report.failures);
    let summary: Vec<_> = report
        .changes
        .iter()
        .map(|c| (c.kind, c.name.as_str(), c.action, c.applied))
        .collect();
    assert_eq!(
        summary,
        vec![
            (EntityKind::Lists, "site-b", SyncAction::Create, false),
            (EntityKind::Definitions, "drop-hq", SyncAction::Update, false),
        ]
    );

    // Without permission to update, the new reference is never resolved.
    let report = ctx
        .sync_document(&document, &[EntityKind::Definitions], SyncOptions::default())
        .await;
    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert_eq!(report.changes.len(), 1);
    assert_eq!(report.changes[0].action, SyncAction::Update);
    assert!(!report.changes[0].applied);
}

#[tokio::test]
async fn test_lists_are_created_before_definitions_that_use_them() {
    let (server, ctx) = setup().await;

    // The first list listing predates the create; later ones include it.
    Mock::given(method("GET"))
        .and(path(ds("template/policy/list")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_listing(
        &server,
        "template/policy/list",
        json!([{ "listId": "l-new", "name": "site-hq", "type": "site", "entries": [{ "siteId": "100" }] }]),
    )
    .await;
    mount_empty_definitions(&server).await;

    Mock::given(method("POST"))
        .and(path(ds("template/policy/list/site")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listId": "l-new" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ds("template/policy/definition/data")))
        .and(body_partial_json(json!({
            "sequences": [{ "match": { "entries": [{ "field": "siteList", "ref": "l-new" }] } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "definitionId": "d-new" })))
        .expect(1)
        .mount(&server)
        .await;

    // Definitions come first in the file; the run still syncs lists first.
    let document = Document::parse(
        r#"{
            "definitions": [{
                "name": "drop-hq",
                "type": "data",
                "sequences": [{ "match": { "entries": [
                    { "field": "siteList", "listName": "site-hq", "listType": "site" }
                ]}}]
            }],
            "lists": [{ "name": "site-hq", "type": "site", "entries": [{ "siteId": "100" }] }]
        }"#,
        vmanly_core::DocumentFormat::Json,
    )
    .unwrap();
    let report = ctx
        .sync_document(&document, &[], SyncOptions::default())
        .await;

    assert!(report.is_success(), "failures: {:?}", report.failures);
    let order: Vec<EntityKind> = report.changes.iter().map(|c| c.kind).collect();
    assert_eq!(order, vec![EntityKind::Lists, EntityKind::Definitions]);
}

#[tokio::test]
async fn test_keep_going_continues_past_failures() {
    let (server, ctx) = setup().await;
    mount_listing(&server, "template/policy/list", json!([])).await;
    Mock::given(method("POST"))
        .and(path(ds("template/policy/list/site")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "Invalid site id", "details": "site id out of range" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ds("template/policy/list/vpn")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listId": "l-vpn" })))
        .expect(1)
        .mount(&server)
        .await;

    let document = Document {
        lists: vec![
            json!({ "name": "bad-sites", "type": "site", "entries": [{ "siteId": "x" }] }),
            json!({ "name": "vpn-corp", "type": "vpn", "entries": [{ "vpn": "10" }] }),
        ],
        ..Document::default()
    };
    let options = SyncOptions {
        keep_going: true,
        ..SyncOptions::default()
    };
    let report = ctx.sync_document(&document, &[], options).await;

    assert!(!report.aborted);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        CoreError::Transport { status: Some(400), .. }
    ));
    assert_eq!(report.created(), 1);
}

#[tokio::test]
async fn test_body_without_name_is_a_validation_error() {
    let (_server, ctx) = setup().await;
    let err = ctx
        .sync_entity(
            EntityKind::FeatureTemplates,
            &json!({ "templateType": "cisco_system" }),
            SyncOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

// ── Policies ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_active_central_policy_is_reactivated_on_push() {
    let (server, ctx) = setup().await;
    mount_listing(&server, "template/policy/list", json!([])).await;
    mount_empty_definitions(&server).await;
    mount_listing(
        &server,
        "template/policy/vsmart",
        json!([{
            "policyId": "cp-1",
            "policyName": "central",
            "policyType": "feature",
            "isPolicyActivated": true
        }]),
    )
    .await;
    mount_get(
        &server,
        "template/policy/vsmart/definition/cp-1",
        json!({
            "policyName": "central",
            "policyType": "feature",
            "policyDescription": "old",
            "policyDefinition": { "assembly": [] }
        }),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(ds("template/policy/vsmart/cp-1")))
        .and(body_partial_json(json!({ "policyId": "cp-1", "policyDescription": "new" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ds("template/policy/vsmart/activate/cp-1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "act-1" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, "device/action/status/act-1", done()).await;

    let options = SyncOptions {
        allow_update: true,
        push: true,
        ..SyncOptions::default()
    };
    let change = ctx
        .sync_entity(
            EntityKind::CentralPolicies,
            &json!({
                "policyName": "central",
                "policyType": "feature",
                "policyDescription": "new",
                "policyDefinition": { "assembly": [] }
            }),
            options,
        )
        .await
        .unwrap()
        .unwrap();
    assert!(change.reactivated);
}

// ── Export ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_export_then_import_is_a_no_op() {
    let (server, ctx) = setup().await;
    mount_listing(
        &server,
        "template/policy/list",
        json!([
            {
                "listId": "l-1",
                "name": "site-hq",
                "type": "site",
                "description": "HQ",
                "entries": [{ "siteId": "100" }],
                "lastUpdated": 1,
                "owner": "admin",
                "readOnly": false,
                "version": "0",
                "referenceCount": 1,
                "references": [{ "id": "d-1", "type": "data" }]
            },
            {
                "listId": "l-default",
                "name": "Google_Apps",
                "type": "app",
                "entries": [{ "app": "gmail" }],
                "readOnly": true
            }
        ]),
    )
    .await;
    mount_listing(
        &server,
        "template/policy/definition/data",
        json!([{ "definitionId": "d-1", "name": "drop-hq", "type": "data", "readOnly": false }]),
    )
    .await;
    mount_get(
        &server,
        "template/policy/definition/data/d-1",
        json!({
            "definitionId": "d-1",
            "name": "drop-hq",
            "type": "data",
            "description": "drop",
            "defaultAction": { "type": "accept" },
            "sequences": [{
                "sequenceId": 1,
                "match": { "entries": [{ "field": "siteList", "ref": "l-1" }] },
                "actions": [{ "type": "drop", "parameter": "" }]
            }],
            "lastUpdated": 2,
            "referenceCount": 0,
            "isActivatedByVsmart": false
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(ds("template/policy/definition/dnssecurity")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_empty_definitions(&server).await;

    let only = [EntityKind::Lists, EntityKind::Definitions];
    let document = ctx.export(&only, ExportOptions::default()).await.unwrap();

    assert_eq!(
        document.lists,
        vec![json!({
            "name": "site-hq",
            "type": "site",
            "description": "HQ",
            "entries": [{ "siteId": "100" }]
        })]
    );
    assert_eq!(
        document.definitions[0]["sequences"][0]["match"]["entries"][0],
        json!({ "field": "siteList", "listName": "site-hq", "listType": "site" })
    );
    assert!(document.definitions[0].get("definitionId").is_none());

    forbid_writes(&server).await;
    let report = ctx.sync_document(&document, &only, write_options()).await;
    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert!(report.changes.is_empty());
    assert_eq!(report.unchanged, 2);
}

#[tokio::test]
async fn test_export_includes_defaults_on_request() {
    let (server, ctx) = setup().await;
    mount_listing(
        &server,
        "template/feature",
        json!([
            { "templateId": "ft-1", "templateName": "Factory_Default_AAA", "templateType": "aaa", "factoryDefault": true },
            { "templateId": "ft-2", "templateName": "system-base", "templateType": "cisco_system", "factoryDefault": false }
        ]),
    )
    .await;
    for id in ["ft-1", "ft-2"] {
        mount_get(
            &server,
            &format!("template/feature/object/{id}"),
            json!({ "templateId": id, "templateDefinition": {}, "devicesAttached": 0 }),
        )
        .await;
    }

    let bodies = ctx
        .export_kind(EntityKind::FeatureTemplates, ExportOptions::default())
        .await
        .unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["templateName"], "system-base");
    assert!(bodies[0].get("devicesAttached").is_none());

    let options = ExportOptions {
        include_defaults: true,
    };
    let bodies = ctx
        .export_kind(EntityKind::FeatureTemplates, options)
        .await
        .unwrap();
    assert_eq!(bodies.len(), 2);
}
