//! End-to-end convergence tests.
//!
//! These tests drive the real engine and HTTP clients against a mock
//! OpenStack control plane, verifying:
//!
//! 1. Keystone password auth and catalog-based endpoint discovery
//! 2. Cluster creation with the create-then-poll convergence flow
//! 3. Resize via a batched patch list
//! 4. Query stability and deletion
//! 5. Timeout diagnostics when the remote never stabilizes
//! 6. The client-side stack walk over nested stacks
//!
//! ## Running
//!
//! ```bash
//! cargo test -p coe-e2e --test converge
//! ```

use std::time::Duration;

use coe_openstack::{AuthInfo, CloudConfig, Session};
use coe_reconcile::{
    walk, ClusterSpec, DesiredState, ReconcileError, Reconciler, ResourceFilter, WaitBudget,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEMPLATE_ID: &str = "0562d357-8641-4759-8fed-8173f02c9633";
const CLUSTER_UUID: &str = "746e779a-751a-456b-b75a-8a8a48420f18";
const STACK_ID: &str = "9c6f1169-7300-4d08-a444-d2be38758719";

fn cloud_config(server_uri: &str) -> CloudConfig {
    CloudConfig {
        auth_type: "password".to_string(),
        auth: AuthInfo {
            auth_url: format!("{server_uri}/identity/v3"),
            username: "admin".to_string(),
            password: "hunter2".to_string(),
            project_name: Some("infra".to_string()),
            user_domain_name: "Default".to_string(),
            project_domain_name: "Default".to_string(),
        },
        region_name: None,
        interface: "public".to_string(),
    }
}

async fn mount_keystone(server: &MockServer) {
    let catalog = json!({
        "token": {
            "expires_at": "2026-09-01T00:00:00.000000Z",
            "catalog": [
                {
                    "type": "container-infra",
                    "name": "magnum",
                    "endpoints": [
                        {"interface": "public", "region": "RegionOne",
                         "url": format!("{}/container-infra/v1", server.uri())}
                    ]
                },
                {
                    "type": "orchestration",
                    "name": "heat",
                    "endpoints": [
                        {"interface": "public", "region": "RegionOne",
                         "url": format!("{}/orchestration/v1/AUTH_infra", server.uri())}
                    ]
                }
            ]
        }
    });
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Subject-Token", "e2e-token")
                .set_body_json(catalog),
        )
        .mount(server)
        .await;
}

async fn mount_template(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clustertemplates/k8s-calico"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": TEMPLATE_ID,
            "name": "k8s-calico",
            "coe": "kubernetes"
        })))
        .mount(server)
        .await;
}

fn cluster_body(status: &str, masters: u64, nodes: u64) -> serde_json::Value {
    json!({
        "uuid": CLUSTER_UUID,
        "name": "demo-cluster",
        "cluster_template_id": TEMPLATE_ID,
        "master_count": masters,
        "node_count": nodes,
        "status": status,
        "status_reason": "Stack operation in flight",
        "stack_id": STACK_ID,
        "keypair": "default"
    })
}

fn not_found_body() -> serde_json::Value {
    json!({
        "errors": [{"status": 404, "detail": "Cluster demo-cluster could not be found."}]
    })
}

fn spec(state: DesiredState, masters: u32, nodes: u32) -> ClusterSpec {
    ClusterSpec {
        name: "demo-cluster".to_string(),
        template: "k8s-calico".to_string(),
        master_count: masters,
        node_count: nodes,
        keypair: "default".to_string(),
        state,
    }
}

fn fast_budget() -> WaitBudget {
    WaitBudget {
        poll_interval: Duration::from_millis(10),
        max_elapsed: Some(Duration::from_secs(5)),
        max_polls: None,
    }
}

async fn engine_for(server: &MockServer) -> Reconciler<coe_openstack::MagnumClient> {
    let session = Session::authenticate(&cloud_config(&server.uri()))
        .await
        .expect("authentication against mock keystone");
    let magnum = session.magnum().expect("container-infra endpoint");
    Reconciler::new(magnum, fast_budget())
}

#[tokio::test]
async fn create_flow_converges() {
    let server = MockServer::start().await;
    mount_keystone(&server).await;
    mount_template(&server).await;

    // Observation sequence: absent, then in progress twice, then complete.
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/container-infra/v1/clusters"))
        .and(body_json(json!({
            "name": "demo-cluster",
            "cluster_template_id": TEMPLATE_ID,
            "master_count": 1,
            "node_count": 3,
            "keypair": "default"
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"uuid": CLUSTER_UUID})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cluster_body("CREATE_IN_PROGRESS", 1, 3)),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cluster_body("CREATE_COMPLETE", 1, 3)),
        )
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let outcome = engine
        .reconcile(&spec(DesiredState::Present, 1, 3))
        .await
        .unwrap();

    assert!(outcome.changed);
    let cluster = outcome.cluster.expect("converged cluster");
    assert_eq!(cluster.status, "CREATE_COMPLETE");
    assert_eq!(cluster.node_count, 3);
}

#[tokio::test]
async fn resize_flow_patches_and_converges() {
    let server = MockServer::start().await;
    mount_keystone(&server).await;
    mount_template(&server).await;

    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cluster_body("CREATE_COMPLETE", 1, 1)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!("/container-infra/v1/clusters/{CLUSTER_UUID}")))
        .and(body_json(json!([
            {"op": "replace", "path": "/node_count", "value": 3}
        ])))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cluster_body("UPDATE_IN_PROGRESS", 1, 1)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cluster_body("UPDATE_COMPLETE", 1, 3)),
        )
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let outcome = engine
        .reconcile(&spec(DesiredState::Present, 1, 3))
        .await
        .unwrap();

    assert!(outcome.changed);
    let cluster = outcome.cluster.expect("converged cluster");
    assert_eq!(cluster.status, "UPDATE_COMPLETE");
    assert_eq!(cluster.node_count, 3);
}

#[tokio::test]
async fn query_observes_without_mutating() {
    let server = MockServer::start().await;
    mount_keystone(&server).await;
    mount_template(&server).await;

    // Only GET is mocked: any create, patch, or delete attempt would miss
    // every mock, answer 404, and fail the reconcile call.
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cluster_body("CREATE_COMPLETE", 3, 5)),
        )
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let outcome = engine
        .reconcile(&spec(DesiredState::Query, 1, 1))
        .await
        .unwrap();

    assert!(!outcome.changed);
    let cluster = outcome.cluster.expect("stable snapshot");
    assert_eq!(cluster.master_count, 3);
    assert_eq!(cluster.node_count, 5);
}

#[tokio::test]
async fn delete_flow_waits_until_gone() {
    let server = MockServer::start().await;
    mount_keystone(&server).await;
    mount_template(&server).await;

    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cluster_body("CREATE_COMPLETE", 1, 1)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/container-infra/v1/clusters/{CLUSTER_UUID}")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cluster_body("DELETE_IN_PROGRESS", 1, 1)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_body()))
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let outcome = engine
        .reconcile(&spec(DesiredState::Absent, 1, 1))
        .await
        .unwrap();

    assert!(outcome.changed);
    assert!(outcome.cluster.is_none());
}

#[tokio::test]
async fn stuck_cluster_times_out_with_last_status() {
    let server = MockServer::start().await;
    mount_keystone(&server).await;
    mount_template(&server).await;

    Mock::given(method("GET"))
        .and(path("/container-infra/v1/clusters/demo-cluster"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(cluster_body("UPDATE_IN_PROGRESS", 1, 1)),
        )
        .mount(&server)
        .await;

    let session = Session::authenticate(&cloud_config(&server.uri()))
        .await
        .unwrap();
    let magnum = session.magnum().unwrap();
    let budget = WaitBudget {
        poll_interval: Duration::from_millis(10),
        max_elapsed: None,
        max_polls: Some(3),
    };
    let engine = Reconciler::new(magnum, budget);

    let err = engine
        .reconcile(&spec(DesiredState::Present, 1, 3))
        .await
        .unwrap_err();

    match err {
        ReconcileError::Timeout {
            attempts,
            last_status,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_status, "UPDATE_IN_PROGRESS");
        }
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn stack_walk_descends_nested_stacks() {
    let server = MockServer::start().await;
    mount_keystone(&server).await;

    Mock::given(method("GET"))
        .and(path(format!(
            "/orchestration/v1/AUTH_infra/stacks/{STACK_ID}/resources"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [
                {
                    "resource_name": "kube_masters",
                    "logical_resource_id": "kube_masters",
                    "physical_resource_id": "nested-stack-1",
                    "resource_type": "OS::Heat::ResourceGroup",
                    "resource_status": "CREATE_COMPLETE"
                },
                {
                    "resource_name": "network",
                    "logical_resource_id": "network",
                    "physical_resource_id": "net-1",
                    "resource_type": "OS::Neutron::Net",
                    "resource_status": "CREATE_COMPLETE"
                }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/orchestration/v1/AUTH_infra/stacks/nested-stack-1/resources",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": [
                {
                    "resource_name": "kube_master_0",
                    "logical_resource_id": "0",
                    "physical_resource_id": "server-1",
                    "resource_type": "OS::Nova::Server",
                    "resource_status": "CREATE_COMPLETE"
                }
            ]
        })))
        .mount(&server)
        .await;
    // Anything else (net-1, server-1) is not a stack: Heat answers 404 and
    // the walk must carry on silently.
    Mock::given(method("GET"))
        .and(path("/orchestration/v1/AUTH_infra/stacks/net-1/resources"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "The Stack (net-1) could not be found.", "title": "Not Found"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orchestration/v1/AUTH_infra/stacks/server-1/resources"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "The Stack (server-1) could not be found.", "title": "Not Found"}
        })))
        .mount(&server)
        .await;

    let session = Session::authenticate(&cloud_config(&server.uri()))
        .await
        .unwrap();
    let heat = session.heat().unwrap();

    let filter = ResourceFilter::new().with("resource_type", "OS::Nova::Server");
    let servers = walk(&heat, STACK_ID, 2, &filter).await.unwrap();

    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].name, "kube_master_0");
    assert_eq!(servers[0].id.as_deref(), Some("server-1"));

    // Unfiltered, the walk reports parents before children in listing order.
    let everything = walk(&heat, STACK_ID, 2, &ResourceFilter::new())
        .await
        .unwrap();
    let names: Vec<&str> = everything.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["kube_masters", "kube_master_0", "network"]);
}
