use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use elchi_discovery::app::Application;
use elchi_discovery::app::CycleOutcome;
use elchi_discovery::delivery::DeliveryClient;
use elchi_discovery::delivery::DeliveryConfig;
use elchi_discovery::delivery::DeliveryOutcome;
use elchi_discovery::inventory::Collector;
use elchi_discovery::k8s::ClusterApi;
use elchi_discovery::k8s::KubernetesError;
use error_stack::Report;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::api::core::v1::NodeAddress;
use k8s_openapi::api::core::v1::NodeCondition;
use k8s_openapi::api::core::v1::NodeStatus;
use k8s_openapi::api::core::v1::NodeSystemInfo;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::json;
use serde_json::Value;
use similar_asserts::assert_eq;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::method;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::Request;
use wiremock::ResponseTemplate;

const TOKEN: &str = "2f1c7a1e-5d0b-4c36-9d3e-51c2b1f0a001--64f0c0ffee";
const PROJECT: &str = "64f0c0ffee";

/// In-memory cluster whose node list can be swapped or broken between cycles.
#[derive(Clone, Default)]
struct StaticCluster {
    nodes: Arc<Mutex<Option<Vec<Node>>>>,
}

impl StaticCluster {
    fn with_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes: Arc::new(Mutex::new(Some(nodes))),
        }
    }

    fn unreachable() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClusterApi for StaticCluster {
    async fn server_version(&self) -> Result<String, Report<KubernetesError>> {
        Ok("v1.29.1".to_string())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, Report<KubernetesError>> {
        self.nodes
            .lock()
            .expect("nodes lock poisoned")
            .clone()
            .ok_or_else(|| {
                Report::new(KubernetesError::ListNodesFailed {
                    message: "connection refused".to_string(),
                })
            })
    }
}

fn node(name: &str, labels: &[&str], ready: &str, internal_ip: &str) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(
                labels
                    .iter()
                    .map(|label| (label.to_string(), String::new()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            ..Default::default()
        },
        status: Some(NodeStatus {
            conditions: Some(vec![NodeCondition {
                type_: "Ready".to_string(),
                status: ready.to_string(),
                ..Default::default()
            }]),
            node_info: Some(NodeSystemInfo {
                kubelet_version: "v1.29.1".to_string(),
                ..Default::default()
            }),
            addresses: Some(vec![
                NodeAddress {
                    type_: "InternalIP".to_string(),
                    address: internal_ip.to_string(),
                },
                NodeAddress {
                    type_: "Hostname".to_string(),
                    address: name.to_string(),
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn two_node_cluster() -> StaticCluster {
    StaticCluster::with_nodes(vec![
        node(
            "cp-1",
            &["node-role.kubernetes.io/control-plane"],
            "True",
            "10.0.0.1",
        ),
        node("worker-1", &[], "False", "10.0.0.2"),
    ])
}

fn application(cluster: StaticCluster, endpoint: &str, token: &str) -> Application<StaticCluster> {
    let delivery = DeliveryClient::new(
        DeliveryConfig::new(endpoint, token).with_request_timeout(Duration::from_secs(2)),
    )
    .expect("should build delivery client");
    Application::new(
        Collector::new(cluster, "lab"),
        delivery,
        Duration::from_millis(50),
        false,
    )
}

fn initial_header(request: &Request) -> String {
    request
        .headers
        .get("initial")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn received(mock_server: &MockServer) -> Vec<Request> {
    mock_server
        .received_requests()
        .await
        .expect("request recording is enabled")
}

#[test_log::test(tokio::test)]
async fn cycle_delivers_classified_nodes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = application(two_node_cluster(), &mock_server.uri(), TOKEN);

    let outcome = app.run_cycle().await;

    assert_eq!(outcome, CycleOutcome::Completed(DeliveryOutcome::Delivered));
    assert!(app.delivery().initial_completed());

    let requests = received(&mock_server).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(initial_header(&requests[0]), "true".to_string());

    let body: Value = serde_json::from_slice(&requests[0].body).expect("body is JSON");
    assert_eq!(body["project"], json!(PROJECT));
    assert_eq!(body["data"]["node_count"], json!(2));
    assert_eq!(
        body["data"]["cluster_info"],
        json!({"name": "lab", "version": "v1.29.1"})
    );
    assert_eq!(
        body["data"]["nodes"],
        json!([
            {
                "name": "cp-1",
                "roles": ["control-plane"],
                "status": "Ready",
                "version": "v1.29.1",
                "addresses": {"Hostname": "cp-1", "InternalIP": "10.0.0.1"}
            },
            {
                "name": "worker-1",
                "roles": ["worker"],
                "status": "NotReady",
                "version": "v1.29.1",
                "addresses": {"Hostname": "worker-1", "InternalIP": "10.0.0.2"}
            }
        ])
    );
}

#[test_log::test(tokio::test)]
async fn initial_flag_clears_after_first_success_and_stays_cleared() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let app = application(two_node_cluster(), &mock_server.uri(), TOKEN);

    assert_eq!(app.run_cycle().await, CycleOutcome::DeliveryFailed);
    assert!(!app.delivery().initial_completed());

    assert_eq!(
        app.run_cycle().await,
        CycleOutcome::Completed(DeliveryOutcome::Delivered)
    );
    assert!(app.delivery().initial_completed());

    assert_eq!(app.run_cycle().await, CycleOutcome::DeliveryFailed);
    assert!(app.delivery().initial_completed());

    let headers: Vec<String> = received(&mock_server)
        .await
        .iter()
        .map(initial_header)
        .collect();
    assert_eq!(headers, ["true", "true", "false"].map(String::from).to_vec());
}

#[test_log::test(tokio::test)]
async fn listing_failure_sends_nothing_and_next_cycle_recovers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&mock_server)
        .await;

    let cluster = StaticCluster::unreachable();
    let app = application(cluster.clone(), &mock_server.uri(), TOKEN);

    assert_eq!(app.run_cycle().await, CycleOutcome::CollectionFailed);
    assert!(received(&mock_server).await.is_empty());

    *cluster.nodes.lock().expect("nodes lock poisoned") = Some(Vec::new());

    assert_eq!(
        app.run_cycle().await,
        CycleOutcome::Completed(DeliveryOutcome::Delivered)
    );
    assert_eq!(received(&mock_server).await.len(), 1);
}

#[test_log::test(tokio::test)]
async fn empty_cluster_is_still_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = application(StaticCluster::with_nodes(Vec::new()), &mock_server.uri(), TOKEN);

    assert_eq!(
        app.run_cycle().await,
        CycleOutcome::Completed(DeliveryOutcome::Delivered)
    );

    let requests = received(&mock_server).await;
    let body: Value = serde_json::from_slice(&requests[0].body).expect("body is JSON");
    assert_eq!(body["data"]["node_count"], json!(0));
    assert_eq!(body["data"]["nodes"], json!([]));
}

#[test_log::test(tokio::test)]
async fn without_endpoint_nothing_is_sent() {
    let app = application(two_node_cluster(), "", TOKEN);

    assert_eq!(
        app.run_cycle().await,
        CycleOutcome::Completed(DeliveryOutcome::Skipped)
    );
    assert!(!app.delivery().initial_completed());
}

#[test_log::test(tokio::test)]
async fn malformed_token_skips_the_cycle() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = application(two_node_cluster(), &mock_server.uri(), "no-separator");

    assert_eq!(app.run_cycle().await, CycleOutcome::PayloadFailed);
}

#[test_log::test(tokio::test)]
async fn loop_runs_first_cycle_immediately_and_stops_on_cancel() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&mock_server)
        .await;

    let app = Arc::new(application(two_node_cluster(), &mock_server.uri(), TOKEN));
    let cancellation_token = CancellationToken::new();

    let handle = tokio::spawn({
        let app = app.clone();
        let cancellation_token = cancellation_token.clone();
        async move { app.run(cancellation_token).await }
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while received(&mock_server).await.len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("loop should deliver repeatedly");

    cancellation_token.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should stop after cancellation")
        .expect("loop task should not panic");

    let headers: Vec<String> = received(&mock_server)
        .await
        .iter()
        .map(initial_header)
        .collect();
    assert_eq!(headers[..2].to_vec(), ["true", "false"].map(String::from).to_vec());
}

#[test_log::test(tokio::test)]
async fn cancelled_loop_exits_without_a_cycle() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = application(two_node_cluster(), &mock_server.uri(), TOKEN);
    let cancellation_token = CancellationToken::new();
    cancellation_token.cancel();

    tokio::time::timeout(Duration::from_secs(5), app.run(cancellation_token))
        .await
        .expect("cancelled loop should return");
}
