//! Shared API type definitions
//!
//! This crate contains the wire types exchanged with the elchi collection endpoint:
//! the discovery report produced by one collection cycle, the envelope that carries it,
//! and the acknowledgment body returned by the endpoint.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

/// Role a node plays in the cluster, derived from its role labels and taints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeRole {
    ControlPlane,
    Master,
    Worker,
    Etcd,
}

impl NodeRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            NodeRole::ControlPlane => "control-plane",
            NodeRole::Master => "master",
            NodeRole::Worker => "worker",
            NodeRole::Etcd => "etcd",
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readiness of a node as reported by its `Ready` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    Ready,
    NotReady,
    Unknown,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Identity of the cluster a report was collected from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    /// Operator supplied display name
    pub name: String,
    /// API server git version, `"unknown"` when it could not be queried
    pub version: String,
}

/// Normalized view of a single cluster node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node name
    pub name: String,
    /// Roles of the node, never empty
    pub roles: Vec<NodeRole>,
    /// Readiness status
    pub status: NodeStatus,
    /// Kubelet version
    pub version: String,
    /// Address type (e.g. `InternalIP`) to address
    pub addresses: BTreeMap<String, String>,
}

/// Snapshot of the cluster produced by one collection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    /// When the snapshot was assembled
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "cluster_info")]
    pub cluster: ClusterInfo,
    /// Always equal to `nodes.len()`
    pub node_count: usize,
    pub nodes: Vec<NodeRecord>,
    /// Human readable time spent collecting, e.g. `"12.345ms"`
    pub duration: String,
}

impl DiscoveryReport {
    /// Assemble a report, keeping `node_count` in step with `nodes`.
    pub fn new(
        timestamp: DateTime<Utc>,
        cluster: ClusterInfo,
        nodes: Vec<NodeRecord>,
        duration: String,
    ) -> Self {
        Self {
            timestamp,
            cluster,
            node_count: nodes.len(),
            nodes,
            duration,
        }
    }
}

/// Payload posted to the collection endpoint
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryEnvelope<'a> {
    /// Tenant identifier derived from the credential
    pub project: String,
    pub data: &'a DiscoveryReport,
}

/// Acknowledgment body returned by the collection endpoint.
///
/// Every field is optional on the wire; missing and `null` fields decode to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub success: bool,
    pub result: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub error: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use similar_asserts::assert_eq;

    use super::*;

    fn sample_report() -> DiscoveryReport {
        let node = NodeRecord {
            name: "node-1".to_string(),
            roles: vec![NodeRole::ControlPlane, NodeRole::Etcd],
            status: NodeStatus::NotReady,
            version: "v1.28.2".to_string(),
            addresses: BTreeMap::from([("InternalIP".to_string(), "10.0.0.1".to_string())]),
        };
        DiscoveryReport::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            ClusterInfo {
                name: "prod".to_string(),
                version: "v1.28.2".to_string(),
            },
            vec![node],
            "1.5ms".to_string(),
        )
    }

    #[test]
    fn envelope_uses_stable_field_names() {
        let report = sample_report();
        let envelope = DeliveryEnvelope {
            project: "tenant".to_string(),
            data: &report,
        };

        let value = serde_json::to_value(&envelope).expect("should serialize envelope");

        assert_eq!(
            value,
            serde_json::json!({
                "project": "tenant",
                "data": {
                    "timestamp": "2024-05-01T12:30:00Z",
                    "cluster_info": {"name": "prod", "version": "v1.28.2"},
                    "node_count": 1,
                    "nodes": [{
                        "name": "node-1",
                        "roles": ["control-plane", "etcd"],
                        "status": "NotReady",
                        "version": "v1.28.2",
                        "addresses": {"InternalIP": "10.0.0.1"}
                    }],
                    "duration": "1.5ms"
                }
            })
        );
    }

    #[test]
    fn report_node_count_follows_nodes() {
        let report = DiscoveryReport::new(
            Utc::now(),
            ClusterInfo {
                name: "empty".to_string(),
                version: "unknown".to_string(),
            },
            Vec::new(),
            "0ns".to_string(),
        );

        assert_eq!(report.node_count, 0);
        assert!(report.nodes.is_empty());
    }

    #[test]
    fn api_response_fields_are_optional() {
        let response: ApiResponse =
            serde_json::from_str(r#"{"success": true}"#).expect("should decode partial body");
        assert!(response.success);
        assert_eq!(response.error, "");

        let response: ApiResponse =
            serde_json::from_str(r#"{"success": false, "error": "quota exceeded", "extra": 1}"#)
                .expect("should ignore unknown fields");
        assert!(!response.success);
        assert_eq!(response.error, "quota exceeded");
    }

    #[test]
    fn api_response_null_fields_decode_as_defaults() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"success": true, "result": null, "message": "ok", "error": null}"#,
        )
        .expect("null error should decode");
        assert!(response.success);
        assert_eq!(response.message, "ok");
        assert_eq!(response.error, "");

        let response: ApiResponse =
            serde_json::from_str(r#"{"success": null, "message": null, "error": "X"}"#)
                .expect("null success should decode");
        assert!(!response.success);
        assert_eq!(response.message, "");
        assert_eq!(response.error, "X");
    }

    #[test]
    fn role_and_status_display() {
        assert_eq!(NodeRole::ControlPlane.to_string(), "control-plane");
        assert_eq!(NodeStatus::NotReady.to_string(), "NotReady");
    }
}
