//! Derives a node's roles and readiness from its labels, taints and conditions.

use api_types::NodeRole;
use api_types::NodeStatus;
use k8s_openapi::api::core::v1::Node;

/// Prefix of the well-known node role labels and taints.
const NODE_ROLE_DOMAIN: &str = "node-role.kubernetes.io";

const READY_CONDITION: &str = "Ready";
const CONDITION_TRUE: &str = "True";

/// Roles and readiness of a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub roles: Vec<NodeRole>,
    pub status: NodeStatus,
}

/// Classify a node. Missing metadata, spec or status count as absence, never as an error.
pub fn classify(node: &Node) -> Classification {
    Classification {
        roles: node_roles(node),
        status: node_status(node),
    }
}

/// Role labels first, then control-plane taints, then `worker` as the fallback.
///
/// `control-plane` suppresses `master`; `worker` and `etcd` are added independently.
pub fn node_roles(node: &Node) -> Vec<NodeRole> {
    let mut roles = Vec::new();

    let has_role_label = |role: NodeRole| {
        node.metadata
            .labels
            .as_ref()
            .is_some_and(|labels| labels.contains_key(&role_key(role)))
    };

    if has_role_label(NodeRole::ControlPlane) {
        roles.push(NodeRole::ControlPlane);
    } else if has_role_label(NodeRole::Master) {
        roles.push(NodeRole::Master);
    }
    if has_role_label(NodeRole::Worker) {
        roles.push(NodeRole::Worker);
    }
    if has_role_label(NodeRole::Etcd) {
        roles.push(NodeRole::Etcd);
    }

    if roles.is_empty() && has_control_plane_taint(node) {
        roles.push(NodeRole::ControlPlane);
    }

    if roles.is_empty() {
        roles.push(NodeRole::Worker);
    }

    roles
}

/// Readiness from the first `Ready` condition; `Unknown` when the node reports none.
pub fn node_status(node: &Node) -> NodeStatus {
    let ready = node
        .status
        .as_ref()
        .and_then(|status| status.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == READY_CONDITION));

    match ready {
        Some(condition) if condition.status == CONDITION_TRUE => NodeStatus::Ready,
        Some(_) => NodeStatus::NotReady,
        None => NodeStatus::Unknown,
    }
}

fn has_control_plane_taint(node: &Node) -> bool {
    let control_plane = role_key(NodeRole::ControlPlane);
    let master = role_key(NodeRole::Master);
    node.spec
        .as_ref()
        .and_then(|spec| spec.taints.as_ref())
        .is_some_and(|taints| {
            taints
                .iter()
                .any(|taint| taint.key == control_plane || taint.key == master)
        })
}

fn role_key(role: NodeRole) -> String {
    format!("{NODE_ROLE_DOMAIN}/{}", role.as_str())
}
