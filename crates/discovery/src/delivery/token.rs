//! Tenant extraction from the elchi credential.

/// Separator between the credential id and the project.
const PROJECT_SEPARATOR: &str = "--";

/// Extract the project from a `uuid--project` credential.
///
/// Only the first separator splits, so `uuid--project--extra` yields `project--extra`.
/// Returns `None` when there is no separator or nothing follows it. The id part is not
/// checked, so `--project` yields `project`.
pub fn extract_project(token: &str) -> Option<&str> {
    token
        .split_once(PROJECT_SEPARATOR)
        .map(|(_, project)| project)
        .filter(|project| !project.is_empty())
}
