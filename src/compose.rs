//! Argument and document composition shared by the subcommands
//!
//! Pure functions over the configuration record and captured command output;
//! no I/O happens here.

use serde_json::json;

use crate::config::{DevConfig, PortsConfig, ServiceConfig, DEFAULT_API_PORT};
use crate::errors::{AppError, AppResult};

/// JSON-patch path appending to the first container's env array.
pub const ENV_PATCH_PATH: &str = "/spec/template/spec/containers/0/env/-";

/// First line of the push output that carries an image digest, trimmed.
///
/// The push step succeeding without printing a digest is a composition
/// failure, distinct from the push itself failing.
pub fn extract_image_digest(stdout: &str) -> AppResult<String> {
    stdout
        .lines()
        .find(|line| line.contains("@sha256:"))
        .map(|line| line.trim().to_string())
        .ok_or(AppError::DigestNotFound)
}

/// Split `KEY=VALUE` on the first `=`, naming the input on failure.
pub fn split_env_var(var: &str) -> AppResult<(&str, &str)> {
    var.split_once('=')
        .ok_or_else(|| AppError::InvalidEnvVar(var.to_string()))
}

/// Single-operation JSON patch adding one env var to the first container.
pub fn env_patch_json(key: &str, value: &str) -> String {
    json!([{
        "op": "add",
        "path": ENV_PATCH_PATH,
        "value": { "name": key, "value": value }
    }])
    .to_string()
}

/// `local:remote` mappings for port-forwarding.
///
/// An explicit argument wins (whitespace-separated mappings); otherwise the
/// configured API port (default 8080) and, when configured, the metrics port
/// are each forwarded onto themselves.
pub fn port_forward_mappings(ports: Option<&PortsConfig>, explicit: Option<&str>) -> Vec<String> {
    if let Some(explicit) = explicit {
        return explicit.split_whitespace().map(str::to_string).collect();
    }
    let api = ports.and_then(|p| p.api).unwrap_or(DEFAULT_API_PORT);
    let mut mappings = vec![format!("{api}:{api}")];
    if let Some(metrics) = ports.and_then(|p| p.metrics) {
        mappings.push(format!("{metrics}:{metrics}"));
    }
    mappings
}

/// Port the service's API listens on inside the pod.
pub fn api_port(config: &DevConfig) -> u16 {
    config
        .ports
        .as_ref()
        .and_then(|p| p.api)
        .unwrap_or(DEFAULT_API_PORT)
}

/// `deployment/<name>` reference accepted by the cluster tool.
pub fn deployment_ref(service: &ServiceConfig) -> String {
    format!("deployment/{}", service.deployment)
}

/// Namespace and context flags every kubectl invocation carries.
pub fn scope_args(config: &DevConfig) -> [String; 4] {
    [
        "-n".to_string(),
        config.service.namespace.clone(),
        "--context".to_string(),
        config.cluster.context.clone(),
    ]
}

/// Start an argument vector from string literals.
pub fn argv<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}
