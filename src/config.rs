//! Project configuration: discovery and parsing of `.cdf-dev.yaml`
//!
//! The file format is a deliberately restricted subset of block-style YAML:
//! two levels of nesting, scalar fields, and a single list construct under
//! `envPresets`. The only consumer is this tool's own per-project file, so a
//! full YAML parser would be unnecessary; parsing is a single line-oriented
//! pass with no backtracking and no external dependency.
//!
//! Parsing is total: unrecognized or malformed lines are silently ignored.
//! Loading only fails on I/O errors; missing fields surface as empty strings
//! (or defaults) on the returned record and fail, if at all, at the external
//! tool that receives them.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// File name searched for when walking up from the invocation directory.
pub const CONFIG_FILE_NAME: &str = ".cdf-dev.yaml";

/// Cluster context used when the `cluster` section does not set one.
pub const DEFAULT_CLUSTER_CONTEXT: &str = "az-arn-dev-002";

/// Build tool family assumed when the `build` section does not set one.
pub const DEFAULT_BUILD_TYPE: &str = "bazel";

/// API port assumed when `ports.api` is not configured.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Log lines fetched when `--tail` is not given.
pub const DEFAULT_LOG_TAIL: u32 = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {file}: {source}", file = .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The workload this project deploys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub name: String,
    pub namespace: String,
    pub deployment: String,
}

/// How the image artifact is produced and published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub build_type: String,
    pub target: String,
    pub push_target: String,
}

/// Where the artifact is deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub context: String,
    pub registry: String,
}

/// Default network endpoints for debug and port-forward operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortsConfig {
    pub api: Option<u16>,
    pub metrics: Option<u16>,
}

/// Parsed, immutable representation of `.cdf-dev.yaml`.
///
/// The required string fields are never null: a field absent from the file
/// loads as an empty string so downstream argument composition never has a
/// missing value to trip over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevConfig {
    pub service: ServiceConfig,
    pub build: BuildConfig,
    pub cluster: ClusterConfig,
    /// Present iff a `ports:` section header appeared in the file.
    pub ports: Option<PortsConfig>,
    /// Named, ordered lists of `KEY=VALUE` strings; empty when the file has
    /// no `envPresets:` section.
    pub env_presets: BTreeMap<String, Vec<String>>,
}

/// Locate the nearest `.cdf-dev.yaml` at or above `start_dir`.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = std::path::absolute(start_dir).ok()?;
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            debug!("found config file: {}", candidate.display());
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Find and parse the nearest configuration.
///
/// `Ok(None)` means no config file exists anywhere on the upward path;
/// callers decide whether that is fatal.
pub fn find_config(start_dir: &Path) -> Result<Option<DevConfig>, ConfigError> {
    match find_config_file(start_dir) {
        Some(path) => load_config(&path).map(Some),
        None => Ok(None),
    }
}

/// Load and parse a specific configuration file.
pub fn load_config(path: &Path) -> Result<DevConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_config(&text))
}

/// What the parser is positioned inside after the lines seen so far.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParserMode {
    Root,
    InSection(String),
    InPresets,
    InPreset(String),
}

#[derive(Debug, Default)]
struct RawConfig {
    sections: BTreeMap<String, BTreeMap<String, String>>,
    presets: BTreeMap<String, Vec<String>>,
}

/// Parse configuration text into a [`DevConfig`].
pub fn parse_config(text: &str) -> DevConfig {
    let mut raw = RawConfig::default();
    let mut mode = ParserMode::Root;
    for line in text.lines() {
        mode = parse_line(line, mode, &mut raw);
    }
    assemble(raw)
}

/// Consume one line, returning the mode the next line starts in. The mode
/// value is the parser's only cross-line state.
fn parse_line(line: &str, mode: ParserMode, raw: &mut RawConfig) -> ParserMode {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return mode;
    }

    // Indentation is a count of leading spaces; tabs are not normalized.
    let indent = line.chars().take_while(|c| *c == ' ').count();

    if indent == 0 {
        if let Some(name) = trimmed.strip_suffix(':') {
            if name == "envPresets" {
                return ParserMode::InPresets;
            }
            // A repeated section header replaces the earlier mapping.
            raw.sections.insert(name.to_string(), BTreeMap::new());
            return ParserMode::InSection(name.to_string());
        }
        return mode;
    }

    match (&mode, indent) {
        (ParserMode::InPresets | ParserMode::InPreset(_), 2) => {
            if let Some(name) = trimmed.strip_suffix(':') {
                raw.presets.insert(name.to_string(), Vec::new());
                return ParserMode::InPreset(name.to_string());
            }
        }
        (ParserMode::InPreset(name), 4) => {
            if let Some(entry) = trimmed.strip_prefix("- ") {
                if let Some(list) = raw.presets.get_mut(name) {
                    list.push(entry.to_string());
                }
            }
        }
        (ParserMode::InSection(name), 2) => {
            if let Some((key, value)) = trimmed.split_once(':') {
                let value = value.trim();
                // A key without a value is a header for nesting this format
                // does not support; drop it.
                if !value.is_empty() {
                    if let Some(section) = raw.sections.get_mut(name) {
                        section.insert(key.trim().to_string(), value.to_string());
                    }
                }
            }
        }
        _ => {}
    }
    mode
}

fn assemble(raw: RawConfig) -> DevConfig {
    let RawConfig { sections, presets } = raw;

    let field = |section: &str, key: &str| -> String {
        sections
            .get(section)
            .and_then(|fields| fields.get(key))
            .cloned()
            .unwrap_or_default()
    };
    let field_or = |section: &str, key: &str, default: &str| -> String {
        let value = field(section, key);
        if value.is_empty() {
            default.to_string()
        } else {
            value
        }
    };

    // Numeric coercion is best-effort: a value that does not parse is
    // treated as absent, not as an error.
    let ports = sections.get("ports").map(|fields| PortsConfig {
        api: fields.get("api").and_then(|v| v.parse().ok()),
        metrics: fields.get("metrics").and_then(|v| v.parse().ok()),
    });

    DevConfig {
        service: ServiceConfig {
            name: field("service", "name"),
            namespace: field("service", "namespace"),
            deployment: field("service", "deployment"),
        },
        build: BuildConfig {
            build_type: field_or("build", "type", DEFAULT_BUILD_TYPE),
            target: field("build", "target"),
            push_target: field("build", "pushTarget"),
        },
        cluster: ClusterConfig {
            context: field_or("cluster", "context", DEFAULT_CLUSTER_CONTEXT),
            registry: field("cluster", "registry"),
        },
        ports,
        env_presets: presets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_minimal_config_when_parsed_then_required_fields_set() {
        let config = parse_config(
            "service:\n  name: demo\n  namespace: demo-ns\n  deployment: demo-api\n",
        );
        assert_eq!(config.service.name, "demo");
        assert_eq!(config.service.namespace, "demo-ns");
        assert_eq!(config.service.deployment, "demo-api");
        assert_eq!(config.build.target, "");
        assert_eq!(config.cluster.registry, "");
    }

    #[test]
    fn given_no_cluster_context_when_parsed_then_default_applies() {
        let config = parse_config("cluster:\n  registry: reg.example.com\n");
        assert_eq!(config.cluster.context, DEFAULT_CLUSTER_CONTEXT);
        assert_eq!(config.cluster.registry, "reg.example.com");
    }

    #[test]
    fn given_value_with_colon_when_parsed_then_split_on_first_colon_only() {
        let config = parse_config("cluster:\n  registry: localhost:5000\n");
        assert_eq!(config.cluster.registry, "localhost:5000");
    }

    #[test]
    fn given_key_without_value_when_parsed_then_dropped() {
        // Headers for unsupported nested structures must not pollute fields.
        let config = parse_config(
            "cluster:\n  annotations:\n  registry: reg.example.com\n",
        );
        assert_eq!(config.cluster.registry, "reg.example.com");
    }

    #[test]
    fn given_comments_and_blanks_when_parsed_then_skipped() {
        let config = parse_config(
            "# header comment\n\nservice:\n  # inline comment line\n  name: demo\n\n",
        );
        assert_eq!(config.service.name, "demo");
    }

    #[test]
    fn given_presets_when_parsed_then_entry_order_preserved() {
        let config = parse_config(
            "envPresets:\n  debug:\n    - LOG_LEVEL=debug\n    - TRACE=1\n",
        );
        assert_eq!(
            config.env_presets.get("debug"),
            Some(&vec!["LOG_LEVEL=debug".to_string(), "TRACE=1".to_string()])
        );
    }

    #[test]
    fn given_section_after_presets_when_parsed_then_preset_mode_exited() {
        let config = parse_config(
            "envPresets:\n  debug:\n    - TRACE=1\nservice:\n  name: demo\n",
        );
        assert_eq!(config.service.name, "demo");
        assert_eq!(config.env_presets.len(), 1);
    }

    #[test]
    fn given_scalar_line_in_preset_mode_when_parsed_then_ignored() {
        let config = parse_config(
            "service:\n  name: demo\nenvPresets:\n  stray: value\n",
        );
        // The stray assignment must not leak into the previous section.
        assert_eq!(config.service.name, "demo");
        assert!(config.env_presets.is_empty());
    }

    #[test]
    fn given_list_entry_without_open_preset_when_parsed_then_ignored() {
        let config = parse_config("envPresets:\n    - ORPHAN=1\n");
        assert!(config.env_presets.is_empty());
    }

    #[test]
    fn given_unrecognized_lines_when_parsed_then_ignored() {
        let config = parse_config(
            "service:\n  name: demo\n   odd indent: x\n- top level list\nnot a header\n",
        );
        assert_eq!(config.service.name, "demo");
    }

    #[test]
    fn given_nonnumeric_port_when_parsed_then_port_absent() {
        let config = parse_config("ports:\n  api: http\n  metrics: 9091\n");
        let ports = config.ports.expect("ports section opens the record");
        assert_eq!(ports.api, None);
        assert_eq!(ports.metrics, Some(9091));
    }

    #[test]
    fn given_no_ports_section_when_parsed_then_ports_none() {
        let config = parse_config("service:\n  name: demo\n");
        assert!(config.ports.is_none());
    }

    #[test]
    fn given_build_type_when_parsed_then_overrides_default() {
        let config = parse_config("build:\n  type: docker\n  target: //x:image\n");
        assert_eq!(config.build.build_type, "docker");
        let config = parse_config("build:\n  target: //x:image\n");
        assert_eq!(config.build.build_type, DEFAULT_BUILD_TYPE);
    }
}
