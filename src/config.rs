use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::k8s::OutputLimits;
use crate::model::{NamespaceScope, ResourceKind};

const CONFIG_ENV: &str = "KUBEGLANCE_CONFIG";
const KUBECONFIG_ENV: &str = "KUBEGLANCE_KUBECONFIG";
const MIN_REFRESH_MS: u64 = 500;
const MIN_REQUEST_TIMEOUT_MS: u64 = 250;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    refresh_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    log_filter: Option<String>,
    log_file: Option<PathBuf>,
    max_output_bytes: Option<usize>,
    max_output_lines: Option<usize>,
    log_tail_lines: Option<i64>,
    diagnostic_command: Option<Vec<String>>,
    kubeconfig: Option<PathBuf>,
}

/// Effective runtime settings: CLI over config file over defaults.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    pub source: Option<PathBuf>,
    pub namespace: NamespaceScope,
    pub kind: ResourceKind,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
    pub max_output_bytes: usize,
    pub max_output_lines: usize,
    pub log_tail_lines: i64,
    pub diagnostic_command: Vec<String>,
    pub kubeconfig: Option<PathBuf>,
}

impl Settings {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let source = args.config.clone().or_else(discover_config_path);
        let file = match &source {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };
        let kubeconfig_env = std::env::var(KUBECONFIG_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Ok(Self::resolve(args, file, source, kubeconfig_env))
    }

    fn resolve(
        args: &CliArgs,
        file: ConfigFile,
        source: Option<PathBuf>,
        kubeconfig_env: Option<PathBuf>,
    ) -> Self {
        let refresh_ms = args
            .refresh_ms
            .or(file.refresh_ms)
            .unwrap_or(2_000)
            .max(MIN_REFRESH_MS);

        Self {
            source,
            namespace: args
                .namespace
                .as_deref()
                .map(NamespaceScope::parse)
                .unwrap_or_default(),
            kind: args.kind.unwrap_or(ResourceKind::Pod),
            refresh_interval: Duration::from_millis(refresh_ms),
            request_timeout: Duration::from_millis(
                file.request_timeout_ms
                    .unwrap_or(4_000)
                    .max(MIN_REQUEST_TIMEOUT_MS),
            ),
            log_filter: args
                .log_filter
                .clone()
                .or(file.log_filter)
                .unwrap_or_else(|| "info".to_string()),
            log_file: args.log_file.clone().or(file.log_file),
            max_output_bytes: file.max_output_bytes.unwrap_or(256 * 1024).max(1),
            max_output_lines: file.max_output_lines.unwrap_or(400).max(1),
            log_tail_lines: file.log_tail_lines.unwrap_or(500).max(1),
            diagnostic_command: file
                .diagnostic_command
                .filter(|command| !command.is_empty())
                .unwrap_or_else(|| vec!["env".to_string()]),
            kubeconfig: kubeconfig_env.or(file.kubeconfig),
        }
    }

    pub fn output_limits(&self) -> OutputLimits {
        OutputLimits {
            max_bytes: self.max_output_bytes,
            log_tail_lines: self.log_tail_lines,
        }
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("kubeglance.yaml"),
        PathBuf::from(".kubeglance.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let candidate = PathBuf::from(home).join(".config/kubeglance/config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}
