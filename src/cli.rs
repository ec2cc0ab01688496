use clap::Parser;
use std::path::PathBuf;

use crate::model::ResourceKind;

#[derive(Debug, Clone, Parser, Default)]
#[command(
    name = "kubeglance",
    version,
    about = "Browse live Kubernetes pods, deployments, services and logs from the terminal."
)]
pub struct CliArgs {
    /// Namespace to start in ("all" for every namespace)
    pub namespace: Option<String>,

    /// Resource kind to open first (po, deploy, svc, cm, logs)
    #[arg(long, value_parser = parse_kind)]
    pub kind: Option<ResourceKind>,

    /// Refresh interval in milliseconds
    #[arg(long)]
    pub refresh_ms: Option<u64>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Append tracing output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Explicit config file instead of the discovered one
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_kind(value: &str) -> Result<ResourceKind, String> {
    ResourceKind::from_token(value).ok_or_else(|| format!("unknown resource kind `{value}`"))
}
