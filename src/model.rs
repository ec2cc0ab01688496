use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Pod,
    Deployment,
    Service,
    ConfigMap,
    LogStream,
}

impl ResourceKind {
    pub const ALL: [Self; 5] = [
        Self::Pod,
        Self::Deployment,
        Self::Service,
        Self::ConfigMap,
        Self::LogStream,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Pod => "Pods",
            Self::Deployment => "Deployments",
            Self::Service => "Services",
            Self::ConfigMap => "ConfigMaps",
            Self::LogStream => "Logs",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "po" | "pod" | "pods" => Some(Self::Pod),
            "deploy" | "deployment" | "deployments" | "dp" => Some(Self::Deployment),
            "svc" | "service" | "services" => Some(Self::Service),
            "cm" | "configmap" | "configmaps" | "config-map" | "config-maps" => {
                Some(Self::ConfigMap)
            }
            "log" | "logs" | "logstream" | "log-stream" => Some(Self::LogStream),
            _ => None,
        }
    }

    pub fn short_token(self) -> &'static str {
        match self {
            Self::Pod => "po",
            Self::Deployment => "deploy",
            Self::Service => "svc",
            Self::ConfigMap => "cm",
            Self::LogStream => "logs",
        }
    }

    /// One-based position used for the number-key hints in the header.
    pub fn hint(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .map_or(0, |index| index + 1)
    }

    pub fn from_hint(hint: usize) -> Option<Self> {
        hint.checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn offset(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let current = self.hint() as isize - 1;
        Self::ALL[(current + delta).rem_euclid(len) as usize]
    }

    /// Kinds whose rows point at a pod that logs or commands can target.
    pub fn targets_pod(self) -> bool {
        matches!(self, Self::Pod | Self::LogStream)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum NamespaceScope {
    All,
    Named(String),
}

impl NamespaceScope {
    pub const ALL_LABEL: &'static str = "all";

    /// Empty input and the literal `all` both mean every namespace.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(Self::ALL_LABEL) {
            Self::All
        } else {
            Self::Named(value.to_string())
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::All => Self::ALL_LABEL.to_string(),
            Self::Named(namespace) => namespace.clone(),
        }
    }

    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Named(namespace) => Some(namespace),
        }
    }
}

impl Default for NamespaceScope {
    fn default() -> Self {
        Self::Named("default".to_string())
    }
}

impl Display for NamespaceScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "{}", Self::ALL_LABEL),
            Self::Named(namespace) => write!(f, "{namespace}"),
        }
    }
}

/// The context a refresh is issued for; results are tagged with it.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Selection {
    pub kind: ResourceKind,
    pub scope: NamespaceScope,
}

impl Selection {
    pub fn new(kind: ResourceKind, scope: NamespaceScope) -> Self {
        Self { kind, scope }
    }
}

impl Display for Selection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.kind.short_token(), self.scope)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub enum ContainerState {
    Running,
    Waiting {
        reason: Option<String>,
    },
    Terminated {
        reason: Option<String>,
    },
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub restart_count: i32,
    pub state: ContainerState,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PodPayload {
    pub phase: Option<String>,
    pub spec_containers: usize,
    pub containers: Vec<ContainerStatus>,
    pub node: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct DeploymentPayload {
    pub desired: Option<i32>,
    pub ready: Option<i32>,
    pub updated: Option<i32>,
    pub available: Option<i32>,
    pub progress_deadline_exceeded: bool,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ServicePayload {
    pub service_type: Option<String>,
    pub cluster_ip: Option<String>,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct ConfigMapPayload {
    pub keys: usize,
    pub immutable: bool,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct LogStreamPayload {
    pub pod: String,
    pub container: ContainerStatus,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourcePayload {
    Pod(PodPayload),
    Deployment(DeploymentPayload),
    Service(ServicePayload),
    ConfigMap(ConfigMapPayload),
    LogStream(LogStreamPayload),
}

/// Immutable snapshot of one cluster object as returned by the gateway.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResourceRecord {
    pub name: String,
    pub namespace: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub payload: ResourcePayload,
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct DisplayRow {
    pub name: String,
    pub namespace: String,
    pub ready: String,
    pub status: String,
    pub restarts: Option<i32>,
    pub age: String,
    pub info: String,
}

impl DisplayRow {
    pub const HEADERS: [&'static str; 7] = [
        "Name",
        "Namespace",
        "Ready",
        "Status",
        "Restarts",
        "Age",
        "Info",
    ];

    pub fn columns(&self) -> [String; 7] {
        [
            self.name.clone(),
            self.namespace.clone(),
            self.ready.clone(),
            self.status.clone(),
            self.restarts
                .map_or_else(|| "-".to_string(), |count| count.to_string()),
            self.age.clone(),
            self.info.clone(),
        ]
    }

    /// Pod name and optional container this row targets for logs or exec.
    pub fn pod_target(&self, kind: ResourceKind) -> Option<(String, Option<String>)> {
        match kind {
            ResourceKind::Pod => Some((self.name.clone(), None)),
            ResourceKind::LogStream => {
                let (pod, container) = self.name.split_once('/')?;
                Some((pod.to_string(), Some(container.to_string())))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum NavigationMode {
    #[default]
    Normal,
    NamespaceSelect,
    CommandOutput,
}

impl NavigationMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "nrm",
            Self::NamespaceSelect => "ns",
            Self::CommandOutput => "out",
        }
    }
}
