use chrono::{DateTime, Utc};
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMap, ContainerStatus as KubeContainerStatus, Namespace, Pod, Service,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use futures::AsyncReadExt as FuturesReadExt;
use kube::{Api, Client, Config, ResourceExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;
use tracing::debug;

use crate::error::GatewayError;
use crate::model::{
    ConfigMapPayload, ContainerState, ContainerStatus, DeploymentPayload, LogStreamPayload,
    NamespaceScope, PodPayload, ResourceKind, ResourcePayload, ResourceRecord, ServicePayload,
};

/// What to capture for the command output pane.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum OutputRequest {
    Logs { container: Option<String> },
    Command(Vec<String>),
}

impl OutputRequest {
    pub fn describe(&self) -> String {
        match self {
            Self::Logs {
                container: Some(container),
            } => format!("logs [{container}]"),
            Self::Logs { container: None } => "logs".to_string(),
            Self::Command(command) => format!("exec {}", command.join(" ")),
        }
    }
}

/// The narrow surface the rest of the program sees of the cluster API.
pub trait ClusterGateway: Send + Sync + 'static {
    fn list(
        &self,
        kind: ResourceKind,
        scope: &NamespaceScope,
    ) -> impl Future<Output = Result<Vec<ResourceRecord>, GatewayError>> + Send;

    fn namespaces(&self) -> impl Future<Output = Result<Vec<String>, GatewayError>> + Send;

    fn exec(
        &self,
        namespace: &str,
        pod: &str,
        request: &OutputRequest,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;
}

#[derive(Debug, Clone, Copy)]
pub struct OutputLimits {
    pub max_bytes: usize,
    pub log_tail_lines: i64,
}

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    context: String,
    cluster: String,
    kubeconfig: Option<PathBuf>,
    limits: OutputLimits,
}

impl KubeGateway {
    /// Builds a client from the explicit kubeconfig when given, otherwise
    /// from ambient discovery. Failure here is fatal to startup.
    pub async fn connect(
        kubeconfig: Option<&Path>,
        limits: OutputLimits,
    ) -> Result<Self, GatewayError> {
        let (config, context) = match kubeconfig {
            Some(path) => {
                let parsed = Kubeconfig::read_from(path).map_err(|error| {
                    GatewayError::Connection(format!(
                        "failed to read kubeconfig {}: {error}",
                        path.display()
                    ))
                })?;
                let context = parsed.current_context.clone();
                let config =
                    Config::from_custom_kubeconfig(parsed, &KubeConfigOptions::default())
                        .await
                        .map_err(|error| {
                            GatewayError::Connection(format!(
                                "failed to load kubeconfig {}: {error}",
                                path.display()
                            ))
                        })?;
                (config, context)
            }
            None => {
                let context = Kubeconfig::read()
                    .ok()
                    .and_then(|parsed| parsed.current_context);
                let config = Config::infer().await.map_err(|error| {
                    GatewayError::Connection(format!(
                        "failed to infer Kubernetes configuration: {error}"
                    ))
                })?;
                (config, context)
            }
        };

        let cluster = config.cluster_url.to_string();
        let client = Client::try_from(config).map_err(|error| {
            GatewayError::Connection(format!("failed to initialize Kubernetes client: {error}"))
        })?;

        Ok(Self {
            client,
            context: context.unwrap_or_else(|| "in-cluster".to_string()),
            cluster,
            kubeconfig: kubeconfig.map(Path::to_path_buf),
            limits,
        })
    }

    pub async fn check_connection(&self) -> Result<(), GatewayError> {
        let version = self
            .client
            .apiserver_version()
            .await
            .map_err(|error| GatewayError::Connection(error.to_string()))?;
        debug!("connected to {} ({})", self.cluster, version.git_version);
        Ok(())
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    fn scoped_api<K>(&self, scope: &NamespaceScope) -> Api<K>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        match scope {
            NamespaceScope::All => Api::all(self.client.clone()),
            NamespaceScope::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        }
    }

    /// Streams the log endpoint and keeps the first `max_bytes`; invalid
    /// UTF-8 in the kept bytes is replaced.
    async fn fetch_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: Option<&str>,
    ) -> Result<String, GatewayError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let limit = self.limits.max_bytes;
        let params = LogParams {
            container: container.map(str::to_string),
            tail_lines: Some(self.limits.log_tail_lines),
            // One byte past the cap tells a full log apart from a cut one.
            limit_bytes: Some(i64::try_from(limit).unwrap_or(i64::MAX).saturating_add(1)),
            ..LogParams::default()
        };

        let stream = pods.log_stream(pod, &params).await?;
        let mut stream = pin!(stream);
        let mut buffer = CappedBuffer::new(limit);
        let mut chunk = [0u8; 8 * 1024];
        loop {
            let read = FuturesReadExt::read(&mut stream, &mut chunk)
                .await
                .map_err(|error| {
                    GatewayError::transport(format!("failed reading logs of {namespace}/{pod}: {error}"))
                })?;
            if read == 0 || !buffer.push(&chunk[..read]) {
                break;
            }
        }

        let (kept, truncated) = buffer.into_parts();
        let mut logs = String::from_utf8_lossy(&kept).into_owned();
        if truncated {
            logs.push_str(&truncation_marker(limit));
        }
        Ok(logs)
    }

    async fn run_kubectl_exec(
        &self,
        namespace: &str,
        pod: &str,
        command: &[String],
    ) -> Result<String, GatewayError> {
        if command.is_empty() {
            return Err(GatewayError::transport("no command configured"));
        }

        let mut cmd = TokioCommand::new("kubectl");
        if let Some(path) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(path);
        }
        cmd.arg("exec")
            .arg("-n")
            .arg(namespace)
            .arg(pod)
            .arg("--")
            .args(command);
        debug!("kubectl exec in {namespace}/{pod}: {}", command.join(" "));
        capture_command(cmd, self.limits.max_bytes).await
    }
}

impl ClusterGateway for KubeGateway {
    async fn list(
        &self,
        kind: ResourceKind,
        scope: &NamespaceScope,
    ) -> Result<Vec<ResourceRecord>, GatewayError> {
        let mut records = match kind {
            ResourceKind::Pod => list_all(&self.scoped_api::<Pod>(scope))
                .await?
                .iter()
                .map(pod_record)
                .collect::<Vec<_>>(),
            ResourceKind::Deployment => list_all(&self.scoped_api::<Deployment>(scope))
                .await?
                .iter()
                .map(deployment_record)
                .collect(),
            ResourceKind::Service => list_all(&self.scoped_api::<Service>(scope))
                .await?
                .iter()
                .map(service_record)
                .collect(),
            ResourceKind::ConfigMap => list_all(&self.scoped_api::<ConfigMap>(scope))
                .await?
                .iter()
                .map(configmap_record)
                .collect(),
            ResourceKind::LogStream => list_all(&self.scoped_api::<Pod>(scope))
                .await?
                .iter()
                .flat_map(log_stream_records)
                .collect(),
        };

        records.sort_by(|left, right| {
            left.namespace
                .cmp(&right.namespace)
                .then_with(|| left.name.cmp(&right.name))
        });
        Ok(records)
    }

    async fn namespaces(&self) -> Result<Vec<String>, GatewayError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let mut names = list_all(&namespaces)
            .await?
            .iter()
            .map(ResourceExt::name_any)
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    async fn exec(
        &self,
        namespace: &str,
        pod: &str,
        request: &OutputRequest,
    ) -> Result<String, GatewayError> {
        match request {
            OutputRequest::Logs { container } => {
                self.fetch_logs(namespace, pod, container.as_deref()).await
            }
            OutputRequest::Command(command) => {
                self.run_kubectl_exec(namespace, pod, command).await
            }
        }
    }
}

const LIST_PAGE_SIZE: u32 = 500;

/// Lists every object, following continue tokens until the server reports
/// the last page.
async fn list_all<K>(api: &Api<K>) -> Result<Vec<K>, GatewayError>
where
    K: Clone + DeserializeOwned + Debug,
{
    let mut items = Vec::new();
    let mut params = ListParams::default().limit(LIST_PAGE_SIZE);
    loop {
        let page = api.list(&params).await?;
        let next = page.metadata.continue_.filter(|token| !token.is_empty());
        items.extend(page.items);
        match next {
            Some(token) => {
                params = ListParams::default()
                    .limit(LIST_PAGE_SIZE)
                    .continue_token(&token);
            }
            None => return Ok(items),
        }
    }
}

fn truncation_marker(limit: usize) -> String {
    format!("\n… output truncated at {limit} bytes")
}

/// Runs a prepared command with piped output and renders what it printed.
/// Stdout past `limit` kills the child and appends the truncation marker;
/// a non-zero exit without truncation is an error carrying stderr's first
/// line.
async fn capture_command(mut cmd: TokioCommand, limit: usize) -> Result<String, GatewayError> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|error| GatewayError::transport(format!("failed to start {program}: {error}")))?;

    let stderr = tokio::spawn(read_capped(child.stderr.take(), limit, true));
    let (stdout, truncated) = read_capped(child.stdout.take(), limit, false)
        .await
        .map_err(|error| GatewayError::transport(format!("failed reading {program} output: {error}")))?;
    if truncated {
        let _ = child.start_kill();
    }

    let status = child
        .wait()
        .await
        .map_err(|error| GatewayError::transport(format!("waiting on {program} failed: {error}")))?;
    let (stderr, _) = stderr
        .await
        .map_err(|error| GatewayError::transport(format!("stderr reader failed: {error}")))?
        .map_err(|error| GatewayError::transport(format!("failed reading {program} stderr: {error}")))?;

    let stdout = String::from_utf8_lossy(&stdout);
    let stderr = String::from_utf8_lossy(&stderr);
    if !status.success() && !truncated {
        let detail = stderr.lines().next().unwrap_or_default().trim();
        return Err(GatewayError::transport(format!(
            "{program} exited with {status}: {detail}"
        )));
    }

    let mut rendered = match (stdout.trim().is_empty(), stderr.trim().is_empty()) {
        (_, true) => stdout.into_owned(),
        (true, false) => format!("stderr:\n{stderr}"),
        (false, false) => format!("stdout:\n{stdout}\n\nstderr:\n{stderr}"),
    };
    if truncated {
        rendered.push_str(&truncation_marker(limit));
    }
    Ok(rendered)
}

/// Keeps the first `limit` bytes offered and remembers whether more came.
struct CappedBuffer {
    kept: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl CappedBuffer {
    fn new(limit: usize) -> Self {
        Self {
            kept: Vec::new(),
            limit,
            truncated: false,
        }
    }

    /// Returns false once anything past the limit has been seen.
    fn push(&mut self, chunk: &[u8]) -> bool {
        let room = self.limit.saturating_sub(self.kept.len());
        self.kept.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if chunk.len() > room {
            self.truncated = true;
        }
        !self.truncated
    }

    fn into_parts(self) -> (Vec<u8>, bool) {
        (self.kept, self.truncated)
    }
}

/// Keeps at most `limit` bytes. With `drain` the rest of the stream is read
/// and discarded so the writer never blocks; without it reading stops.
async fn read_capped<R>(
    reader: Option<R>,
    limit: usize,
    drain: bool,
) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = CappedBuffer::new(limit);
    let Some(mut reader) = reader else {
        return Ok(buffer.into_parts());
    };

    let mut chunk = [0u8; 8 * 1024];
    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 || (!buffer.push(&chunk[..read]) && !drain) {
            break;
        }
    }

    Ok(buffer.into_parts())
}

fn created_at(timestamp: Option<&Time>) -> Option<DateTime<Utc>> {
    timestamp.and_then(|time| DateTime::from_timestamp(time.0.as_second(), 0))
}

fn container_state(status: &KubeContainerStatus) -> ContainerState {
    let Some(state) = status.state.as_ref() else {
        return ContainerState::Unknown;
    };
    if let Some(waiting) = state.waiting.as_ref() {
        ContainerState::Waiting {
            reason: waiting.reason.clone(),
        }
    } else if let Some(terminated) = state.terminated.as_ref() {
        ContainerState::Terminated {
            reason: terminated.reason.clone(),
        }
    } else if state.running.is_some() {
        ContainerState::Running
    } else {
        ContainerState::Unknown
    }
}

fn container_statuses(pod: &Pod) -> Vec<ContainerStatus> {
    pod.status
        .as_ref()
        .and_then(|status| status.container_statuses.as_ref())
        .map(|statuses| {
            statuses
                .iter()
                .map(|status| ContainerStatus {
                    name: status.name.clone(),
                    ready: status.ready,
                    restart_count: status.restart_count,
                    state: container_state(status),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn pod_record(pod: &Pod) -> ResourceRecord {
    ResourceRecord {
        name: pod.name_any(),
        namespace: pod.namespace(),
        created: created_at(pod.metadata.creation_timestamp.as_ref()),
        payload: ResourcePayload::Pod(PodPayload {
            phase: pod.status.as_ref().and_then(|status| status.phase.clone()),
            spec_containers: pod
                .spec
                .as_ref()
                .map_or(0, |spec| spec.containers.len()),
            containers: container_statuses(pod),
            node: pod.spec.as_ref().and_then(|spec| spec.node_name.clone()),
        }),
    }
}

fn log_stream_records(pod: &Pod) -> Vec<ResourceRecord> {
    let pod_name = pod.name_any();
    let namespace = pod.namespace();
    let created = created_at(pod.metadata.creation_timestamp.as_ref());
    container_statuses(pod)
        .into_iter()
        .map(|container| ResourceRecord {
            name: format!("{pod_name}/{}", container.name),
            namespace: namespace.clone(),
            created,
            payload: ResourcePayload::LogStream(LogStreamPayload {
                pod: pod_name.clone(),
                container,
            }),
        })
        .collect()
}

fn deployment_record(deployment: &Deployment) -> ResourceRecord {
    let status = deployment.status.as_ref();
    let progress_deadline_exceeded = status
        .and_then(|status| status.conditions.as_ref())
        .is_some_and(|conditions| {
            conditions.iter().any(|condition| {
                condition.type_ == "Progressing"
                    && condition.reason.as_deref() == Some("ProgressDeadlineExceeded")
            })
        });

    ResourceRecord {
        name: deployment.name_any(),
        namespace: deployment.namespace(),
        created: created_at(deployment.metadata.creation_timestamp.as_ref()),
        payload: ResourcePayload::Deployment(DeploymentPayload {
            desired: deployment.spec.as_ref().and_then(|spec| spec.replicas),
            ready: status.and_then(|status| status.ready_replicas),
            updated: status.and_then(|status| status.updated_replicas),
            available: status.and_then(|status| status.available_replicas),
            progress_deadline_exceeded,
        }),
    }
}

fn service_record(service: &Service) -> ResourceRecord {
    let spec = service.spec.as_ref();
    let ports = spec
        .and_then(|spec| spec.ports.as_ref())
        .map(|ports| {
            ports
                .iter()
                .map(|port| {
                    let protocol = port.protocol.as_deref().unwrap_or("TCP");
                    format!("{}/{protocol}", port.port)
                })
                .collect()
        })
        .unwrap_or_default();

    ResourceRecord {
        name: service.name_any(),
        namespace: service.namespace(),
        created: created_at(service.metadata.creation_timestamp.as_ref()),
        payload: ResourcePayload::Service(ServicePayload {
            service_type: spec.and_then(|spec| spec.type_.clone()),
            cluster_ip: spec.and_then(|spec| spec.cluster_ip.clone()),
            ports,
        }),
    }
}

fn configmap_record(configmap: &ConfigMap) -> ResourceRecord {
    let data = configmap.data.as_ref().map_or(0, |entries| entries.len());
    let binary = configmap
        .binary_data
        .as_ref()
        .map_or(0, |entries| entries.len());

    ResourceRecord {
        name: configmap.name_any(),
        namespace: configmap.namespace(),
        created: created_at(configmap.metadata.creation_timestamp.as_ref()),
        payload: ResourcePayload::ConfigMap(ConfigMapPayload {
            keys: data + binary,
            immutable: configmap.immutable.unwrap_or(false),
        }),
    }
}
