//! Display status derivation. Everything here is pure: the caller supplies
//! `now`, and records missing sub-fields fall back to safe defaults.

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::{
    ConfigMapPayload, ContainerState, ContainerStatus, DeploymentPayload, DisplayRow,
    LogStreamPayload, PodPayload, ResourcePayload, ResourceRecord, ServicePayload,
};

const NOT_READY: &str = "NotReady";
const UNKNOWN: &str = "Unknown";
const RUNNING: &str = "Running";

pub fn derive_row(record: &ResourceRecord, now: DateTime<Utc>) -> DisplayRow {
    let age = record
        .created
        .map_or_else(|| "-".to_string(), |created| format_age(now - created));
    let namespace = record.namespace.clone().unwrap_or_else(|| "-".to_string());

    let (ready, status, restarts, info) = match &record.payload {
        ResourcePayload::Pod(pod) => (
            pod_ready(pod),
            pod_status(pod),
            Some(pod_restarts(pod)),
            pod.node.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ResourcePayload::Deployment(deployment) => deployment_columns(deployment),
        ResourcePayload::Service(service) => service_columns(service),
        ResourcePayload::ConfigMap(configmap) => configmap_columns(configmap),
        ResourcePayload::LogStream(stream) => log_stream_columns(stream),
    };

    DisplayRow {
        name: record.name.clone(),
        namespace,
        ready,
        status,
        restarts,
        age,
        info,
    }
}

pub fn pod_status(pod: &PodPayload) -> String {
    let Some(phase) = pod.phase.as_deref().filter(|phase| !phase.is_empty()) else {
        return UNKNOWN.to_string();
    };
    if phase != RUNNING {
        return phase.to_string();
    }

    match pod.containers.iter().find(|container| !container.ready) {
        None => RUNNING.to_string(),
        Some(container) => match &container.state {
            ContainerState::Waiting {
                reason: Some(reason),
            } if !reason.is_empty() => reason.clone(),
            _ => NOT_READY.to_string(),
        },
    }
}

pub fn pod_restarts(pod: &PodPayload) -> i32 {
    pod.containers
        .iter()
        .map(|container| container.restart_count)
        .sum()
}

pub fn pod_ready(pod: &PodPayload) -> String {
    let ready = pod
        .containers
        .iter()
        .filter(|container| container.ready)
        .count();
    let total = if pod.spec_containers > 0 {
        pod.spec_containers
    } else {
        pod.containers.len()
    };
    format!("{ready}/{total}")
}

/// Truncates to the coarsest unit with a non-zero count. Exactly 60s is
/// "1m", exactly 60m is "1h", exactly 24h is "1d".
pub fn format_age(elapsed: TimeDelta) -> String {
    let seconds = elapsed.num_seconds().max(0);
    if seconds >= 86_400 {
        return format!("{}d", seconds / 86_400);
    }

    if seconds >= 3_600 {
        return format!("{}h", seconds / 3_600);
    }

    if seconds >= 60 {
        return format!("{}m", seconds / 60);
    }

    format!("{seconds}s")
}

fn deployment_columns(deployment: &DeploymentPayload) -> (String, String, Option<i32>, String) {
    let desired = deployment.desired.unwrap_or(1);
    let ready = deployment.ready.unwrap_or(0);
    let updated = deployment.updated.unwrap_or(0);
    let available = deployment.available.unwrap_or(0);

    let status = if desired == 0 {
        "ScaledDown"
    } else if ready >= desired && updated >= desired {
        "Available"
    } else if deployment.progress_deadline_exceeded {
        "Stalled"
    } else {
        "Progressing"
    };

    (
        format!("{ready}/{desired}"),
        status.to_string(),
        None,
        format!("{updated} up-to-date, {available} available"),
    )
}

fn service_columns(service: &ServicePayload) -> (String, String, Option<i32>, String) {
    let service_type = service
        .service_type
        .clone()
        .unwrap_or_else(|| "ClusterIP".to_string());
    let cluster_ip = service.cluster_ip.as_deref().unwrap_or("-");
    let info = if service.ports.is_empty() {
        cluster_ip.to_string()
    } else {
        format!("{cluster_ip} {}", service.ports.join(","))
    };

    ("-".to_string(), service_type, None, info)
}

fn configmap_columns(configmap: &ConfigMapPayload) -> (String, String, Option<i32>, String) {
    let status = if configmap.immutable {
        "Immutable"
    } else {
        "Mutable"
    };
    (
        "-".to_string(),
        status.to_string(),
        None,
        format!("{} keys", configmap.keys),
    )
}

fn log_stream_columns(stream: &LogStreamPayload) -> (String, String, Option<i32>, String) {
    let container = &stream.container;
    let ready = if container.ready { "1/1" } else { "0/1" };
    (
        ready.to_string(),
        container_state_label(container),
        Some(container.restart_count),
        stream.pod.clone(),
    )
}

fn container_state_label(container: &ContainerStatus) -> String {
    match &container.state {
        ContainerState::Running => RUNNING.to_string(),
        ContainerState::Waiting { reason } => non_empty_or(reason.as_deref(), "Waiting"),
        ContainerState::Terminated { reason } => non_empty_or(reason.as_deref(), "Terminated"),
        ContainerState::Unknown => UNKNOWN.to_string(),
    }
}

fn non_empty_or(value: Option<&str>, fallback: &str) -> String {
    value
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{derive_row, format_age, pod_ready, pod_restarts, pod_status};
    use crate::model::{
        ConfigMapPayload, ContainerState, ContainerStatus, DeploymentPayload, LogStreamPayload,
        PodPayload, ResourcePayload, ResourceRecord, ServicePayload,
    };
    use chrono::{TimeDelta, TimeZone, Utc};

    fn container(ready: bool, restarts: i32, state: ContainerState) -> ContainerStatus {
        ContainerStatus {
            name: "app".to_string(),
            ready,
            restart_count: restarts,
            state,
        }
    }

    fn pod(phase: &str, containers: Vec<ContainerStatus>) -> PodPayload {
        PodPayload {
            phase: Some(phase.to_string()),
            spec_containers: containers.len(),
            containers,
            node: None,
        }
    }

    #[test]
    fn non_running_phase_wins_over_container_statuses() {
        for phase in ["Pending", "Succeeded", "Failed", "Unknown"] {
            let payload = pod(
                phase,
                vec![container(
                    false,
                    0,
                    ContainerState::Waiting {
                        reason: Some("CrashLoopBackOff".to_string()),
                    },
                )],
            );
            assert_eq!(pod_status(&payload), phase);
        }
    }

    #[test]
    fn running_pod_reports_first_unready_reason() {
        let all_ready = pod(
            "Running",
            vec![
                container(true, 0, ContainerState::Running),
                container(true, 0, ContainerState::Running),
            ],
        );
        assert_eq!(pod_status(&all_ready), "Running");

        let waiting = pod(
            "Running",
            vec![
                container(true, 0, ContainerState::Running),
                container(
                    false,
                    3,
                    ContainerState::Waiting {
                        reason: Some("CrashLoopBackOff".to_string()),
                    },
                ),
            ],
        );
        assert_eq!(pod_status(&waiting), "CrashLoopBackOff");

        let no_reason = pod(
            "Running",
            vec![container(false, 0, ContainerState::Waiting { reason: None })],
        );
        assert_eq!(pod_status(&no_reason), "NotReady");

        let terminated = pod(
            "Running",
            vec![container(
                false,
                0,
                ContainerState::Terminated {
                    reason: Some("Error".to_string()),
                },
            )],
        );
        assert_eq!(pod_status(&terminated), "NotReady");
    }

    #[test]
    fn missing_phase_degrades_to_unknown() {
        assert_eq!(pod_status(&PodPayload::default()), "Unknown");
    }

    #[test]
    fn restarts_sum_across_containers() {
        let payload = pod(
            "Running",
            vec![
                container(true, 2, ContainerState::Running),
                container(true, 5, ContainerState::Running),
            ],
        );
        assert_eq!(pod_restarts(&payload), 7);
        assert_eq!(pod_restarts(&pod("Pending", Vec::new())), 0);
    }

    #[test]
    fn ready_ratio_uses_spec_container_count() {
        let mut payload = pod("Running", vec![container(true, 0, ContainerState::Running)]);
        payload.spec_containers = 2;
        assert_eq!(pod_ready(&payload), "1/2");
        assert_eq!(pod_ready(&PodPayload::default()), "0/0");
    }

    #[test]
    fn age_promotes_at_unit_boundaries() {
        assert_eq!(format_age(TimeDelta::seconds(0)), "0s");
        assert_eq!(format_age(TimeDelta::seconds(59)), "59s");
        assert_eq!(format_age(TimeDelta::seconds(60)), "1m");
        assert_eq!(format_age(TimeDelta::seconds(3_599)), "59m");
        assert_eq!(format_age(TimeDelta::seconds(3_600)), "1h");
        assert_eq!(format_age(TimeDelta::seconds(86_399)), "23h");
        assert_eq!(format_age(TimeDelta::seconds(86_400)), "1d");
        assert_eq!(format_age(TimeDelta::seconds(86_400 * 9 + 5)), "9d");
        assert_eq!(format_age(TimeDelta::seconds(-30)), "0s");
    }

    #[test]
    fn age_is_monotonic_in_elapsed_time() {
        fn rank(age: &str) -> (u8, i64) {
            let (count, unit) = age.split_at(age.len() - 1);
            let unit = match unit {
                "s" => 0,
                "m" => 1,
                "h" => 2,
                _ => 3,
            };
            (unit, count.parse().unwrap_or(0))
        }

        let mut previous = rank(&format_age(TimeDelta::zero()));
        for seconds in (0..200_000).step_by(37) {
            let current = rank(&format_age(TimeDelta::seconds(seconds)));
            assert!(current >= previous, "{seconds}s went backwards");
            previous = current;
        }
    }

    #[test]
    fn derive_row_covers_every_kind() {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let now = created + TimeDelta::minutes(90);
        let record = |payload| ResourceRecord {
            name: "web".to_string(),
            namespace: Some("shop".to_string()),
            created: Some(created),
            payload,
        };

        let row = derive_row(
            &record(ResourcePayload::Pod(pod(
                "Running",
                vec![container(true, 1, ContainerState::Running)],
            ))),
            now,
        );
        assert_eq!(
            (row.ready.as_str(), row.status.as_str(), row.restarts, row.age.as_str()),
            ("1/1", "Running", Some(1), "1h")
        );
        assert_eq!(row.namespace, "shop");

        let row = derive_row(
            &record(ResourcePayload::Deployment(DeploymentPayload {
                desired: Some(3),
                ready: Some(1),
                updated: Some(3),
                available: Some(1),
                progress_deadline_exceeded: true,
            })),
            now,
        );
        assert_eq!((row.ready.as_str(), row.status.as_str()), ("1/3", "Stalled"));
        assert_eq!(row.restarts, None);

        let row = derive_row(
            &record(ResourcePayload::Deployment(DeploymentPayload {
                desired: Some(0),
                ..DeploymentPayload::default()
            })),
            now,
        );
        assert_eq!(row.status, "ScaledDown");

        let row = derive_row(
            &record(ResourcePayload::Service(ServicePayload {
                service_type: None,
                cluster_ip: Some("10.0.0.7".to_string()),
                ports: vec!["80/TCP".to_string(), "443/TCP".to_string()],
            })),
            now,
        );
        assert_eq!(row.status, "ClusterIP");
        assert_eq!(row.info, "10.0.0.7 80/TCP,443/TCP");

        let row = derive_row(
            &record(ResourcePayload::ConfigMap(ConfigMapPayload {
                keys: 4,
                immutable: true,
            })),
            now,
        );
        assert_eq!((row.status.as_str(), row.info.as_str()), ("Immutable", "4 keys"));

        let row = derive_row(
            &record(ResourcePayload::LogStream(LogStreamPayload {
                pod: "web".to_string(),
                container: container(
                    false,
                    4,
                    ContainerState::Terminated {
                        reason: Some("OOMKilled".to_string()),
                    },
                ),
            })),
            now,
        );
        assert_eq!(
            (row.ready.as_str(), row.status.as_str(), row.restarts),
            ("0/1", "OOMKilled", Some(4))
        );
    }

    #[test]
    fn missing_timestamp_renders_placeholder_age() {
        let record = ResourceRecord {
            name: "orphan".to_string(),
            namespace: None,
            created: None,
            payload: ResourcePayload::Pod(PodPayload::default()),
        };
        let row = derive_row(&record, Utc::now());
        assert_eq!(row.age, "-");
        assert_eq!(row.namespace, "-");
        assert_eq!(row.status, "Unknown");
    }
}
