use chrono::{DateTime, Local, Utc};
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::input::Action;
use crate::k8s::OutputRequest;
use crate::model::{DisplayRow, NamespaceScope, NavigationMode, ResourceKind, ResourceRecord, Selection};
use crate::status::derive_row;

/// Side effects the state machine asks the event loop to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Quit,
    Refresh(Selection),
    LoadNamespaces,
    CaptureOutput {
        request: u64,
        namespace: String,
        pod: String,
        output: OutputRequest,
    },
}

/// A finished background call, tagged with what it was issued for.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    Rows {
        selection: Selection,
        fetched_at: DateTime<Utc>,
        result: Result<Vec<ResourceRecord>, GatewayError>,
    },
    Namespaces {
        result: Result<Vec<String>, GatewayError>,
    },
    Output {
        request: u64,
        result: Result<String, GatewayError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputBody {
    Pending,
    Text(String),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub title: String,
    pub body: OutputBody,
    pub scroll: usize,
    request: u64,
    namespace: String,
    pod: String,
    output: OutputRequest,
}

impl CommandOutput {
    fn line_count(&self) -> usize {
        match &self.body {
            OutputBody::Text(text) => text.lines().count(),
            OutputBody::Pending | OutputBody::Failed(_) => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub kind: ResourceKind,
    pub scope: NamespaceScope,
    pub diagnostic_command: Vec<String>,
    pub cluster: String,
    pub context: String,
}

pub struct ViewState {
    kind: ResourceKind,
    scope: NamespaceScope,
    mode: NavigationMode,
    rows: Vec<DisplayRow>,
    cursor: usize,
    namespaces: Option<Vec<String>>,
    namespaces_loading: bool,
    namespace_cursor: usize,
    output: Option<CommandOutput>,
    next_request: u64,
    last_error: Option<String>,
    last_refresh: Option<DateTime<Local>>,
    loading: bool,
    disconnected: Option<String>,
    diagnostic_command: Vec<String>,
    cluster: String,
    context: String,
}

impl ViewState {
    pub fn new(options: ViewOptions) -> Self {
        Self {
            kind: options.kind,
            scope: options.scope,
            mode: NavigationMode::Normal,
            rows: Vec::new(),
            cursor: 0,
            namespaces: None,
            namespaces_loading: false,
            namespace_cursor: 0,
            output: None,
            next_request: 0,
            last_error: None,
            last_refresh: None,
            loading: true,
            disconnected: None,
            diagnostic_command: options.diagnostic_command,
            cluster: options.cluster,
            context: options.context,
        }
    }

    /// State for a cluster that failed its connectivity test at startup.
    /// It stays disconnected for the lifetime of the process.
    pub fn disconnected(options: ViewOptions, error: impl Into<String>) -> Self {
        let mut state = Self::new(options);
        state.loading = false;
        state.disconnected = Some(error.into());
        state
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn scope(&self) -> &NamespaceScope {
        &self.scope
    }

    pub fn selection(&self) -> Selection {
        Selection::new(self.kind, self.scope.clone())
    }

    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected_row(&self) -> Option<&DisplayRow> {
        self.rows.get(self.cursor)
    }

    /// "all namespaces" first, then the cached names. Before the cache is
    /// filled the current namespace is offered so it stays selectable.
    pub fn namespace_entries(&self) -> Vec<NamespaceScope> {
        let mut entries = vec![NamespaceScope::All];
        match &self.namespaces {
            Some(names) => entries.extend(names.iter().cloned().map(NamespaceScope::Named)),
            None => {
                if let NamespaceScope::Named(current) = &self.scope {
                    entries.push(NamespaceScope::Named(current.clone()));
                }
            }
        }
        entries
    }

    pub fn namespace_cursor(&self) -> usize {
        self.namespace_cursor
    }

    pub fn namespaces_loading(&self) -> bool {
        self.namespaces_loading
    }

    pub fn output(&self) -> Option<&CommandOutput> {
        self.output.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.last_refresh
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn disconnected_reason(&self) -> Option<&str> {
        self.disconnected.as_deref()
    }

    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn handle_input(&mut self, action: Action) -> AppCommand {
        if matches!(action, Action::Quit) {
            return AppCommand::Quit;
        }
        if self.disconnected.is_some() {
            return AppCommand::None;
        }

        match self.mode {
            NavigationMode::Normal => self.handle_normal(action),
            NavigationMode::NamespaceSelect => self.handle_namespace_select(action),
            NavigationMode::CommandOutput => self.handle_command_output(action),
        }
    }

    pub fn apply_refresh(&mut self, outcome: RefreshOutcome) {
        if self.disconnected.is_some() {
            return;
        }

        match outcome {
            RefreshOutcome::Rows {
                selection,
                fetched_at,
                result,
            } => {
                if selection != self.selection() {
                    debug!("dropping stale refresh for {selection}");
                    return;
                }
                self.loading = false;
                match result {
                    Ok(records) => {
                        self.rows = records
                            .iter()
                            .map(|record| derive_row(record, fetched_at))
                            .collect();
                        self.cursor = self.cursor.min(self.rows.len().saturating_sub(1));
                        self.last_error = None;
                        self.last_refresh = Some(fetched_at.with_timezone(&Local));
                    }
                    Err(error) => {
                        self.last_error = Some(error.to_string());
                    }
                }
            }
            RefreshOutcome::Namespaces { result } => {
                self.namespaces_loading = false;
                match result {
                    Ok(names) => {
                        let highlighted = self.namespace_entries().get(self.namespace_cursor).cloned();
                        self.namespaces = Some(names);
                        let entries = self.namespace_entries();
                        self.namespace_cursor = highlighted
                            .and_then(|scope| entries.iter().position(|entry| *entry == scope))
                            .unwrap_or(0);
                    }
                    Err(error) => {
                        self.last_error = Some(format!("namespaces: {error}"));
                    }
                }
            }
            RefreshOutcome::Output { request, result } => {
                let Some(output) = self
                    .output
                    .as_mut()
                    .filter(|output| output.request == request)
                else {
                    debug!("dropping superseded output #{request}");
                    return;
                };
                output.body = match result {
                    Ok(text) => OutputBody::Text(text),
                    Err(error) => OutputBody::Failed(error.to_string()),
                };
                output.scroll = 0;
            }
        }
    }

    fn handle_normal(&mut self, action: Action) -> AppCommand {
        match action {
            Action::Up => {
                self.move_cursor(-1);
                AppCommand::None
            }
            Action::Down => {
                self.move_cursor(1);
                AppCommand::None
            }
            Action::Top => {
                self.cursor = 0;
                AppCommand::None
            }
            Action::Bottom => {
                self.cursor = self.rows.len().saturating_sub(1);
                AppCommand::None
            }
            Action::SelectKind(kind) => self.switch_kind(kind),
            Action::NextKind => self.switch_kind(self.kind.offset(1)),
            Action::PrevKind => self.switch_kind(self.kind.offset(-1)),
            Action::Namespace => self.enter_namespace_select(),
            Action::Refresh => AppCommand::Refresh(self.selection()),
            Action::Confirm | Action::Logs => {
                let container = self
                    .selected_row()
                    .and_then(|row| row.pod_target(self.kind))
                    .and_then(|(_, container)| container);
                self.open_output(OutputRequest::Logs { container })
            }
            Action::Exec => self.open_output(OutputRequest::Command(self.diagnostic_command.clone())),
            Action::Back | Action::Quit => AppCommand::None,
        }
    }

    fn handle_namespace_select(&mut self, action: Action) -> AppCommand {
        let last = self.namespace_entries().len().saturating_sub(1);
        match action {
            Action::Up => {
                self.namespace_cursor = self.namespace_cursor.saturating_sub(1);
                AppCommand::None
            }
            Action::Down => {
                self.namespace_cursor = (self.namespace_cursor + 1).min(last);
                AppCommand::None
            }
            Action::Top => {
                self.namespace_cursor = 0;
                AppCommand::None
            }
            Action::Bottom => {
                self.namespace_cursor = last;
                AppCommand::None
            }
            Action::Confirm => {
                let Some(scope) = self.namespace_entries().get(self.namespace_cursor).cloned() else {
                    return AppCommand::None;
                };
                info!("namespace selected: {scope}");
                self.scope = scope;
                self.mode = NavigationMode::Normal;
                self.reset_rows();
                AppCommand::Refresh(self.selection())
            }
            Action::Refresh => {
                self.namespaces = None;
                self.request_namespaces()
            }
            Action::Back | Action::Namespace => {
                self.mode = NavigationMode::Normal;
                AppCommand::None
            }
            Action::SelectKind(_)
            | Action::NextKind
            | Action::PrevKind
            | Action::Logs
            | Action::Exec
            | Action::Quit => AppCommand::None,
        }
    }

    fn handle_command_output(&mut self, action: Action) -> AppCommand {
        let Some(output) = self.output.as_mut() else {
            self.mode = NavigationMode::Normal;
            return AppCommand::None;
        };
        let last = output.line_count().saturating_sub(1);
        match action {
            Action::Up => {
                output.scroll = output.scroll.saturating_sub(1);
                AppCommand::None
            }
            Action::Down => {
                output.scroll = (output.scroll + 1).min(last);
                AppCommand::None
            }
            Action::Top => {
                output.scroll = 0;
                AppCommand::None
            }
            Action::Bottom => {
                output.scroll = last;
                AppCommand::None
            }
            Action::Refresh => {
                let namespace = output.namespace.clone();
                let pod = output.pod.clone();
                let request = output.output.clone();
                self.start_output(namespace, pod, request)
            }
            Action::Back | Action::Confirm => {
                self.output = None;
                self.mode = NavigationMode::Normal;
                AppCommand::None
            }
            Action::SelectKind(_)
            | Action::NextKind
            | Action::PrevKind
            | Action::Namespace
            | Action::Logs
            | Action::Exec
            | Action::Quit => AppCommand::None,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let last = self.rows.len().saturating_sub(1);
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    fn switch_kind(&mut self, kind: ResourceKind) -> AppCommand {
        if kind != self.kind {
            info!("resource kind switched to {}", kind.title());
            self.kind = kind;
            self.reset_rows();
        }
        AppCommand::Refresh(self.selection())
    }

    fn reset_rows(&mut self) {
        self.rows.clear();
        self.cursor = 0;
        self.loading = true;
        self.last_error = None;
    }

    fn enter_namespace_select(&mut self) -> AppCommand {
        self.mode = NavigationMode::NamespaceSelect;
        let entries = self.namespace_entries();
        self.namespace_cursor = entries
            .iter()
            .position(|entry| *entry == self.scope)
            .unwrap_or(0);
        if self.namespaces.is_some() {
            AppCommand::None
        } else {
            self.request_namespaces()
        }
    }

    fn request_namespaces(&mut self) -> AppCommand {
        if self.namespaces_loading {
            return AppCommand::None;
        }
        self.namespaces_loading = true;
        AppCommand::LoadNamespaces
    }

    fn open_output(&mut self, request: OutputRequest) -> AppCommand {
        let Some((pod, _)) = self
            .selected_row()
            .and_then(|row| row.pod_target(self.kind))
        else {
            return AppCommand::None;
        };
        let namespace = match (self.scope.as_named(), self.selected_row()) {
            (Some(namespace), _) => namespace.to_string(),
            (None, Some(row)) => row.namespace.clone(),
            (None, None) => return AppCommand::None,
        };
        self.start_output(namespace, pod, request)
    }

    fn start_output(&mut self, namespace: String, pod: String, output: OutputRequest) -> AppCommand {
        self.next_request += 1;
        let request = self.next_request;
        self.mode = NavigationMode::CommandOutput;
        self.output = Some(CommandOutput {
            title: format!("{} {namespace}/{pod}", output.describe()),
            body: OutputBody::Pending,
            scroll: 0,
            request,
            namespace: namespace.clone(),
            pod: pod.clone(),
            output: output.clone(),
        });
        AppCommand::CaptureOutput {
            request,
            namespace,
            pod,
            output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, OutputBody, RefreshOutcome, ViewOptions, ViewState};
    use crate::error::GatewayError;
    use crate::input::Action;
    use crate::k8s::OutputRequest;
    use crate::model::{
        ContainerStatus, LogStreamPayload, NamespaceScope, NavigationMode, PodPayload,
        ResourceKind, ResourcePayload, ResourceRecord, Selection,
    };
    use chrono::Utc;

    fn state() -> ViewState {
        ViewState::new(ViewOptions {
            kind: ResourceKind::Pod,
            scope: NamespaceScope::Named("default".to_string()),
            diagnostic_command: vec!["env".to_string()],
            cluster: "https://cluster".to_string(),
            context: "ctx".to_string(),
        })
    }

    fn pod(name: &str) -> ResourceRecord {
        ResourceRecord {
            name: name.to_string(),
            namespace: Some("default".to_string()),
            created: Some(Utc::now()),
            payload: ResourcePayload::Pod(PodPayload {
                phase: Some("Running".to_string()),
                ..PodPayload::default()
            }),
        }
    }

    fn rows_for(state: &ViewState, names: &[&str]) -> RefreshOutcome {
        RefreshOutcome::Rows {
            selection: state.selection(),
            fetched_at: Utc::now(),
            result: Ok(names.iter().map(|name| pod(name)).collect()),
        }
    }

    fn names(state: &ViewState) -> Vec<String> {
        state.rows().iter().map(|row| row.name.clone()).collect()
    }

    #[test]
    fn starts_loading_on_pods_in_default_namespace() {
        let state = state();
        assert!(state.loading());
        assert_eq!(state.mode(), NavigationMode::Normal);
        assert_eq!(state.kind(), ResourceKind::Pod);
        assert_eq!(state.scope(), &NamespaceScope::Named("default".to_string()));
        assert!(state.rows().is_empty());
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn cursor_clamps_without_wrapping() {
        let mut state = state();
        let outcome = rows_for(&state, &["a", "b", "c"]);
        state.apply_refresh(outcome);
        assert!(!state.loading());

        for _ in 0..3 {
            state.handle_input(Action::Down);
        }
        assert_eq!(state.cursor(), 2);
        state.handle_input(Action::Down);
        assert_eq!(state.cursor(), 2);

        for _ in 0..5 {
            state.handle_input(Action::Up);
        }
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn cursor_stays_zero_on_empty_rows() {
        let mut state = state();
        for action in [Action::Down, Action::Down, Action::Up, Action::Bottom, Action::Down] {
            state.handle_input(action);
            assert_eq!(state.cursor(), 0);
        }
    }

    #[test]
    fn switching_kind_clears_rows_and_requests_tagged_refresh() {
        let mut state = state();
        let outcome = rows_for(&state, &["a", "b"]);
        state.apply_refresh(outcome);
        state.handle_input(Action::Down);

        let command = state.handle_input(Action::SelectKind(ResourceKind::Deployment));
        assert_eq!(
            command,
            AppCommand::Refresh(Selection::new(
                ResourceKind::Deployment,
                NamespaceScope::Named("default".to_string())
            ))
        );
        assert!(state.rows().is_empty());
        assert_eq!(state.cursor(), 0);
        assert!(state.loading());
    }

    #[test]
    fn stale_refresh_leaves_rows_and_cursor_untouched() {
        let mut state = state();
        let outcome = rows_for(&state, &["a", "b", "c"]);
        state.apply_refresh(outcome);
        state.handle_input(Action::Down);

        state.apply_refresh(RefreshOutcome::Rows {
            selection: Selection::new(ResourceKind::Service, state.scope().clone()),
            fetched_at: Utc::now(),
            result: Ok(vec![pod("svc")]),
        });
        state.apply_refresh(RefreshOutcome::Rows {
            selection: Selection::new(ResourceKind::Pod, NamespaceScope::All),
            fetched_at: Utc::now(),
            result: Ok(Vec::new()),
        });

        assert_eq!(names(&state), vec!["a", "b", "c"]);
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn transport_error_keeps_rows_until_next_success() {
        let mut state = state();
        let outcome = rows_for(&state, &["a", "b"]);
        state.apply_refresh(outcome);
        state.handle_input(Action::Down);

        state.apply_refresh(RefreshOutcome::Rows {
            selection: state.selection(),
            fetched_at: Utc::now(),
            result: Err(GatewayError::transport("Connection refused")),
        });
        assert_eq!(names(&state), vec!["a", "b"]);
        assert_eq!(state.cursor(), 1);
        assert_eq!(state.last_error(), Some("network error: Connection refused"));

        let outcome = rows_for(&state, &["x"]);
        state.apply_refresh(outcome);
        assert_eq!(names(&state), vec!["x"]);
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.last_error(), None);
        assert!(state.last_refresh().is_some());
    }

    #[test]
    fn first_failed_refresh_also_ends_loading() {
        let mut state = state();
        state.apply_refresh(RefreshOutcome::Rows {
            selection: state.selection(),
            fetched_at: Utc::now(),
            result: Err(GatewayError::transport("boom")),
        });
        assert!(!state.loading());
        assert!(state.last_error().is_some());
    }

    #[test]
    fn namespace_list_is_fetched_once_then_cached() {
        let mut state = state();
        assert_eq!(state.handle_input(Action::Namespace), AppCommand::LoadNamespaces);
        assert_eq!(state.mode(), NavigationMode::NamespaceSelect);
        assert!(state.namespaces_loading());

        state.apply_refresh(RefreshOutcome::Namespaces {
            result: Ok(vec!["default".to_string(), "kube-system".to_string()]),
        });
        assert_eq!(
            state.namespace_entries(),
            vec![
                NamespaceScope::All,
                NamespaceScope::Named("default".to_string()),
                NamespaceScope::Named("kube-system".to_string()),
            ]
        );
        assert_eq!(state.namespace_cursor(), 1);

        state.handle_input(Action::Back);
        assert_eq!(state.mode(), NavigationMode::Normal);
        assert_eq!(state.handle_input(Action::Namespace), AppCommand::None);

        assert_eq!(state.handle_input(Action::Refresh), AppCommand::LoadNamespaces);
    }

    #[test]
    fn repeated_namespace_entry_while_loading_does_not_refetch() {
        let mut state = state();
        assert_eq!(state.handle_input(Action::Namespace), AppCommand::LoadNamespaces);
        state.handle_input(Action::Back);
        assert_eq!(state.handle_input(Action::Namespace), AppCommand::None);
    }

    #[test]
    fn confirming_namespace_resets_rows_and_returns_to_normal() {
        let mut state = state();
        let outcome = rows_for(&state, &["a", "b"]);
        state.apply_refresh(outcome);
        state.handle_input(Action::Down);

        state.handle_input(Action::Namespace);
        state.apply_refresh(RefreshOutcome::Namespaces {
            result: Ok(vec!["default".to_string(), "kube-system".to_string()]),
        });
        state.handle_input(Action::Down);
        state.handle_input(Action::Down);
        assert_eq!(state.namespace_cursor(), 2);

        let command = state.handle_input(Action::Confirm);
        assert_eq!(
            command,
            AppCommand::Refresh(Selection::new(
                ResourceKind::Pod,
                NamespaceScope::Named("kube-system".to_string())
            ))
        );
        assert_eq!(state.mode(), NavigationMode::Normal);
        assert!(state.rows().is_empty());
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn directional_keys_in_namespace_mode_do_not_touch_row_cursor() {
        let mut state = state();
        let outcome = rows_for(&state, &["a", "b", "c"]);
        state.apply_refresh(outcome);
        state.handle_input(Action::Down);
        state.handle_input(Action::Namespace);
        state.handle_input(Action::Up);
        state.handle_input(Action::Up);
        assert_eq!(state.namespace_cursor(), 0);
        assert_eq!(state.cursor(), 1);
    }

    #[test]
    fn quit_is_propagated_from_every_mode() {
        let mut state = state();
        assert_eq!(state.handle_input(Action::Quit), AppCommand::Quit);
        state.handle_input(Action::Namespace);
        assert_eq!(state.handle_input(Action::Quit), AppCommand::Quit);
    }

    #[test]
    fn logs_open_command_output_and_ignore_superseded_results() {
        let mut state = state();
        state.handle_input(Action::SelectKind(ResourceKind::LogStream));
        state.apply_refresh(RefreshOutcome::Rows {
            selection: state.selection(),
            fetched_at: Utc::now(),
            result: Ok(vec![ResourceRecord {
                name: "api-0/proxy".to_string(),
                namespace: Some("default".to_string()),
                created: None,
                payload: ResourcePayload::LogStream(LogStreamPayload {
                    pod: "api-0".to_string(),
                    container: ContainerStatus::default(),
                }),
            }]),
        });

        let command = state.handle_input(Action::Confirm);
        assert_eq!(
            command,
            AppCommand::CaptureOutput {
                request: 1,
                namespace: "default".to_string(),
                pod: "api-0".to_string(),
                output: OutputRequest::Logs {
                    container: Some("proxy".to_string())
                },
            }
        );
        assert_eq!(state.mode(), NavigationMode::CommandOutput);

        let rerun = state.handle_input(Action::Refresh);
        assert!(matches!(rerun, AppCommand::CaptureOutput { request: 2, .. }));

        state.apply_refresh(RefreshOutcome::Output {
            request: 1,
            result: Ok("old".to_string()),
        });
        assert_eq!(state.output().map(|output| &output.body), Some(&OutputBody::Pending));

        state.apply_refresh(RefreshOutcome::Output {
            request: 2,
            result: Ok("line one\nline two".to_string()),
        });
        assert_eq!(
            state.output().map(|output| &output.body),
            Some(&OutputBody::Text("line one\nline two".to_string()))
        );

        state.handle_input(Action::Down);
        state.handle_input(Action::Down);
        assert_eq!(state.output().map(|output| output.scroll), Some(1));

        state.handle_input(Action::Back);
        assert_eq!(state.mode(), NavigationMode::Normal);
        assert!(state.output().is_none());

        state.apply_refresh(RefreshOutcome::Output {
            request: 2,
            result: Ok("late".to_string()),
        });
        assert!(state.output().is_none());
    }

    #[test]
    fn exec_needs_a_pod_row() {
        let mut state = state();
        assert_eq!(state.handle_input(Action::Exec), AppCommand::None);
        assert_eq!(state.mode(), NavigationMode::Normal);

        state.handle_input(Action::SelectKind(ResourceKind::Service));
        let outcome = rows_for(&state, &["web"]);
        state.apply_refresh(outcome);
        assert_eq!(state.handle_input(Action::Exec), AppCommand::None);

        state.handle_input(Action::SelectKind(ResourceKind::Pod));
        let outcome = rows_for(&state, &["web-0"]);
        state.apply_refresh(outcome);
        assert_eq!(
            state.handle_input(Action::Exec),
            AppCommand::CaptureOutput {
                request: 1,
                namespace: "default".to_string(),
                pod: "web-0".to_string(),
                output: OutputRequest::Command(vec!["env".to_string()]),
            }
        );
    }

    #[test]
    fn disconnected_state_ignores_everything_but_quit() {
        let mut state = ViewState::disconnected(
            ViewOptions {
                kind: ResourceKind::Pod,
                scope: NamespaceScope::default(),
                diagnostic_command: Vec::new(),
                cluster: "-".to_string(),
                context: "-".to_string(),
            },
            "connection refused",
        );
        assert!(!state.loading());
        assert_eq!(state.handle_input(Action::Namespace), AppCommand::None);
        assert_eq!(state.mode(), NavigationMode::Normal);
        let outcome = rows_for(&state, &["a"]);
        state.apply_refresh(outcome);
        assert!(state.rows().is_empty());
        assert_eq!(state.handle_input(Action::Quit), AppCommand::Quit);
    }
}
