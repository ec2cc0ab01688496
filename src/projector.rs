use crate::app::{OutputBody, ViewState};
use crate::model::{DisplayRow, NamespaceScope, NavigationMode, ResourceKind};

pub const PRODUCT: &str = "kubeglance";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindHint {
    pub hint: usize,
    pub title: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub product: &'static str,
    pub kinds: Vec<KindHint>,
    pub namespace: String,
    pub context: String,
    pub mode: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Loading(String),
    Disconnected(String),
    Table {
        title: String,
        headers: [&'static str; 7],
        rows: Vec<[String; 7]>,
        cursor: Option<usize>,
    },
    Namespaces {
        items: Vec<String>,
        cursor: usize,
        loading: bool,
    },
    Output {
        title: String,
        lines: Vec<String>,
        marker: Option<String>,
        failed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub hints: &'static str,
    pub error: Option<String>,
    pub refreshed: Option<String>,
    pub loading: bool,
}

/// Everything the terminal layer draws for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub header: Header,
    pub body: Body,
    pub footer: Footer,
}

pub fn project(state: &ViewState, max_output_lines: usize) -> Projection {
    Projection {
        header: header(state),
        body: body(state, max_output_lines),
        footer: footer(state),
    }
}

fn header(state: &ViewState) -> Header {
    Header {
        product: PRODUCT,
        kinds: ResourceKind::ALL
            .into_iter()
            .map(|kind| KindHint {
                hint: kind.hint(),
                title: kind.title(),
                active: kind == state.kind(),
            })
            .collect(),
        namespace: state.scope().label(),
        context: state.context().to_string(),
        mode: state.mode().label(),
    }
}

fn body(state: &ViewState, max_output_lines: usize) -> Body {
    if let Some(reason) = state.disconnected_reason() {
        return Body::Disconnected(format!(
            "disconnected from {}: {reason}",
            state.cluster()
        ));
    }

    match state.mode() {
        NavigationMode::Normal => table_body(state),
        NavigationMode::NamespaceSelect => Body::Namespaces {
            items: state
                .namespace_entries()
                .iter()
                .map(namespace_item)
                .collect(),
            cursor: state.namespace_cursor(),
            loading: state.namespaces_loading(),
        },
        NavigationMode::CommandOutput => match state.output() {
            Some(output) => {
                let (lines, marker, failed) = match &output.body {
                    OutputBody::Pending => (vec!["running…".to_string()], None, false),
                    OutputBody::Failed(error) => (vec![error.clone()], None, true),
                    OutputBody::Text(text) => {
                        let (lines, marker) = visible_lines(text, output.scroll, max_output_lines);
                        (lines, marker, false)
                    }
                };
                Body::Output {
                    title: output.title.clone(),
                    lines,
                    marker,
                    failed,
                }
            }
            None => table_body(state),
        },
    }
}

fn table_body(state: &ViewState) -> Body {
    if state.loading() && state.rows().is_empty() {
        return Body::Loading(format!(
            "loading {} in {}…",
            state.kind().title(),
            state.scope().label()
        ));
    }

    let rows: Vec<[String; 7]> = state.rows().iter().map(DisplayRow::columns).collect();
    let cursor = (!rows.is_empty()).then(|| state.cursor());
    Body::Table {
        title: format!("{} ({})", state.kind().title(), rows.len()),
        headers: DisplayRow::HEADERS,
        rows,
        cursor,
    }
}

fn namespace_item(scope: &NamespaceScope) -> String {
    match scope {
        NamespaceScope::All => "all namespaces".to_string(),
        NamespaceScope::Named(namespace) => namespace.clone(),
    }
}

/// Window of at most `limit` lines starting at `scroll`, plus a marker
/// naming how many lines fell outside it.
fn visible_lines(text: &str, scroll: usize, limit: usize) -> (Vec<String>, Option<String>) {
    let total = text.lines().count();
    let lines: Vec<String> = text
        .lines()
        .skip(scroll)
        .take(limit)
        .map(str::to_string)
        .collect();
    let hidden = total - lines.len();
    let marker = (hidden > 0).then(|| format!("[truncated: {hidden} of {total} lines not shown]"));
    (lines, marker)
}

fn footer(state: &ViewState) -> Footer {
    let hints = match state.mode() {
        _ if state.disconnected_reason().is_some() => "q quit",
        NavigationMode::Normal if state.kind().targets_pod() => {
            "j/k move  1-5 kind  tab next  n namespace  l logs  x exec  r refresh  q quit"
        }
        NavigationMode::Normal => "j/k move  1-5 kind  tab next  n namespace  r refresh  q quit",
        NavigationMode::NamespaceSelect => "j/k move  enter select  r reload  esc back  q quit",
        NavigationMode::CommandOutput => "j/k scroll  g/G top/bottom  r rerun  esc back  q quit",
    };
    Footer {
        hints,
        error: state.last_error().map(str::to_string),
        refreshed: state
            .last_refresh()
            .map(|at| at.format("%H:%M:%S").to_string()),
        loading: state.loading(),
    }
}
