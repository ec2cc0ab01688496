use crate::model::{NavigationMode, ResourceKind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Down,
    Up,
    Top,
    Bottom,
    NextKind,
    PrevKind,
    SelectKind(ResourceKind),
    Namespace,
    Confirm,
    Back,
    Refresh,
    Logs,
    Exec,
}

/// Keys that mean nothing in the current mode map to `None`.
pub fn map_key(mode: NavigationMode, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    if let Some(action) = map_motion_key(key) {
        return Some(action);
    }
    match mode {
        NavigationMode::Normal => map_normal_mode_key(key),
        NavigationMode::NamespaceSelect => map_namespace_mode_key(key),
        NavigationMode::CommandOutput => map_output_mode_key(key),
    }
}

fn map_motion_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Char('g') if key.modifiers.is_empty() => Some(Action::Top),
        KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') => Some(Action::Bottom),
        KeyCode::End => Some(Action::Bottom),
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Esc => Some(Action::Back),
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        _ => None,
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() && c.is_ascii_digit() => c
            .to_digit(10)
            .and_then(|hint| ResourceKind::from_hint(hint as usize))
            .map(Action::SelectKind),
        KeyCode::Tab | KeyCode::Right => Some(Action::NextKind),
        KeyCode::BackTab | KeyCode::Left => Some(Action::PrevKind),
        KeyCode::Char('n') if key.modifiers.is_empty() => Some(Action::Namespace),
        KeyCode::Char('l') if key.modifiers.is_empty() => Some(Action::Logs),
        KeyCode::Char('x') if key.modifiers.is_empty() => Some(Action::Exec),
        _ => None,
    }
}

fn map_namespace_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('n') if key.modifiers.is_empty() => Some(Action::Namespace),
        _ => None,
    }
}

fn map_output_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Bottom),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Top),
        _ => None,
    }
}
