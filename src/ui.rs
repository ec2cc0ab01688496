use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};

use crate::projector::{Body, Footer, Header, Projection};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const SELECTED: Color = Color::Rgb(24, 36, 58);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const PL_D: Color = Color::Rgb(82, 24, 124);

pub fn render(frame: &mut Frame, projection: &Projection) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], &projection.header);
    render_body(frame, root[1], &projection.body);
    render_footer(frame, root[2], &projection.footer);
}

fn render_header(frame: &mut Frame, area: Rect, header: &Header) {
    let left = powerline(
        vec![
            (format!(" {} ", header.product), Color::White, PL_A),
            (format!(" {} ", ellipsize(&header.context, 24)), Color::White, PL_B),
            (format!(" ns:{} ", ellipsize(&header.namespace, 24)), Color::White, PL_C),
            (format!(" {} ", header.mode), Color::White, PL_D),
        ],
        BG,
    );
    let left_width = width_of(&left);
    let left_line = Line::from(left);

    let mut right = Vec::new();
    for kind in &header.kinds {
        let style = if kind.active {
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED).bg(BG)
        };
        right.push(Span::styled(format!(" {}:{} ", kind.hint, kind.title), style));
    }
    let right_width = width_of(&right);

    if right_width == 0 || right_width.saturating_add(left_width) >= area.width {
        frame.render_widget(
            Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(left_line).style(Style::default().bg(BG).fg(Color::White)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(right)).style(Style::default().bg(BG)),
        chunks[1],
    );
}

fn render_body(frame: &mut Frame, area: Rect, body: &Body) {
    match body {
        Body::Loading(message) => render_notice(frame, area, "Loading", message, WARN),
        Body::Disconnected(message) => render_notice(frame, area, "Disconnected", message, ERROR),
        Body::Table {
            title,
            headers,
            rows,
            cursor,
        } => render_table(frame, area, title, headers, rows, *cursor),
        Body::Namespaces {
            items,
            cursor,
            loading,
        } => render_namespaces(frame, area, items, *cursor, *loading),
        Body::Output {
            title,
            lines,
            marker,
            failed,
        } => render_output(frame, area, title, lines, marker.as_deref(), *failed),
    }
}

fn panel_block(title: impl Into<String>, border: Color) -> Block<'static> {
    Block::default()
        .title(title.into())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(PANEL))
}

fn render_notice(frame: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let paragraph = Paragraph::new(Text::from(message.to_string()))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .block(panel_block(title, color))
        .style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
}

fn render_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    headers: &[&'static str],
    rows: &[[String; 7]],
    cursor: Option<usize>,
) {
    if rows.is_empty() {
        render_notice(frame, area, title, "No resources found", MUTED);
        return;
    }

    let header_row = Row::new(headers.iter().map(|header| {
        Cell::from(*header).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let table_rows = rows.iter().map(|columns| {
        Row::new(columns.iter().enumerate().map(|(index, column)| {
            let style = if index == 3 {
                Style::default().fg(status_color(column))
            } else {
                Style::default().fg(Color::White)
            };
            Cell::from(column.clone()).style(style)
        }))
    });

    let table = Table::new(table_rows, column_constraints(headers.len()))
        .header(header_row)
        .block(panel_block(title, ACCENT))
        .column_spacing(1)
        .row_highlight_style(Style::default().bg(SELECTED).add_modifier(Modifier::BOLD))
        .highlight_symbol("› ");

    let mut state = TableState::default();
    state.select(cursor);
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_namespaces(frame: &mut Frame, area: Rect, items: &[String], cursor: usize, loading: bool) {
    let popup = popup_area(area, 50, 70);
    frame.render_widget(Clear, popup);

    let title = if loading {
        "Namespaces (loading…)".to_string()
    } else {
        format!("Namespaces ({})", items.len())
    };
    let rows = items
        .iter()
        .map(|item| Row::new([Cell::from(item.clone()).style(Style::default().fg(Color::White))]));
    let table = Table::new(rows, [Constraint::Percentage(100)])
        .block(panel_block(title, ACCENT))
        .row_highlight_style(Style::default().bg(SELECTED).add_modifier(Modifier::BOLD))
        .highlight_symbol("› ");

    let mut state = TableState::default();
    state.select((!items.is_empty()).then_some(cursor));
    frame.render_stateful_widget(table, popup, &mut state);
}

fn render_output(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    lines: &[String],
    marker: Option<&str>,
    failed: bool,
) {
    let color = if failed { ERROR } else { Color::White };
    let mut text: Vec<Line<'static>> = lines.iter().map(|line| Line::from(line.clone())).collect();
    if let Some(marker) = marker {
        text.push(Line::from(Span::styled(
            marker.to_string(),
            Style::default().fg(WARN).add_modifier(Modifier::ITALIC),
        )));
    }
    let paragraph = Paragraph::new(Text::from(text))
        .wrap(Wrap { trim: false })
        .block(panel_block(title, if failed { ERROR } else { ACCENT }))
        .style(Style::default().fg(color));
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, area: Rect, footer: &Footer) {
    let (state_label, state_bg) = if footer.loading {
        (" loading ", WARN)
    } else if footer.error.is_some() {
        (" error ", ERROR)
    } else {
        (" ok ", PL_A)
    };
    let state_fg = if footer.loading || footer.error.is_some() {
        Color::Black
    } else {
        Color::White
    };
    let detail = footer.error.as_deref().unwrap_or(footer.hints);
    let detail_width = area.width.saturating_sub(24).max(24) as usize;
    let spans = powerline(
        vec![
            (state_label.to_string(), state_fg, state_bg),
            (format!(" {} ", ellipsize(detail, detail_width)), Color::White, PL_B),
        ],
        BG,
    );

    let Some(refreshed) = &footer.refreshed else {
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    };

    let right = vec![Span::styled(
        format!(" refreshed {refreshed} "),
        Style::default().fg(MUTED).bg(BG),
    )];
    let right_width = width_of(&right);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(right)).style(Style::default().bg(BG)),
        chunks[1],
    );
}

fn status_color(status: &str) -> Color {
    match status {
        "Running" | "Available" | "Succeeded" | "Completed" | "Immutable" => ACCENT,
        "Pending" | "Progressing" | "ContainerCreating" | "Terminating" | "ScaledDown" => WARN,
        "Failed" | "Stalled" | "CrashLoopBackOff" | "ImagePullBackOff" | "ErrImagePull"
        | "Error" | "OOMKilled" => ERROR,
        _ => Color::White,
    }
}

/// Bold segments, each closed by an arrow drawn in its own background
/// over the background of whatever follows (`tail` after the last one).
fn powerline(segments: Vec<(String, Color, Color)>, tail: Color) -> Vec<Span<'static>> {
    let following = segments
        .iter()
        .skip(1)
        .map(|(_, _, bg)| *bg)
        .chain([tail])
        .collect::<Vec<_>>();
    segments
        .into_iter()
        .zip(following)
        .flat_map(|((text, fg, bg), next)| {
            [
                Span::styled(text, Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD)),
                Span::styled("", Style::default().fg(bg).bg(next)),
            ]
        })
        .collect()
}

fn width_of(spans: &[Span<'_>]) -> u16 {
    u16::try_from(spans.iter().map(Span::width).sum::<usize>()).unwrap_or(u16::MAX)
}

/// Cuts `value` to `max_chars` characters, the last one an ellipsis.
fn ellipsize(value: &str, max_chars: usize) -> String {
    if value.char_indices().nth(max_chars).is_none() {
        return value.to_string();
    }
    let cut = value
        .char_indices()
        .nth(max_chars.saturating_sub(1))
        .map_or(value.len(), |(index, _)| index);
    format!("{}…", &value[..cut])
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    popup
}

/// Name, namespace and info stretch; the short status columns stay fixed.
fn column_constraints(columns: usize) -> Vec<Constraint> {
    if columns != 7 {
        let width = (100 / columns.max(1) as u16).max(1);
        return (0..columns.max(1))
            .map(|_| Constraint::Percentage(width))
            .collect();
    }

    vec![
        Constraint::Percentage(30),
        Constraint::Percentage(15),
        Constraint::Length(7),
        Constraint::Length(18),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Min(10),
    ]
}
