use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Clear, Dataset, GraphType, LegendPosition, List, ListItem,
        ListState, Paragraph, Wrap,
    },
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::core::history::HistoryView;
use crate::core::message::{ReplyStatus, TranscriptEntry, TranscriptRole};
use crate::core::session::ChatSession;
use crate::core::tokens::{TokenField, TokenSeries};
use crate::utils::scroll::prewrap_lines;
use crate::utils::text::{single_line, truncate_to_width};

/// Scroll position of the transcript pane.
#[derive(Debug, Clone, Copy)]
pub struct ViewState {
    pub scroll: u16,
    /// Keep the newest line in view.
    pub follow: bool,
    /// Largest useful offset, as of the last render.
    pub max_scroll: u16,
    pub page: u16,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scroll: 0,
            follow: true,
            max_scroll: 0,
            page: 10,
        }
    }
}

impl ViewState {
    pub fn scroll_up(&mut self, lines: u16) {
        self.follow = false;
        self.scroll = self.scroll.min(self.max_scroll).saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll);
        if self.scroll >= self.max_scroll {
            self.follow = true;
        }
    }
}

pub fn ui(f: &mut Frame, view: &mut ViewState, session: &ChatSession) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(f.area());

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[0]);

    render_dashboard(f, left[0], session.tokens());
    render_history(f, left[1], session.history(), session.history_cursor());
    render_chat(f, columns[1], view, session);

    if let Some(confirmation) = session.confirmation() {
        render_confirmation(f, confirmation.question());
    }
}

fn field_color(field: TokenField) -> Color {
    match field {
        TokenField::Prompt => Color::Blue,
        TokenField::Completion => Color::Green,
        TokenField::Total => Color::Magenta,
    }
}

fn render_dashboard(f: &mut Frame, area: Rect, tokens: &TokenSeries) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Token Usage");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let current = tokens.current();
    let counters = Line::from(vec![
        Span::styled("Prompt: ", Style::default().fg(field_color(TokenField::Prompt))),
        Span::raw(current.prompt.to_string()),
        Span::raw("   "),
        Span::styled(
            "Completion: ",
            Style::default().fg(field_color(TokenField::Completion)),
        ),
        Span::raw(current.completion.to_string()),
        Span::raw("   "),
        Span::styled("Total: ", Style::default().fg(field_color(TokenField::Total))),
        Span::raw(current.total.to_string()),
    ]);
    f.render_widget(Paragraph::new(counters), rows[0]);

    let points: Vec<(TokenField, Vec<(f64, f64)>)> = TokenField::ALL
        .iter()
        .map(|field| (*field, tokens.points(*field)))
        .collect();
    let datasets: Vec<Dataset> = points
        .iter()
        .map(|(field, data)| {
            Dataset::default()
                .name(field.label())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(field_color(*field)))
                .data(data)
        })
        .collect();

    let x_max = tokens.len().saturating_sub(1).max(1) as f64;
    let mut x_labels = tokens.labels();
    if x_labels.len() > 2 {
        let last = x_labels.split_off(x_labels.len() - 1);
        x_labels.truncate(1);
        x_labels.extend(last);
    }
    let y_max = tokens.y_max() as f64;
    let axis_style = Style::default().fg(Color::Gray);

    let chart = Chart::new(datasets)
        .legend_position(Some(LegendPosition::TopLeft))
        .x_axis(
            Axis::default()
                .title("Prompt Number")
                .style(axis_style)
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Tokens")
                .style(axis_style)
                .bounds([0.0, y_max])
                .labels([
                    "0".to_string(),
                    format!("{}", (y_max / 2.0).round() as u64),
                    format!("{}", y_max as u64),
                ]),
        );
    f.render_widget(chart, rows[1]);
}

fn render_history(f: &mut Frame, area: Rect, history: &HistoryView, cursor: Option<usize>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Previous Prompts (Ctrl+↑/↓ to recall, Ctrl+L to clear)");
    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = match history {
        HistoryView::Empty => history
            .display_lines()
            .into_iter()
            .map(|line| {
                ListItem::new(line.to_string()).style(
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )
            })
            .collect(),
        HistoryView::Entries(entries) => entries
            .iter()
            .map(|prompt| ListItem::new(truncate_to_width(&single_line(prompt), width)))
            .collect(),
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("› ");
    let mut state = ListState::default().with_selected(cursor);
    f.render_stateful_widget(list, area, &mut state);
}

fn assistant_color(model: Option<&str>) -> Color {
    match model.and_then(|name| name.split_whitespace().next()) {
        Some("Groq") => Color::Green,
        Some("OpenAI") => Color::Blue,
        Some("Gemini") => Color::Red,
        _ => Color::Magenta,
    }
}

fn entry_lines(entry: &TranscriptEntry) -> Vec<Line<'static>> {
    let stamp = Span::styled(
        format!("{} ", entry.at.format("%H:%M")),
        Style::default().fg(Color::DarkGray),
    );
    let mut lines = Vec::new();

    match entry.role {
        TranscriptRole::System => {
            lines.push(
                Line::from(Span::styled(
                    entry.content.clone(),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ))
                .alignment(Alignment::Center),
            );
        }
        TranscriptRole::User => {
            let style = Style::default().fg(Color::Cyan);
            for (i, text) in entry.content.lines().enumerate() {
                let mut spans = Vec::new();
                if i == 0 {
                    spans.push(stamp.clone());
                    spans.push(Span::styled(
                        "You: ",
                        style.add_modifier(Modifier::BOLD),
                    ));
                }
                spans.push(Span::styled(text.to_string(), style));
                lines.push(Line::from(spans));
            }
        }
        TranscriptRole::Assistant => {
            let avatar_style = Style::default()
                .fg(assistant_color(entry.model))
                .add_modifier(Modifier::BOLD);
            let text_style = match entry.status {
                ReplyStatus::Failed => Style::default().fg(Color::Red),
                ReplyStatus::Stopped => Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC),
                _ => Style::default(),
            };
            let content = match entry.status {
                ReplyStatus::Waiting => "…".to_string(),
                ReplyStatus::Revealing => format!("{}▌", entry.content),
                _ => entry.content.clone(),
            };
            for (i, text) in content.split('\n').enumerate() {
                let mut spans = Vec::new();
                if i == 0 {
                    spans.push(stamp.clone());
                    spans.push(Span::styled(format!("{}: ", entry.avatar()), avatar_style));
                }
                spans.push(Span::styled(text.to_string(), text_style));
                lines.push(Line::from(spans));
            }
        }
    }

    lines.push(Line::from(""));
    lines
}

fn render_chat(f: &mut Frame, area: Rect, view: &mut ViewState, session: &ChatSession) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    let model = session.current_model();
    let header = Line::from(vec![
        Span::styled(
            format!("chatgauge v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("• Model: "),
        Span::styled(model.display_name, Style::default().fg(Color::Cyan)),
        Span::raw(" • "),
        Span::raw(session.models().probe_status().label()),
    ]);
    f.render_widget(Paragraph::new(header), chunks[0]);

    let transcript_area = chunks[1];
    let lines: Vec<Line> = session.transcript().iter().flat_map(entry_lines).collect();
    let lines = prewrap_lines(&lines, transcript_area.width);
    let total = lines.len().min(u16::MAX as usize) as u16;
    view.max_scroll = total.saturating_sub(transcript_area.height);
    view.page = transcript_area.height.saturating_sub(1).max(1);
    if view.follow {
        view.scroll = view.max_scroll;
    }
    view.scroll = view.scroll.min(view.max_scroll);

    let transcript = Paragraph::new(lines).scroll((view.scroll, 0));
    f.render_widget(transcript, transcript_area);

    let controls = session.controls();
    let (input_title, input_style) = if controls.can_submit {
        (
            "Type your message (Enter to send, Tab to change model)",
            Style::default().fg(Color::Cyan),
        )
    } else if session.is_revealing() {
        ("Receiving reply…", Style::default().fg(Color::DarkGray))
    } else {
        ("Waiting for reply…", Style::default().fg(Color::DarkGray))
    };
    let input = Paragraph::new(session.input())
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title(input_title));
    f.render_widget(input, chunks[2]);

    if controls.can_submit && session.confirmation().is_none() {
        let inner_width = chunks[2].width.saturating_sub(2);
        let cursor_x = (session.input().width() as u16).min(inner_width.saturating_sub(1));
        f.set_cursor_position((chunks[2].x + 1 + cursor_x, chunks[2].y + 1));
    }

    let stop = if controls.can_cancel {
        Span::styled(
            format!("[Esc] {}", controls.stop_label),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if controls.stop_label != "Stop" {
        Span::styled(controls.stop_label, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw("")
    };
    let status = Line::from(vec![
        stop,
        Span::styled(
            "  PgUp/PgDn scroll • Ctrl+C quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(status), chunks[3]);
}

fn render_confirmation(f: &mut Frame, question: &str) {
    let area = f.area();
    let width = area.width.saturating_sub(4).min(60);
    let height = 5;
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height: height.min(area.height),
    };

    f.render_widget(Clear, popup);
    let text = vec![
        Line::from(question.to_string()),
        Line::from(Span::styled(
            "[y] yes   [n] no",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(paragraph, popup);
}
