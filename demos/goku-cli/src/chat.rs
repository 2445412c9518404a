//! Chat dashboard: transcript, activity log, plan and connection status.

use std::{io, time::Duration};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use goku_core::{ActivityEntry, ConnectionStatus, Role, Session, TaskStatus};
use goku_transport::{ChannelConfig, ChannelError, SessionHandle, WsConnector};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use serde_json::Value;

use crate::cli::ChatArgs;

const TOOL_TEXT_LIMIT: usize = 160;

pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    tracing::info!(url = %args.url, "Starting chat dashboard");
    let handle = goku_transport::spawn(
        WsConnector::new(args.url),
        ChannelConfig {
            reconnect_delay: Duration::from_millis(args.reconnect_delay_ms),
        },
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = run_app(&mut terminal, &handle);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    handle.shutdown().await;
    Ok(result?)
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    None,
    Send(String),
    Stop,
    Quit,
}

#[derive(Debug, Default)]
struct App {
    input: String,
    /// Lines scrolled up from the bottom of the transcript.
    scroll_back: u16,
    error: Option<String>,
}

impl App {
    fn handle_key(&mut self, key: KeyEvent) -> Action {
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => return Action::Quit,
            // AltGr arrives as Ctrl+Alt on some platforms.
            (KeyCode::Char(c), modifiers) if modifiers != KeyModifiers::CONTROL => {
                self.input.push(c);
            }
            (KeyCode::Backspace, _) => {
                self.input.pop();
            }
            (KeyCode::Enter, _) => {
                let text = self.input.trim().to_owned();
                self.input.clear();
                if !text.is_empty() {
                    self.scroll_back = 0;
                    return Action::Send(text);
                }
            }
            (KeyCode::Esc, _) => return Action::Stop,
            (KeyCode::Up, _) => self.scroll_back = self.scroll_back.saturating_add(1),
            (KeyCode::Down, _) => self.scroll_back = self.scroll_back.saturating_sub(1),
            (KeyCode::PageUp, _) => self.scroll_back = self.scroll_back.saturating_add(10),
            (KeyCode::PageDown, _) => self.scroll_back = self.scroll_back.saturating_sub(10),
            _ => {}
        }
        Action::None
    }

    fn report(&mut self, result: Result<(), ChannelError>) {
        self.error = result.err().map(|e| e.to_string());
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    handle: &SessionHandle,
) -> io::Result<()> {
    let mut app = App::default();
    let state = handle.subscribe();

    loop {
        let session = state.borrow().clone();
        terminal.draw(|f| ui(f, &app, &session))?;

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key) {
            Action::Quit => return Ok(()),
            Action::Send(text) => app.report(handle.send_message(text)),
            Action::Stop => app.report(handle.stop()),
            Action::None => {}
        }
    }
}

fn ui(f: &mut Frame, app: &App, session: &Session) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Transcript + activity
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status
        ])
        .split(f.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[0]);

    // Transcript
    let transcript = Paragraph::new(transcript_lines(session)).wrap(Wrap { trim: false });
    let block = Block::default().borders(Borders::ALL).title("Chat");
    f.render_widget(pin_to_bottom(transcript, block, body[0], app.scroll_back), body[0]);

    // Plan + activity
    let plan = plan_lines(session);
    let side = if plan.is_empty() {
        Layout::default()
            .constraints([Constraint::Length(0), Constraint::Min(3)])
            .split(body[1])
    } else {
        let plan_height = u16::try_from(plan.len() + 2).unwrap_or(u16::MAX).min(12);
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(plan_height), Constraint::Min(3)])
            .split(body[1])
    };
    if !plan.is_empty() {
        let plan = Paragraph::new(plan)
            .block(Block::default().borders(Borders::ALL).title("Plan"))
            .wrap(Wrap { trim: true });
        f.render_widget(plan, side[0]);
    }

    let activity = Paragraph::new(activity_lines(session)).wrap(Wrap { trim: true });
    let block = Block::default().borders(Borders::ALL).title("Activity");
    f.render_widget(pin_to_bottom(activity, block, side[1], 0), side[1]);

    // Input
    let input = Paragraph::new(app.input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Message"));
    f.render_widget(input, chunks[1]);

    let cursor = u16::try_from(app.input.chars().count()).unwrap_or(u16::MAX);
    f.set_cursor_position((
        chunks[1].x.saturating_add(cursor).saturating_add(1),
        chunks[1].y + 1,
    ));

    // Status bar
    f.render_widget(Paragraph::new(status_line(app, session)), chunks[2]);
}

fn transcript_lines(session: &Session) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in session.transcript() {
        let (label, color) = match message.role {
            Role::User => ("you", Color::Yellow),
            Role::Agent => ("goku", Color::Cyan),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        lines.extend(message.content.lines().map(|l| Line::from(l.to_owned())));
        lines.push(Line::default());
    }

    if session.is_sending() {
        let thought = session.current_thought().unwrap_or("thinking");
        lines.push(Line::from(Span::styled(
            format!("... {thought}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}

fn activity_lines(session: &Session) -> Vec<Line<'static>> {
    session
        .activity()
        .iter()
        .map(|entry| match entry {
            ActivityEntry::Thought { content } => Line::from(vec![
                Span::styled("thought ", Style::default().fg(Color::Magenta)),
                Span::raw(content.clone()),
            ]),
            ActivityEntry::ToolCall { name, args } => Line::from(vec![
                Span::styled("call ", Style::default().fg(Color::Blue)),
                Span::styled(name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!(" {}", truncate(&args.to_string(), TOOL_TEXT_LIMIT))),
            ]),
            ActivityEntry::ToolResult { name, result } => Line::from(vec![
                Span::styled("result ", Style::default().fg(Color::Green)),
                Span::styled(name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!(" {}", truncate(&value_text(result), TOOL_TEXT_LIMIT))),
            ]),
        })
        .collect()
}

fn plan_lines(session: &Session) -> Vec<Line<'static>> {
    session
        .plan()
        .iter()
        .map(|task| {
            let (mark, color) = match task.status {
                TaskStatus::Done => ("[x]", Color::Green),
                TaskStatus::InProgress => ("[~]", Color::Yellow),
                TaskStatus::Todo | TaskStatus::Unknown => ("[ ]", Color::Gray),
            };
            Line::from(vec![
                Span::styled(mark, Style::default().fg(color)),
                Span::raw(format!(" {}", task.desc)),
            ])
        })
        .collect()
}

fn status_line(app: &App, session: &Session) -> Line<'static> {
    let (text, color) = match session.status() {
        ConnectionStatus::Connected => ("Connected", Color::Green),
        ConnectionStatus::Connecting => ("Connecting...", Color::Yellow),
        ConnectionStatus::Disconnected => ("Disconnected - reconnecting", Color::Red),
    };

    let mut spans = vec![Span::raw(" "), Span::styled(text, Style::default().fg(color))];
    if let Some(error) = &app.error {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(error.clone(), Style::default().fg(Color::Red)));
    } else if let Some(notice) = session.notice() {
        spans.push(Span::raw(" | "));
        spans.push(Span::raw(notice.to_owned()));
    }
    spans.extend([
        Span::raw(" | "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" send | "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" stop | "),
        Span::styled("Ctrl+C", Style::default().fg(Color::Yellow)),
        Span::raw(" quit "),
    ]);
    Line::from(spans)
}

/// Strings are shown bare, everything else as compact JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Scroll `paragraph` so its last wrapped row sits at the bottom of `area`,
/// less `scroll_back` rows.
fn pin_to_bottom<'a>(
    paragraph: Paragraph<'a>,
    block: Block<'a>,
    area: Rect,
    scroll_back: u16,
) -> Paragraph<'a> {
    let inner = block.inner(area);
    let offset = scroll_offset(paragraph.line_count(inner.width), inner.height, scroll_back);
    paragraph.block(block).scroll((offset, 0))
}

fn scroll_offset(total: usize, height: u16, scroll_back: u16) -> u16 {
    u16::try_from(total)
        .unwrap_or(u16::MAX)
        .saturating_sub(height)
        .saturating_sub(scroll_back)
}
