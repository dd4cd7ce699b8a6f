//! Interactive console: status badge, progress gauge, analysis card and the
//! companion chat pane, driven entirely by controller events.

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{io, time::Duration};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::chat::{self, ChatMessage};
use crate::cli::{build_console, Cli};
use crate::model::{ConsoleEvent, RunReport, RunStatus};
use crate::orchestrator::{run_controller, UiCommand};
use crate::session::ConsoleSession;

struct UiState {
    session: ConsoleSession,
    info: String,
    chat: Vec<ChatMessage>,
    chat_input: String,
    chat_focus: bool,
    last_report: Option<RunReport>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            session: ConsoleSession::new(),
            info: String::new(),
            chat: vec![ChatMessage::assistant(chat::GREETING)],
            chat_input: String::new(),
            chat_focus: false,
            last_report: None,
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let (channel, capture) = build_console(&args);

    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<ConsoleEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let controller = tokio::spawn(run_controller(
        capture,
        channel,
        args.export_json.clone(),
        evt_tx,
        cmd_rx,
    ));

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let res = ui_loop(&mut terminal, &cmd_tx, evt_rx).await;

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    let _ = cmd_tx.send(UiCommand::Quit);
    controller
        .await
        .context("controller task failed")?
        .context("controller returned an error")?;

    res
}

async fn ui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cmd_tx: &UnboundedSender<UiCommand>,
    mut evt_rx: UnboundedReceiver<ConsoleEvent>,
) -> Result<()> {
    let mut state = UiState::default();

    loop {
        // Drain pending controller events before drawing.
        while let Ok(ev) = evt_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        terminal.draw(|f| draw(f, &state))?;

        // Short poll keeps the progress gauge live between key presses.
        if !event::poll(Duration::from_millis(50))? {
            tokio::task::yield_now().await;
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if state.chat_focus {
                match key.code {
                    KeyCode::Enter => {
                        let text = state.chat_input.trim().to_string();
                        if !text.is_empty() {
                            state.chat.push(ChatMessage::user(text.clone()));
                            let _ = cmd_tx.send(UiCommand::ChatSend(text));
                        }
                        state.chat_input.clear();
                    }
                    KeyCode::Backspace => {
                        state.chat_input.pop();
                    }
                    KeyCode::Esc | KeyCode::Tab => state.chat_focus = false,
                    KeyCode::Char(c) => state.chat_input.push(c),
                    _ => {}
                }
            } else {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        return Ok(());
                    }
                    KeyCode::Char('r') => {
                        let _ = cmd_tx.send(UiCommand::StartRecording);
                    }
                    KeyCode::Char('s') => {
                        let _ = cmd_tx.send(UiCommand::StopAndSubmit);
                    }
                    KeyCode::Char('c') => {
                        let _ = cmd_tx.send(UiCommand::CancelRun);
                    }
                    KeyCode::Tab | KeyCode::Char('t') => state.chat_focus = true,
                    _ => {}
                }
            }
        }
    }
}

fn apply_event(state: &mut UiState, ev: ConsoleEvent) {
    match ev {
        ConsoleEvent::Session(session) => state.session = session,
        ConsoleEvent::Info(info) => state.info = info.to_message(),
        ConsoleEvent::ChatReply { text } => state.chat.push(ChatMessage::assistant(text)),
        ConsoleEvent::RunFinished { report } => state.last_report = Some(*report),
    }
}

fn status_colors(status: RunStatus) -> (Color, Color) {
    match status {
        RunStatus::Idle => (Color::Gray, Color::Black),
        RunStatus::Recording => (Color::Red, Color::White),
        RunStatus::Uploading | RunStatus::Queued => (Color::Yellow, Color::Black),
        RunStatus::Processing => (Color::Blue, Color::White),
        RunStatus::Succeeded => (Color::Green, Color::Black),
        RunStatus::Failed => (Color::Red, Color::White),
    }
}

fn draw(f: &mut Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, rows[0], state);
    draw_progress(f, rows[1], state);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[2]);
    draw_result(f, body[0], state);
    draw_chat(f, body[1], state);

    draw_footer(f, rows[3], state);
}

fn draw_header(f: &mut Frame, area: Rect, state: &UiState) {
    let (bg, fg) = status_colors(state.session.status);
    let line = Line::from(vec![
        Span::raw("AI Analysis Interface  "),
        Span::styled(
            format!(" {} ", state.session.status.label()),
            Style::default().bg(bg).fg(fg).add_modifier(Modifier::BOLD),
        ),
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_progress(f: &mut Frame, area: Rect, state: &UiState) {
    let visible = matches!(
        state.session.status,
        RunStatus::Uploading | RunStatus::Queued | RunStatus::Processing | RunStatus::Succeeded
    );
    if !visible {
        f.render_widget(Block::default().borders(Borders::ALL).title("Progress"), area);
        return;
    }
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(u16::from(state.session.progress.min(100)));
    f.render_widget(gauge, area);
}

fn draw_result(f: &mut Frame, area: Rect, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();

    if let Some(error) = state.session.error.as_deref() {
        lines.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::default());
    }

    match state.session.result.as_ref() {
        Some(result) => {
            lines.push(Line::from(Span::styled(
                "Summary",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(result.summary.clone()));
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Entities",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for entity in &result.entities {
                lines.push(Line::from(format!("- {}: {}", entity.kind, entity.value)));
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                "Notes",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for note in result.notes.lines() {
                lines.push(Line::from(note.to_string()));
            }
        }
        None => {
            if state.session.error.is_none() {
                lines.push(Line::from(Span::styled(
                    "No analysis yet. Record something.",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }

    // Tag the card with the finished run's id while its output is shown.
    let finished_run = state
        .last_report
        .as_ref()
        .filter(|_| state.session.is_terminal())
        .and_then(|report| report.run_id.as_ref());
    let title = match finished_run {
        Some(run_id) => format!("Analysis Result ({})", run_id),
        None => "Analysis Result".to_string(),
    };
    let card = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(card, area);
}

fn draw_chat(f: &mut Frame, area: Rect, state: &UiState) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    // Show the tail of the conversation that fits the pane.
    let visible_rows = parts[0].height.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for msg in &state.chat {
        let (who, color) = match msg.role {
            crate::chat::Role::User => ("You", Color::Cyan),
            crate::chat::Role::Assistant => ("Assistant", Color::Green),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", who), Style::default().fg(color)),
            Span::raw(msg.text.clone()),
        ]));
    }
    let skip = lines.len().saturating_sub(visible_rows);
    let list = Paragraph::new(lines.split_off(skip))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Chat"));
    f.render_widget(list, parts[0]);

    let input_style = if state.chat_focus {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(state.chat_input.as_str())
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title(
            if state.chat_focus {
                "Message (Enter to send, Esc to leave)"
            } else {
                "Message (Tab to focus)"
            },
        ));
    f.render_widget(input, parts[1]);
}

fn draw_footer(f: &mut Frame, area: Rect, state: &UiState) {
    let hints = "r record | s stop | c cancel | Tab chat | q quit";
    let text = if state.info.is_empty() {
        hints.to_string()
    } else {
        format!("{}  |  {}", hints, state.info)
    };
    let footer = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, area);
}
