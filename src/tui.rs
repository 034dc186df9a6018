use anyhow::{bail, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::{stderr, stdout, Write};

use crate::models::{ApplicationStatus, JobApplication, TimelineEvent};
use crate::timeline::derive_timeline;

struct AppState {
    applications: Vec<JobApplication>,
    selected: usize,
    scroll_offset: u16,
    timeline: Vec<TimelineEvent>,
}

impl AppState {
    fn new(applications: Vec<JobApplication>) -> Self {
        let mut state = Self {
            applications,
            selected: 0,
            scroll_offset: 0,
            timeline: Vec::new(),
        };
        state.refresh_timeline();
        state
    }

    fn current(&self) -> Option<&JobApplication> {
        self.applications.get(self.selected)
    }

    fn refresh_timeline(&mut self) {
        self.timeline = self.current().map(derive_timeline).unwrap_or_default();
    }

    fn next(&mut self) {
        if !self.applications.is_empty() && self.selected < self.applications.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

pub fn run_browse(applications: Vec<JobApplication>) -> Result<()> {
    if applications.is_empty() {
        println!("No applications found.");
        return Ok(());
    }

    let mut state = AppState::new(applications);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let prev_selected = state.selected;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                _ => {}
            }
            if state.selected != prev_selected {
                list_state.select(Some(state.selected));
                state.refresh_timeline();
            }
        }
    }
    Ok(())
}

/// Read one line from the terminal without echoing it.
pub fn prompt_hidden(label: &str) -> Result<String> {
    eprint!("{}", label);
    stderr().flush()?;

    enable_raw_mode()?;
    let result = read_hidden_line();
    disable_raw_mode()?;
    eprintln!();

    result
}

fn read_hidden_line() -> Result<String> {
    let mut line = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(line),
            KeyCode::Esc => bail!("Cancelled"),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => bail!("Cancelled"),
            KeyCode::Backspace => {
                line.pop();
            }
            KeyCode::Char(c) => line.push(c),
            _ => {}
        }
    }
}

fn status_icon(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => " ",
        ApplicationStatus::Reviewed => "*",
        ApplicationStatus::Shortlisted => "+",
        ApplicationStatus::Interviewed => "#",
        ApplicationStatus::Offered => "$",
        ApplicationStatus::Rejected => "x",
    }
}

fn status_style(status: ApplicationStatus) -> Style {
    let color = match status {
        ApplicationStatus::Pending => Color::Yellow,
        ApplicationStatus::Reviewed => Color::Blue,
        ApplicationStatus::Shortlisted => Color::Magenta,
        ApplicationStatus::Interviewed => Color::Cyan,
        ApplicationStatus::Offered => Color::Green,
        ApplicationStatus::Rejected => Color::Red,
    };
    Style::default().fg(color)
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(frame.area());

    let items: Vec<ListItem> = state
        .applications
        .iter()
        .map(|app| {
            let title = if app.job_title.chars().count() > 30 {
                format!("{}...", app.job_title.chars().take(27).collect::<String>())
            } else {
                app.job_title.clone()
            };
            ListItem::new(format!("{} {} | {}", status_icon(app.status), title, app.company))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Applications ({}) ",
            state.applications.len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    let detail = Paragraph::new(build_detail(state))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail, chunks[1]);

    let help_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let help = Paragraph::new(" j/k:navigate  J/K:scroll  q:quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, help_area[1]);
}

fn build_detail(state: &AppState) -> Text<'_> {
    let Some(app) = state.current() else {
        return Text::raw("No application selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &app.job_title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", app.company)));
    lines.push(Line::from(Span::styled(
        format!("Status: {}", app.status.label()),
        status_style(app.status),
    )));
    lines.push(Line::from(format!("Location: {}", app.location)));
    lines.push(Line::from(format!("Salary: {}", app.salary_range)));
    lines.push(Line::from(format!("Type: {}", app.employment_type)));
    lines.push(Line::from(format!("Applied: {}", app.applied_date.format("%Y-%m-%d"))));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "TIMELINE",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for event in &state.timeline {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<12}", event.status), Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {}", event.date.format("%Y-%m-%d"))),
        ]));
        lines.push(Line::from(Span::styled(
            format!("    {}", event.description),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "COVER LETTER",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for line in textwrap::fill(&app.cover_letter, 70).lines() {
        lines.push(Line::from(format!("  {}", line)));
    }

    Text::from(lines)
}
