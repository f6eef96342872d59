//! 视图层模块
//!
//! 包含主渲染入口和各个视图

pub mod components;
pub mod layouts;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::discovery::{DiscoverySnapshot, DiscoveryStatus};
use super::state::{App, Modal, Panel, View};
use crate::models::PrinterState;
use components::{panel_block, render_dialog_framework, row_style};
use layouts::centered_rect;

/// 渲染 UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // 标题
            Constraint::Min(6),    // 主体
            Constraint::Length(3), // 帮助 + 状态
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    match app.view {
        View::Main => render_main(frame, app, chunks[1]),
        View::Discover => render_discover(frame, &app.discovery.poll(), chunks[1]),
    }
    render_footer(frame, app, chunks[2]);

    if let Some(modal) = &app.modal {
        render_confirm_dialog(frame, modal);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let style = Style::default().fg(Color::White).bg(Color::Blue);
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(8)])
        .split(area);

    let updated = app
        .last_refresh
        .map(|t| format!("updated {}", t.format("%H:%M:%S")))
        .unwrap_or_default();
    let title = Line::from(vec![
        Span::styled(" spoolie ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {updated}")),
    ]);
    frame.render_widget(Paragraph::new(title).style(style), halves[0]);
    frame.render_widget(
        Paragraph::new("[Q]uit ")
            .style(style)
            .alignment(Alignment::Right),
        halves[1],
    );
}

fn render_main(frame: &mut Frame, app: &App, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_printers(frame, app, halves[0]);
    render_jobs(frame, app, halves[1]);
}

fn render_printers(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.panel == Panel::Printers;
    let title = format!("Printers ({})", app.printers.len());
    let block = panel_block(&title, active);

    if app.printers.is_empty() {
        frame.render_widget(Paragraph::new("No printers configured").block(block), area);
        return;
    }

    let items: Vec<ListItem> = app
        .printers
        .items()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let selected = i == app.printers.cursor();
            let marker = if selected && active { '>' } else { ' ' };
            let default = if p.is_default { " (default)" } else { "" };
            let state_color = match p.state {
                PrinterState::Idle => Color::Green,
                PrinterState::Processing => Color::Yellow,
                PrinterState::Stopped => Color::Red,
                PrinterState::Unknown => Color::Gray,
            };
            let mut spans = vec![
                Span::raw(format!("{marker} {:<20}{default:<10} ", p.name)),
                Span::styled(format!("{:<10}", p.state), Style::default().fg(state_color)),
                Span::raw(format!(" {}", p.model)),
            ];
            if !p.accepting_jobs {
                spans.push(Span::styled(" [rejecting]", Style::default().fg(Color::Red)));
            }
            if !p.location.is_empty() {
                spans.push(Span::styled(
                    format!("  @ {}", p.location),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans)).style(row_style(selected, active))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.printers.cursor()));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_jobs(frame: &mut Frame, app: &App, area: Rect) {
    let active = app.panel == Panel::Jobs;
    let title = format!("Jobs ({})", app.jobs.len());
    let block = panel_block(&title, active);

    if app.jobs.is_empty() {
        frame.render_widget(Paragraph::new("No active print jobs").block(block), area);
        return;
    }

    let items: Vec<ListItem> = app
        .jobs
        .items()
        .iter()
        .enumerate()
        .map(|(i, j)| {
            let selected = i == app.jobs.cursor();
            let marker = if selected && active { '>' } else { ' ' };
            let text = format!(
                "{marker} {:<6} {:<15} {:<10} {:<10} {}",
                j.id,
                j.printer,
                j.user,
                j.state,
                j.title
            );
            ListItem::new(text).style(row_style(selected, active))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.jobs.cursor()));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_discover(frame: &mut Frame, snap: &DiscoverySnapshot, area: Rect) {
    let block = Block::default()
        .title(" Discover printers ")
        .borders(Borders::ALL)
        .title_style(Style::default().add_modifier(Modifier::BOLD));

    let placeholder = match (snap.status, &snap.error) {
        (DiscoveryStatus::Running | DiscoveryStatus::Idle, _) => {
            Some("Discovering printers...".to_string())
        }
        (DiscoveryStatus::Ready, Some(e)) => Some(format!("Discovery failed: {e}")),
        (DiscoveryStatus::Ready, None) if snap.devices.is_empty() => {
            Some("No network printers found".to_string())
        }
        (DiscoveryStatus::Ready, None) => None,
    };
    if let Some(text) = placeholder {
        let body = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
        frame.render_widget(body, area);
        return;
    }

    let items: Vec<ListItem> = snap
        .devices
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let selected = i == snap.cursor;
            let marker = if selected { '>' } else { ' ' };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{marker} {}", d.uri)),
                Span::styled(
                    format!("  as {}", d.suggested_name),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
            .style(row_style(selected, true))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(snap.cursor));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help = match (app.view, app.panel) {
        _ if app.modal.is_some() => "[y] yes  [n] no",
        (View::Main, Panel::Printers) => {
            "Tab:switch  j/k:nav  Enter:default  d:delete  a:add  r:refresh  q:quit"
        }
        (View::Main, Panel::Jobs) => "Tab:switch  j/k:nav  c:cancel  a:add  r:refresh  q:quit",
        (View::Discover, _) => "j/k:nav  Enter:add printer  Esc/q:back",
    };

    let footer = Paragraph::new(Line::from(vec![
        Span::styled(help, Style::default().fg(Color::Blue)),
        Span::raw("  |  "),
        Span::raw(app.status.message()),
    ]))
    .block(Block::default().borders(Borders::TOP));

    frame.render_widget(footer, area);
}

fn render_confirm_dialog(frame: &mut Frame, modal: &Modal) {
    let area = centered_rect(50, 25, frame.area());
    let inner = render_dialog_framework(frame, area, " Confirm ");

    let dialog = Paragraph::new(vec![
        Line::from(""),
        Line::from(modal.message.as_str()),
        Line::from(""),
        Line::styled("[y] Yes    [n] No", Style::default().add_modifier(Modifier::BOLD)),
    ])
    .style(Style::default().fg(Color::Red))
    .wrap(Wrap { trim: true });

    frame.render_widget(dialog, inner);
}
