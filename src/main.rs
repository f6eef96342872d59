mod config;
mod cups;
mod models;
mod print_system;
mod ui;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    cursor::Show,
    event::{self, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::cups::CupsCommands;
use crate::ui::{App, InputEvent, handle_event, render};

/// 日志写入文件，终端留给 UI
fn init_logging(config: &Config) -> Result<WorkerGuard> {
    let dir = config.log_dir().context("creating log directory")?;
    let appender = tracing_appender::rolling::daily(&dir, "spoolie.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

/// 终端守卫：raw mode + 备用屏幕
///
/// `finish` 或 `Drop`（包括 panic 展开）都会恢复终端。
struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        // 从这里开始，任何失败都由 Drop 恢复 raw mode
        let guard = Self { active: true };
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }

    /// 恢复终端并返回第一个错误
    fn finish(mut self) -> io::Result<()> {
        self.active = false;
        restore_terminal(disable_raw_mode, &mut io::stdout())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = restore_terminal(disable_raw_mode, &mut io::stdout()) {
            warn!(error = %e, "could not restore terminal");
        }
    }
}

/// 每一步都执行，不因前一步失败而跳过
fn restore_terminal(
    disable_raw: impl FnOnce() -> io::Result<()>,
    out: &mut impl Write,
) -> io::Result<()> {
    let raw = disable_raw();
    let screen = execute!(out, LeaveAlternateScreen, Show);
    raw.and(screen)
}

fn main() -> Result<()> {
    let config = match Config::default_path() {
        Some(path) => {
            Config::load(&path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };
    let _guard = init_logging(&config)?;
    info!(?config, "starting");

    let backend = Arc::new(CupsCommands::new(&config));
    let mut app = App::new(backend);

    // 设置终端
    let terminal_guard = TerminalGuard::enter()?;
    let result = Terminal::new(CrosstermBackend::new(io::stdout()))
        .map_err(anyhow::Error::from)
        .and_then(|mut terminal| run_app(&mut terminal, &mut app, &config));

    // 此后到达的发现结果一律丢弃
    app.shutdown();

    // 恢复终端
    let restored = terminal_guard.finish();

    info!("exiting");
    result?;
    restored?;
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    config: &Config,
) -> Result<()> {
    let tick = config.tick();
    while app.running {
        terminal.draw(|f| render(f, app))?;

        let input = if event::poll(tick)? {
            match event::read()? {
                Event::Key(key) => InputEvent::Key(key),
                Event::Resize(width, height) => InputEvent::Resize(width, height),
                _ => InputEvent::Tick,
            }
        } else {
            InputEvent::Tick
        };
        handle_event(app, input);
    }
    Ok(())
}
