//! 键盘事件映射 (Input -> Action)

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use super::actions::Action;
use super::state::{App, Panel, View};

/// 主循环交给控制器的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    /// 一个 tick 内没有输入
    Tick,
}

/// 根据当前弹窗、视图和面板获取按键对应的 Action
///
/// 顺序：弹窗按键 > 全局按键 > 当前视图/面板按键
pub fn get_action(app: &App, key: KeyEvent) -> Option<Action> {
    if app.modal.is_some() {
        return match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::Confirm),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::Dismiss),
            _ => None,
        };
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    let global = match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Tab => Some(Action::SwitchPanel),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Action::StartDiscovery),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Refresh),
        _ => None,
    };
    if global.is_some() {
        return global;
    }

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => return Some(Action::MoveSelectionDown),
        KeyCode::Char('k') | KeyCode::Up => return Some(Action::MoveSelectionUp),
        _ => {}
    }

    match (app.view, app.panel) {
        (View::Main, Panel::Printers) => match key.code {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Char('d') => Some(Action::StartDeletePrinter),
            _ => None,
        },
        (View::Main, Panel::Jobs) => match key.code {
            KeyCode::Char('c') => Some(Action::StartCancelJob),
            _ => None,
        },
        (View::Discover, _) => match key.code {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Esc => Some(Action::LeaveDiscover),
            _ => None,
        },
    }
}

/// 处理一个事件，然后执行每个 tick 的轮询
pub fn handle_event(app: &mut App, event: InputEvent) {
    match event {
        InputEvent::Key(key) if key.kind == KeyEventKind::Press => {
            if let Some(action) = get_action(app, key) {
                app.dispatch(action);
            }
        }
        InputEvent::Key(_) => {}
        InputEvent::Resize(width, height) => {
            // 下次绘制时按新尺寸重新布局
            debug!(width, height, "terminal resized");
        }
        InputEvent::Tick => {}
    }
    app.tick();
}
