//! 通用 UI 组件

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear},
};

/// [组件] 弹窗基础框架：清空区域并返回内部矩形
pub fn render_dialog_framework(frame: &mut Frame, area: Rect, title: &str) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

/// [组件] 面板边框，持有焦点时绿色加粗
pub fn panel_block(title: &str, active: bool) -> Block<'_> {
    let style = if active {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(style)
}

/// 选中行样式，只在有焦点的列表中高亮
pub fn row_style(selected: bool, active: bool) -> Style {
    if selected && active {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}
