//! Action 枚举定义 (Intent)
//!
//! 按键先转成 Action，再改变状态

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // 全局
    Quit,
    SwitchPanel,
    StartDiscovery,
    Refresh,

    // 列表
    MoveSelectionUp,
    MoveSelectionDown,
    /// Enter：设为默认打印机，或添加选中的发现设备
    Submit,
    StartDeletePrinter,
    StartCancelJob,
    LeaveDiscover,

    // 确认弹窗
    Confirm, // y
    Dismiss, // n / Esc
}
