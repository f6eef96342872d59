//! UI 模块
//!
//! 采用 MVI (Model-View-Intent) 架构：
//! - Model (state.rs, selection.rs, status.rs, discovery.rs): App 结构体及其拥有的状态
//! - View (view/): 纯函数，将 State 映射为 UI
//! - Intent (actions.rs, input.rs): 按键转化为明确的语义化 Action
//! - Update (logic.rs): `App::dispatch`

pub mod actions;
pub mod discovery;
pub mod input;
pub mod logic;
pub mod selection;
pub mod state;
pub mod status;
pub mod view;

// Re-export for convenience
pub use input::{InputEvent, handle_event};
pub use state::App;
pub use view::render;
