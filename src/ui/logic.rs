//! 业务逻辑处理 (Update/Dispatch)
//!
//! 核心 dispatch 逻辑和各个 Action 的处理方法。打印系统的失败只会写进状态栏。

use tracing::{debug, info};

use super::actions::Action;
use super::discovery::DiscoveryStatus;
use super::state::{App, Modal, ModalKind, Panel, View};

impl App {
    /// 核心逻辑分发
    pub fn dispatch(&mut self, action: Action) {
        debug!(?action, view = ?self.view, panel = ?self.panel, "dispatch");

        // 弹窗打开时只响应确认/取消
        if self.modal.is_some() {
            match action {
                Action::Confirm => self.confirm_modal(),
                Action::Dismiss => self.dismiss_modal(),
                _ => {}
            }
            return;
        }

        match action {
            Action::Quit => self.quit(),
            Action::SwitchPanel => self.switch_panel(),
            Action::StartDiscovery => self.start_discovery(),
            Action::Refresh => self.refresh(),

            Action::MoveSelectionUp => self.move_selection(-1),
            Action::MoveSelectionDown => self.move_selection(1),
            Action::Submit => match self.view {
                View::Main if self.panel == Panel::Printers => self.set_default_printer(),
                View::Main => {}
                View::Discover => self.add_discovered_printer(),
            },
            Action::StartDeletePrinter => self.start_delete_printer(),
            Action::StartCancelJob => self.start_cancel_job(),
            Action::LeaveDiscover => self.leave_discover(),

            Action::Confirm | Action::Dismiss => {}
        }
    }

    /// 每个 tick 轮询一次：完成的发现结果只报告一次
    pub fn tick(&mut self) {
        if self.view != View::Discover {
            return;
        }
        let snap = self.discovery.poll();
        if snap.status != DiscoveryStatus::Ready
            || self.reported_generation == Some(snap.generation)
        {
            return;
        }
        self.reported_generation = Some(snap.generation);

        match (&snap.error, snap.devices.len()) {
            (Some(e), _) => self.status.set(format!("Discovery failed: {e}")),
            (None, 0) => self.status.set("No network printers found"),
            (None, 1) => self.status.set("Found 1 printer"),
            (None, n) => self.status.set(format!("Found {n} printers")),
        }
    }

    // ============ 全局操作 ============

    pub fn quit(&mut self) {
        if self.view == View::Discover {
            self.leave_discover();
        } else {
            info!("quit requested");
            self.running = false;
        }
    }

    pub fn switch_panel(&mut self) {
        if self.view == View::Main {
            self.panel = match self.panel {
                Panel::Printers => Panel::Jobs,
                Panel::Jobs => Panel::Printers,
            };
        }
    }

    pub fn start_discovery(&mut self) {
        if self.view == View::Discover {
            return;
        }
        self.view = View::Discover;
        self.reported_generation = None;
        self.discovery.start();
        self.status.set("Searching for network printers...");
    }

    pub fn refresh(&mut self) {
        if self.view != View::Main {
            return;
        }
        match self.reload_all() {
            Ok(()) => self.status.set("Refreshed"),
            Err(message) => self.status.set(message),
        }
    }

    // ============ 导航相关 ============

    pub fn move_selection(&mut self, delta: isize) {
        match (self.view, self.panel) {
            (View::Main, Panel::Printers) => self.printers.move_by(delta),
            (View::Main, Panel::Jobs) => self.jobs.move_by(delta),
            (View::Discover, _) => self.discovery.move_cursor(delta),
        }
    }

    // ============ 打印机 ============

    pub fn set_default_printer(&mut self) {
        let Some(name) = self.printers.selected().map(|p| p.name.clone()) else {
            return;
        };
        match self.backend.set_default(&name) {
            Ok(()) => {
                let done = format!("Set {name} as default");
                self.status.set(done.clone());
                self.reload_printers_after(&done);
            }
            Err(e) => self.status.set(format!("Failed to set default: {e}")),
        }
    }

    pub fn start_delete_printer(&mut self) {
        if self.view != View::Main || self.panel != Panel::Printers {
            return;
        }
        if let Some(printer) = self.printers.selected() {
            self.modal = Some(Modal::confirm_delete(printer));
        }
    }

    // ============ 作业 ============

    pub fn start_cancel_job(&mut self) {
        if self.view != View::Main || self.panel != Panel::Jobs {
            return;
        }
        if let Some(job) = self.jobs.selected() {
            self.modal = Some(Modal::confirm_cancel_job(job));
        }
    }

    // ============ 发现 ============

    pub fn add_discovered_printer(&mut self) {
        let Some(device) = self.discovery.selected() else {
            return;
        };
        match self
            .backend
            .add_printer(&device.suggested_name, &device.uri)
        {
            Ok(()) => {
                let done = format!("Added {}", device.suggested_name);
                self.status.set(done.clone());
                self.reload_printers_after(&done);
            }
            Err(e) => self.status.set(format!("Failed to add printer: {e}")),
        }
        self.leave_discover();
    }

    pub fn leave_discover(&mut self) {
        if self.view != View::Discover {
            return;
        }
        self.view = View::Main;
        self.discovery.invalidate();
    }

    // ============ 弹窗 ============

    pub fn confirm_modal(&mut self) {
        let Some(modal) = self.modal.take() else {
            return;
        };
        match modal.kind {
            ModalKind::ConfirmDelete { printer } => match self.backend.delete_printer(&printer) {
                Ok(()) => {
                    let done = format!("Deleted {printer}");
                    self.status.set(done.clone());
                    self.reload_printers_after(&done);
                }
                Err(e) => self.status.set(format!("Failed to delete printer: {e}")),
            },
            ModalKind::ConfirmCancelJob { job_id } => match self.backend.cancel_job(job_id) {
                Ok(()) => {
                    let done = format!("Cancelled job {job_id}");
                    self.status.set(done.clone());
                    if let Err(e) = self.jobs.refresh(|| self.backend.list_jobs()) {
                        self.status.set(format!("{done}, but listing jobs failed: {e}"));
                    }
                }
                Err(e) => self.status.set(format!("Failed to cancel job: {e}")),
            },
        }
    }

    pub fn dismiss_modal(&mut self) {
        self.modal = None;
        self.status.set("Cancelled");
    }

    // ============ 刷新辅助 ============

    /// 重新加载两个列表；哪个取失败，哪个保留旧内容
    pub(super) fn reload_all(&mut self) -> Result<(), String> {
        let printers = self.printers.refresh(|| self.backend.list_printers());
        let jobs = self.jobs.refresh(|| self.backend.list_jobs());
        if printers.is_ok() || jobs.is_ok() {
            self.last_refresh = Some(chrono::Local::now());
        }
        match (printers, jobs) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), _) => Err(format!("Failed to list printers: {e}")),
            (_, Err(e)) => Err(format!("Failed to list jobs: {e}")),
        }
    }

    fn reload_printers_after(&mut self, done: &str) {
        match self.printers.refresh(|| self.backend.list_printers()) {
            Ok(()) => self.last_refresh = Some(chrono::Local::now()),
            Err(e) => self.status.set(format!("{done}, but listing printers failed: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;
    use crate::models::DiscoveredDevice;
    use crate::print_system::fake::FakePrintSystem;
    use crate::ui::input::{InputEvent, handle_event};

    fn app_with(fake: FakePrintSystem) -> (App, Arc<FakePrintSystem>) {
        let fake = Arc::new(fake);
        let app = App::new(fake.clone());
        (app, fake)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn names(app: &App) -> Vec<String> {
        app.printers.items().iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn starts_on_printers_panel_with_lists_loaded() {
        let (app, _) = app_with(
            FakePrintSystem::new()
                .with_printers(&["office", "lab"])
                .with_jobs(&[7]),
        );
        assert!(app.running);
        assert_eq!(app.view, View::Main);
        assert_eq!(app.panel, Panel::Printers);
        assert_eq!(app.printers.len(), 2);
        assert_eq!(app.jobs.len(), 1);
        assert!(app.last_refresh.is_some());
    }

    #[test]
    fn failed_initial_load_is_reported_not_fatal() {
        let fake = FakePrintSystem::new();
        fake.fail("list_printers");
        let (app, _) = app_with(fake);
        assert!(app.running);
        assert!(app.status.message().starts_with("Failed to list printers"));
    }

    #[test]
    fn quit_from_main_stops_the_loop() {
        let (mut app, _) = app_with(FakePrintSystem::new());
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn ctrl_c_quits() {
        let (mut app, _) = app_with(FakePrintSystem::new());
        handle_event(
            &mut app,
            InputEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(!app.running);
    }

    #[test]
    fn tab_toggles_panels_and_moves_the_right_cursor() {
        let (mut app, _) = app_with(
            FakePrintSystem::new()
                .with_printers(&["a", "b"])
                .with_jobs(&[1, 2, 3]),
        );
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.panel, Panel::Jobs);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.jobs.cursor(), 2);
        assert_eq!(app.printers.cursor(), 0);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.panel, Panel::Printers);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.printers.cursor(), 0);
    }

    #[test]
    fn refresh_reports_and_picks_up_changes() {
        let (mut app, fake) = app_with(FakePrintSystem::new());
        assert!(app.printers.is_empty());

        *fake.printers.lock().unwrap() = vec![
            crate::models::PrinterRecord::new("a"),
            crate::models::PrinterRecord::new("b"),
        ];
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.printers.len(), 2);
        assert_eq!(app.printers.cursor(), 0);
        assert_eq!(app.status.message(), "Refreshed");
    }

    #[test]
    fn refresh_shrinking_jobs_clamps_cursor() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_jobs(&[1, 2, 3]));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.jobs.cursor(), 1);

        fake.jobs.lock().unwrap().truncate(1);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.jobs.cursor(), 0);
        assert_eq!(app.jobs.len(), 1);
    }

    #[test]
    fn failed_refresh_keeps_previous_list() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_printers(&["a", "b"]));
        fake.fail("list_printers");
        fake.printers.lock().unwrap().clear();

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(names(&app), vec!["a", "b"]);
        assert!(app.status.message().starts_with("Failed to list printers"));
    }

    #[test]
    fn enter_sets_default_and_refreshes() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_printers(&["a", "b"]));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);

        assert!(fake.calls().contains(&"set_default b".to_string()));
        assert_eq!(app.status.message(), "Set b as default");
        assert!(app.printers.items()[1].is_default);
    }

    #[test]
    fn failed_set_default_is_only_a_status() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_printers(&["a"]));
        fake.fail("set_default");
        press(&mut app, KeyCode::Enter);
        assert!(app.status.message().starts_with("Failed to set default"));
        assert!(app.running);
        assert!(!app.printers.items()[0].is_default);
    }

    #[test]
    fn delete_on_empty_list_opens_nothing() {
        let (mut app, _) = app_with(FakePrintSystem::new());
        press(&mut app, KeyCode::Char('d'));
        assert!(app.modal.is_none());
    }

    #[test]
    fn confirmed_delete_removes_printer() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_printers(&["a", "b"]));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(
            app.modal.as_ref().map(|m| m.message.as_str()),
            Some("Delete printer 'b'?")
        );

        press(&mut app, KeyCode::Char('Y'));
        assert!(app.modal.is_none());
        assert!(fake.calls().contains(&"delete_printer b".to_string()));
        assert_eq!(names(&app), vec!["a"]);
        assert_eq!(app.printers.cursor(), 0);
        assert_eq!(app.status.message(), "Deleted b");
    }

    #[test]
    fn failed_delete_closes_modal_and_keeps_list() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_printers(&["a", "b"]));
        fake.fail("delete_printer");
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));

        assert!(app.modal.is_none());
        assert_eq!(names(&app), vec!["a", "b"]);
        assert!(app.status.message().starts_with("Failed to delete printer"));
    }

    #[test]
    fn modal_targets_what_was_selected_when_opened() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_jobs(&[4, 5]));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(
            app.modal.as_ref().map(|m| &m.kind),
            Some(&ModalKind::ConfirmCancelJob { job_id: 5 })
        );
        assert_eq!(app.modal.as_ref().unwrap().message, "Cancel job 5 'doc-5'?");

        press(&mut app, KeyCode::Char('y'));
        assert!(fake.calls().contains(&"cancel_job 5".to_string()));
        assert_eq!(app.jobs.len(), 1);
        assert_eq!(app.status.message(), "Cancelled job 5");
    }

    #[test]
    fn failed_cancel_keeps_job_and_reports() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_jobs(&[8, 9]));
        fake.fail("cancel_job");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('y'));

        assert!(app.modal.is_none());
        assert!(fake.calls().contains(&"cancel_job 8".to_string()));
        assert_eq!(app.jobs.len(), 2);
        assert!(app.status.message().starts_with("Failed to cancel job"));
        assert!(app.running);
    }

    #[test]
    fn delete_succeeds_but_relisting_printers_fails() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_printers(&["a", "b"]));
        fake.fail("list_printers");
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));

        assert!(fake.calls().contains(&"delete_printer a".to_string()));
        assert!(
            app.status
                .message()
                .starts_with("Deleted a, but listing printers failed")
        );
        // 刷新失败时列表保留旧内容
        assert_eq!(names(&app), vec!["a", "b"]);
    }

    #[test]
    fn cancel_succeeds_but_relisting_jobs_fails() {
        let (mut app, fake) = app_with(FakePrintSystem::new().with_jobs(&[3]));
        fake.fail("list_jobs");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('c'));
        press(&mut app, KeyCode::Char('y'));

        assert!(fake.calls().contains(&"cancel_job 3".to_string()));
        assert!(
            app.status
                .message()
                .starts_with("Cancelled job 3, but listing jobs failed")
        );
        assert_eq!(app.jobs.len(), 1);
    }

    #[test]
    fn dismissing_modal_reports_cancellation() {
        for key in [KeyCode::Char('n'), KeyCode::Char('N'), KeyCode::Esc] {
            let (mut app, fake) = app_with(FakePrintSystem::new().with_printers(&["a"]));
            press(&mut app, KeyCode::Char('d'));
            press(&mut app, key);
            assert!(app.modal.is_none());
            assert_eq!(app.status.message(), "Cancelled");
            assert!(!fake.calls().iter().any(|c| c.starts_with("delete_printer")));
        }
    }

    #[test]
    fn open_modal_swallows_every_other_key() {
        let (mut app, fake) = app_with(
            FakePrintSystem::new()
                .with_printers(&["a", "b"])
                .with_jobs(&[1]),
        );
        press(&mut app, KeyCode::Char('d'));
        let modal = app.modal.clone();
        let calls = fake.calls().len();
        let status = app.status.message().to_string();

        for key in [
            KeyCode::Char('q'),
            KeyCode::Tab,
            KeyCode::Char('a'),
            KeyCode::Char('r'),
            KeyCode::Down,
            KeyCode::Char('j'),
            KeyCode::Enter,
            KeyCode::Char('d'),
            KeyCode::Char('c'),
            KeyCode::Char('x'),
        ] {
            press(&mut app, key);
        }
        app.dispatch(Action::Quit);
        app.dispatch(Action::StartDiscovery);

        assert!(app.running);
        assert_eq!(app.view, View::Main);
        assert_eq!(app.panel, Panel::Printers);
        assert_eq!(app.printers.cursor(), 0);
        assert_eq!(app.modal, modal);
        assert_eq!(fake.calls().len(), calls);
        assert_eq!(app.status.message(), status);
    }

    #[test]
    fn discovery_runs_in_background_and_reports_once() {
        let (fake, release) = FakePrintSystem::new()
            .with_devices(&["ipp://10.0.0.5:631/ipp/print", "socket://10.0.0.7"])
            .gated();
        let (mut app, _) = app_with(fake);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.view, View::Discover);
        assert_eq!(app.discovery.poll().status, DiscoveryStatus::Running);

        release.send(()).unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while app.discovery.poll().status != DiscoveryStatus::Ready {
            assert!(std::time::Instant::now() < deadline);
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        handle_event(&mut app, InputEvent::Tick);
        assert_eq!(app.status.message(), "Found 2 printers");

        app.status.set("something else");
        handle_event(&mut app, InputEvent::Tick);
        assert_eq!(app.status.message(), "something else");
    }

    #[test]
    fn adding_a_discovered_printer_returns_to_main() {
        let (fake, _release) = FakePrintSystem::new().gated();
        let (mut app, fake_ref) = app_with(fake);
        press(&mut app, KeyCode::Char('a'));
        let g = app.discovery.poll().generation;
        app.discovery.commit(
            g,
            Ok(vec![
                DiscoveredDevice::from_uri("socket://first"),
                DiscoveredDevice::from_uri("ipp://second/ipp"),
            ]),
        );
        handle_event(&mut app, InputEvent::Tick);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);

        assert!(
            fake_ref
                .calls()
                .contains(&"add_printer second ipp://second/ipp".to_string())
        );
        assert_eq!(app.view, View::Main);
        assert_eq!(app.status.message(), "Added second");
        assert_eq!(names(&app), vec!["second"]);
        assert!(app.discovery.poll().generation > g);
        assert_eq!(app.discovery.poll().status, DiscoveryStatus::Idle);
    }

    #[test]
    fn enter_while_still_searching_does_nothing() {
        let (fake, _release) = FakePrintSystem::new().gated();
        let (mut app, fake_ref) = app_with(fake);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view, View::Discover);
        assert!(!fake_ref.calls().iter().any(|c| c.starts_with("add_printer")));
    }

    #[test]
    fn failed_add_still_leaves_discover() {
        let (fake, _release) = FakePrintSystem::new().gated();
        fake.fail("add_printer");
        let (mut app, _) = app_with(fake);
        press(&mut app, KeyCode::Char('a'));
        let g = app.discovery.poll().generation;
        app.discovery
            .commit(g, Ok(vec![DiscoveredDevice::from_uri("socket://x")]));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.view, View::Main);
        assert!(app.status.message().starts_with("Failed to add printer"));
        assert!(app.printers.is_empty());
    }

    #[test]
    fn escape_then_late_commit_is_silent() {
        let (fake, _release) = FakePrintSystem::new().with_printers(&["a"]).gated();
        let (mut app, _) = app_with(fake);
        press(&mut app, KeyCode::Char('a'));
        let g = app.discovery.poll().generation;

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.view, View::Main);
        app.status.set("before");

        assert!(!app
            .discovery
            .commit(g, Ok(vec![DiscoveredDevice::from_uri("socket://late")])));
        handle_event(&mut app, InputEvent::Tick);
        assert_eq!(app.status.message(), "before");
        assert_eq!(names(&app), vec!["a"]);
        assert!(app.discovery.poll().devices.is_empty());
    }

    #[test]
    fn q_in_discover_goes_back_instead_of_quitting() {
        let (fake, _release) = FakePrintSystem::new().gated();
        let (mut app, _) = app_with(fake);
        press(&mut app, KeyCode::Char('a'));
        let g = app.discovery.poll().generation;
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        assert_eq!(app.view, View::Main);
        assert!(app.discovery.poll().generation > g);
    }

    #[test]
    fn rediscovery_ignores_the_previous_attempt() {
        let (fake, _release) = FakePrintSystem::new().gated();
        let (mut app, _) = app_with(fake);
        press(&mut app, KeyCode::Char('a'));
        let first = app.discovery.poll().generation;
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('a'));
        let second = app.discovery.poll().generation;

        assert!(!app
            .discovery
            .commit(first, Ok(vec![DiscoveredDevice::from_uri("socket://old")])));
        handle_event(&mut app, InputEvent::Tick);
        assert_eq!(app.discovery.poll().status, DiscoveryStatus::Running);

        assert!(app.discovery.commit(second, Ok(Vec::new())));
        handle_event(&mut app, InputEvent::Tick);
        assert_eq!(app.status.message(), "No network printers found");
    }

    #[test]
    fn discovery_failure_is_not_reported_as_empty() {
        let (fake, _release) = FakePrintSystem::new().gated();
        let (mut app, _) = app_with(fake);
        press(&mut app, KeyCode::Char('a'));
        let g = app.discovery.poll().generation;
        app.discovery.commit(
            g,
            Err(crate::print_system::PrintSystemError::Parse {
                command: "lpinfo -v".to_string(),
                line: "???".to_string(),
            }),
        );
        handle_event(&mut app, InputEvent::Tick);
        assert!(app.status.message().starts_with("Discovery failed"));
    }

    #[test]
    fn panel_keys_are_inert_in_discover() {
        let (fake, _release) = FakePrintSystem::new().with_printers(&["a"]).gated();
        let (mut app, _) = app_with(fake);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.panel, Panel::Printers);
        assert!(app.modal.is_none());
        assert_eq!(app.view, View::Discover);
    }

    #[test]
    fn resize_changes_no_state() {
        let (mut app, _) = app_with(FakePrintSystem::new().with_printers(&["a"]));
        handle_event(&mut app, InputEvent::Resize(80, 24));
        assert_eq!(app.view, View::Main);
        assert!(app.running);
    }

    #[test]
    fn shutdown_invalidates_discovery() {
        let (fake, _release) = FakePrintSystem::new().gated();
        let (mut app, _) = app_with(fake);
        press(&mut app, KeyCode::Char('a'));
        let g = app.discovery.poll().generation;
        app.shutdown();
        assert!(!app.running);
        assert!(!app.discovery.commit(g, Ok(Vec::new())));
    }
}
