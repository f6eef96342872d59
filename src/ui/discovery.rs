//! 后台打印机发现
//!
//! 发现在独立线程中运行，渲染循环从不等待网络扫描。每次 `start` 或
//! `invalidate` 都会让代数加一；worker 提交时只有代数仍是当前值，结果才会
//! 生效，因此最后一次 start 获胜，过期结果被静默丢弃。worker 不会被中断。
//!
//! 代数、状态和结果放在同一个 mutex 后面，通过 `Arc` 与 worker 共享，
//! UI 退出后仍在运行的 worker 也能安全提交。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use tracing::{debug, info, warn};

use super::selection::SelectionList;
use crate::models::DiscoveredDevice;
use crate::print_system::{PrintSystem, PrintSystemError};

/// worker 完成时交回的结果
pub type DiscoveryOutcome = Result<Vec<DiscoveredDevice>, PrintSystemError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStatus {
    Idle,
    Running,
    Ready,
}

#[derive(Debug)]
struct DiscoveryState {
    generation: u64,
    status: DiscoveryStatus,
    results: SelectionList<DiscoveredDevice>,
    /// 当前代的扫描失败时设置
    error: Option<String>,
}

/// 一次渲染使用的发现状态只读副本
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySnapshot {
    pub generation: u64,
    pub status: DiscoveryStatus,
    pub devices: Vec<DiscoveredDevice>,
    pub cursor: usize,
    pub error: Option<String>,
}

pub struct DiscoveryCoordinator {
    shared: Arc<Mutex<DiscoveryState>>,
    backend: Arc<dyn PrintSystem>,
}

impl DiscoveryCoordinator {
    pub fn new(backend: Arc<dyn PrintSystem>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(DiscoveryState {
                generation: 0,
                status: DiscoveryStatus::Idle,
                results: SelectionList::new(),
                error: None,
            })),
            backend,
        }
    }

    /// 开始新的扫描，立即返回其代数
    pub fn start(&self) -> u64 {
        let generation = {
            let mut state = lock(&self.shared);
            state.generation += 1;
            state.status = DiscoveryStatus::Running;
            state.results = SelectionList::new();
            state.error = None;
            state.generation
        };
        info!(generation, "discovery started");

        let shared = Arc::clone(&self.shared);
        let backend = Arc::clone(&self.backend);
        let spawned = thread::Builder::new()
            .name(format!("discovery-{generation}"))
            .spawn(move || {
                let outcome = backend.discover();
                commit(&shared, generation, outcome);
            });

        if let Err(source) = spawned {
            warn!(generation, error = %source, "could not spawn discovery worker");
            self.commit(
                generation,
                Err(PrintSystemError::Spawn {
                    command: "discovery worker".to_string(),
                    source,
                }),
            );
        }
        generation
    }

    /// `generation` 仍是当前代时写入 `outcome`
    ///
    /// 返回是否已写入。过期结果由产生它的 worker 在这里丢弃。
    pub fn commit(&self, generation: u64, outcome: DiscoveryOutcome) -> bool {
        commit(&self.shared, generation, outcome)
    }

    /// 让进行中的扫描结果失效，但不开始新的扫描
    pub fn invalidate(&self) -> u64 {
        let mut state = lock(&self.shared);
        state.generation += 1;
        state.status = DiscoveryStatus::Idle;
        state.results = SelectionList::new();
        state.error = None;
        debug!(generation = state.generation, "discovery invalidated");
        state.generation
    }

    pub fn poll(&self) -> DiscoverySnapshot {
        let state = lock(&self.shared);
        DiscoverySnapshot {
            generation: state.generation,
            status: state.status,
            devices: state.results.items().to_vec(),
            cursor: state.results.cursor(),
            error: state.error.clone(),
        }
    }

    pub fn move_cursor(&self, delta: isize) {
        lock(&self.shared).results.move_by(delta);
    }

    pub fn selected(&self) -> Option<DiscoveredDevice> {
        lock(&self.shared).results.selected().cloned()
    }
}

impl Drop for DiscoveryCoordinator {
    fn drop(&mut self) {
        self.invalidate();
    }
}

fn lock(shared: &Mutex<DiscoveryState>) -> MutexGuard<'_, DiscoveryState> {
    // 每次写入都保持状态完整，中毒的锁仍可使用
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn commit(shared: &Mutex<DiscoveryState>, generation: u64, outcome: DiscoveryOutcome) -> bool {
    let mut state = lock(shared);
    if state.generation != generation {
        debug!(
            generation,
            current = state.generation,
            "discarding stale discovery result"
        );
        return false;
    }

    match outcome {
        Ok(devices) => {
            info!(generation, found = devices.len(), "discovery finished");
            state.results = SelectionList::from_items(devices);
            state.error = None;
        }
        Err(e) => {
            warn!(generation, error = %e, "discovery failed");
            state.results = SelectionList::new();
            state.error = Some(e.to_string());
        }
    }
    state.status = DiscoveryStatus::Ready;
    true
}
