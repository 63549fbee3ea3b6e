use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use actix_web::rt::task::{JoinHandle, spawn_blocking};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::LoadError;
use crate::simulation::loader::{LoadContext, LoadSummary, run_load};
use crate::simulation::state::SimulationState;

/// 后台加载任务句柄，可取消，也可在关闭时等待其结束
pub struct LoadTask {
    pub id: String,
    pub path: PathBuf,
    /// 任务创建时间
    pub created_at: Instant,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<Result<LoadSummary, LoadError>>,
}

impl LoadTask {
    /// 请求取消，加载线程在读取下一帧之前检查该标志
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 等待任务结束
    pub async fn join(self) -> Result<LoadSummary, LoadError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(LoadError::TaskFailed(e.to_string())),
        }
    }
}

/// 在阻塞线程池中启动加载，立即返回任务句柄
/// 状态重置在调用线程同步完成，已有加载进行中时直接返回 AlreadyLoading
pub fn spawn_load(
    state: Arc<SimulationState>,
    path: &Path,
    ctx: LoadContext,
) -> Result<LoadTask, LoadError> {
    state.begin_load(path, Some(ctx.task_id.clone()))?;

    info!(task_id = %ctx.task_id, path = %path.display(), policy = ?ctx.policy, "开始后台加载模拟");

    let id = ctx.task_id.clone();
    let cancel = ctx.cancel_flag();
    let load_path = path.to_path_buf();
    let handle = spawn_blocking(move || run_load(&state, &load_path, &ctx));

    Ok(LoadTask {
        id,
        path: path.to_path_buf(),
        created_at: Instant::now(),
        cancel,
        handle,
    })
}

/// 保存当前（最近一次）加载任务
pub struct TaskStore {
    current: Mutex<Option<LoadTask>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }

    /// 记录新任务，替换已结束的旧任务
    pub fn insert(&self, task: LoadTask) -> String {
        let id = task.id.clone();
        let mut current = self.current.lock();
        if let Some(old) = current.as_ref() {
            if !old.is_finished() {
                warn!(old_task = %old.id, new_task = %id, "替换仍在运行的加载任务");
            }
        }
        *current = Some(task);
        id
    }

    /// 取消正在运行的任务，返回其 ID；没有运行中的任务时返回 None
    pub fn cancel_current(&self) -> Option<String> {
        let current = self.current.lock();
        match current.as_ref() {
            Some(task) if !task.is_finished() => {
                task.cancel();
                info!(task_id = %task.id, "已请求取消加载任务");
                Some(task.id.clone())
            }
            _ => None,
        }
    }

    pub fn current_id(&self) -> Option<String> {
        self.current.lock().as_ref().map(|t| t.id.clone())
    }

    /// 取出当前任务（通常在服务关闭时取消并等待）
    pub fn take(&self) -> Option<LoadTask> {
        self.current.lock().take()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
