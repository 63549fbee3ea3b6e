use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::LoadError;
use crate::performance::PerformanceStore;
use crate::simulation::{FrameTimer, LoadContext, MissingFramePolicy, SharedStaging, SimulationState};
use crate::task::{TaskStore, spawn_load};

/// 全局应用状态，负责在 handler、tick 循环与加载任务之间共享模拟数据
pub struct AppState {
    pub config: Config,
    pub simulation: Arc<SimulationState>,
    pub staging: SharedStaging,
    pub frame_timer: Arc<Mutex<FrameTimer>>,
    pub task_store: Arc<TaskStore>,
    pub performance_store: Arc<PerformanceStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let performance_store = Arc::new(PerformanceStore::with_ttl(config.task_ttl));
        Self {
            config,
            simulation: Arc::new(SimulationState::new()),
            staging: Arc::new(RwLock::new(None)),
            frame_timer: Arc::new(Mutex::new(FrameTimer::new())),
            task_store: Arc::new(TaskStore::new()),
            performance_store,
        }
    }

    /// 启动后台加载，返回任务 ID 与解析后的描述文件路径
    pub fn request_load(
        &self,
        path: &str,
        policy: Option<MissingFramePolicy>,
    ) -> Result<(String, PathBuf), LoadError> {
        let descriptor = self.config.resolve(path);
        let ctx = LoadContext::new(policy.unwrap_or(self.config.missing_frames))
            .with_performance(self.performance_store.clone());
        let task = spawn_load(self.simulation.clone(), &descriptor, ctx)?;
        let task_id = self.task_store.insert(task);
        Ok((task_id, descriptor))
    }
}
