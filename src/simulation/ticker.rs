use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::simulation::state::SimulationState;
use crate::simulation::upload::StagingVolume;

/// 暂存体积在 tick 循环与 HTTP handler 之间共享
pub type SharedStaging = Arc<RwLock<Option<StagingVolume>>>;

/// 统计最近若干次 tick 的间隔，计算平均频率
#[derive(Debug, Clone)]
pub struct FrameTimer {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl FrameTimer {
    pub const DEFAULT_CAPACITY: usize = 144;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.samples.push_back(elapsed);
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// 平均每秒 tick 次数，没有样本时为 0
    pub fn rate(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().sum();
        let average = total.as_secs_f32() / self.samples.len() as f32;
        if average > 0.0 { 1.0 / average } else { 0.0 }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// 单次更新: 推进播放，然后把当前帧逐层拷贝到暂存体积
pub fn tick_once(state: &SimulationState, staging: &RwLock<Option<StagingVolume>>) {
    state.tick();

    let Some((index, grid)) = state.current_frame_grid() else {
        *staging.write() = None;
        return;
    };

    let mut staging = staging.write();
    if staging.as_ref().map(StagingVolume::shape) != Some(grid.shape()) {
        debug!(shape = ?grid.shape(), "重新创建暂存体积");
        *staging = Some(StagingVolume::new(grid.shape()));
    }
    if let Some(volume) = staging.as_mut() {
        if let Err(e) = volume.upload(index, &grid) {
            warn!(frame = index, error = %e, "上传帧数据失败");
        }
    }
}

/// 以固定间隔运行 tick 循环，直到所在运行时关闭
pub async fn run_ticker(
    state: Arc<SimulationState>,
    staging: SharedStaging,
    timer: Arc<Mutex<FrameTimer>>,
    period: Duration,
) {
    let mut interval = actix_web::rt::time::interval(period);
    let mut last = Instant::now();
    loop {
        interval.tick().await;
        let now = Instant::now();
        timer.lock().record(now - last);
        last = now;
        tick_once(&state, &staging);
    }
}
