use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::LoadError;
use crate::parsers::{self, SimulationHeader};
use crate::performance::{PerformanceRecord, PerformanceStore, get_unix_timestamp_ms};
use crate::simulation::state::SimulationState;
use crate::voxel_grid::VoxelGrid;

/// 帧文件缺失或格式错误时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFramePolicy {
    /// 跳过该帧，序列变短（播放按实际帧数回绕）
    #[default]
    Skip,
    /// 插入全 0 的帧，保持帧号对齐
    ZeroFill,
    /// 终止整个加载
    Abort,
}

impl FromStr for MissingFramePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "zero_fill" | "zero-fill" | "zerofill" => Ok(Self::ZeroFill),
            "abort" => Ok(Self::Abort),
            other => Err(format!("未知的缺帧策略: {}", other)),
        }
    }
}

/// 一次加载的上下文: 任务 ID、缺帧策略、取消标志与性能记录
#[derive(Clone)]
pub struct LoadContext {
    pub task_id: String,
    pub policy: MissingFramePolicy,
    cancel: Arc<AtomicBool>,
    performance: Option<Arc<PerformanceStore>>,
}

impl LoadContext {
    pub fn new(policy: MissingFramePolicy) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            policy,
            cancel: Arc::new(AtomicBool::new(false)),
            performance: None,
        }
    }

    pub fn with_performance(mut self, store: Arc<PerformanceStore>) -> Self {
        self.performance = Some(store);
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn record(&self, index: usize, start_time: u64, msg: String) {
        if let Some(store) = &self.performance {
            store.add_record(
                &self.task_id,
                PerformanceRecord {
                    start_time,
                    end_time: get_unix_timestamp_ms(),
                    channel_group: "load".to_string(),
                    channel_index: format!("frame_{}", index),
                    msg,
                },
            );
        }
    }
}

/// 加载结果摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub header: SimulationHeader,
    /// 实际加入序列的帧数（ZeroFill 策略下包含占位帧）
    pub loaded: usize,
    /// 读取失败的帧号
    pub failed_frames: Vec<usize>,
}

/// 同步加载模拟: 重置状态后在当前线程读取所有帧
/// 已有加载在进行时返回 AlreadyLoading 且不修改状态
pub fn load_simulation(
    state: &SimulationState,
    path: &Path,
    ctx: &LoadContext,
) -> Result<LoadSummary, LoadError> {
    state.begin_load(path, Some(ctx.task_id.clone()))?;
    run_load(state, path, ctx)
}

/// 加载主体，调用前必须已通过 begin_load 进入加载状态
/// 无论成功、失败还是 panic，结束时 is_loading 都会被清除
pub(crate) fn run_load(
    state: &SimulationState,
    path: &Path,
    ctx: &LoadContext,
) -> Result<LoadSummary, LoadError> {
    let mut guard = FinishGuard {
        state,
        finished: false,
    };
    let load_start = Instant::now();

    match read_frames(state, path, ctx) {
        Ok((frames, summary)) => {
            info!(
                task_id = %ctx.task_id,
                path = %path.display(),
                loaded = summary.loaded,
                total = summary.header.total_frames,
                failed = summary.failed_frames.len(),
                elapsed_ms = load_start.elapsed().as_millis() as u64,
                "模拟加载完成"
            );
            state.finish_load(frames, None);
            guard.finished = true;
            Ok(summary)
        }
        Err(err) => {
            warn!(
                task_id = %ctx.task_id,
                path = %path.display(),
                error = %err,
                "模拟加载失败，模拟保持为空"
            );
            state.finish_load(Vec::new(), Some(&err));
            guard.finished = true;
            Err(err)
        }
    }
}

fn read_frames(
    state: &SimulationState,
    path: &Path,
    ctx: &LoadContext,
) -> Result<(Vec<VoxelGrid<f32>>, LoadSummary), LoadError> {
    let header = parsers::parse_descriptor(path)?;
    state.set_header(header);
    debug!(
        task_id = %ctx.task_id,
        total_frames = header.total_frames,
        shape = ?header.shape(),
        voxels_per_frame = ?header.voxel_count(),
        "描述文件解析完成"
    );

    // totalFrames 来自文件，不按它预留空间
    let mut frames = Vec::new();
    let mut failed_frames = Vec::new();

    for index in 0..header.total_frames {
        if ctx.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let frame_path = parsers::frame_path(path, index);
        let start_time = get_unix_timestamp_ms();

        match parsers::parse_frame(&frame_path, index, &header) {
            Ok(grid) => {
                frames.push(grid);
                ctx.record(index, start_time, format!("frame{} 读取完成", index));
            }
            Err(err) if err.is_frame_error() => {
                failed_frames.push(index);
                ctx.record(index, start_time, err.to_string());
                match ctx.policy {
                    MissingFramePolicy::Skip => {
                        warn!(task_id = %ctx.task_id, error = %err, "跳过无法读取的帧");
                    }
                    MissingFramePolicy::ZeroFill => {
                        warn!(task_id = %ctx.task_id, error = %err, "以全 0 帧代替无法读取的帧");
                        frames.push(VoxelGrid::new(header.width, header.height, header.depth)?);
                    }
                    MissingFramePolicy::Abort => return Err(err),
                }
            }
            Err(err) => return Err(err),
        }

        state.record_attempt(index + 1, frames.len());
    }

    let summary = LoadSummary {
        header,
        loaded: frames.len(),
        failed_frames,
    };
    Ok((frames, summary))
}

/// 确保加载线程 panic 时也会清除 is_loading
struct FinishGuard<'a> {
    state: &'a SimulationState,
    finished: bool,
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.state.finish_load(
                Vec::new(),
                Some(&LoadError::TaskFailed("加载线程异常退出".to_string())),
            );
        }
    }
}
