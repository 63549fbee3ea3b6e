use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::error::LoadError;
use crate::parsers::SimulationHeader;
use crate::simulation::playback::{Playback, PlaybackError};
use crate::voxel_grid::VoxelGrid;

/// 单个模拟的共享状态，由加载任务、tick 循环和 HTTP handler 通过 Arc 共享
///
/// 加载期间只有加载任务写入帧序列与计数器；is_loading 以 Release 写入 false 之后，
/// 其他线程以 Acquire 读到 false 即可安全地整体读取帧序列
pub struct SimulationState {
    is_loading: AtomicBool,
    total_frames: AtomicUsize,
    /// 已尝试读取的帧数（成功或跳过）
    attempted_frames: AtomicUsize,
    /// 已成功加入序列的帧数
    loaded_count: AtomicUsize,
    path: RwLock<Option<PathBuf>>,
    header: RwLock<Option<SimulationHeader>>,
    frames: RwLock<Vec<Arc<VoxelGrid<f32>>>>,
    playback: Mutex<Playback>,
    last_error: RwLock<Option<String>>,
    task_id: RwLock<Option<String>>,
}

/// 提供给前端轮询的状态快照
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStatus {
    pub path: Option<String>,
    pub task_id: Option<String>,
    pub is_loading: bool,
    pub load_progress: f32,
    pub loaded_count: usize,
    pub attempted_frames: usize,
    pub total_frames: usize,
    pub shape: Option<[usize; 3]>,
    pub frame_count: usize,
    pub is_valid: bool,
    pub current_frame: usize,
    pub is_playing: bool,
    pub last_error: Option<String>,
}

impl SimulationState {
    pub fn new() -> Self {
        Self {
            is_loading: AtomicBool::new(false),
            total_frames: AtomicUsize::new(0),
            attempted_frames: AtomicUsize::new(0),
            loaded_count: AtomicUsize::new(0),
            path: RwLock::new(None),
            header: RwLock::new(None),
            frames: RwLock::new(Vec::new()),
            playback: Mutex::new(Playback::default()),
            last_error: RwLock::new(None),
            task_id: RwLock::new(None),
        }
    }

    /// 进入加载状态并清空上一次的模拟
    /// 已有加载在进行时返回 AlreadyLoading，且不修改任何状态
    pub fn begin_load(&self, path: &Path, task_id: Option<String>) -> Result<(), LoadError> {
        if self
            .is_loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(LoadError::AlreadyLoading);
        }

        self.frames.write().clear();
        *self.header.write() = None;
        *self.last_error.write() = None;
        *self.path.write() = Some(path.to_path_buf());
        *self.task_id.write() = task_id;
        self.total_frames.store(0, Ordering::Release);
        self.attempted_frames.store(0, Ordering::Release);
        self.loaded_count.store(0, Ordering::Release);
        self.playback.lock().reset();
        Ok(())
    }

    pub(crate) fn set_header(&self, header: SimulationHeader) {
        *self.header.write() = Some(header);
        self.total_frames.store(header.total_frames, Ordering::Release);
    }

    /// 每尝试一帧后更新进度（严格按帧序递增）
    pub(crate) fn record_attempt(&self, attempted: usize, loaded: usize) {
        self.loaded_count.store(loaded, Ordering::Release);
        self.attempted_frames.store(attempted, Ordering::Release);
    }

    /// 发布帧序列并结束加载，每次加载只调用一次
    pub(crate) fn finish_load(&self, frames: Vec<VoxelGrid<f32>>, error: Option<&LoadError>) {
        *self.frames.write() = frames.into_iter().map(Arc::new).collect();
        *self.last_error.write() = error.map(|e| e.to_string());
        self.is_loading.store(false, Ordering::Release);
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.load(Ordering::Acquire)
    }

    /// attempted / total，范围 [0, 1]
    pub fn load_progress(&self) -> f32 {
        let total = self.total_frames.load(Ordering::Acquire);
        if total == 0 {
            return 0.0;
        }
        let attempted = self.attempted_frames.load(Ordering::Acquire);
        (attempted as f32 / total as f32).min(1.0)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded_count.load(Ordering::Acquire)
    }

    pub fn attempted_frames(&self) -> usize {
        self.attempted_frames.load(Ordering::Acquire)
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames.load(Ordering::Acquire)
    }

    pub fn header(&self) -> Option<SimulationHeader> {
        *self.header.read()
    }

    pub fn task_id(&self) -> Option<String> {
        self.task_id.read().clone()
    }

    /// 可播放的帧数，加载期间为 0
    pub fn frame_count(&self) -> usize {
        if self.is_loading() {
            return 0;
        }
        self.frames.read().len()
    }

    pub fn frame(&self, index: usize) -> Option<Arc<VoxelGrid<f32>>> {
        if self.is_loading() {
            return None;
        }
        self.frames.read().get(index).cloned()
    }

    /// 当前播放帧的索引与数据
    pub fn current_frame_grid(&self) -> Option<(usize, Arc<VoxelGrid<f32>>)> {
        let index = self.playback.lock().current_frame;
        self.frame(index).map(|grid| (index, grid))
    }

    pub fn playback(&self) -> Playback {
        *self.playback.lock()
    }

    /// 先持有播放锁再读取加载标志，begin_load 的 reset 不会被并发的 play 覆盖
    pub fn play(&self) -> Result<(), PlaybackError> {
        let mut playback = self.playback.lock();
        let loading = self.is_loading();
        let count = if loading { 0 } else { self.frames.read().len() };
        playback.play(count, loading)
    }

    pub fn stop(&self) {
        self.playback.lock().stop();
    }

    pub fn reset(&self) {
        self.playback.lock().reset();
    }

    /// 推进播放，以实际加载的帧数作为回绕边界
    pub fn tick(&self) -> bool {
        let count = self.frame_count();
        self.playback.lock().tick(count)
    }

    pub fn status(&self) -> SimulationStatus {
        let is_loading = self.is_loading();
        // 与 is_loading 取自同一次读取，快照内部保持一致
        let frame_count = if is_loading { 0 } else { self.frames.read().len() };
        let playback = self.playback();
        SimulationStatus {
            path: self
                .path
                .read()
                .as_ref()
                .map(|p| p.display().to_string()),
            task_id: self.task_id(),
            is_loading,
            load_progress: self.load_progress(),
            loaded_count: self.loaded_count(),
            attempted_frames: self.attempted_frames(),
            total_frames: self.total_frames(),
            shape: self.header().map(|h| h.shape()),
            frame_count,
            is_valid: !is_loading && frame_count > 0,
            current_frame: playback.current_frame,
            is_playing: playback.is_playing,
            last_error: self.last_error.read().clone(),
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new()
    }
}
