use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("没有已加载的模拟")]
    NotLoaded,
    #[error("模拟仍在加载中")]
    Loading,
}

/// 播放状态机
/// Stopped: is_playing = false，current_frame 可以非零
/// Playing: is_playing = true，每次 tick 前进一帧
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Playback {
    pub current_frame: usize,
    pub is_playing: bool,
}

impl Playback {
    /// 开始播放，仅当已有帧且不在加载中时有效
    pub fn play(&mut self, frame_count: usize, loading: bool) -> Result<(), PlaybackError> {
        if loading {
            return Err(PlaybackError::Loading);
        }
        if frame_count == 0 {
            return Err(PlaybackError::NotLoaded);
        }
        self.is_playing = true;
        Ok(())
    }

    /// 暂停，当前帧不变
    pub fn stop(&mut self) {
        self.is_playing = false;
    }

    pub fn reset(&mut self) {
        self.is_playing = false;
        self.current_frame = 0;
    }

    /// 每帧更新，frame_count 为实际加载的帧数
    /// 播放到末尾时停止并回到第 0 帧（不循环）
    /// 返回当前帧是否发生变化
    pub fn tick(&mut self, frame_count: usize) -> bool {
        if !self.is_playing {
            return false;
        }
        self.current_frame += 1;
        if self.current_frame >= frame_count {
            self.is_playing = false;
            self.current_frame = 0;
        }
        true
    }
}
