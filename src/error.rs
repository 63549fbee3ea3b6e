use std::path::PathBuf;

use thiserror::Error;

use crate::voxel_grid::GridError;

/// 模拟加载过程中的错误
/// 这些错误在加载任务内部处理，只通过 SimulationStatus 暴露给调用方
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("无法打开描述文件 {path}: {source}")]
    DescriptorUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("描述文件为空或无效 {path}: {reason}")]
    EmptyOrInvalidDescriptor { path: PathBuf, reason: String },

    #[error("无法打开第 {index} 帧文件 {path}: {source}")]
    FrameUnreadable {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("第 {index} 帧文件格式错误 {path}: {reason}")]
    FrameMalformed {
        index: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("网格创建失败: {0}")]
    Grid(#[from] GridError),

    #[error("已有模拟正在加载")]
    AlreadyLoading,

    #[error("加载已取消")]
    Cancelled,

    #[error("加载任务异常退出: {0}")]
    TaskFailed(String),
}

impl LoadError {
    /// 单帧错误（可按策略跳过），描述文件错误则终止整个加载
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            LoadError::FrameUnreadable { .. } | LoadError::FrameMalformed { .. }
        )
    }
}

/// 配置解析错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("环境变量 {key} 的值无效: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
