mod descriptor;
mod frame;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use descriptor::parse_descriptor;
pub use frame::parse_frame;

/// 单帧体素数量上限 (2^30 个 f32，约 4 GiB)
pub const MAX_VOXELS_PER_FRAME: usize = 1 << 30;

/// 描述文件解析结果: 总帧数与网格维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationHeader {
    pub total_frames: usize,
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl SimulationHeader {
    pub fn shape(&self) -> [usize; 3] {
        [self.width, self.height, self.depth]
    }

    /// 每帧的体素数量，乘积溢出时返回 None
    pub fn voxel_count(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(self.depth))
    }
}

/// 第 index 帧的文件路径: 描述文件所在目录 / "frame{index}"
pub fn frame_path(descriptor_path: &Path, index: usize) -> PathBuf {
    let dir = descriptor_path.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("frame{}", index))
}
