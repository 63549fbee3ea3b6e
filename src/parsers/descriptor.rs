use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::parsers::{MAX_VOXELS_PER_FRAME, SimulationHeader};

/// 解析模拟描述文件
/// 格式: 四个空白分隔的整数 "totalFrames gridWidth gridHeight gridDepth"
pub fn parse_descriptor(path: &Path) -> Result<SimulationHeader, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::DescriptorUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let invalid = |reason: String| LoadError::EmptyOrInvalidDescriptor {
        path: path.to_path_buf(),
        reason,
    };

    let mut values = [0i64; 4];
    let mut tokens = content.split_whitespace();
    for (slot, name) in values
        .iter_mut()
        .zip(["totalFrames", "gridWidth", "gridHeight", "gridDepth"])
    {
        let token = tokens
            .next()
            .ok_or_else(|| invalid(format!("缺少字段 {}", name)))?;
        *slot = token
            .parse::<i64>()
            .map_err(|e| invalid(format!("无法解析 {} ({:?}): {}", name, token, e)))?;
    }

    let [total_frames, width, height, depth] = values;
    if total_frames <= 0 {
        return Err(invalid(format!("没有可加载的帧 (totalFrames = {})", total_frames)));
    }
    if width <= 0 || height <= 0 || depth <= 0 {
        return Err(invalid(format!(
            "网格维度必须为正数: {}x{}x{}",
            width, height, depth
        )));
    }

    let to_usize = |name: &str, value: i64| {
        usize::try_from(value).map_err(|_| invalid(format!("{} 超出范围: {}", name, value)))
    };
    let header = SimulationHeader {
        total_frames: to_usize("totalFrames", total_frames)?,
        width: to_usize("gridWidth", width)?,
        height: to_usize("gridHeight", height)?,
        depth: to_usize("gridDepth", depth)?,
    };

    match header.voxel_count() {
        Some(count) if count <= MAX_VOXELS_PER_FRAME => Ok(header),
        _ => Err(invalid(format!(
            "网格过大: {}x{}x{} (每帧上限 {} 个体素)",
            width, height, depth, MAX_VOXELS_PER_FRAME
        ))),
    }
}
