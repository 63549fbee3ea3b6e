use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::LoadError;
use crate::parsers::SimulationHeader;
use crate::voxel_grid::VoxelGrid;

/// 解析单帧密度数据文件
/// 读取 width*height*depth 个浮点数，z 最外层，然后 y，x 变化最快（与网格内存布局一致）
/// 小于等于 0 的密度（以及 NaN）存为 0，其余原样保存；多余的数据被忽略
pub fn parse_frame(
    path: &Path,
    index: usize,
    header: &SimulationHeader,
) -> Result<VoxelGrid<f32>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::FrameUnreadable {
        index,
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let malformed = |reason: String| LoadError::FrameMalformed {
        index,
        path: path.to_path_buf(),
        reason,
    };

    let mut grid = VoxelGrid::<f32>::new(header.width, header.height, header.depth)?;
    let expected = grid.len();
    let data = grid.data_mut();
    let mut filled = 0usize;

    'lines: for line in reader.lines() {
        let line = line.map_err(|e| malformed(format!("读取失败: {}", e)))?;
        for token in line.split_whitespace() {
            let density = token
                .parse::<f32>()
                .map_err(|e| malformed(format!("无法解析值 {:?}: {}", token, e)))?;
            data[filled] = if density > 0.0 { density } else { 0.0 };
            filled += 1;
            if filled == expected {
                break 'lines;
            }
        }
    }

    if filled < expected {
        return Err(malformed(format!(
            "数据量不匹配: 需要 {} 个值，但只有 {} 个",
            expected, filled
        )));
    }

    Ok(grid)
}
