use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use crate::voxel_grid::VoxelGrid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("帧维度 {frame:?} 与目标体积维度 {target:?} 不一致")]
    ShapeMismatch { frame: [usize; 3], target: [usize; 3] },
    #[error("切片 {z} 超出深度 {depth}")]
    SliceOutOfRange { z: usize, depth: usize },
    #[error("目标层间距 {depth_pitch} 小于切片长度 {slice_len}")]
    PitchTooSmall { depth_pitch: usize, slice_len: usize },
}

/// 接收帧数据的三维标量体积（对应映射后的 3D 纹理）
/// 目标中第 z 层从 z * depth_pitch 开始，depth_pitch >= width * height
pub trait VolumeTarget {
    fn dimensions(&self) -> [usize; 3];

    fn depth_pitch(&self) -> usize;

    /// 写入第 z 层，`slice` 长度为 width * height，逐元素原样拷贝
    fn write_slice(&mut self, z: usize, slice: &[f32]) -> Result<(), UploadError>;
}

/// 按深度切片把一帧拷贝到目标体积
/// 源偏移 z * width * height，长度 width * height
pub fn upload_frame<V: VolumeTarget + ?Sized>(
    grid: &VoxelGrid<f32>,
    target: &mut V,
) -> Result<(), UploadError> {
    if grid.shape() != target.dimensions() {
        return Err(UploadError::ShapeMismatch {
            frame: grid.shape(),
            target: target.dimensions(),
        });
    }

    let slice_len = grid.slice_len();
    if target.depth_pitch() < slice_len {
        return Err(UploadError::PitchTooSmall {
            depth_pitch: target.depth_pitch(),
            slice_len,
        });
    }
    let depth = grid.shape()[2];
    for z in 0..depth {
        let slice = grid
            .slice(z)
            .map_err(|_| UploadError::SliceOutOfRange { z, depth })?;
        target.write_slice(z, slice)?;
    }
    Ok(())
}

/// CPU 端的暂存体积，布局与映射后的 3D 纹理一致（每层可带填充）
#[derive(Debug, Clone)]
pub struct StagingVolume {
    shape: [usize; 3],
    depth_pitch: usize,
    data: Vec<f32>,
    /// 最近一次上传的帧号
    frame_index: Option<usize>,
}

impl StagingVolume {
    /// 无填充的暂存体积
    pub fn new(shape: [usize; 3]) -> Self {
        Self::with_depth_pitch(shape, shape[0] * shape[1])
    }

    /// depth_pitch 小于 width * height 时按 width * height 处理
    pub fn with_depth_pitch(shape: [usize; 3], depth_pitch: usize) -> Self {
        let depth_pitch = depth_pitch.max(shape[0] * shape[1]);
        Self {
            shape,
            depth_pitch,
            data: vec![0.0; depth_pitch * shape[2]],
            frame_index: None,
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn frame_index(&self) -> Option<usize> {
        self.frame_index
    }

    /// 上传一帧并记录帧号
    pub fn upload(&mut self, index: usize, grid: &VoxelGrid<f32>) -> Result<(), UploadError> {
        upload_frame(grid, self)?;
        self.frame_index = Some(index);
        Ok(())
    }

    /// 第 z 层的有效数据（不含填充）
    pub fn slice(&self, z: usize) -> Result<&[f32], UploadError> {
        if z >= self.shape[2] {
            return Err(UploadError::SliceOutOfRange {
                z,
                depth: self.shape[2],
            });
        }
        let start = z * self.depth_pitch;
        Ok(&self.data[start..start + self.shape[0] * self.shape[1]])
    }

    /// 紧密排列的小端 f32 字节（去掉每层填充）
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let slice_len = self.shape[0] * self.shape[1];
        let mut bytes = Vec::with_capacity(slice_len * self.shape[2] * size_of::<f32>());
        for z in 0..self.shape[2] {
            let start = z * self.depth_pitch;
            write_le(&mut bytes, &self.data[start..start + slice_len]);
        }
        bytes
    }

    pub fn slice_le_bytes(&self, z: usize) -> Result<Vec<u8>, UploadError> {
        let slice = self.slice(z)?;
        let mut bytes = Vec::with_capacity(slice.len() * size_of::<f32>());
        write_le(&mut bytes, slice);
        Ok(bytes)
    }
}

impl VolumeTarget for StagingVolume {
    fn dimensions(&self) -> [usize; 3] {
        self.shape
    }

    fn depth_pitch(&self) -> usize {
        self.depth_pitch
    }

    fn write_slice(&mut self, z: usize, slice: &[f32]) -> Result<(), UploadError> {
        if z >= self.shape[2] {
            return Err(UploadError::SliceOutOfRange {
                z,
                depth: self.shape[2],
            });
        }
        let start = z * self.depth_pitch;
        self.data[start..start + slice.len()].copy_from_slice(slice);
        Ok(())
    }
}

fn write_le(bytes: &mut Vec<u8>, values: &[f32]) {
    let start = bytes.len();
    bytes.resize(start + values.len() * size_of::<f32>(), 0);
    LittleEndian::write_f32_into(values, &mut bytes[start..]);
}
