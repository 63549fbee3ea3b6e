//! 测试用的临时目录与模拟数据生成

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// 位于系统临时目录下的唯一目录，drop 时删除
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("volume-sim-{}", Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// 写入描述文件与 frame0..frameN，`frames` 中为 None 的帧不生成文件
    /// 返回描述文件路径
    pub fn write_simulation(
        &self,
        total_frames: i64,
        shape: [usize; 3],
        frames: &[Option<Vec<f32>>],
    ) -> PathBuf {
        let descriptor = self.write(
            "info.sim",
            &format!("{} {} {} {}\n", total_frames, shape[0], shape[1], shape[2]),
        );
        for (index, frame) in frames.iter().enumerate() {
            if let Some(values) = frame {
                let text = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.write(&format!("frame{}", index), &text);
            }
        }
        descriptor
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// 每个体素值都等于帧号 + 1 的帧数据
pub fn constant_frame(index: usize, voxels: usize) -> Option<Vec<f32>> {
    Some(vec![(index + 1) as f32; voxels])
}
