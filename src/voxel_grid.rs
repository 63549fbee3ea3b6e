use glam::Vec3;
use thiserror::Error;

/// 体素网格访问错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// 维度为 0 或元素总数溢出
    #[error("无效的网格维度: {width}x{height}x{depth}")]
    InvalidDimension {
        width: usize,
        height: usize,
        depth: usize,
    },
    /// 无法为网格分配内存
    #[error("无法为 {width}x{height}x{depth} 网格分配内存")]
    AllocationFailed {
        width: usize,
        height: usize,
        depth: usize,
    },
    /// 坐标超出 [0, dim) 范围
    #[error("坐标越界: ({x}, {y}, {z})，网格维度 {shape:?}")]
    OutOfRange {
        x: i64,
        y: i64,
        z: i64,
        shape: [usize; 3],
    },
}

/// 体素网格数据结构
/// 表示三维规则网格上的标量场数据，维度在构造后固定
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid<T> {
    width: usize,
    height: usize,
    depth: usize,
    /// 数据数组，x 变化最快，y 其次，z 最慢
    /// 索引计算: index = x + width * (y + height * z)
    data: Vec<T>,
}

impl<T: Default + Clone> VoxelGrid<T> {
    /// 创建新的体素网格，所有元素为 T 的默认值
    pub fn new(width: usize, height: usize, depth: usize) -> Result<Self, GridError> {
        let invalid = GridError::InvalidDimension {
            width,
            height,
            depth,
        };
        if width == 0 || height == 0 || depth == 0 {
            return Err(invalid);
        }
        let total_elements = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(depth))
            .ok_or(invalid)?;

        // 分配失败时返回错误，而不是中止进程
        let mut data = Vec::new();
        data.try_reserve_exact(total_elements)
            .map_err(|_| GridError::AllocationFailed {
                width,
                height,
                depth,
            })?;
        data.resize(total_elements, T::default());

        Ok(VoxelGrid {
            width,
            height,
            depth,
            data,
        })
    }
}

impl<T> VoxelGrid<T> {
    /// 获取 shape [width, height, depth]
    pub fn shape(&self) -> [usize; 3] {
        [self.width, self.height, self.depth]
    }

    /// 元素总数 (width * height * depth)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 单个深度切片的元素数量 (width * height)
    pub fn slice_len(&self) -> usize {
        self.width * self.height
    }

    /// 计算一维索引，越界时返回 OutOfRange
    pub fn index(&self, x: usize, y: usize, z: usize) -> Result<usize, GridError> {
        if x >= self.width || y >= self.height || z >= self.depth {
            return Err(self.out_of_range(x as i64, y as i64, z as i64));
        }
        Ok(x + self.width * (y + self.height * z))
    }

    pub fn at(&self, x: usize, y: usize, z: usize) -> Result<&T, GridError> {
        let index = self.index(x, y, z)?;
        Ok(&self.data[index])
    }

    #[allow(dead_code)]
    pub fn at_mut(&mut self, x: usize, y: usize, z: usize) -> Result<&mut T, GridError> {
        let index = self.index(x, y, z)?;
        Ok(&mut self.data[index])
    }

    /// 以向量坐标访问，各分量向零截断（不是四舍五入）
    pub fn at_vec(&self, pos: Vec3) -> Result<&T, GridError> {
        let [x, y, z] = self.truncate(pos)?;
        self.at(x, y, z)
    }

    #[allow(dead_code)]
    pub fn at_vec_mut(&mut self, pos: Vec3) -> Result<&mut T, GridError> {
        let [x, y, z] = self.truncate(pos)?;
        self.at_mut(x, y, z)
    }

    /// 获取整个数据数组，用于批量拷贝
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// 获取第 z 层深度切片: 偏移 z * width * height，长度 width * height
    pub fn slice(&self, z: usize) -> Result<&[T], GridError> {
        if z >= self.depth {
            return Err(self.out_of_range(0, 0, z as i64));
        }
        let start = z * self.slice_len();
        Ok(&self.data[start..start + self.slice_len()])
    }

    fn truncate(&self, pos: Vec3) -> Result<[usize; 3], GridError> {
        if !pos.is_finite() {
            return Err(self.out_of_range(i64::MIN, i64::MIN, i64::MIN));
        }
        // `as` 对浮点数向零截断
        let (x, y, z) = (pos.x as i64, pos.y as i64, pos.z as i64);
        if x < 0 || y < 0 || z < 0 {
            return Err(self.out_of_range(x, y, z));
        }
        Ok([x as usize, y as usize, z as usize])
    }

    fn out_of_range(&self, x: i64, y: i64, z: i64) -> GridError {
        GridError::OutOfRange {
            x,
            y,
            z,
            shape: self.shape(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_zero_filled() {
        let grid = VoxelGrid::<f32>::new(3, 4, 5).unwrap();
        assert_eq!(grid.len(), 60);
        assert_eq!(grid.data().len(), 60);
        assert!(grid.data().iter().all(|&v| v == 0.0));

        let ints = VoxelGrid::<i32>::new(2, 2, 2).unwrap();
        assert!(ints.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            VoxelGrid::<f32>::new(0, 4, 4),
            Err(GridError::InvalidDimension {
                width: 0,
                height: 4,
                depth: 4
            })
        );
        assert!(VoxelGrid::<f32>::new(4, 0, 4).is_err());
        assert!(VoxelGrid::<f32>::new(4, 4, 0).is_err());
        assert!(VoxelGrid::<u8>::new(usize::MAX, 2, 2).is_err());
    }

    #[test]
    fn unallocatable_grid_is_an_error() {
        assert_eq!(
            VoxelGrid::<f32>::new(100_000, 100_000, 100_000),
            Err(GridError::AllocationFailed {
                width: 100_000,
                height: 100_000,
                depth: 100_000
            })
        );
    }

    #[test]
    fn index_covers_buffer_exactly_once() {
        let grid = VoxelGrid::<u8>::new(3, 4, 5).unwrap();
        let mut seen = vec![false; grid.len()];
        for z in 0..5 {
            for y in 0..4 {
                for x in 0..3 {
                    let i = grid.index(x, y, z).unwrap();
                    assert!(!seen[i], "index {i} visited twice");
                    seen[i] = true;
                }
            }
        }
        assert!(seen.iter().all(|&v| v));
    }

    #[test]
    fn layout_is_x_fastest() {
        let mut grid = VoxelGrid::<f32>::new(2, 3, 4).unwrap();
        *grid.at_mut(1, 0, 0).unwrap() = 1.0;
        *grid.at_mut(0, 1, 0).unwrap() = 2.0;
        *grid.at_mut(0, 0, 1).unwrap() = 3.0;
        assert_eq!(grid.data()[1], 1.0);
        assert_eq!(grid.data()[2], 2.0);
        assert_eq!(grid.data()[6], 3.0);
        assert_eq!(grid.slice(1).unwrap()[0], 3.0);
        assert_eq!(grid.slice(1).unwrap().len(), 6);
    }

    #[test]
    fn out_of_range_is_reported() {
        let grid = VoxelGrid::<f32>::new(2, 2, 2).unwrap();
        assert!(matches!(
            grid.at(2, 0, 0),
            Err(GridError::OutOfRange { x: 2, .. })
        ));
        assert!(grid.at(0, 2, 0).is_err());
        assert!(grid.at(0, 0, 2).is_err());
        assert!(grid.slice(2).is_err());
    }

    #[test]
    fn vector_access_truncates() {
        let mut grid = VoxelGrid::<f32>::new(3, 3, 3).unwrap();
        *grid.at_mut(1, 0, 0).unwrap() = 7.0;
        *grid.at_mut(2, 1, 2).unwrap() = 9.0;

        assert_eq!(*grid.at_vec(Vec3::new(1.9, 0.0, 0.0)).unwrap(), 7.0);
        assert_eq!(*grid.at_vec(Vec3::new(1.0, 0.0, 0.0)).unwrap(), 7.0);
        assert_eq!(*grid.at_vec(Vec3::new(2.5, 1.99, 2.01)).unwrap(), 9.0);
        // -0.5 向零截断为 0
        assert_eq!(*grid.at_vec(Vec3::new(-0.5, 0.0, 0.0)).unwrap(), 0.0);

        *grid.at_vec_mut(Vec3::new(0.2, 0.7, 0.9)).unwrap() = 4.0;
        assert_eq!(*grid.at(0, 0, 0).unwrap(), 4.0);
    }

    #[test]
    fn vector_access_rejects_negative_and_non_finite() {
        let grid = VoxelGrid::<f32>::new(2, 2, 2).unwrap();
        assert!(grid.at_vec(Vec3::new(-1.5, 0.0, 0.0)).is_err());
        assert!(grid.at_vec(Vec3::new(f32::NAN, 0.0, 0.0)).is_err());
        assert!(grid.at_vec(Vec3::new(3.0, 0.0, 0.0)).is_err());
    }
}
