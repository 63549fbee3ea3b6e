use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// 性能数据记录（每帧读取一条）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// 开始时间 (Unix 时间戳，毫秒)
    pub start_time: u64,
    /// 结束时间 (Unix 时间戳，毫秒)
    pub end_time: u64,
    /// 行组，例如 "load"
    pub channel_group: String,
    /// 行号，例如 "frame_3"
    pub channel_index: String,
    /// 附加信息
    pub msg: String,
}

/// 性能数据存储
/// 按加载任务 ID 存储性能记录，超过 TTL 的任务会被定期清理
pub struct PerformanceStore {
    records: RwLock<HashMap<String, Vec<PerformanceRecord>>>,
    /// task_id -> 创建时间
    session_times: RwLock<HashMap<String, SystemTime>>,
    default_ttl: Duration,
}

impl PerformanceStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(30 * 60))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            session_times: RwLock::new(HashMap::new()),
            default_ttl: ttl,
        }
    }

    pub fn add_record(&self, task_id: &str, record: PerformanceRecord) {
        self.records
            .write()
            .entry(task_id.to_string())
            .or_default()
            .push(record);

        self.session_times
            .write()
            .entry(task_id.to_string())
            .or_insert_with(SystemTime::now);
    }

    pub fn get_records(&self, task_id: &str) -> Option<Vec<PerformanceRecord>> {
        self.records.read().get(task_id).cloned()
    }

    /// 清理过期的任务记录，返回清理数量
    pub fn cleanup_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut records = self.records.write();
        let mut session_times = self.session_times.write();
        let before_count = records.len();

        session_times.retain(|task_id, created_at| {
            let alive = now.duration_since(*created_at).unwrap_or(Duration::ZERO) <= self.default_ttl;
            if !alive {
                records.remove(task_id);
            }
            alive
        });

        before_count - records.len()
    }

    pub fn session_count(&self) -> usize {
        self.records.read().len()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl Default for PerformanceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 获取 Unix 时间戳（毫秒）
pub fn get_unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
