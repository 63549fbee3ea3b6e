use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;
use crate::simulation::MissingFramePolicy;

/// 服务配置，默认值可通过 SIMVIEW_* 环境变量覆盖
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// 相对路径的描述文件在该目录下查找
    pub resource_dir: PathBuf,
    /// 播放 tick 频率
    pub tick_hz: f32,
    pub missing_frames: MissingFramePolicy,
    /// 性能记录保留时间
    pub task_ttl: Duration,
    /// 启动时自动加载的描述文件
    pub autoload: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            resource_dir: PathBuf::from("Simulations"),
            tick_hz: 60.0,
            missing_frames: MissingFramePolicy::Skip,
            task_ttl: Duration::from_secs(30 * 60),
            autoload: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置，未设置的键使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(value) = lookup("SIMVIEW_BIND") {
            config.bind_addr = value;
        }
        if let Some(value) = lookup("SIMVIEW_PORT") {
            config.port = parse_value("SIMVIEW_PORT", &value)?;
        }
        if let Some(value) = lookup("SIMVIEW_RESOURCE_DIR") {
            config.resource_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("SIMVIEW_TICK_HZ") {
            let tick_hz: f32 = parse_value("SIMVIEW_TICK_HZ", &value)?;
            if !(tick_hz.is_finite() && tick_hz > 0.0) {
                return Err(ConfigError::InvalidValue {
                    key: "SIMVIEW_TICK_HZ",
                    value,
                    reason: "必须为正数".to_string(),
                });
            }
            config.tick_hz = tick_hz;
        }
        if let Some(value) = lookup("SIMVIEW_MISSING_FRAMES") {
            config.missing_frames = parse_value("SIMVIEW_MISSING_FRAMES", &value)?;
        }
        if let Some(value) = lookup("SIMVIEW_TASK_TTL_SECS") {
            config.task_ttl = Duration::from_secs(parse_value("SIMVIEW_TASK_TTL_SECS", &value)?);
        }
        if let Some(value) = lookup("SIMVIEW_AUTOLOAD") {
            config.autoload = Some(value).filter(|v| !v.trim().is_empty());
        }

        Ok(config)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.tick_hz)
    }

    /// 相对路径拼接到资源目录下，绝对路径原样返回
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            path
        } else {
            self.resource_dir.join(path)
        }
    }
}

fn parse_value<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.missing_frames, MissingFramePolicy::Skip);
        assert_eq!(config.tick_hz, 60.0);
        assert!(config.autoload.is_none());
    }

    #[test]
    fn overrides_from_lookup() {
        let config = Config::from_lookup(lookup(&[
            ("SIMVIEW_PORT", "9000"),
            ("SIMVIEW_RESOURCE_DIR", "/data/sims"),
            ("SIMVIEW_TICK_HZ", "30"),
            ("SIMVIEW_MISSING_FRAMES", "zero_fill"),
            ("SIMVIEW_TASK_TTL_SECS", "60"),
            ("SIMVIEW_AUTOLOAD", "staticframe/info.sim"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.missing_frames, MissingFramePolicy::ZeroFill);
        assert_eq!(config.task_ttl, Duration::from_secs(60));
        assert_eq!(config.autoload.as_deref(), Some("staticframe/info.sim"));
        assert_eq!(
            config.resolve("staticframe/info.sim"),
            PathBuf::from("/data/sims/staticframe/info.sim")
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (key, value) in [
            ("SIMVIEW_PORT", "eighty"),
            ("SIMVIEW_TICK_HZ", "0"),
            ("SIMVIEW_TICK_HZ", "-5"),
            ("SIMVIEW_MISSING_FRAMES", "retry"),
        ] {
            let result = Config::from_lookup(lookup(&[(key, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { key: k, .. }) if k == key),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }
}
