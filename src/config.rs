//! 运行配置
//! 全部来自环境变量，缺省或无法解析时使用默认值

use crate::favorites::DEFAULT_FAV_LIST_API;
use crate::resolver::DEFAULT_PARSE_API;
use std::time::Duration;
use tracing::warn;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub fav_list_api: String,
    pub parse_api: String,
    pub upstream_timeout: Duration,
    /// 单页并发解析上限，`None` 为不限制
    pub resolve_concurrency: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            fav_list_api: DEFAULT_FAV_LIST_API.to_string(),
            parse_api: DEFAULT_PARSE_API.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            resolve_concurrency: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            port: parse_or("PORT", get("PORT"), defaults.port),
            fav_list_api: get("FAV_LIST_API_URL").unwrap_or(defaults.fav_list_api),
            parse_api: get("PARSE_API_URL").unwrap_or(defaults.parse_api),
            upstream_timeout: Duration::from_secs(parse_or(
                "UPSTREAM_TIMEOUT_SECS",
                get("UPSTREAM_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECONDS,
            )),
            resolve_concurrency: get("RESOLVE_CONCURRENCY").and_then(|raw| match raw.parse::<usize>() {
                Ok(0) => None,
                Ok(n) => Some(n),
                Err(_) => {
                    warn!("⚠️ 环境变量 RESOLVE_CONCURRENCY={} 无效, 不限制并发", raw);
                    None
                }
            }),
        }
    }
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("⚠️ 环境变量 {}={} 无效, 使用默认值", key, raw);
            default
        }),
    }
}
