//! 单视频解析
//! 通过第三方解析接口把 BV 号换成标题与直链

use crate::http_client::{get_json, HttpClientError};
use crate::types::ResolvedVideo;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// 默认解析接口
pub const DEFAULT_PARSE_API: &str = "https://api.mir6.com/api/bzjiexi";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("解析接口请求失败: {0}")]
    Transport(#[from] HttpClientError),
    #[error("无效的解析接口地址: {0}")]
    InvalidUrl(String),
}

/// 视频解析器
///
/// `Ok(None)` 表示该视频解析失败 (可恢复、只影响单条)，
/// `Err` 表示解析接口本身不可用。
#[async_trait]
pub trait VideoResolver: Send + Sync {
    async fn resolve(&self, bvid: &str) -> Result<Option<ResolvedVideo>, ResolveError>;
}

/// BV 号对应的视频页地址
pub fn canonical_video_url(bvid: &str) -> String {
    format!("https://www.bilibili.com/video/{}", bvid)
}

pub struct ParseApiResolver {
    client: Client,
    api_url: String,
}

impl ParseApiResolver {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// 接口地址自带的查询参数会保留
    fn request_url(&self, bvid: &str) -> Result<url::Url, ResolveError> {
        url::Url::parse_with_params(&self.api_url, &[("url", canonical_video_url(bvid))])
            .map_err(|e| ResolveError::InvalidUrl(format!("{}: {}", self.api_url, e)))
    }
}

#[async_trait]
impl VideoResolver for ParseApiResolver {
    async fn resolve(&self, bvid: &str) -> Result<Option<ResolvedVideo>, ResolveError> {
        let url = self.request_url(bvid)?;
        let response: ParseResponse = get_json(&self.client, url.as_str(), None).await?;
        Ok(response.into_video(bvid))
    }
}

/// 解析接口响应
///
/// 失败时 `data` 可能是空字符串或 null，先按任意 JSON 接收
#[derive(Debug, Deserialize)]
pub struct ParseResponse {
    pub code: i64,
    #[serde(default)]
    pub data: Value,
}

impl ParseResponse {
    pub fn into_video(self, bvid: &str) -> Option<ResolvedVideo> {
        if self.code != 0 {
            return None;
        }
        let field = |name: &str| {
            self.data
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Some(ResolvedVideo {
            bvid: bvid.to_string(),
            title: field("title")?,
            url: field("video")?,
        })
    }
}
