//! 收藏夹列表获取
//! 调用 B站收藏夹接口，提取当前页的 BV 号与分页信息

use crate::http_client::{get_json, HttpClientError, BILIBILI_REFERER};
use crate::types::{ListingPage, PageRequest};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::debug;

/// B站收藏夹内容列表接口
pub const DEFAULT_FAV_LIST_API: &str = "https://api.bilibili.com/x/v3/fav/resource/list";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("收藏夹请求失败: {0}")]
    Http(#[from] HttpClientError),
    #[error("收藏夹接口返回错误 ({code}): {message}")]
    Api { code: i64, message: String },
    #[error("无效的收藏夹接口地址: {0}")]
    InvalidUrl(String),
}

/// 收藏夹数据源
#[async_trait]
pub trait FavoritesSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ListingPage, ListingError>;
}

/// 直连 B站接口的数据源
pub struct BiliFavorites {
    client: Client,
    api_url: String,
}

impl BiliFavorites {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    fn page_url(&self, request: &PageRequest) -> Result<url::Url, ListingError> {
        let page = request.page.to_string();
        let page_size = request.page_size.to_string();
        url::Url::parse_with_params(
            &self.api_url,
            &[
                ("media_id", request.media_id.as_str()),
                ("pn", page.as_str()),
                ("ps", page_size.as_str()),
                ("platform", "web"),
            ],
        )
        .map_err(|e| ListingError::InvalidUrl(format!("{}: {}", self.api_url, e)))
    }
}

#[async_trait]
impl FavoritesSource for BiliFavorites {
    async fn fetch_page(&self, request: &PageRequest) -> Result<ListingPage, ListingError> {
        let url = self.page_url(request)?;
        debug!("收藏夹 URL: {}", url);

        let response: FavListResponse =
            get_json(&self.client, url.as_str(), Some(BILIBILI_REFERER)).await?;
        let listing = response.into_listing()?;

        debug!(
            "收藏夹 {} 第 {} 页: {} 个视频, 共 {} 个",
            request.media_id,
            request.page,
            listing.bvids.len(),
            listing.total_items
        );
        Ok(listing)
    }
}

/// 收藏夹接口响应
#[derive(Debug, Deserialize)]
pub struct FavListResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<FavListData>,
}

#[derive(Debug, Deserialize)]
pub struct FavListData {
    #[serde(default)]
    pub info: Option<FavInfo>,
    #[serde(default)]
    pub medias: Option<Vec<FavMedia>>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct FavInfo {
    #[serde(default)]
    pub media_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct FavMedia {
    #[serde(default)]
    pub bvid: Option<String>,
    #[serde(default)]
    pub bv_id: Option<String>,
}

impl FavMedia {
    fn identifier(self) -> Option<String> {
        self.bvid
            .or(self.bv_id)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }
}

impl FavListResponse {
    /// 校验状态码并提取 BV 号列表 (保持接口返回顺序)
    pub fn into_listing(self) -> Result<ListingPage, ListingError> {
        if self.code != 0 {
            let message = if self.message.is_empty() {
                "Unknown error".to_string()
            } else {
                self.message
            };
            return Err(ListingError::Api {
                code: self.code,
                message,
            });
        }

        let Some(data) = self.data else {
            return Ok(ListingPage::default());
        };

        let bvids = data
            .medias
            .unwrap_or_default()
            .into_iter()
            .filter_map(FavMedia::identifier)
            .collect();

        Ok(ListingPage {
            bvids,
            has_more: data.has_more,
            total_items: data.info.map(|i| i.media_count).unwrap_or(0),
        })
    }
}

/// has_more 可能是 bool 也可能是 0/1
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<ListingPage, ListingError> {
        serde_json::from_str::<FavListResponse>(json)
            .unwrap()
            .into_listing()
    }

    #[test]
    fn test_listing_keeps_order_and_skips_missing_bvid() {
        let listing = parse(
            r#"{
                "code": 0,
                "message": "0",
                "data": {
                    "info": {"id": 1, "media_count": 45},
                    "medias": [
                        {"id": 1, "bvid": "BV1", "bv_id": "BV1", "title": "A"},
                        {"id": 2, "title": "已失效视频"},
                        {"id": 3, "bvid": "BV3"},
                        {"id": 4, "bv_id": "BV4"}
                    ],
                    "has_more": true
                }
            }"#,
        )
        .unwrap();

        assert_eq!(listing.bvids, vec!["BV1", "BV3", "BV4"]);
        assert!(listing.has_more);
        assert_eq!(listing.total_items, 45);
    }

    #[test]
    fn test_listing_integer_has_more_and_null_medias() {
        let listing = parse(
            r#"{"code": 0, "data": {"info": {"media_count": 3}, "medias": null, "has_more": 0}}"#,
        )
        .unwrap();
        assert!(listing.bvids.is_empty());
        assert!(!listing.has_more);
        assert_eq!(listing.total_items, 3);

        let listing = parse(r#"{"code": 0, "data": {"medias": [], "has_more": 1}}"#).unwrap();
        assert!(listing.has_more);
        assert_eq!(listing.total_items, 0);
    }

    #[test]
    fn test_listing_nonzero_code_is_error() {
        let err = parse(r#"{"code": -403, "message": "访问权限不足", "data": null}"#).unwrap_err();
        match err {
            ListingError::Api { code, message } => {
                assert_eq!(code, -403);
                assert_eq!(message, "访问权限不足");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_page_url_params() {
        let source = BiliFavorites::new(Client::new(), DEFAULT_FAV_LIST_API);
        let request = PageRequest::new("123456", 2, 10).unwrap();
        let url = source.page_url(&request).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("media_id".to_string(), "123456".to_string()),
                ("pn".to_string(), "2".to_string()),
                ("ps".to_string(), "10".to_string()),
                ("platform".to_string(), "web".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_url_invalid_base() {
        let source = BiliFavorites::new(Client::new(), "not a url");
        let request = PageRequest::new("1", 1, 1).unwrap();
        assert!(matches!(source.page_url(&request), Err(ListingError::InvalidUrl(_))));
    }

    /// 本地收藏夹服务：缺少浏览器 UA / Referer 时返回 -412
    async fn favorites_server() -> String {
        use axum::{extract::Query, http::{header, HeaderMap, StatusCode}, routing, Json, Router};
        use serde_json::json;
        use std::collections::HashMap;

        let list = |Query(q): Query<HashMap<String, String>>, headers: HeaderMap| async move {
            let ua = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok()).unwrap_or_default();
            let referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok()).unwrap_or_default();
            if !ua.starts_with("Mozilla/5.0") || referer != BILIBILI_REFERER {
                return Json(json!({"code": -412, "message": "请求被拦截", "data": null}));
            }
            let pn = q.get("pn").cloned().unwrap_or_default();
            Json(json!({
                "code": 0,
                "message": "0",
                "data": {
                    "info": {"media_count": 45},
                    "medias": [{"bvid": format!("BV{}a", pn)}, {"bvid": format!("BV{}b", pn)}],
                    "has_more": q.get("ps").map(|ps| ps == "2").unwrap_or(false)
                }
            }))
        };

        let app = Router::new()
            .route("/list", routing::get(list))
            .route("/down", routing::get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/html", routing::get(|| async { "<html>502 Bad Gateway</html>" }));
        crate::http_client::testing::serve(app).await
    }

    fn favorites(base: &str, path: &str) -> BiliFavorites {
        let client = crate::http_client::build_client(std::time::Duration::from_secs(5)).unwrap();
        BiliFavorites::new(client, format!("{}{}", base, path))
    }

    #[tokio::test]
    async fn test_fetch_page_over_http() {
        let base = favorites_server().await;
        let request = PageRequest::new("123", 3, 2).unwrap();

        let listing = favorites(&base, "/list").fetch_page(&request).await.unwrap();
        assert_eq!(listing.bvids, vec!["BV3a", "BV3b"]);
        assert!(listing.has_more);
        assert_eq!(listing.total_items, 45);
    }

    #[tokio::test]
    async fn test_fetch_page_transport_errors() {
        let base = favorites_server().await;
        let request = PageRequest::new("123", 1, 20).unwrap();

        let err = favorites(&base, "/down").fetch_page(&request).await.unwrap_err();
        assert!(matches!(err, ListingError::Http(HttpClientError::BadStatus(500))));

        let err = favorites(&base, "/html").fetch_page(&request).await.unwrap_err();
        assert!(matches!(err, ListingError::Http(HttpClientError::Decode(_))));
    }
}
