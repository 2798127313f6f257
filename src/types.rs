//! 数据模型
//! 收藏夹分页请求、解析结果与分页信息

use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// 收藏夹接口单页上限
pub const MAX_PAGE_SIZE: u32 = 20;

/// 未指定时的默认每页数量
pub const DEFAULT_PAGE_SIZE: u32 = MAX_PAGE_SIZE;

/// 解析成功的视频
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVideo {
    /// BV 号
    #[serde(rename = "bv")]
    pub bvid: String,
    pub title: String,
    /// 可直接播放的视频地址
    #[serde(rename = "video")]
    pub url: String,
}

/// 经过校验的分页请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub media_id: String,
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(media_id: impl Into<String>, page: u32, page_size: u32) -> Result<Self, AppError> {
        let media_id = media_id.into();
        let media_id = media_id.trim().to_string();

        if media_id.is_empty() {
            return Err(AppError::InvalidPageRequest("mediaId is required".to_string()));
        }
        if !media_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::InvalidPageRequest(format!(
                "mediaId must be numeric, got '{}'",
                media_id
            )));
        }
        if page < 1 {
            return Err(AppError::InvalidPageRequest("page must be >= 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::InvalidPageRequest(format!(
                "pageSize must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        Ok(Self {
            media_id,
            page,
            page_size,
        })
    }

    /// 从查询字符串参数构建 (page / pageSize 缺省时取默认值)
    pub fn from_query(
        media_id: Option<&str>,
        page: Option<&str>,
        page_size: Option<&str>,
    ) -> Result<Self, AppError> {
        let page = parse_number("page", page, 1)?;
        let page_size = parse_number("pageSize", page_size, DEFAULT_PAGE_SIZE)?;
        Self::new(media_id.unwrap_or_default(), page, page_size)
    }
}

fn parse_number(name: &str, raw: Option<&str>, default: u32) -> Result<u32, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<u32>().map_err(|_| {
            AppError::InvalidPageRequest(format!("{} must be a positive integer, got '{}'", name, value))
        }),
    }
}

/// 收藏夹单页列表 (上游原样信任 has_more 与总数)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub bvids: Vec<String>,
    pub has_more: bool,
    pub total_items: u64,
}

/// 分页信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub has_more: bool,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(request: &PageRequest, listing: &ListingPage) -> Self {
        Self {
            current_page: request.page,
            page_size: request.page_size,
            total_items: listing.total_items,
            has_more: listing.has_more,
            total_pages: total_pages(listing.total_items, request.page_size),
        }
    }
}

/// ceil(total_items / page_size)
pub fn total_pages(total_items: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(u64::from(page_size))
}

/// 一页组装结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub videos: Vec<ResolvedVideo>,
    pub pagination: Pagination,
}

impl PageResult {
    pub fn count(&self) -> usize {
        self.videos.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new("123", 1, 1).is_ok());
        assert!(PageRequest::new("123", 7, 20).is_ok());
        assert!(matches!(
            PageRequest::new("123", 0, 10),
            Err(AppError::InvalidPageRequest(_))
        ));
        assert!(matches!(
            PageRequest::new("123", 1, 0),
            Err(AppError::InvalidPageRequest(_))
        ));
        assert!(matches!(
            PageRequest::new("123", 1, 21),
            Err(AppError::InvalidPageRequest(_))
        ));
    }

    #[test]
    fn test_page_request_media_id() {
        assert!(PageRequest::new("", 1, 10).is_err());
        assert!(PageRequest::new("12a3", 1, 10).is_err());
        assert_eq!(PageRequest::new(" 42 ", 1, 10).unwrap().media_id, "42");
    }

    #[test]
    fn test_from_query_defaults_and_garbage() {
        let req = PageRequest::from_query(Some("99"), None, None).unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);

        assert!(PageRequest::from_query(Some("99"), Some("abc"), None).is_err());
        assert!(PageRequest::from_query(Some("99"), Some("-1"), None).is_err());
        assert!(PageRequest::from_query(None, Some("1"), Some("5")).is_err());
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(45, 20), 3);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 1), 1);
        assert_eq!(total_pages(45, 7), 7);
    }

    #[test]
    fn test_resolved_video_wire_names() {
        let video = ResolvedVideo {
            bvid: "BV1".to_string(),
            title: "A".to_string(),
            url: "u1".to_string(),
        };
        let value = serde_json::to_value(&video).unwrap();
        assert_eq!(value, serde_json::json!({"bv": "BV1", "title": "A", "video": "u1"}));
    }
}
