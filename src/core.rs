//! 核心分页逻辑
//! 获取收藏夹一页 BV 号，并发解析后按原顺序组装结果

use crate::error::AppError;
use crate::favorites::FavoritesSource;
use crate::resolver::VideoResolver;
use crate::types::{ListingPage, PageRequest, PageResult, Pagination, ResolvedVideo};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 收藏夹分页组装器
#[derive(Clone)]
pub struct PageAssembler {
    source: Arc<dyn FavoritesSource>,
    resolver: Arc<dyn VideoResolver>,
    /// 并发解析上限，`None` 时整页同时发出 (最多 20 个)
    concurrency: Option<usize>,
}

impl PageAssembler {
    pub fn new(source: Arc<dyn FavoritesSource>, resolver: Arc<dyn VideoResolver>) -> Self {
        Self {
            source,
            resolver,
            concurrency: None,
        }
    }

    pub fn with_concurrency(mut self, limit: Option<usize>) -> Self {
        self.concurrency = limit.filter(|n| *n > 0);
        self
    }

    /// 只获取 BV 号列表，不解析
    pub async fn list_page(&self, request: &PageRequest) -> Result<(ListingPage, Pagination), AppError> {
        let listing = self.source.fetch_page(request).await?;
        let pagination = Pagination::new(request, &listing);
        Ok((listing, pagination))
    }

    /// 校验参数后组装一页
    pub async fn assemble_page(
        &self,
        media_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<PageResult, AppError> {
        let request = PageRequest::new(media_id, page, page_size)?;
        self.assemble(&request).await
    }

    /// 组装已校验的一页
    pub async fn assemble(&self, request: &PageRequest) -> Result<PageResult, AppError> {
        let (listing, pagination) = self.list_page(request).await?;

        if listing.bvids.is_empty() {
            debug!("收藏夹 {} 第 {} 页为空", request.media_id, request.page);
            return Ok(PageResult {
                videos: Vec::new(),
                pagination,
            });
        }

        let total = listing.bvids.len();
        info!(
            "开始解析: 收藏夹 {} 第 {} 页, 共 {} 个视频",
            request.media_id, request.page, total
        );

        let videos = self.resolve_all(&listing.bvids).await;

        info!("解析完成: {}/{} 个视频可播放", videos.len(), total);

        Ok(PageResult { videos, pagination })
    }

    /// 解析单个视频，失败时返回 `NotResolved`
    pub async fn resolve_one(&self, bvid: &str) -> Result<ResolvedVideo, AppError> {
        let bvid = bvid.trim();
        if bvid.is_empty() {
            return Err(AppError::InvalidPageRequest("bv is required".to_string()));
        }
        self.resolver
            .resolve(bvid)
            .await?
            .ok_or_else(|| AppError::NotResolved(bvid.to_string()))
    }

    /// 并发解析，结果保持 BV 号原顺序，失败项被丢弃
    async fn resolve_all(&self, bvids: &[String]) -> Vec<ResolvedVideo> {
        let tasks = bvids.iter().cloned().map(|bvid| self.resolve_item(bvid));

        let results: Vec<Option<ResolvedVideo>> = match self.concurrency {
            Some(limit) => stream::iter(tasks).buffered(limit).collect().await,
            None => join_all(tasks).await,
        };

        results.into_iter().flatten().collect()
    }

    async fn resolve_item(&self, bvid: String) -> Option<ResolvedVideo> {
        match self.resolver.resolve(&bvid).await {
            Ok(Some(video)) => Some(video),
            Ok(None) => {
                debug!("视频 {} 解析失败, 已跳过", bvid);
                None
            }
            Err(e) => {
                warn!("视频 {} 解析请求失败: {}", bvid, e);
                None
            }
        }
    }
}
