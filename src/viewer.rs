//! 播放器状态机
//! 页面脚本 (INDEX_HTML) 中的连播逻辑与此一致：
//! 不可变状态快照 + 每个事件一个纯转换

use crate::types::{PageResult, ResolvedVideo, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerState {
    pub videos: Vec<ResolvedVideo>,
    /// 当前播放位置 (下标)，同一 BV 号可能在列表中出现多次
    pub selected: Option<usize>,
    pub page: u32,
    pub page_size: u32,
    /// 每次翻页递增，用于丢弃过期的加载结果
    pub generation: u64,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            videos: Vec::new(),
            selected: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            generation: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ViewerEvent {
    /// 切换页码或每页数量，发起新请求
    PageRequested { page: u32, page_size: u32 },
    /// 请求完成；generation 与当前不一致时忽略
    PageLoaded { generation: u64, result: PageResult },
    Select(usize),
    Next,
    Previous,
    PlaybackEnded,
}

impl ViewerState {
    pub fn current(&self) -> Option<&ResolvedVideo> {
        self.selected.and_then(|i| self.videos.get(i))
    }

    fn with_selected(&self, index: usize) -> Self {
        Self {
            selected: Some(index),
            ..self.clone()
        }
    }

    /// 下一个，末尾回到第一个
    fn step(&self, forward: bool) -> Self {
        let len = self.videos.len();
        if len == 0 {
            return self.clone();
        }
        let next = match self.selected.filter(|&i| i < len) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.with_selected(next)
    }

    pub fn apply(&self, event: ViewerEvent) -> Self {
        match event {
            ViewerEvent::PageRequested { page, page_size } => Self {
                videos: self.videos.clone(),
                selected: None,
                page: page.max(1),
                page_size,
                generation: self.generation + 1,
            },
            ViewerEvent::PageLoaded { generation, result } => {
                if generation != self.generation {
                    return self.clone();
                }
                let len = result.videos.len();
                let selected = match self.selected {
                    Some(i) if i < len => Some(i),
                    _ if len > 0 => Some(0),
                    _ => None,
                };
                Self {
                    videos: result.videos,
                    selected,
                    page: result.pagination.current_page,
                    page_size: result.pagination.page_size,
                    generation: self.generation,
                }
            }
            ViewerEvent::Select(index) => {
                if index < self.videos.len() {
                    self.with_selected(index)
                } else {
                    self.clone()
                }
            }
            ViewerEvent::Next | ViewerEvent::PlaybackEnded => self.step(true),
            ViewerEvent::Previous => self.step(false),
        }
    }
}
