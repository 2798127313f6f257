//! HTTP 接口
//! /list 只返回 BV 号，/resolved-page 返回解析后的可播放列表

use crate::core::PageAssembler;
use crate::error::AppError;
use crate::types::PageRequest;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::any::Any;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub assembler: PageAssembler,
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    // CORS 配置
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(index_handler))
        .route("/api", get(api_info_handler))
        .route("/health", get(health_handler))
        .route(
            "/list",
            get(list_handler)
                .options(preflight_handler)
                .fallback(method_not_allowed),
        )
        .route(
            "/resolved-page",
            get(resolved_page_handler)
                .options(preflight_handler)
                .fallback(method_not_allowed),
        )
        .route(
            "/resolve",
            get(resolve_handler)
                .options(preflight_handler)
                .fallback(method_not_allowed),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
}

/// 分页查询参数，数值在这里才解析以便统一返回 400
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub media_id: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// 查询字符串本身无法解析时同样返回 JSON 400
fn query_or_400<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(inner)| inner)
        .map_err(|rejection| AppError::InvalidPageRequest(rejection.body_text()))
}

impl PageQuery {
    fn to_request(&self) -> Result<PageRequest, AppError> {
        PageRequest::from_query(
            self.media_id.as_deref(),
            self.page.as_deref(),
            self.page_size.as_deref(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveQuery {
    pub bv: Option<String>,
}

/// GET / - 连播页面
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /api - API 信息
async fn api_info_handler() -> impl IntoResponse {
    Json(json!({
        "name": "Bili Favlist Player API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "B站收藏夹连播后端",
        "endpoints": {
            "GET /": "连播页面",
            "GET /list": "获取收藏夹一页 BV 号 (?mediaId=&page=&pageSize=)",
            "GET /resolved-page": "获取收藏夹一页并解析为可播放视频 (?mediaId=&page=&pageSize=)",
            "GET /resolve": "解析单个视频 (?bv=)",
            "GET /health": "健康检查"
        }
    }))
}

/// 健康检查
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// GET /list - 收藏夹一页 BV 号
async fn list_handler(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let request = query_or_400(query)?.to_request()?;
    info!(
        "📋 获取列表: 收藏夹 {} 第 {} 页 (每页 {})",
        request.media_id, request.page, request.page_size
    );

    let (listing, pagination) = state.assembler.list_page(&request).await?;

    Ok(Json(json!({
        "success": true,
        "mediaId": request.media_id,
        "bvids": listing.bvids,
        "pagination": pagination,
    })))
}

/// GET /resolved-page - 收藏夹一页并解析
async fn resolved_page_handler(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let request = query_or_400(query)?.to_request()?;
    info!(
        "🎬 解析页面: 收藏夹 {} 第 {} 页 (每页 {})",
        request.media_id, request.page, request.page_size
    );

    let result = state.assembler.assemble(&request).await?;

    Ok(Json(json!({
        "success": true,
        "count": result.count(),
        "videos": result.videos,
        "pagination": result.pagination,
    })))
}

/// GET /resolve - 单个视频
async fn resolve_handler(
    State(state): State<AppState>,
    query: Result<Query<ResolveQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let query = query_or_400(query)?;
    let video = state
        .assembler
        .resolve_one(query.bv.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(json!({
        "success": true,
        "video": video,
    })))
}

/// 跨域预检
async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::Internal(detail).into_response()
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>收藏夹连播</title>
  <style>
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
      background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%);
      color: #e8e8e8;
      min-height: 100vh;
      padding: 20px;
    }
    .container { max-width: 1200px; margin: 0 auto; }
    h1 { text-align: center; margin-bottom: 20px; color: #fb7299; }
    .controls { display: flex; gap: 10px; flex-wrap: wrap; margin-bottom: 16px; }
    .controls input, .controls select {
      padding: 10px 14px;
      border: none;
      border-radius: 8px;
      background: rgba(255,255,255,0.1);
      color: #fff;
      font-size: 14px;
    }
    .controls input { flex: 1; min-width: 200px; }
    button {
      padding: 10px 16px;
      border: none;
      border-radius: 8px;
      background: #fb7299;
      color: #fff;
      cursor: pointer;
      font-size: 14px;
    }
    button:disabled { opacity: 0.4; cursor: not-allowed; }
    .layout { display: grid; grid-template-columns: 2fr 1fr; gap: 16px; }
    @media (max-width: 800px) { .layout { grid-template-columns: 1fr; } }
    video { width: 100%; border-radius: 12px; background: #000; }
    .now { margin: 10px 0; font-size: 15px; }
    .player-actions { display: flex; gap: 10px; }
    .list { max-height: 70vh; overflow-y: auto; }
    .item {
      padding: 10px 12px;
      margin-bottom: 6px;
      background: rgba(255,255,255,0.05);
      border-radius: 8px;
      cursor: pointer;
      font-size: 14px;
    }
    .item:hover { background: rgba(255,255,255,0.1); }
    .item.active { background: rgba(251, 114, 153, 0.35); }
    .item small { color: rgba(255,255,255,0.5); }
    .pager { display: flex; align-items: center; gap: 10px; margin-bottom: 10px; font-size: 13px; }
    .error { color: #ff6b6b; font-size: 13px; margin-bottom: 10px; }
    .empty { color: rgba(255,255,255,0.4); text-align: center; padding: 40px; }
  </style>
</head>
<body>
  <div class="container">
    <h1>📺 收藏夹连播</h1>
    <div class="controls">
      <input type="text" id="mediaId" placeholder="收藏夹 ID (media_id)">
      <select id="pageSize">
        <option value="5">5 / 页</option>
        <option value="10">10 / 页</option>
        <option value="20" selected>20 / 页</option>
      </select>
      <button id="loadBtn" onclick="requestPage(1)">加载</button>
    </div>
    <div class="error" id="error"></div>
    <div class="layout">
      <div>
        <video id="player" controls autoplay></video>
        <div class="now" id="now">未选择视频</div>
        <div class="player-actions">
          <button onclick="dispatch({ type: 'previous' })">上一个</button>
          <button onclick="dispatch({ type: 'next' })">下一个</button>
        </div>
      </div>
      <div>
        <div class="pager">
          <button id="prevPage" onclick="requestPage(state.page - 1)" disabled>上一页</button>
          <span id="pageInfo">-</span>
          <button id="nextPage" onclick="requestPage(state.page + 1)" disabled>下一页</button>
        </div>
        <div class="list" id="list"><div class="empty">输入收藏夹 ID 开始</div></div>
      </div>
    </div>
  </div>
  <script>
    // selected 是列表下标，同一 BV 号可能出现多次
    let state = { videos: [], selected: -1, page: 1, pageSize: 20, generation: 0, pagination: null };

    function current(s) {
      return s.selected >= 0 ? s.videos[s.selected] || null : null;
    }

    function step(s, forward) {
      const len = s.videos.length;
      if (len === 0) return s;
      const i = s.selected;
      let next;
      if (i < 0) next = forward ? 0 : len - 1;
      else next = forward ? (i + 1) % len : (i + len - 1) % len;
      return { ...s, selected: next };
    }

    // 与服务端 viewer 状态机一致的纯转换
    function transition(s, event) {
      switch (event.type) {
        case 'pageRequested':
          return { ...s, selected: -1, page: Math.max(1, event.page), pageSize: event.pageSize, generation: s.generation + 1 };
        case 'pageLoaded':
          if (event.generation !== s.generation) return s;
          return {
            ...s,
            videos: event.videos,
            selected: s.selected >= 0 && s.selected < event.videos.length ? s.selected : (event.videos.length > 0 ? 0 : -1),
            page: event.pagination.currentPage,
            pageSize: event.pagination.pageSize,
            pagination: event.pagination,
          };
        case 'select':
          return event.index < s.videos.length ? { ...s, selected: event.index } : s;
        case 'next':
        case 'ended':
          return step(s, true);
        case 'previous':
          return step(s, false);
        default:
          return s;
      }
    }

    function dispatch(event) {
      const before = state;
      state = transition(state, event);
      render(before.selected !== state.selected || before.videos !== state.videos);
    }

    async function requestPage(page) {
      const mediaId = document.getElementById('mediaId').value.trim();
      const pageSize = parseInt(document.getElementById('pageSize').value, 10);
      if (!mediaId) return;
      dispatch({ type: 'pageRequested', page, pageSize });
      const generation = state.generation;
      document.getElementById('error').textContent = '';
      document.getElementById('list').innerHTML = '<div class="empty">解析中...</div>';
      try {
        const params = new URLSearchParams({ mediaId, page: String(state.page), pageSize: String(state.pageSize) });
        const res = await fetch('/resolved-page?' + params);
        const data = await res.json();
        if (!data.success) throw new Error(data.error || 'HTTP ' + res.status);
        dispatch({ type: 'pageLoaded', generation, videos: data.videos, pagination: data.pagination });
      } catch (e) {
        if (generation === state.generation) {
          document.getElementById('error').textContent = '加载失败: ' + e.message;
          document.getElementById('list').innerHTML = '';
        }
      }
    }

    function render(videoChanged) {
      const list = document.getElementById('list');
      if (state.videos.length === 0) {
        if (state.pagination) list.innerHTML = '<div class="empty">本页没有可播放的视频</div>';
      } else {
        list.innerHTML = '';
        state.videos.forEach((v, i) => {
          const div = document.createElement('div');
          div.className = 'item' + (i === state.selected ? ' active' : '');
          div.innerHTML = '<div></div><small></small>';
          div.firstChild.textContent = v.title;
          div.lastChild.textContent = v.bv;
          div.onclick = () => dispatch({ type: 'select', index: i });
          list.appendChild(div);
        });
      }

      const p = state.pagination;
      document.getElementById('pageInfo').textContent = p ? `第 ${p.currentPage} / ${p.totalPages} 页 · 共 ${p.totalItems} 个` : '-';
      document.getElementById('prevPage').disabled = !p || p.currentPage <= 1;
      document.getElementById('nextPage').disabled = !p || !p.hasMore;

      const player = document.getElementById('player');
      const playing = current(state);
      document.getElementById('now').textContent = playing ? playing.title : '未选择视频';
      if (videoChanged && playing) {
        player.src = playing.video;
        player.play().catch(() => {});
      }
    }

    document.getElementById('player').addEventListener('ended', () => dispatch({ type: 'ended' }));
    document.getElementById('mediaId').addEventListener('keydown', e => { if (e.key === 'Enter') requestPage(1); });
  </script>
</body>
</html>
"#;
