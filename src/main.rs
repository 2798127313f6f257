use bili_favlist_player::config::Config;
use bili_favlist_player::core::PageAssembler;
use bili_favlist_player::favorites::BiliFavorites;
use bili_favlist_player::http_client::build_client;
use bili_favlist_player::resolver::ParseApiResolver;
use bili_favlist_player::routes::{router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let config = Config::from_env();
    let client = build_client(config.upstream_timeout)?;

    let assembler = PageAssembler::new(
        Arc::new(BiliFavorites::new(client.clone(), config.fav_list_api.clone())),
        Arc::new(ParseApiResolver::new(client, config.parse_api.clone())),
    )
    .with_concurrency(config.resolve_concurrency);

    let app = router(AppState { assembler });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("🚀 收藏夹连播服务启动在 http://{}", addr);
    info!("📡 解析接口: {}", config.parse_api);
    match config.resolve_concurrency {
        Some(n) => info!("⚙️ 单页并发解析上限: {}", n),
        None => info!("⚙️ 单页并发解析: 不限制"),
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
