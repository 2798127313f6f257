//! B站收藏夹连播后端
//! 收藏夹分页获取 BV 号 → 并发解析直链 → 浏览器连播

pub mod config;
pub mod core;
pub mod error;
pub mod favorites;
pub mod http_client;
pub mod resolver;
pub mod routes;
pub mod types;
pub mod viewer;
