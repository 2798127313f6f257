use reqwest::{Client, Response};
use std::time::Duration;
use thiserror::Error;

/// B站接口要求浏览器 UA
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// B站接口要求 Referer 为主站域名
pub const BILIBILI_REFERER: &str = "https://www.bilibili.com/";

/// 创建上游 HTTP 客户端
pub fn build_client(timeout: Duration) -> Result<Client, HttpClientError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| HttpClientError::RequestFailed(e.to_string()))
}

#[derive(Debug, Error)]
pub enum HttpClientError {
    #[error("请求超时")]
    Timeout,
    #[error("请求失败: {0}")]
    RequestFailed(String),
    #[error("响应异常状态码: {0}")]
    BadStatus(u16),
    #[error("响应解析失败: {0}")]
    Decode(String),
}

/// GET 请求
pub async fn get(client: &Client, url: &str, referer: Option<&str>) -> Result<Response, HttpClientError> {
    let mut req = client.get(url);

    if let Some(ref_url) = referer {
        req = req.header("Referer", ref_url);
    }

    req = req
        .header("Accept", "application/json, text/plain, */*")
        .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8");

    let response = req.send().await.map_err(|e| {
        if e.is_timeout() {
            HttpClientError::Timeout
        } else {
            HttpClientError::RequestFailed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(HttpClientError::BadStatus(response.status().as_u16()));
    }

    Ok(response)
}

/// GET 请求并返回 JSON
pub async fn get_json<T: serde::de::DeserializeOwned>(
    client: &Client,
    url: &str,
    referer: Option<&str>,
) -> Result<T, HttpClientError> {
    let response = get(client, url, referer).await?;
    response.json().await.map_err(|e| {
        if e.is_timeout() {
            HttpClientError::Timeout
        } else {
            HttpClientError::Decode(e.to_string())
        }
    })
}


#[cfg(test)]
mod tests {
    use super::testing::serve;
    use super::*;
    use axum::{
        http::{header, HeaderMap, StatusCode},
        routing, Json, Router,
    };
    use serde_json::{json, Value};

    async fn upstream() -> String {
        let app = Router::new()
            .route(
                "/echo",
                routing::get(|headers: HeaderMap| async move {
                    let value = |name: header::HeaderName| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string()
                    };
                    Json(json!({
                        "ua": value(header::USER_AGENT),
                        "referer": value(header::REFERER),
                    }))
                }),
            )
            .route("/teapot", routing::get(|| async { StatusCode::IM_A_TEAPOT }))
            .route("/text", routing::get(|| async { "not json" }));
        serve(app).await
    }

    fn client() -> Client {
        build_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_json_sends_browser_headers() {
        let base = upstream().await;
        let echoed: Value = get_json(&client(), &format!("{}/echo", base), Some(BILIBILI_REFERER))
            .await
            .unwrap();
        assert_eq!(echoed["ua"], json!(USER_AGENT));
        assert_eq!(echoed["referer"], json!(BILIBILI_REFERER));

        let echoed: Value = get_json(&client(), &format!("{}/echo", base), None).await.unwrap();
        assert_eq!(echoed["referer"], json!(""));
    }

    #[tokio::test]
    async fn test_bad_status_and_undecodable_body() {
        let base = upstream().await;

        let err = get(&client(), &format!("{}/teapot", base), None).await.unwrap_err();
        assert!(matches!(err, HttpClientError::BadStatus(418)));

        let err = get_json::<Value>(&client(), &format!("{}/text", base), None)
            .await
            .unwrap_err();
        assert!(matches!(err, HttpClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let err = get(&client(), "http://127.0.0.1:1/", None).await.unwrap_err();
        assert!(matches!(err, HttpClientError::RequestFailed(_)));
    }
}
