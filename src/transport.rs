//! 注册中心 HTTP 传输层
//!
//! 把对单个注册中心地址的一次 HTTP 调用抽象成 trait，
//! 换址重试与状态码语义由上层（取候选、注册、版本配置）决定。
//! 连接层失败与"有应答但状态码非 2xx"在返回值上严格区分。

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// HTTP 方法子集
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Delete,
}

/// 注册中心的一次应答
#[derive(Debug, Clone)]
pub struct RegistryResponse {
    /// HTTP 状态码
    pub status: u16,
    /// 应答正文
    pub body: String,
}

impl RegistryResponse {
    /// 是否为成功状态
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 连接层错误：该地址根本没有给出应答
pub type TransportError = String;

/// 注册中心传输 trait
///
/// `Err` 表示连接层失败（地址不可达），`Ok` 表示拿到了 HTTP 应答，
/// 无论其状态码如何。
#[async_trait]
pub trait LbosTransport: Send + Sync {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> std::result::Result<RegistryResponse, TransportError>;
}

/// 基于 reqwest 的默认传输实现
pub struct HttpLbosTransport {
    client: reqwest::Client,
}

impl HttpLbosTransport {
    /// 创建默认传输；超时交给 reqwest 默认行为，调用方可自带 client
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// 使用自定义连接超时创建传输
    pub fn with_connect_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpLbosTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LbosTransport for HttpLbosTransport {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> std::result::Result<RegistryResponse, TransportError> {
        let mut builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        };
        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| format!("request to {url} failed: {e}"))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| format!("reading body from {url} failed: {e}"))?;

        Ok(RegistryResponse { status, body })
    }
}
