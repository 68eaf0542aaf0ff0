//! 主机名解析缓存
//!
//! 以 (主机名, 端口, 服务名, 版本) 为键记住第一次解析出的 IP。
//! 首次解析之后缓存即为权威来源：同键的后续查询不再发起 DNS，
//! 即使底层 DNS 应答会在多个 IP 之间变化。注销实例时失效对应条目。

use crate::error::{LbosError, Result};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;
use tracing::debug;

/// 缓存键：主机名 + 端口 + 服务名 + 版本
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpCacheKey {
    pub host: String,
    pub port: u16,
    pub service: String,
    pub version: String,
}

impl IpCacheKey {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        service: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            service: service.into(),
            version: version.into(),
        }
    }
}

/// 进程级主机名解析缓存
#[derive(Debug, Default)]
pub struct IpCache {
    entries: RwLock<HashMap<IpCacheKey, String>>,
}

impl IpCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析主机名并缓存结果
    ///
    /// 字面 IP（含 `0.0.0.0`）原样返回且不进缓存；空主机名报未知错误；
    /// 同键第二次调用直接命中缓存，不再发起网络查询。
    pub async fn resolve(
        &self,
        host: &str,
        port: u16,
        service: &str,
        version: &str,
    ) -> Result<String> {
        if host.is_empty() {
            return Err(LbosError::unknown("cannot resolve empty hostname"));
        }
        if host.parse::<IpAddr>().is_ok() {
            return Ok(host.to_string());
        }

        let key = IpCacheKey::new(host, port, service, version);
        {
            let entries = self.entries.read().await;
            if let Some(ip) = entries.get(&key) {
                return Ok(ip.clone());
            }
        }

        let ip = lookup_ip(host, port).await?;
        let mut entries = self.entries.write().await;
        // 并发首查时保留先写入的值，缓存才是权威来源
        let ip = entries.entry(key).or_insert(ip).clone();
        Ok(ip)
    }

    /// 查缓存但不解析：未命中时原样返回主机名
    pub async fn try_find(&self, host: &str, port: u16, service: &str, version: &str) -> String {
        let key = IpCacheKey::new(host, port, service, version);
        let entries = self.entries.read().await;
        entries.get(&key).cloned().unwrap_or_else(|| host.to_string())
    }

    /// 失效一个条目；键不存在时为无害的空操作
    pub async fn invalidate(&self, service: &str, host: &str, port: u16, version: &str) -> bool {
        let key = IpCacheKey::new(host, port, service, version);
        let mut entries = self.entries.write().await;
        let removed = entries.remove(&key).is_some();
        if !removed {
            debug!(host, port, service, "ip cache entry already absent");
        }
        removed
    }

    /// 当前条目数
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// 是否为空
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 清空缓存
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// 一次性 DNS 查询，取第一个应答地址
async fn lookup_ip(host: &str, port: u16) -> Result<String> {
    let mut addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| LbosError::unknown(format!("hostname lookup failed for {host}: {e}")))?;
    match addrs.next() {
        Some(addr) => Ok(addr.ip().to_string()),
        None => Err(LbosError::unknown(format!(
            "hostname lookup returned no address for {host}"
        ))),
    }
}

/// 解析本机对外地址
///
/// 先用 UDP connect 技巧向探测地址"连接"一次拿本地地址（不产生流量），
/// 失败时退回主机名 DNS。注册 `0.0.0.0` 实例时用它做地址替换。
pub fn local_host_addr(probe: Option<&str>) -> Option<String> {
    let target = probe
        .and_then(|p| {
            p.trim_start_matches("http://")
                .trim_start_matches("https://")
                .split('/')
                .next()
                .map(str::to_string)
        })
        .unwrap_or_else(|| "203.0.113.1:80".to_string());
    let target = if target.contains(':') {
        target
    } else {
        format!("{}:80", target)
    };

    if let Ok(socket) = std::net::UdpSocket::bind("0.0.0.0:0") {
        if socket.connect(&target).is_ok() {
            if let Ok(local) = socket.local_addr() {
                let ip = local.ip();
                if !ip.is_unspecified() {
                    return Some(ip.to_string());
                }
            }
        }
    }

    std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty())
}
