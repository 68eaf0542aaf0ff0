//! 实例注册与注销
//!
//! 维护本进程已注册实例的内存表，支持同区幂等重注册、
//! 跨区注册拒绝、单个/批量注销，注销同时失效对应的 IP 缓存项。

use crate::context::LbosContext;
use crate::discovery::candidate::CandidateMeta;
use crate::discovery::fetch;
use crate::dtab::{NetInfo, RequestContext};
use crate::error::{LbosError, Result};
use crate::transport::HttpMethod;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 已注册实例表的键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnounceKey {
    pub service: String,
    pub version: String,
    pub host: String,
    pub port: u16,
}

/// 一条已注册实例记录
#[derive(Debug, Clone)]
pub struct AnnouncementRecord {
    pub service: String,
    pub version: String,
    pub host: String,
    pub port: u16,
    pub healthcheck_url: String,
    /// 注册发生时的可用区
    pub zone: Option<String>,
    /// 实际接受注册的注册中心地址
    pub lbos_address: String,
    pub announced_at: DateTime<Utc>,
}

/// 注册服务
pub struct Announcer {
    context: Arc<LbosContext>,
    net_info: NetInfo,
}

impl Announcer {
    /// 共享上下文创建注册服务
    pub fn from_context(context: Arc<LbosContext>) -> Self {
        Self {
            context,
            net_info: NetInfo::default(),
        }
    }

    /// 设置后续请求携带的连接信息（自定义头、连接级 DTab）
    pub fn with_net_info(mut self, net_info: NetInfo) -> Self {
        self.net_info = net_info;
        self
    }

    /// 上下文
    pub fn context(&self) -> &Arc<LbosContext> {
        &self.context
    }

    /// 注册本进程的一个实例，成功返回注册中心的应答正文
    ///
    /// 参数校验在任何网络调用之前完成；`0.0.0.0` 在发送前替换为
    /// 解析出的本机地址，解析失败返回 `DnsResolve` 且不联系注册中心。
    /// 同键同区重复注册覆盖原记录；同键不同区返回
    /// `MultizoneProhibited` 并保持原记录不变。
    pub async fn announce(
        &self,
        service: &str,
        version: &str,
        host: &str,
        port: u16,
        healthcheck_url: &str,
        meta: Option<&CandidateMeta>,
    ) -> Result<String> {
        validate_announce_args(service, version, port, healthcheck_url)?;

        if !self.context.ensure_initialized().await {
            return Err(LbosError::Off);
        }

        let host = if host == "0.0.0.0" {
            self.context.local_host().await.ok_or_else(|| {
                LbosError::dns_resolve("cannot resolve local host address for 0.0.0.0")
            })?
        } else {
            host.to_string()
        };

        let key = AnnounceKey {
            service: service.to_string(),
            version: version.to_string(),
            host: host.clone(),
            port,
        };
        let zone = self.context.current_zone();
        {
            let table = self.context.announcements.read().await;
            if let Some(existing) = table.get(&key) {
                if existing.zone != zone {
                    return Err(LbosError::MultizoneProhibited(format!(
                        "'{}:{}' already announced in zone {:?}",
                        service, version, existing.zone
                    )));
                }
            }
        }

        let request = RequestContext::default();
        let headers = fetch::build_headers(&self.context, &self.net_info, &request);
        let params = announce_params(service, version, &host, port, healthcheck_url, meta);

        for addr in self.context.addresses().await {
            let url = match reqwest::Url::parse_with_params(
                &format!("{}/lbos/v3/announce", addr),
                &params,
            ) {
                Ok(u) => u,
                Err(e) => {
                    debug!(address = %addr, error = %e, "lbos address is not a valid url, trying next");
                    continue;
                }
            };
            let response = match self
                .context
                .transport()
                .request(HttpMethod::Put, url.as_str(), &headers)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(address = %addr, error = %e, "lbos address unreachable, trying next");
                    continue;
                }
            };

            if response.is_success() {
                if serde_json::from_str::<serde_json::Value>(&response.body).is_err() {
                    return Err(LbosError::server_error(
                        "registry returned a corrupt announce answer",
                        Some(response.body),
                    ));
                }
                let record = AnnouncementRecord {
                    service: service.to_string(),
                    version: version.to_string(),
                    host: host.clone(),
                    port,
                    healthcheck_url: healthcheck_url.to_string(),
                    zone: zone.clone(),
                    lbos_address: addr.clone(),
                    announced_at: Utc::now(),
                };
                self.context.announcements.write().await.insert(key, record);
                // 注册即缓存主机解析，注销时再失效这条缓存
                if let Err(e) = self
                    .context
                    .ip_cache()
                    .resolve(&host, port, service, version)
                    .await
                {
                    debug!(host = %host, error = %e, "announced host did not resolve");
                }
                info!(service = %service, version = %version, host = %host, port, "instance announced");
                return Ok(response.body);
            }
            if response.status == 404 {
                return Err(LbosError::not_found(
                    "healthcheck url is unreachable",
                    Some(response.body),
                ));
            }
            if response.status == 400 {
                return Err(LbosError::BadRequest {
                    message: "registry rejected the announce parameters".to_string(),
                    answer: Some(response.body),
                });
            }
            return Err(LbosError::server_error(
                format!("registry rejected announce with status {}", response.status),
                Some(response.body),
            ));
        }

        Err(LbosError::NoLbos)
    }

    /// 注销一个实例
    ///
    /// `host` 省略时注销本机实例。成功移除本地记录并使对应 IP 缓存
    /// 失效，返回 `Ok(true)`；目标处于其他可用区时不做任何事，
    /// 返回 `Ok(false)`；注册中心找不到该实例返回 `NotFound`。
    pub async fn deannounce(
        &self,
        service: &str,
        version: &str,
        host: Option<&str>,
        port: u16,
    ) -> Result<bool> {
        if !self.context.ensure_initialized().await {
            return Err(LbosError::Off);
        }

        let host = match host {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => self.context.local_host().await.ok_or_else(|| {
                LbosError::dns_resolve("cannot resolve local host address for deannounce")
            })?,
        };

        let key = AnnounceKey {
            service: service.to_string(),
            version: version.to_string(),
            host: host.clone(),
            port,
        };
        let zone = self.context.current_zone();
        {
            let table = self.context.announcements.read().await;
            if let Some(existing) = table.get(&key) {
                if existing.zone != zone {
                    info!(
                        service = %service,
                        host = %host,
                        "instance belongs to another zone, deannounce skipped"
                    );
                    return Ok(false);
                }
            }
        }

        let request = RequestContext::default();
        let headers = fetch::build_headers(&self.context, &self.net_info, &request);
        let port_text = port.to_string();
        let params = [
            ("name", service),
            ("version", version),
            ("host", host.as_str()),
            ("port", port_text.as_str()),
        ];

        for addr in self.context.addresses().await {
            let url = match reqwest::Url::parse_with_params(
                &format!("{}/lbos/v3/announce", addr),
                &params,
            ) {
                Ok(u) => u,
                Err(e) => {
                    debug!(address = %addr, error = %e, "lbos address is not a valid url, trying next");
                    continue;
                }
            };
            let response = match self
                .context
                .transport()
                .request(HttpMethod::Delete, url.as_str(), &headers)
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(address = %addr, error = %e, "lbos address unreachable, trying next");
                    continue;
                }
            };

            if response.is_success() {
                self.context.announcements.write().await.remove(&key);
                self.context
                    .ip_cache()
                    .invalidate(service, &host, port, version)
                    .await;
                info!(service = %service, version = %version, host = %host, port, "instance deannounced");
                return Ok(true);
            }
            if response.status == 404 {
                return Err(LbosError::not_found(
                    format!("instance '{}:{}' is not announced", service, version),
                    Some(response.body),
                ));
            }
            return Err(LbosError::server_error(
                format!(
                    "registry rejected deannounce with status {}",
                    response.status
                ),
                Some(response.body),
            ));
        }

        Err(LbosError::NoLbos)
    }

    /// 注销本进程已注册的全部实例，返回成功注销的数量
    pub async fn deannounce_all(&self) -> usize {
        let keys: Vec<AnnounceKey> = self
            .context
            .announcements
            .read()
            .await
            .keys()
            .cloned()
            .collect();

        let mut removed = 0;
        for key in keys {
            match self
                .deannounce(&key.service, &key.version, Some(&key.host), key.port)
                .await
            {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        service = %key.service,
                        host = %key.host,
                        error = %e,
                        "deannounce failed during bulk withdrawal"
                    );
                }
            }
        }
        removed
    }

    /// 按配置文件的 `[announce.<name>]` 段注册实例
    ///
    /// 缺段、缺字段或端口非法都返回 `InvalidArgs`，不发起网络调用。
    pub async fn announce_from_config(&self, section: &str) -> Result<String> {
        let Some(entry) = self.context.config().announce.get(section).cloned() else {
            return Err(LbosError::invalid_args(format!(
                "announce section '{}' is missing from the config",
                section
            )));
        };

        let service = entry
            .service
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LbosError::invalid_args("announce section has no service name"))?;
        let version = entry
            .version
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LbosError::invalid_args("announce section has no version"))?;
        let host = entry.host.unwrap_or_else(|| "0.0.0.0".to_string());
        let healthcheck = entry
            .healthcheck
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LbosError::invalid_args("announce section has no healthcheck url"))?;

        let port_text = entry
            .port
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LbosError::invalid_args("announce section has no port"))?;
        let port: u16 = port_text.parse().map_err(|_| {
            LbosError::invalid_args(format!("announce section port '{}' is invalid", port_text))
        })?;

        self.announce(&service, &version, &host, port, &healthcheck, None)
            .await
    }
}

/// 任何网络调用前的参数校验
fn validate_announce_args(
    service: &str,
    version: &str,
    port: u16,
    healthcheck_url: &str,
) -> Result<()> {
    if service.is_empty() {
        return Err(LbosError::invalid_args("service name must not be empty"));
    }
    if version.is_empty() {
        return Err(LbosError::invalid_args("version must not be empty"));
    }
    if port == 0 {
        return Err(LbosError::invalid_args("port must not be zero"));
    }
    if !healthcheck_url.starts_with("http://") && !healthcheck_url.starts_with("https://") {
        return Err(LbosError::invalid_args(
            "healthcheck url must start with http:// or https://",
        ));
    }
    Ok(())
}

/// 组装注册请求的查询参数，附加元数据跟在保留参数之后
fn announce_params(
    service: &str,
    version: &str,
    host: &str,
    port: u16,
    healthcheck_url: &str,
    meta: Option<&CandidateMeta>,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("name".to_string(), service.to_string()),
        ("version".to_string(), version.to_string()),
        ("host".to_string(), host.to_string()),
        ("port".to_string(), port.to_string()),
        ("check".to_string(), healthcheck_url.to_string()),
    ];
    if let Some(meta) = meta {
        for (key, value) in meta.iter() {
            params.push((key.to_string(), value.to_string()));
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_catches_each_argument() {
        assert!(validate_announce_args("", "1.0.0", 80, "http://h/x").is_err());
        assert!(validate_announce_args("svc", "", 80, "http://h/x").is_err());
        assert!(validate_announce_args("svc", "1.0.0", 0, "http://h/x").is_err());
        assert!(validate_announce_args("svc", "1.0.0", 80, "").is_err());
        assert!(validate_announce_args("svc", "1.0.0", 80, "ftp://h/x").is_err());
        assert!(validate_announce_args("svc", "1.0.0", 80, "https://h/x").is_ok());
    }

    #[test]
    fn test_announce_params_include_meta() {
        let mut meta = CandidateMeta::default();
        meta.set("datacenter", "be").unwrap();
        let params = announce_params("svc", "1.0.0", "10.0.0.1", 8080, "http://h/x", Some(&meta));
        assert_eq!(params[0], ("name".to_string(), "svc".to_string()));
        assert_eq!(params[4], ("check".to_string(), "http://h/x".to_string()));
        assert!(params.contains(&("datacenter".to_string(), "be".to_string())));
    }
}
