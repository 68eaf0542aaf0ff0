//! 服务版本配置端点
//!
//! 查询、设置、删除注册中心记录的服务缺省版本。

use crate::context::LbosContext;
use crate::error::{LbosError, Result};
use crate::transport::{HttpMethod, RegistryResponse};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 注册中心记录的服务版本信息
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceVersionInfo {
    /// 当前记录的版本（无记录时为空串）
    #[serde(default)]
    pub version: String,
    /// 注册中心是否存在该服务的版本记录
    #[serde(default)]
    pub exists: bool,
}

/// 服务版本配置客户端
pub struct VersionConfigurer {
    context: Arc<LbosContext>,
}

impl VersionConfigurer {
    /// 共享上下文创建配置客户端
    pub fn from_context(context: Arc<LbosContext>) -> Self {
        Self { context }
    }

    /// 查询服务的版本记录，服务无记录时返回 `{version: "", exists: false}`
    pub async fn get(&self, service: &str) -> Result<ServiceVersionInfo> {
        let params = [("name", validated(service)?)];
        match self.call(HttpMethod::Get, &params).await {
            Ok(response) => parse_info(response),
            Err(LbosError::NotFound { .. }) => Ok(ServiceVersionInfo {
                version: String::new(),
                exists: false,
            }),
            Err(e) => Err(e),
        }
    }

    /// 设置服务版本，返回设置前的记录
    pub async fn set(&self, service: &str, version: &str) -> Result<ServiceVersionInfo> {
        if version.is_empty() {
            return Err(LbosError::invalid_args("version must not be empty"));
        }
        let params = [("name", validated(service)?), ("version", version)];
        let response = self.call(HttpMethod::Put, &params).await?;
        parse_info(response)
    }

    /// 删除服务的版本记录，返回删除前的记录
    pub async fn delete(&self, service: &str) -> Result<ServiceVersionInfo> {
        let params = [("name", validated(service)?)];
        let response = self.call(HttpMethod::Delete, &params).await?;
        parse_info(response)
    }

    /// 在地址列表上执行一次配置请求，故障转移规则与发现一致
    async fn call(
        &self,
        method: HttpMethod,
        params: &[(&str, &str)],
    ) -> Result<RegistryResponse> {
        if !self.context.ensure_initialized().await {
            return Err(LbosError::Off);
        }

        for addr in self.context.addresses().await {
            let url = match reqwest::Url::parse_with_params(
                &format!("{}/lbos/v3/conf", addr),
                params,
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
                .request(method, url.as_str(), &HashMap::new())
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(address = %addr, error = %e, "lbos address unreachable, trying next");
                    continue;
                }
            };

            if response.is_success() {
                return Ok(response);
            }
            if response.status == 404 {
                return Err(LbosError::not_found(
                    "service has no version record",
                    Some(response.body),
                ));
            }
            return Err(LbosError::server_error(
                format!(
                    "registry rejected version request with status {}",
                    response.status
                ),
                Some(response.body),
            ));
        }

        Err(LbosError::NoLbos)
    }
}

fn validated(service: &str) -> Result<&str> {
    if service.is_empty() {
        return Err(LbosError::invalid_args("service name must not be empty"));
    }
    Ok(service)
}

fn parse_info(response: RegistryResponse) -> Result<ServiceVersionInfo> {
    serde_json::from_str(&response.body).map_err(|_| {
        LbosError::server_error(
            "registry returned a corrupt version answer",
            Some(response.body),
        )
    })
}
