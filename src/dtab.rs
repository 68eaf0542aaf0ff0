//! DTab 命名空间覆写合并
//!
//! 三个来源按优先级从低到高排列：配置级 DTab、连接信息携带的 DTab、
//! 请求上下文 DTab。注册中心按"最后匹配的规则生效"解释覆写串，
//! 因此低优先级排在前面。每次调用都重新合并（请求上下文随调用变化）。

use std::collections::HashMap;

/// 发现/注册请求携带的连接信息
///
/// 自定义头原样转发给注册中心；`dtab` 字段对应 HTTP 头来源的覆写。
#[derive(Debug, Clone, Default)]
pub struct NetInfo {
    /// 连接级 DTab 覆写
    pub dtab: Option<String>,
    /// 需要原样转发的自定义请求头
    pub custom_headers: HashMap<String, String>,
}

impl NetInfo {
    /// 创建空的连接信息
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置连接级 DTab
    pub fn with_dtab(mut self, dtab: impl Into<String>) -> Self {
        self.dtab = Some(dtab.into());
        self
    }

    /// 添加自定义请求头
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(name.into(), value.into());
        self
    }
}

/// 单次调用的请求上下文
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// 请求级 DTab 覆写（优先级最高）
    pub dtab: Option<String>,
}

impl RequestContext {
    /// 创建携带 DTab 的请求上下文
    pub fn with_dtab(dtab: impl Into<String>) -> Self {
        Self {
            dtab: Some(dtab.into()),
        }
    }
}

/// 合并三个来源的 DTab 覆写串，低优先级在前
///
/// 空串与缺省来源被跳过；三者皆空时返回 `None`。
pub fn merge(
    config_dtab: Option<&str>,
    net_info_dtab: Option<&str>,
    request_dtab: Option<&str>,
) -> Option<String> {
    let parts: Vec<&str> = [config_dtab, net_info_dtab, request_dtab]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(";"))
    }
}
