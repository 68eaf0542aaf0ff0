//! LBOS 状态码定义
//!
//! 状态码与注册中心 HTTP 语义对齐：2xx/4xx 沿用标准含义，
//! 450-455 为映射器扩展码，用于描述注册中心本身不可达等情况。

use serde::{Deserialize, Serialize};
use std::fmt;

/// LBOS 映射器状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum LbosStatus {
    /// 操作成功
    Success = 200,
    /// 注册中心拒绝了请求参数
    BadRequest = 400,
    /// 服务不存在，或健康检查地址不可达
    NotFound = 404,
    /// 没有任何注册中心地址有响应
    NoLbos = 450,
    /// 本机地址解析失败（替换 0.0.0.0 时）
    DnsResolve = 451,
    /// 调用方参数非法（空服务名、零端口、保留元数据键等）
    InvalidArgs = 452,
    /// 同一实例禁止跨可用区重复注册
    MultizoneProhibited = 453,
    /// 注册中心有响应但应答损坏或报告内部错误
    ServerError = 454,
    /// 映射器全局状态为关闭
    Off = 455,
    /// 未知错误
    Unknown = 499,
}

impl fmt::Display for LbosStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl LbosStatus {
    /// 获取状态码的数字值
    #[inline]
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// 从数字值创建状态码
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            200 => Some(LbosStatus::Success),
            400 => Some(LbosStatus::BadRequest),
            404 => Some(LbosStatus::NotFound),
            450 => Some(LbosStatus::NoLbos),
            451 => Some(LbosStatus::DnsResolve),
            452 => Some(LbosStatus::InvalidArgs),
            453 => Some(LbosStatus::MultizoneProhibited),
            454 => Some(LbosStatus::ServerError),
            455 => Some(LbosStatus::Off),
            499 => Some(LbosStatus::Unknown),
            _ => None,
        }
    }

    /// 获取状态码的英文标识符
    pub fn as_str(&self) -> &'static str {
        match self {
            LbosStatus::Success => "SUCCESS",
            LbosStatus::BadRequest => "BAD_REQUEST",
            LbosStatus::NotFound => "NOT_FOUND",
            LbosStatus::NoLbos => "NO_LBOS",
            LbosStatus::DnsResolve => "DNS_RESOLVE_ERROR",
            LbosStatus::InvalidArgs => "INVALID_ARGS",
            LbosStatus::MultizoneProhibited => "MULTIZONE_ANNOUNCE_PROHIBITED",
            LbosStatus::ServerError => "SERVER_ERROR",
            LbosStatus::Off => "OFF",
            LbosStatus::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// 判断是否为可重试的状态
    ///
    /// 单个注册中心地址失败在取候选时已经透明换址重试过，
    /// 这里的"可重试"指整个操作在稍后重新发起是否有意义。
    pub fn is_retryable(&self) -> bool {
        matches!(self, LbosStatus::NoLbos | LbosStatus::ServerError)
    }
}
