//! LBOS 映射器统一错误类型

use super::code::LbosStatus;
use thiserror::Error;

/// LBOS 映射器统一错误类型
///
/// 每个变体对应一个 [`LbosStatus`]；携带 `answer` 的变体会保留
/// 注册中心的原始应答正文，供调用方诊断（NoLBOS 路径上没有应答，
/// `answer()` 返回 `None`）。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LbosError {
    /// 服务不存在，或注册中心判定健康检查地址不可达
    #[error("未找到 [404] {message}")]
    NotFound {
        message: String,
        answer: Option<String>,
    },

    /// 所有注册中心地址均无响应
    #[error("没有可用的注册中心 [450]")]
    NoLbos,

    /// 调用方参数非法
    #[error("参数非法 [452] {0}")]
    InvalidArgs(String),

    /// 注册中心有响应但应答损坏或报告错误
    #[error("注册中心错误 [454] {message}")]
    ServerError {
        message: String,
        answer: Option<String>,
    },

    /// 映射器全局状态为关闭
    #[error("映射器已关闭 [455]")]
    Off,

    /// 本机地址解析失败
    #[error("本机地址解析失败 [451] {0}")]
    DnsResolve(String),

    /// 同一实例禁止跨可用区重复注册
    #[error("禁止跨可用区注册 [453] {0}")]
    MultizoneProhibited(String),

    /// 注册中心拒绝了请求
    #[error("请求被拒绝 [400] {message}")]
    BadRequest {
        message: String,
        answer: Option<String>,
    },

    /// 未知错误
    #[error("未知错误 [499] {0}")]
    Unknown(String),
}

impl LbosError {
    /// 创建参数非法错误
    pub fn invalid_args(reason: impl Into<String>) -> Self {
        LbosError::InvalidArgs(reason.into())
    }

    /// 创建"未找到"错误
    pub fn not_found(message: impl Into<String>, answer: Option<String>) -> Self {
        LbosError::NotFound {
            message: message.into(),
            answer,
        }
    }

    /// 创建注册中心错误
    pub fn server_error(message: impl Into<String>, answer: Option<String>) -> Self {
        LbosError::ServerError {
            message: message.into(),
            answer,
        }
    }

    /// 创建本机地址解析错误
    pub fn dns_resolve(reason: impl Into<String>) -> Self {
        LbosError::DnsResolve(reason.into())
    }

    /// 创建未知错误
    pub fn unknown(reason: impl Into<String>) -> Self {
        LbosError::Unknown(reason.into())
    }

    /// 获取错误对应的状态码
    pub fn status(&self) -> LbosStatus {
        match self {
            LbosError::NotFound { .. } => LbosStatus::NotFound,
            LbosError::NoLbos => LbosStatus::NoLbos,
            LbosError::InvalidArgs(_) => LbosStatus::InvalidArgs,
            LbosError::ServerError { .. } => LbosStatus::ServerError,
            LbosError::Off => LbosStatus::Off,
            LbosError::DnsResolve(_) => LbosStatus::DnsResolve,
            LbosError::MultizoneProhibited(_) => LbosStatus::MultizoneProhibited,
            LbosError::BadRequest { .. } => LbosStatus::BadRequest,
            LbosError::Unknown(_) => LbosStatus::Unknown,
        }
    }

    /// 获取注册中心的原始应答正文（如果有）
    pub fn answer(&self) -> Option<&str> {
        match self {
            LbosError::NotFound { answer, .. }
            | LbosError::ServerError { answer, .. }
            | LbosError::BadRequest { answer, .. } => answer.as_deref(),
            _ => None,
        }
    }

    /// 判断是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        self.status().is_retryable()
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, LbosError>;
