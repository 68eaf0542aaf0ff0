//! 服务候选实例定义

use crate::error::{LbosError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 通过通用元数据接口禁止写入的保留键
const RESERVED_KEYS: [&str; 6] = ["version", "ip", "port", "check", "format", "name"];

/// 一次发现返回的服务候选实例
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceCandidate {
    /// 主机名或 IP
    pub host: String,

    /// 端口
    pub port: u16,

    /// 权重（注册中心的 rate 字段）
    #[serde(default)]
    pub rate: f64,

    /// 服务类型（如 "HTTP", "STANDALONE"）
    #[serde(rename = "type", default)]
    pub server_type: Option<String>,

    /// 版本
    #[serde(default)]
    pub version: Option<String>,

    /// 附加元数据
    #[serde(flatten)]
    pub meta: CandidateMeta,
}

/// 候选实例的附加元数据
///
/// 保留键（version、ip、port、check、format、name）由结构体的
/// 具名字段承载，通用键值表只接受其余键，键一律折叠为小写。
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CandidateMeta {
    /// 通用键值元数据
    #[serde(flatten)]
    extra: HashMap<String, String>,
}

impl ServiceCandidate {
    /// 创建新的候选实例
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            rate: 0.0,
            server_type: None,
            version: None,
            meta: CandidateMeta::default(),
        }
    }

    /// 设置服务类型
    pub fn with_type(mut self, server_type: impl Into<String>) -> Self {
        self.server_type = Some(server_type.into());
        self
    }

    /// 设置版本
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// "host:port" 形式的地址
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl CandidateMeta {
    /// 写入一个通用元数据键值
    ///
    /// 键折叠为小写存储。保留键和带空白字符的值都被拒绝。
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let key = key.to_ascii_lowercase();
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(LbosError::invalid_args(format!(
                "metadata key '{}' is reserved",
                key
            )));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(LbosError::invalid_args(format!(
                "metadata value for '{}' contains whitespace",
                key
            )));
        }
        self.extra.insert(key, value.to_string());
        Ok(())
    }

    /// 读取一个元数据值（键不区分大小写）
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(&key.to_ascii_lowercase()).map(String::as_str)
    }

    /// 删除一个元数据键，返回是否存在
    pub fn remove(&mut self, key: &str) -> bool {
        self.extra.remove(&key.to_ascii_lowercase()).is_some()
    }

    /// 元数据键数量
    pub fn len(&self) -> usize {
        self.extra.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.extra.is_empty()
    }

    /// 遍历全部键值
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
