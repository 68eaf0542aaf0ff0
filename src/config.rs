//! 映射器配置
//!
//! 从 TOML 文件或代码装配 [`LbosConfig`]。注册中心地址可以显式指定，
//! 也可以在运行时由角色/域名文件推导（见 `address` 模块）。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 默认角色文件路径
fn default_role_file() -> String {
    "/etc/ncbi/role".to_string()
}

/// 默认域名文件路径
fn default_domain_file() -> String {
    "/etc/ncbi/domain".to_string()
}

/// LBOS 映射器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LbosConfig {
    /// 显式指定的注册中心地址；设置后不再读取角色/域名文件
    #[serde(default)]
    pub lbos_address: Option<String>,

    /// 静态兜底地址，排在推导地址之后
    #[serde(default)]
    pub fallback_addresses: Vec<String>,

    /// 角色文件路径
    #[serde(default = "default_role_file")]
    pub role_file: String,

    /// 域名文件路径
    #[serde(default = "default_domain_file")]
    pub domain_file: String,

    /// 注册中心级 DTab（合并时优先级最低）
    #[serde(default)]
    pub dtab: Option<String>,

    /// 版本过滤规则：逗号分隔的版本边界，空表示不过滤
    #[serde(default)]
    pub accepted_versions: Option<String>,

    /// 命名的注册段，供 `announce_from_config` 使用
    #[serde(default)]
    pub announce: HashMap<String, AnnounceSection>,
}

/// 配置文件中的一个注册段
///
/// 字段刻意保持字符串形态，端口是否为数字、是否越界等校验
/// 由注册流程统一完成，而不是在反序列化阶段被拦截。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnnounceSection {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub healthcheck: Option<String>,
}

impl Default for LbosConfig {
    fn default() -> Self {
        Self {
            lbos_address: None,
            fallback_addresses: Vec::new(),
            role_file: default_role_file(),
            domain_file: default_domain_file(),
            dtab: None,
            accepted_versions: None,
            announce: HashMap::new(),
        }
    }
}

impl LbosConfig {
    /// 从 TOML 文件加载配置
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: LbosConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// 使用显式注册中心地址构造配置
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            lbos_address: Some(address.into()),
            ..Self::default()
        }
    }
}
