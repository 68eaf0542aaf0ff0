//! 注册中心地址解析
//!
//! 每个进程只解析一次：显式配置优先，其次由角色/域名文件推导出
//! 当前可用区对应的单一地址，最后追加静态兜底地址。
//! 文件缺失或内容异常不会报错，只是得不到推导地址。

use crate::config::LbosConfig;
use tracing::debug;

/// 解析出有序的注册中心地址列表
///
/// 顺序固定：显式覆盖地址、角色/域名推导地址、静态兜底地址。
pub fn resolve_addresses(config: &LbosConfig) -> Vec<String> {
    let mut addresses = Vec::new();

    if let Some(custom) = &config.lbos_address {
        // 有显式地址时不读角色/域名文件
        addresses.push(custom.clone());
    } else if let Some(zone) = current_zone(config) {
        addresses.push(format!("http://lbos.{}", zone));
    }

    for fallback in &config.fallback_addresses {
        if !addresses.contains(fallback) {
            addresses.push(fallback.clone());
        }
    }

    debug!(count = addresses.len(), "resolved lbos address list");
    addresses
}

/// 由角色/域名文件推导当前可用区
///
/// 任一文件不可读或内容非法时返回 `None`，由调用方走"无注册中心"路径。
pub fn current_zone(config: &LbosConfig) -> Option<String> {
    let role = read_value(&config.role_file)?;
    let domain = read_value(&config.domain_file)?;
    Some(format!("{}.{}", role, domain))
}

/// 读取单值文件：取首行并去空白，空值或含内部空白视为非法
fn read_value(path: &str) -> Option<String> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            debug!(path, error = %e, "zone file unreadable");
            return None;
        }
    };
    let value = content.lines().next().unwrap_or("").trim();
    if value.is_empty() || value.contains(char::is_whitespace) {
        debug!(path, "zone file content malformed");
        return None;
    }
    Some(value.to_string())
}
