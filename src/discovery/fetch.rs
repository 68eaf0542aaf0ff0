//! 候选实例拉取
//!
//! 单轮发现：按顺序尝试注册中心地址列表，解析应答中的候选实例，
//! 逐条跳过无法解析的记录，按需要打乱结果顺序。

use crate::context::LbosContext;
use crate::discovery::candidate::ServiceCandidate;
use crate::dtab::{self, NetInfo, RequestContext};
use crate::error::{LbosError, Result};
use crate::transport::HttpMethod;
use crate::version::VersionRange;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use tracing::{debug, warn};

/// DTab 覆写头
pub const DTAB_HEADER: &str = "DTab-Local";

/// 拉取一个服务的候选实例列表
///
/// 逐个尝试地址列表中的注册中心；连接失败或非成功状态换下一个地址，
/// 全部失败返回 `NoLbos`；注册中心明确应答 404 则立即返回 `NotFound`。
pub async fn fetch_candidates(
    context: &LbosContext,
    service: &str,
    net_info: &NetInfo,
    request: &RequestContext,
) -> Result<Vec<ServiceCandidate>> {
    let addresses = context.addresses().await;
    if addresses.is_empty() {
        return Err(LbosError::NoLbos);
    }

    let headers = build_headers(context, net_info, request);

    for addr in &addresses {
        // 服务名可含 '/' 等保留字符，交给 Url 做查询串编码
        let url = match reqwest::Url::parse_with_params(
            &format!("{}/lbos/v3/services", addr),
            [("name", service)],
        ) {
            Ok(u) => u,
            Err(e) => {
                debug!(address = %addr, error = %e, "lbos address is not a valid url, trying next");
                continue;
            }
        };
        let response = match context
            .transport()
            .request(HttpMethod::Get, url.as_str(), &headers)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!(address = %addr, error = %e, "lbos address unreachable, trying next");
                continue;
            }
        };

        if response.status == 404 {
            return Err(LbosError::not_found(
                format!("service '{}' not found", service),
                Some(response.body),
            ));
        }
        if !response.is_success() {
            debug!(
                address = %addr,
                status = response.status,
                "lbos returned error status, trying next address"
            );
            continue;
        }

        let mut candidates = parse_candidates(&response.body);
        filter_by_accepted_versions(context, &mut candidates);
        if service.starts_with('/') {
            candidates.shuffle(&mut rand::thread_rng());
        }
        debug!(service = %service, count = candidates.len(), "candidates fetched");
        return Ok(candidates);
    }

    Err(LbosError::NoLbos)
}

/// 组装请求头：合并后的 DTab 加上连接信息携带的自定义头
pub(crate) fn build_headers(
    context: &LbosContext,
    net_info: &NetInfo,
    request: &RequestContext,
) -> HashMap<String, String> {
    let mut headers = net_info.custom_headers.clone();
    let merged = dtab::merge(
        context.config().dtab.as_deref(),
        net_info.dtab.as_deref(),
        request.dtab.as_deref(),
    );
    if let Some(merged) = merged {
        headers.insert(DTAB_HEADER.to_string(), merged);
    }
    headers
}

/// 解析候选列表，坏记录逐条跳过
fn parse_candidates(body: &str) -> Vec<ServiceCandidate> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "candidate list body is not a json array");
            return Vec::new();
        }
    };

    let mut candidates = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<ServiceCandidate>(entry) {
            Ok(c) => candidates.push(c),
            Err(e) => {
                warn!(error = %e, "skipping malformed candidate record");
            }
        }
    }
    candidates
}

/// 按配置的版本区间过滤候选实例（未配置或版本缺失时不过滤）
fn filter_by_accepted_versions(context: &LbosContext, candidates: &mut Vec<ServiceCandidate>) {
    let Some(spec) = context.config().accepted_versions.as_deref() else {
        return;
    };
    let range = match VersionRange::parse(spec) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "invalid accepted_versions spec, skipping version filter");
            return;
        }
    };
    candidates.retain(|c| match c.version.as_deref() {
        Some(v) => match v.parse() {
            Ok(parsed) => range.contains(&parsed),
            Err(_) => true,
        },
        None => true,
    });
}
