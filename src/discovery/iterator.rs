//! 拉取式服务迭代器
//!
//! 对外的发现入口：`LbosMapper::open` 打开一个迭代器，
//! `next_info` 逐个取出候选实例，`reset` 清空缓冲，`close` 释放。
//! 单个迭代器不支持多线程并发调用，不同迭代器相互独立。

use crate::config::LbosConfig;
use crate::context::{LbosContext, MAPPER_NAME};
use crate::discovery::candidate::ServiceCandidate;
use crate::discovery::fetch;
use crate::dtab::{NetInfo, RequestContext};
use std::sync::Arc;
use tracing::{debug, info};

/// LBOS 服务发现映射器
pub struct LbosMapper {
    context: Arc<LbosContext>,
}

/// 迭代器内部的拉取状态，可被 `reset` 清空后惰性重建
struct IterData {
    candidates: Vec<ServiceCandidate>,
    position: usize,
    fetched: bool,
}

impl IterData {
    fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            position: 0,
            fetched: false,
        }
    }
}

/// 一次 `open` 返回的服务迭代器
pub struct ServiceIter {
    context: Arc<LbosContext>,
    mapper: String,
    service: String,
    net_info: NetInfo,
    request: RequestContext,
    data: Option<IterData>,
}

impl LbosMapper {
    /// 使用独立配置创建映射器（内部新建上下文）
    pub fn new(config: LbosConfig) -> Self {
        Self {
            context: Arc::new(LbosContext::new(config)),
        }
    }

    /// 共享已有上下文创建映射器
    pub fn from_context(context: Arc<LbosContext>) -> Self {
        Self { context }
    }

    /// 上下文
    pub fn context(&self) -> &Arc<LbosContext> {
        &self.context
    }

    /// 打开一个服务的迭代器
    ///
    /// 通配符名无法解析为具体候选列表，直接返回 `None`；
    /// 传入 `db_name` 时追加为 `service/db` 再查询；
    /// 全局状态 Off 或注册中心明确报告服务不存在时返回 `None`。
    pub async fn open(
        &self,
        service: &str,
        net_info: NetInfo,
        db_name: Option<&str>,
    ) -> Option<ServiceIter> {
        if !self.context.ensure_initialized().await {
            debug!(service = %service, "mapper is off, open refused");
            return None;
        }
        if service.is_empty() || service.contains('*') || service.contains('?') {
            debug!(service = %service, "mask or empty service name, open refused");
            return None;
        }

        let full_name = match db_name {
            Some(db) if !db.is_empty() => format!("{}/{}", service, db),
            _ => service.to_string(),
        };

        let request = RequestContext::default();
        match fetch::fetch_candidates(&self.context, &full_name, &net_info, &request).await {
            Ok(candidates) => {
                info!(service = %full_name, count = candidates.len(), "iterator opened");
                Some(ServiceIter {
                    context: Arc::clone(&self.context),
                    mapper: MAPPER_NAME.to_string(),
                    service: full_name,
                    net_info,
                    request,
                    data: Some(IterData {
                        candidates,
                        position: 0,
                        fetched: true,
                    }),
                })
            }
            Err(e) => {
                debug!(service = %full_name, error = %e, "open failed");
                None
            }
        }
    }
}

impl ServiceIter {
    /// 所属映射器的名字标签
    pub fn mapper_name(&self) -> &str {
        &self.mapper
    }

    /// 覆盖映射器标签（通用解析框架集成点）
    pub fn with_mapper_tag(mut self, tag: impl Into<String>) -> Self {
        self.mapper = tag.into();
        self
    }

    /// 服务名（含 db 限定）
    pub fn service(&self) -> &str {
        &self.service
    }

    /// 修改本迭代器后续拉取使用的请求级 DTab
    pub fn set_request_dtab(&mut self, dtab: Option<String>) {
        self.request = RequestContext { dtab };
    }

    /// 取下一个候选实例
    ///
    /// 缓冲为空或刚被 `reset` 时同步触发一次拉取；拉取失败返回 `None`
    /// 且不改动状态。列表耗尽后持续返回 `None` 直到下一次 `reset`。
    /// 标签不属于本映射器的迭代器直接返回 `None`，无副作用。
    pub async fn next_info(&mut self) -> Option<ServiceCandidate> {
        if self.mapper != MAPPER_NAME {
            return None;
        }

        // 内部数据被外部清空时重建而不是崩溃
        let data = self.data.get_or_insert_with(IterData::empty);

        if !data.fetched {
            match fetch::fetch_candidates(&self.context, &self.service, &self.net_info, &self.request)
                .await
            {
                Ok(candidates) => {
                    data.candidates = candidates;
                    data.position = 0;
                    data.fetched = true;
                }
                Err(e) => {
                    debug!(service = %self.service, error = %e, "refetch failed");
                    return None;
                }
            }
        }

        if data.position >= data.candidates.len() {
            return None;
        }
        let mut candidate = data.candidates[data.position].clone();
        data.position += 1;

        self.resolve_host(&mut candidate).await;
        Some(candidate)
    }

    /// 清空候选缓冲和位置，不触发新的拉取
    pub fn reset(&mut self) {
        self.data = Some(IterData::empty());
    }

    /// 关闭迭代器，释放资源
    pub fn close(mut self) {
        self.data = None;
    }

    /// 主机名经 IP 缓存解析，失败时保留原值
    async fn resolve_host(&self, candidate: &mut ServiceCandidate) {
        let version = candidate.version.clone().unwrap_or_default();
        match self
            .context
            .ip_cache()
            .resolve(&candidate.host, candidate.port, &self.service, &version)
            .await
        {
            Ok(ip) => candidate.host = ip,
            Err(e) => {
                debug!(host = %candidate.host, error = %e, "host resolution failed, keeping name");
            }
        }
    }
}
