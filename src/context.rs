//! 进程级发现上下文
//!
//! 把全局可变状态（注册中心地址列表、初始化状态、IP 缓存、
//! 已注册实例表）收拢到一个显式的 [`LbosContext`] 中，由进程持有
//! 并注入各组件，而不是散落的模块级静态量。

use crate::address;
use crate::cache::IpCache;
use crate::config::LbosConfig;
use crate::registry::announce::{AnnounceKey, AnnouncementRecord};
use crate::transport::{HttpLbosTransport, HttpMethod, LbosTransport};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// 本映射器在通用解析框架中的名字标签
pub const MAPPER_NAME: &str = "lbos";

/// 初始化探活路径：任何 HTTP 应答都算地址存活
const HEALTH_PATH: &str = "/lbos/health";

/// 全局初始化状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    /// 尚未尝试初始化
    Uninitialized,
    /// 初始化成功，发现与注册可用
    On,
    /// 初始化失败，所有发现调用立即返回空
    Off,
}

/// 初始化状态与地址列表放在同一把锁下
///
/// 进入初始化即构造地址列表，保证任何发现逻辑运行时列表都已就绪
/// （可能为空，但绝不缺失）。
struct InitInner {
    state: InitState,
    addresses: Vec<String>,
}

/// 进程级发现上下文
pub struct LbosContext {
    config: LbosConfig,
    transport: Arc<dyn LbosTransport>,
    init: Mutex<InitInner>,
    ip_cache: IpCache,
    pub(crate) announcements: RwLock<HashMap<AnnounceKey, AnnouncementRecord>>,
    /// 测试用本机地址覆盖；生产路径走 `cache::local_host_addr`
    local_host_override: RwLock<Option<String>>,
}

impl LbosContext {
    /// 使用默认 HTTP 传输创建上下文
    pub fn new(config: LbosConfig) -> Self {
        Self::with_transport(config, Arc::new(HttpLbosTransport::new()))
    }

    /// 注入自定义传输创建上下文
    pub fn with_transport(config: LbosConfig, transport: Arc<dyn LbosTransport>) -> Self {
        Self {
            config,
            transport,
            init: Mutex::new(InitInner {
                state: InitState::Uninitialized,
                addresses: Vec::new(),
            }),
            ip_cache: IpCache::new(),
            announcements: RwLock::new(HashMap::new()),
            local_host_override: RwLock::new(None),
        }
    }

    /// 配置
    pub fn config(&self) -> &LbosConfig {
        &self.config
    }

    /// 传输层
    pub fn transport(&self) -> &Arc<dyn LbosTransport> {
        &self.transport
    }

    /// IP 缓存
    pub fn ip_cache(&self) -> &IpCache {
        &self.ip_cache
    }

    /// 当前可用区（角色 + 域名）
    pub fn current_zone(&self) -> Option<String> {
        address::current_zone(&self.config)
    }

    /// 确保完成一次初始化，返回最终状态是否为 On
    ///
    /// 首个调用方持锁构造地址列表并逐个探活；并发调用方阻塞在锁上，
    /// 醒来后直接观察到终态，不会重复初始化。一旦进入 Off，
    /// 普通发现调用不再隐式重试，恢复走 [`reinitialize`](Self::reinitialize)。
    pub async fn ensure_initialized(&self) -> bool {
        let mut inner = self.init.lock().await;
        if inner.state != InitState::Uninitialized {
            return inner.state == InitState::On;
        }
        self.run_initialization(&mut inner).await;
        inner.state == InitState::On
    }

    /// 显式重新初始化（长生命周期进程的恢复路径）
    pub async fn reinitialize(&self) -> bool {
        let mut inner = self.init.lock().await;
        inner.state = InitState::Uninitialized;
        self.run_initialization(&mut inner).await;
        inner.state == InitState::On
    }

    async fn run_initialization(&self, inner: &mut InitInner) {
        if inner.addresses.is_empty() {
            inner.addresses = address::resolve_addresses(&self.config);
        }
        if inner.addresses.is_empty() {
            warn!("no lbos address could be composed, mapper is off");
            inner.state = InitState::Off;
            return;
        }

        for addr in &inner.addresses {
            let url = format!("{}{}", addr, HEALTH_PATH);
            match self
                .transport
                .request(HttpMethod::Get, &url, &HashMap::new())
                .await
            {
                Ok(_) => {
                    info!(address = %addr, "lbos registry reachable, mapper is on");
                    inner.state = InitState::On;
                    return;
                }
                Err(e) => {
                    warn!(address = %addr, error = %e, "lbos registry not responding");
                }
            }
        }

        warn!("no lbos registry responded during initialization, mapper is off");
        inner.state = InitState::Off;
    }

    /// 当前初始化状态
    pub async fn init_state(&self) -> InitState {
        self.init.lock().await.state
    }

    /// 地址列表快照（初始化成功后非空且不再变化）
    pub async fn addresses(&self) -> Vec<String> {
        self.init.lock().await.addresses.clone()
    }

    /// 测试用：直接覆盖地址列表并把状态置为 On
    pub async fn override_addresses(&self, addresses: Vec<String>) {
        let mut inner = self.init.lock().await;
        inner.addresses = addresses;
        inner.state = if inner.addresses.is_empty() {
            InitState::Off
        } else {
            InitState::On
        };
    }

    /// 解析本机对外地址，测试可通过覆盖值注入
    pub async fn local_host(&self) -> Option<String> {
        if let Some(host) = self.local_host_override.read().await.clone() {
            if host.is_empty() {
                return None;
            }
            return Some(host);
        }
        let probe = self.init.lock().await.addresses.first().cloned();
        crate::cache::local_host_addr(probe.as_deref())
    }

    /// 测试用：覆盖本机地址解析结果（`Some("")` 可模拟解析失败）
    pub async fn set_local_host_override(&self, host: Option<String>) {
        *self.local_host_override.write().await = host;
    }

    /// 已注册实例数量
    pub async fn announcement_count(&self) -> usize {
        self.announcements.read().await.len()
    }

    /// 已注册实例记录的快照
    pub async fn announced(&self) -> Vec<AnnouncementRecord> {
        self.announcements.read().await.values().cloned().collect()
    }
}
