//! 集成测试公共设施
//!
//! 提供可编程的模拟传输层和基于 axum 的假 LBOS 注册中心。

#![allow(dead_code)]

use async_trait::async_trait;
use lbos_mapper::{
    HttpMethod, LbosConfig, LbosContext, LbosTransport, RegistryResponse, TransportError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

/// 初始化测试日志订阅器，RUST_LOG 控制级别，重复调用无害
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// 模拟传输层记录下来的一次请求
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
}

/// 一条应答规则
enum Rule {
    /// URL 包含给定子串时返回固定应答
    Respond {
        url_part: String,
        status: u16,
        body: String,
    },
    /// URL 包含给定子串时模拟连接层失败
    Refuse { url_part: String },
}

/// 可编程的模拟传输层
///
/// 规则按添加顺序匹配，第一条命中的规则生效；
/// 没有规则命中时视为地址不可达（连接层失败）。
#[derive(Default)]
pub struct MockTransport {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// URL 包含 `url_part` 时返回给定状态码和正文
    pub fn respond(&self, url_part: &str, status: u16, body: &str) {
        self.rules.lock().unwrap().push(Rule::Respond {
            url_part: url_part.to_string(),
            status,
            body: body.to_string(),
        });
    }

    /// URL 包含 `url_part` 时模拟连接失败
    pub fn refuse(&self, url_part: &str) {
        self.rules.lock().unwrap().push(Rule::Refuse {
            url_part: url_part.to_string(),
        });
    }

    /// 清空全部规则
    pub fn clear_rules(&self) {
        self.rules.lock().unwrap().clear();
    }

    /// 全部已记录的请求
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// URL 包含给定子串的请求数
    pub fn calls_to(&self, url_part: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.url.contains(url_part))
            .count()
    }
}

#[async_trait]
impl LbosTransport for MockTransport {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        headers: &HashMap<String, String>,
    ) -> Result<RegistryResponse, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            url: url.to_string(),
            headers: headers.clone(),
        });

        let rules = self.rules.lock().unwrap();
        for rule in rules.iter() {
            match rule {
                Rule::Respond {
                    url_part,
                    status,
                    body,
                } if url.contains(url_part.as_str()) => {
                    return Ok(RegistryResponse {
                        status: *status,
                        body: body.clone(),
                    });
                }
                Rule::Refuse { url_part } if url.contains(url_part.as_str()) => {
                    return Err(format!("connection refused: {url}"));
                }
                _ => {}
            }
        }
        Err(format!("connection refused: {url}"))
    }
}

/// 测试用注册中心地址
pub const LBOS_PRIMARY: &str = "http://lbos-1.test";
pub const LBOS_SECONDARY: &str = "http://lbos-2.test";

/// 用模拟传输构造已初始化（On）的上下文
pub async fn test_context(transport: Arc<MockTransport>) -> Arc<LbosContext> {
    init_tracing();
    let context = Arc::new(LbosContext::with_transport(
        LbosConfig::default(),
        transport,
    ));
    context
        .override_addresses(vec![LBOS_PRIMARY.to_string(), LBOS_SECONDARY.to_string()])
        .await;
    context
}

/// 同上，但使用自定义配置
pub async fn test_context_with_config(
    transport: Arc<MockTransport>,
    config: LbosConfig,
) -> Arc<LbosContext> {
    init_tracing();
    let context = Arc::new(LbosContext::with_transport(config, transport));
    context
        .override_addresses(vec![LBOS_PRIMARY.to_string(), LBOS_SECONDARY.to_string()])
        .await;
    context
}

/// 三个候选实例的标准应答正文
pub fn three_candidates_body() -> String {
    r#"[
        {"host": "10.0.0.1", "port": 8080, "rate": 1.0, "type": "HTTP"},
        {"host": "10.0.0.2", "port": 8081, "rate": 1.0, "type": "HTTP"},
        {"host": "10.0.0.3", "port": 8082, "rate": 0.5, "type": "STANDALONE"}
    ]"#
    .to_string()
}

pub mod fake_lbos {
    //! 基于 axum 的假 LBOS 注册中心
    //!
    //! 提供健康检查、发现、注册/注销端点，注册表存在内存里，
    //! 用于走真实 HTTP 传输的端到端测试。

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub struct FakeLbosState {
        /// (service, version, host, port) -> healthcheck url
        pub announced: Arc<Mutex<HashMap<(String, String, String, u16), String>>>,
    }

    /// 启动假注册中心，返回基地址和状态句柄
    pub async fn spawn() -> (String, FakeLbosState) {
        let state = FakeLbosState::default();
        let app = Router::new()
            .route("/lbos/health", get(|| async { "OK" }))
            .route("/lbos/v3/services", get(list_services))
            .route(
                "/lbos/v3/announce",
                axum::routing::put(announce).delete(deannounce),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake lbos");
        let addr: SocketAddr = listener.local_addr().expect("no local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake lbos died");
        });
        (format!("http://{}", addr), state)
    }

    async fn list_services(
        State(state): State<FakeLbosState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let name = params.get("name").cloned().unwrap_or_default();
        let announced = state.announced.lock().unwrap();
        let candidates: Vec<Value> = announced
            .keys()
            .filter(|(service, _, _, _)| *service == name)
            .map(|(_, version, host, port)| {
                json!({"host": host, "port": port, "version": version})
            })
            .collect();
        if candidates.is_empty() {
            return (StatusCode::NOT_FOUND, Json(json!({"error": "not found"})));
        }
        (StatusCode::OK, Json(Value::Array(candidates)))
    }

    async fn announce(
        State(state): State<FakeLbosState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let get = |k: &str| params.get(k).cloned().unwrap_or_default();
        let port: u16 = match get("port").parse() {
            Ok(p) => p,
            Err(_) => return (StatusCode::BAD_REQUEST, Json(json!({"error": "bad port"}))),
        };
        state.announced.lock().unwrap().insert(
            (get("name"), get("version"), get("host"), port),
            get("check"),
        );
        (StatusCode::OK, Json(json!({"watcher": "ok"})))
    }

    async fn deannounce(
        State(state): State<FakeLbosState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        let get = |k: &str| params.get(k).cloned().unwrap_or_default();
        let port: u16 = get("port").parse().unwrap_or(0);
        let removed = state
            .announced
            .lock()
            .unwrap()
            .remove(&(get("name"), get("version"), get("host"), port))
            .is_some();
        if removed {
            (StatusCode::OK, Json(json!({"removed": true})))
        } else {
            (StatusCode::NOT_FOUND, Json(json!({"error": "not announced"})))
        }
    }
}
