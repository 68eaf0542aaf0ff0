//! LBOS Mapper Client Library
//!
//! Provides service discovery against an HTTP-based LBOS registry: candidate
//! lookup with multi-address failover, a pull-based service iterator,
//! announce/deannounce lifecycle management, and an IP resolution cache.

pub mod address;
pub mod cache;
pub mod config;
pub mod context;
pub mod discovery;
pub mod dtab;
pub mod error;
pub mod registry;
pub mod transport;
pub mod version;

// Re-exports
pub use config::{AnnounceSection, LbosConfig};
pub use context::{InitState, LbosContext, MAPPER_NAME};
pub use error::{LbosError, LbosStatus, Result};

// 发现侧 re-exports
pub use cache::IpCache;
pub use discovery::{CandidateMeta, LbosMapper, ServiceCandidate, ServiceIter};
pub use dtab::{NetInfo, RequestContext};
pub use version::{Version, VersionRange};

// 注册侧 re-exports
pub use registry::{AnnounceKey, AnnouncementRecord, Announcer, ServiceVersionInfo, VersionConfigurer};
pub use transport::{HttpLbosTransport, HttpMethod, LbosTransport, RegistryResponse, TransportError};
