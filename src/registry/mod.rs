//! 注册中心写路径
//!
//! 实例注册/注销的生命周期管理与服务版本配置端点。

pub mod announce;
pub mod configure;

pub use announce::{AnnounceKey, AnnouncementRecord, Announcer};
pub use configure::{ServiceVersionInfo, VersionConfigurer};
