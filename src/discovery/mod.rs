//! 服务发现
//!
//! 候选实例模型、单轮拉取与对外的拉取式迭代器。

pub mod candidate;
pub mod fetch;
pub mod iterator;

pub use candidate::{CandidateMeta, ServiceCandidate};
pub use iterator::{LbosMapper, ServiceIter};
