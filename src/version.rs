//! 语义版本解析与生效区间判定
//!
//! 版本串格式为 `major.minor.patch`，仅接受 ASCII 数字。
//! 生效区间由逗号分隔的版本边界定义：边界排序后把版本轴切成
//! 交替的左闭右开区间，第一个边界之前不生效，[v1, v2) 生效，
//! [v2, v3) 不生效，依此类推；空规则表示始终生效。

use crate::error::{LbosError, Result};
use std::fmt;
use std::str::FromStr;

/// 三段式语义版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// 直接构造版本
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = LbosError;

    fn from_str(s: &str) -> Result<Self> {
        let mut fields = s.trim().split('.');
        let mut next_field = |name: &str| -> Result<u32> {
            let field = fields
                .next()
                .ok_or_else(|| LbosError::invalid_args(format!("version missing {name}: {s}")))?;
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
                return Err(LbosError::invalid_args(format!(
                    "version field not numeric: {s}"
                )));
            }
            field
                .parse::<u32>()
                .map_err(|_| LbosError::invalid_args(format!("version field out of range: {s}")))
        };

        let major = next_field("major")?;
        let minor = next_field("minor")?;
        let patch = next_field("patch")?;
        if fields.next().is_some() {
            return Err(LbosError::invalid_args(format!(
                "version has extra fields: {s}"
            )));
        }
        Ok(Version::new(major, minor, patch))
    }
}

/// 版本生效区间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    boundaries: Vec<Version>,
}

impl VersionRange {
    /// 解析逗号分隔的边界列表；空串得到"始终生效"的区间
    pub fn parse(spec: &str) -> Result<Self> {
        let mut boundaries = Vec::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            boundaries.push(part.parse::<Version>()?);
        }
        boundaries.sort();
        Ok(Self { boundaries })
    }

    /// 判断版本是否落在生效区间内
    pub fn contains(&self, version: &Version) -> bool {
        if self.boundaries.is_empty() {
            return true;
        }
        let passed = self.boundaries.iter().filter(|b| *b <= version).count();
        passed % 2 == 1
    }

    /// 边界数量
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// 是否为空规则（始终生效）
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }
}
