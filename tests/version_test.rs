//! 版本解析与生效区间测试

use lbos_mapper::{Version, VersionRange};

fn v(s: &str) -> Version {
    s.parse().expect("version should parse")
}

/// 测试：版本串解析
#[test]
fn test_version_parse() {
    assert_eq!(v("1.0.0"), Version::new(1, 0, 0));
    assert_eq!(v("0.12.345"), Version::new(0, 12, 345));
    assert_eq!(v(" 2.3.4 "), Version::new(2, 3, 4));
}

/// 测试：非法版本串被拒绝
#[test]
fn test_version_parse_rejects_malformed() {
    for bad in ["", "1", "1.0", "1.0.0.0", "a.b.c", "1..0", "1.0.x", "-1.0.0", "1.0.0-rc1"] {
        assert!(
            bad.parse::<Version>().is_err(),
            "'{}' should not parse",
            bad
        );
    }
}

/// 测试：版本比较按 (major, minor, patch) 数值字典序
#[test]
fn test_version_ordering_is_numeric() {
    assert!(v("1.0.2") < v("1.0.10"));
    assert!(v("1.9.0") < v("1.10.0"));
    assert!(v("2.0.0") > v("1.99.99"));
    assert_eq!(v("1.2.3"), v("1.2.3"));
}

/// 测试：空区间规则表示始终生效
#[test]
fn test_empty_range_always_active() {
    let range = VersionRange::parse("").expect("empty spec should parse");
    assert!(range.is_empty());
    assert!(range.contains(&v("0.0.1")));
    assert!(range.contains(&v("99.99.99")));
}

/// 测试：单边界区间，边界之前不生效
#[test]
fn test_single_boundary_band() {
    let range = VersionRange::parse("1.0.0").expect("spec should parse");
    assert!(!range.contains(&v("0.0.2")));
    assert!(!range.contains(&v("0.9.9")));
    assert!(range.contains(&v("1.0.0")));
    assert!(range.contains(&v("1.0.5")));
    assert!(range.contains(&v("34.0.0")));
}

/// 测试：双边界区间，[v1, v2) 生效
#[test]
fn test_two_boundary_bands() {
    let range = VersionRange::parse("1.0.0, 1.0.2").expect("spec should parse");
    assert!(!range.contains(&v("0.0.2")));
    assert!(range.contains(&v("1.0.0")));
    assert!(range.contains(&v("1.0.1")));
    assert!(!range.contains(&v("1.0.2")));
    assert!(!range.contains(&v("1.0.3")));
}

/// 测试：三边界区间，最后一个边界之后重新生效
#[test]
fn test_three_boundary_bands() {
    let range = VersionRange::parse("1.0.0,1.0.2,1.0.4").expect("spec should parse");
    assert!(!range.contains(&v("0.9.9")));
    assert!(range.contains(&v("1.0.0")));
    assert!(range.contains(&v("1.0.1")));
    assert!(!range.contains(&v("1.0.2")));
    assert!(!range.contains(&v("1.0.3")));
    assert!(range.contains(&v("1.0.4")));
    assert!(range.contains(&v("2.0.0")));
}

/// 测试：四边界区间交替生效
#[test]
fn test_four_boundary_bands() {
    let range = VersionRange::parse("1.0.0, 1.0.2, 1.0.4, 1.0.6").expect("spec should parse");
    assert!(!range.contains(&v("0.0.1")));
    assert!(range.contains(&v("1.0.1")));
    assert!(!range.contains(&v("1.0.3")));
    assert!(range.contains(&v("1.0.5")));
    assert!(!range.contains(&v("1.0.6")));
    assert!(!range.contains(&v("9.0.0")));
}

/// 测试：边界无序给出时排序后再分段
#[test]
fn test_boundaries_are_sorted_before_banding() {
    let range = VersionRange::parse("1.0.2, 1.0.0").expect("spec should parse");
    assert!(range.contains(&v("1.0.1")));
    assert!(!range.contains(&v("1.0.2")));
}

/// 测试：规则里的坏版本串导致整体解析失败
#[test]
fn test_range_parse_rejects_bad_boundary() {
    assert!(VersionRange::parse("1.0.0, oops").is_err());
}
