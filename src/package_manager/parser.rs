//! pip 输出解析函数

use super::types::OutdatedPackage;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// `pip check` 没有发现问题时的输出
pub const NO_BROKEN_REQUIREMENTS: &str = "No broken requirements found.";

/// 升级后与其他包版本要求冲突的包，捕获组为提出要求的包名
const CONFLICT_PATTERN: &str = r"^(\S+) \S+ requires .+ but you have .+ incompatible";

/// `pip check` 报告的缺失依赖，捕获组为缺失的包名
const MISSING_PATTERN: &str = r"^\S+ \S+ requires ([^,\s]+), which is not installed";

static CONFLICT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CONFLICT_PATTERN).expect("conflict pattern is valid"));

static MISSING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MISSING_PATTERN).expect("missing pattern is valid"));

/// 解析 `pip list --outdated --format=json` 的输出
pub fn parse_outdated(output: &str) -> Result<Vec<OutdatedPackage>, serde_json::Error> {
    serde_json::from_str(output.trim())
}

/// 按 pip 报告的顺序提取包名
pub fn outdated_names(packages: &[OutdatedPackage]) -> Vec<String> {
    packages.iter().map(|p| p.name.clone()).collect()
}

/// 从升级命令的 stderr 中提取版本冲突的包名（去重）
pub fn find_conflicts(output: &str) -> BTreeSet<String> {
    capture_names(&CONFLICT_RE, output)
}

/// 从 `pip check` 的输出中提取缺失的依赖包名（去重）
pub fn find_missing(output: &str) -> BTreeSet<String> {
    capture_names(&MISSING_RE, output)
}

/// `pip check` 输出是否为“无问题”
pub fn is_healthy(output: &str) -> bool {
    output.trim() == NO_BROKEN_REQUIREMENTS
}

/// 每行取第一个匹配的第一个捕获组
fn capture_names(re: &Regex, output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| re.captures(line.trim()))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
