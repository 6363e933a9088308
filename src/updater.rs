//! 一次完整的更新流程：检查 → 升级 → 修复 → 清理缓存

use crate::package_manager::parser::{find_conflicts, find_missing, is_healthy, outdated_names};
use crate::package_manager::{CommandRunner, OutdatedPackage, PackageManager};
use anyhow::{Context, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy)]
pub struct UpdateOptions {
    /// 只列出过期包，不做任何修改
    pub dry_run: bool,
    pub repair: bool,
    pub purge_cache: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            repair: true,
            purge_cache: true,
        }
    }
}

/// 本次运行做了什么
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub outdated: Vec<OutdatedPackage>,
    pub upgraded: bool,
    /// 因版本冲突被强制重装的包
    pub reinstalled: BTreeSet<String>,
    /// 补装的缺失依赖
    pub installed_missing: BTreeSet<String>,
    pub cache_purged: bool,
}

impl RunSummary {
    /// 渲染为纯文本报告
    pub fn to_report(&self) -> String {
        let mut out = String::from("[=== 过期模块 ===]\n");
        if self.outdated.is_empty() {
            out.push_str("无\n");
        }
        for pkg in &self.outdated {
            out.push_str(&format!(
                "* {}: {} -> {} ({})\n",
                pkg.name, pkg.version, pkg.latest_version, pkg.latest_filetype
            ));
        }
        out.push('\n');
        out.push_str(&format!("已升级: {}\n", yes_no(self.upgraded)));
        out.push_str(&format!("冲突回滚: {}\n", format_names(&self.reinstalled)));
        out.push_str(&format!("补装依赖: {}\n", format_names(&self.installed_missing)));
        out.push_str(&format!("缓存已清理: {}\n", yes_no(self.cache_purged)));
        out
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "是"
    } else {
        "否"
    }
}

fn format_names(names: &BTreeSet<String>) -> String {
    if names.is_empty() {
        "无".to_string()
    } else {
        names.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn print_names<'a>(label: &str, names: impl IntoIterator<Item = &'a String>) {
    let names: Vec<&String> = names.into_iter().collect();
    if names.is_empty() {
        println!("{}: None", label);
    } else {
        println!("{}: {:?}", label, names);
    }
}

/// 按顺序执行整个流程，任何一步失败都会中止
pub fn run<R: CommandRunner>(pm: &PackageManager<R>, options: UpdateOptions) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    println!("=> Checking for outdated modules...");
    summary.outdated = pm.find_outdated().context("检查过期模块失败")?;
    let names = outdated_names(&summary.outdated);
    print_names("Old", &names);

    if options.dry_run {
        log::info!("dry-run 模式，跳过升级");
        return Ok(summary);
    }

    println!("=> Updating outdated modules...");
    let upgrade_output = pm.upgrade(&names).context("升级模块失败")?;
    if upgrade_output.is_none() {
        println!("New: None");
    }
    summary.upgraded = upgrade_output.is_some();

    if options.repair {
        let stderr = upgrade_output.map(|o| o.stderr).unwrap_or_default();
        summary.reinstalled = repair_conflicts(pm, &stderr)?;
        summary.installed_missing = repair_missing(pm)?;
    } else {
        log::info!("跳过依赖修复");
    }

    if options.purge_cache {
        println!("=> Clearing cached modules...");
        pm.purge_cache().context("清理缓存失败")?;
        summary.cache_purged = true;
    } else {
        log::info!("跳过缓存清理");
    }

    Ok(summary)
}

/// 从升级的 stderr 中找出版本冲突的包并强制重装；没有匹配时原样输出 stderr
pub fn repair_conflicts<R: CommandRunner>(
    pm: &PackageManager<R>,
    upgrade_stderr: &str,
) -> Result<BTreeSet<String>> {
    println!("=> Checking for incompatible modules...");
    let conflicts = find_conflicts(upgrade_stderr);
    print_names("Incompatible", &conflicts);

    if conflicts.is_empty() {
        if !upgrade_stderr.trim().is_empty() {
            eprint!("{}", upgrade_stderr);
        }
        return Ok(conflicts);
    }

    pm.force_reinstall(&conflicts).context("回滚冲突模块失败")?;
    Ok(conflicts)
}

/// 运行 pip check，安装报告为缺失的依赖
pub fn repair_missing<R: CommandRunner>(pm: &PackageManager<R>) -> Result<BTreeSet<String>> {
    println!("=> Checking for missing modules...");
    let output = pm.check().context("检查依赖失败")?;

    if is_healthy(&output.stdout) {
        print_names("Missing", &BTreeSet::<String>::new());
        return Ok(BTreeSet::new());
    }

    let missing = find_missing(&output.stdout);
    print_names("Missing", &missing);
    if missing.is_empty() {
        log::warn!("pip check 报告了问题，但没有可补装的缺失依赖");
        print!("{}", output.stdout);
        return Ok(missing);
    }

    pm.install(&missing).context("安装缺失模块失败")?;
    Ok(missing)
}
