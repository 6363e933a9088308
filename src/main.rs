mod config;
mod package_manager;
mod report;
mod updater;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// lian-pip - 更新过期的 Python 模块
///
/// 依次执行：检查过期模块、升级、回滚版本冲突的模块、补装缺失依赖、清理 pip 缓存。
/// 默认配置文件位于 ~/.config/lian-pip/config.toml。
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// 配置文件路径
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// 运行 `-m pip` 的 Python 解释器
    #[arg(long, env = "LIAN_PIP_PYTHON", value_name = "PATH")]
    python: Option<String>,

    /// 只列出过期模块，不做修改
    #[arg(long)]
    dry_run: bool,

    /// 不清理 pip 缓存
    #[arg(long)]
    no_purge: bool,

    /// 不检查冲突和缺失依赖
    #[arg(long)]
    no_repair: bool,

    /// 保存本次运行的报告
    #[arg(long)]
    report: bool,
}

impl Cli {
    /// 命令行参数覆盖配置文件
    fn apply(&self, config: &mut config::Config) {
        if let Some(python) = &self.python {
            config.python = python.clone();
        }
        if self.no_purge {
            config.purge_cache = false;
        }
        if self.no_repair {
            config.repair = false;
        }
        if self.report {
            config.save_report = true;
        }
    }

    fn options(&self, config: &config::Config) -> updater::UpdateOptions {
        updater::UpdateOptions {
            dry_run: self.dry_run,
            repair: config.repair,
            purge_cache: config.purge_cache,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    // 加载配置
    let mut config = match &cli.config {
        Some(path) => config::Config::load_from(path)?,
        None => config::Config::load_or_default()?,
    };
    cli.apply(&mut config);

    // 能找到完整路径时显示完整路径
    let python_path = which::which(&config.python)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| config.python.clone());
    println!("=> Using Python executable:\n{}", python_path);

    let pm = package_manager::PackageManager::from_config(package_manager::DuctRunner, &config);
    let summary = updater::run(&pm, cli.options(&config))?;

    if config.save_report {
        let saver = report::ReportSaver::new(config.report_dir.clone());
        let path = saver.save(&summary.to_report(), &python_path)?;
        println!("=> Report saved to {}", path.display());
    }

    Ok(())
}
