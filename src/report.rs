use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::PathBuf;

pub struct ReportSaver {
    base_dir: PathBuf,
}

impl ReportSaver {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn save(&self, content: &str, python: &str) -> Result<PathBuf> {
        self.save_at(content, python, Local::now())
    }

    /// 报告路径: <base_dir>/YYYY/MM/DD/HH-MM.md
    pub fn save_at(&self, content: &str, python: &str, now: DateTime<Local>) -> Result<PathBuf> {
        let dir = self
            .base_dir
            .join(now.format("%Y").to_string())
            .join(now.format("%m").to_string())
            .join(now.format("%d").to_string());
        fs::create_dir_all(&dir)
            .with_context(|| format!("无法创建报告目录 {}", dir.display()))?;

        let filepath = dir.join(now.format("%H-%M.md").to_string());

        let mut full_content = String::new();
        full_content.push_str(&format!(
            "pip 模块更新报告\n解释器: {}\n生成时间: {}\n\n",
            python,
            now.format("%Y-%m-%d %H:%M:%S")
        ));
        full_content.push_str(content);

        fs::write(&filepath, full_content)
            .with_context(|| format!("无法写入报告 {}", filepath.display()))?;

        Ok(filepath)
    }
}
