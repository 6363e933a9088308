use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// 运行 `-m pip` 的 Python 解释器
    pub python: String,
    /// 不参与过期检查的包，通过 PIP_EXCLUDE 传给 pip
    pub exclude: Vec<String>,
    pub disable_version_check: bool,
    pub purge_cache: bool,
    /// 升级后回滚冲突包并补装缺失依赖
    pub repair: bool,
    pub save_report: bool,
    pub report_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self {
            python: default_python().to_string(),
            exclude: vec!["pip".to_string()],
            disable_version_check: true,
            purge_cache: true,
            repair: true,
            save_report: false,
            report_dir: PathBuf::from(home).join(".lian/pip"),
        }
    }
}

fn default_python() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/lian-pip/config.toml")
    }

    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// 文件不存在时使用默认配置，存在但无法解析时报错
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("配置文件 {} 不存在，使用默认配置", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件 {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件 {}", path.display()))?;
        Ok(config)
    }

    /// 传给每次 pip 调用的环境变量
    pub fn pip_env(&self) -> Vec<(String, String)> {
        let mut envs = Vec::new();
        if self.disable_version_check {
            envs.push(("PIP_DISABLE_PIP_VERSION_CHECK".to_string(), "1".to_string()));
        }
        if !self.exclude.is_empty() {
            envs.push(("PIP_EXCLUDE".to_string(), self.exclude.join(" ")));
        }
        envs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.exclude, vec!["pip"]);
        assert!(config.purge_cache);
        assert!(config.repair);
        assert!(!config.save_report);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "python = \"/opt/py/bin/python\"\nexclude = []\npurge_cache = false\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.python, "/opt/py/bin/python");
        assert!(config.exclude.is_empty());
        assert!(!config.purge_cache);
        assert!(config.repair);
        assert!(config.disable_version_check);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "purge_cache = \"maybe\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("无法解析配置文件"));
    }

    #[test]
    fn test_pip_env_defaults() {
        let config = Config::default();
        assert_eq!(
            config.pip_env(),
            vec![
                ("PIP_DISABLE_PIP_VERSION_CHECK".to_string(), "1".to_string()),
                ("PIP_EXCLUDE".to_string(), "pip".to_string()),
            ]
        );
    }

    #[test]
    fn test_pip_env_empty() {
        let config = Config {
            exclude: Vec::new(),
            disable_version_check: false,
            ..Config::default()
        };
        assert!(config.pip_env().is_empty());
    }
}
