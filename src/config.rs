//! 应用配置管理器
//!
//! 配置来源按优先级从低到高：内置默认值、`config.toml`、环境变量。
//! `.env` 文件在读取环境变量之前加载，只加载第一个存在的文件。

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::env::{core, reader, EnvVar};
use crate::layout::LineSpacing;
use crate::library::DATABASE_FILE;
use crate::translation::{TranslationConfig, TranslationError, TranslationResult};

/// 日志文件名
pub const LOG_FILE: &str = "bookworm.log";
/// 配置文件名
pub const CONFIG_FILE: &str = "config.toml";

const APPLICATION: &str = "bookworm";

/// 阅读器默认设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderDefaults {
    pub line_spacing: u8,
    pub dual_page: bool,
}

impl Default for ReaderDefaults {
    fn default() -> Self {
        Self {
            line_spacing: LineSpacing::default().get(),
            dual_page: false,
        }
    }
}

impl ReaderDefaults {
    pub fn spacing(&self) -> LineSpacing {
        LineSpacing::new(self.line_spacing)
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 数据目录，为空时使用平台默认位置
    pub data_dir: Option<PathBuf>,
    pub log_level: String,
    pub reader: ReaderDefaults,
    pub translation: TranslationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: "info".to_string(),
            reader: ReaderDefaults::default(),
            translation: TranslationConfig::default(),
        }
    }
}

impl AppConfig {
    /// 实际使用的数据目录
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join(DATABASE_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join(LOG_FILE)
    }

    /// 创建数据目录
    pub fn ensure_dirs(&self) -> TranslationResult<()> {
        let dir = self.data_dir();
        std::fs::create_dir_all(&dir).map_err(|e| {
            TranslationError::ConfigError(format!("无法创建数据目录 {}: {}", dir.display(), e))
        })
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = core::DataDir::get_if_set() {
            self.data_dir = Some(dir);
        }

        if let Some(level) = core::LogLevel::get_if_set() {
            self.log_level = level;
        }

        if let Some(spacing) = reader::LineSpacing::get_if_set() {
            self.reader.line_spacing = spacing;
        }

        if let Some(dual) = reader::DualPage::get_if_set() {
            self.reader.dual_page = dual;
        }

        self.translation.apply_env_overrides();
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.reader.line_spacing > LineSpacing::MAX {
            return Err(TranslationError::ConfigError(format!(
                "段间距必须在 0..={} 之间",
                LineSpacing::MAX
            )));
        }
        self.translation.validate()
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 加载完整配置
    ///
    /// `env_file` 为显式指定的 `.env` 路径，优先于默认搜索位置。
    pub fn load(env_file: Option<&Path>) -> TranslationResult<AppConfig> {
        Self::load_dotenv(env_file);

        let mut config = match config_dir().map(|dir| dir.join(CONFIG_FILE)) {
            Some(path) if path.exists() => {
                tracing::info!("加载配置文件: {}", path.display());
                Self::load_from_file(&path)?
            }
            _ => {
                tracing::debug!("未找到配置文件，使用默认配置");
                AppConfig::default()
            }
        };

        config.translation.fill_provider_defaults();
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// 从指定文件加载配置
    pub fn load_from_file(path: &Path) -> TranslationResult<AppConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        let mut config: AppConfig = toml::from_str(&content)
            .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))?;
        config.translation.fill_provider_defaults();
        Ok(config)
    }

    /// `.env` 的候选位置，按优先级排列
    pub fn dotenv_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = explicit {
            candidates.push(path.to_path_buf());
        }
        candidates.push(PathBuf::from(".env"));
        if let Some(dir) = config_dir() {
            candidates.push(dir.join(".env"));
        }
        if let Some(base) = BaseDirs::new() {
            candidates.push(base.home_dir().join(".env"));
        }
        candidates
    }

    /// 加载第一个存在的 `.env` 文件
    fn load_dotenv(explicit: Option<&Path>) -> Option<PathBuf> {
        for path in Self::dotenv_candidates(explicit) {
            if !path.exists() {
                continue;
            }
            match dotenv::from_path(&path) {
                Ok(()) => {
                    tracing::info!("已加载环境变量文件: {}", path.display());
                    return Some(path);
                }
                Err(e) => tracing::warn!("加载环境变量文件失败 {}: {}", path.display(), e),
            }
        }
        None
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &Path) -> TranslationResult<()> {
        let content = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APPLICATION)
}

/// 平台配置目录
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".bookworm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_share_data_dir() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/tmp/bw")),
            ..AppConfig::default()
        };
        assert_eq!(config.db_path(), PathBuf::from("/tmp/bw/bookworm.redb"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/bw/bookworm.log"));
        assert_eq!(config.reader.spacing(), LineSpacing::default());
    }

    #[test]
    fn test_partial_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
log_level = "debug"

[reader]
dual_page = true

[translation]
provider = "ollama"
target_lang = "ja"

[translation.providers.ollama]
model = "qwen2.5:7b"
"#,
        )
        .unwrap();

        let config = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.reader.dual_page);
        assert_eq!(config.reader.line_spacing, 1);
        assert_eq!(config.translation.target_lang, "ja");

        let ollama = config.translation.active_provider().unwrap();
        assert_eq!(ollama.model, "qwen2.5:7b");
        assert!(!ollama.base_url.is_empty());
        assert!(config.translation.is_configured());
        // 未写出的内置供应商仍然存在
        assert!(config.translation.providers.contains_key("openai"));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "reader = 3").unwrap();
        let err = ConfigManager::load_from_file(&path).unwrap_err();
        assert!(matches!(err, TranslationError::ConfigError(_)));
    }

    #[test]
    fn test_example_config_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.toml");
        ConfigManager::generate_example_config(&path).unwrap();
        let config = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(config.translation.provider, "qwen");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_dotenv_comes_first() {
        let explicit = PathBuf::from("/somewhere/custom.env");
        let candidates = ConfigManager::dotenv_candidates(Some(&explicit));
        assert_eq!(candidates[0], explicit);
        assert_eq!(candidates[1], PathBuf::from(".env"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_spacing() {
        let mut config = AppConfig::default();
        config.reader.line_spacing = 7;
        assert!(config.validate().is_err());
    }
}
