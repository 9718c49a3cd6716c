//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问。供应商相关的变量（`<P>_API_KEY` 等）
//! 由 [`crate::translation::config`] 中的供应商表读取，这里只定义全局变量。

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 环境变量解析错误
#[derive(Error, Debug, Clone)]
#[error("环境变量 {variable} 无效: {message}")]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::DEFAULT.ok_or_else(|| EnvError {
                variable: Self::NAME.to_string(),
                message: "Required environment variable not set".to_string(),
            }),
        }
    }

    /// 变量是否被显式设置
    fn is_set() -> bool {
        env::var(Self::NAME).is_ok()
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// 仅在变量被显式设置且合法时返回值，非法值记录警告后忽略
    fn get_if_set() -> Option<T> {
        let value = env::var(Self::NAME).ok()?;
        match Self::parse(&value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("忽略无效的环境变量: {}", e);
                None
            }
        }
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "BOOKWORM_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                level @ ("trace" | "debug" | "info" | "warn" | "error") => Ok(level.to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 数据目录（数据库与日志文件所在位置）
    pub struct DataDir;
    impl EnvVar<PathBuf> for DataDir {
        const NAME: &'static str = "BOOKWORM_DATA_DIR";
        const DEFAULT: Option<PathBuf> = None;
        const DESCRIPTION: &'static str = "Directory holding bookworm.redb and bookworm.log";

        fn parse(value: &str) -> EnvResult<PathBuf> {
            let path = value.trim();
            if path.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Path cannot be empty".to_string(),
                });
            }
            Ok(PathBuf::from(path))
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 当前启用的翻译供应商
    pub struct Provider;
    impl EnvVar<String> for Provider {
        const NAME: &'static str = "BOOKWORM_TRANSLATE_PROVIDER";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str =
            "Active provider: openai, claude, qwen, glm, openrouter, ollama";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("qwen".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let name = value.trim().to_lowercase();
            if name.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Provider name cannot be empty".to_string(),
                });
            }
            Ok(name)
        }
    }

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "BOOKWORM_TRANSLATE_TARGET_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Target language tag, e.g. zh-CN, en, ja";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("zh-CN".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim();
            let valid = !lang.is_empty()
                && lang.len() <= 16
                && lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!("Invalid language tag '{}'", value),
                });
            }
            Ok(lang.to_string())
        }
    }

    /// 单次请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "BOOKWORM_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(120));
        const DESCRIPTION: &'static str = "Translation request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.trim().parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 || seconds > 600 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be between 1 and 600 seconds".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }
}

/// 阅读相关环境变量
pub mod reader {
    use super::*;

    /// 默认段间距
    pub struct LineSpacing;
    impl EnvVar<u8> for LineSpacing {
        const NAME: &'static str = "BOOKWORM_LINE_SPACING";
        const DEFAULT: Option<u8> = Some(1);
        const DESCRIPTION: &'static str =
            "Default blank lines between paragraphs: 0=compact .. 3=extra-wide";

        fn parse(value: &str) -> EnvResult<u8> {
            let spacing = parse_bounded_usize(value, Self::NAME, 0, 3)?;
            Ok(spacing as u8)
        }
    }

    /// 默认是否启用双页模式
    pub struct DualPage;
    impl EnvVar<bool> for DualPage {
        const NAME: &'static str = "BOOKWORM_DUAL_PAGE";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Start in side-by-side dual page mode";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_bounded_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid non-negative number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    docs.push_str("## Core\n\n");
    docs.push_str(&format!("- `{}`: {}\n", core::LogLevel::NAME, core::LogLevel::DESCRIPTION));
    docs.push_str(&format!("- `{}`: {}\n", core::DataDir::NAME, core::DataDir::DESCRIPTION));

    docs.push_str("\n## Translation\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        translation::Provider::NAME,
        translation::Provider::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        translation::TargetLang::NAME,
        translation::TargetLang::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::RequestTimeout::NAME,
        translation::RequestTimeout::DESCRIPTION,
        translation::RequestTimeout::DEFAULT
    ));
    docs.push_str("- `<PROVIDER>_API_KEY`, `<PROVIDER>_BASE_URL`, `<PROVIDER>_MODEL`: per-provider credentials and endpoints\n");

    docs.push_str("\n## Reader\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        reader::LineSpacing::NAME,
        reader::LineSpacing::DESCRIPTION,
        reader::LineSpacing::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        reader::DualPage::NAME,
        reader::DualPage::DESCRIPTION,
        reader::DualPage::DEFAULT
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert_eq!(core::LogLevel::parse(" warn ").unwrap(), "warn");
        assert!(core::LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn test_boolean_parsing() {
        assert!(reader::DualPage::parse("true").unwrap());
        assert!(reader::DualPage::parse("YES").unwrap());
        assert!(!reader::DualPage::parse("off").unwrap());
        assert!(reader::DualPage::parse("maybe").is_err());
    }

    #[test]
    fn test_line_spacing_bounds() {
        assert_eq!(reader::LineSpacing::parse("0").unwrap(), 0);
        assert_eq!(reader::LineSpacing::parse("3").unwrap(), 3);
        assert!(reader::LineSpacing::parse("4").is_err());
        assert!(reader::LineSpacing::parse("-1").is_err());
    }

    #[test]
    fn test_language_tag_validation() {
        assert_eq!(translation::TargetLang::parse("zh-CN").unwrap(), "zh-CN");
        assert_eq!(translation::TargetLang::parse("en").unwrap(), "en");
        assert!(translation::TargetLang::parse("").is_err());
        assert!(translation::TargetLang::parse("zh CN").is_err());
    }

    #[test]
    fn test_timeout_validation() {
        assert_eq!(
            translation::RequestTimeout::parse("30").unwrap(),
            Duration::from_secs(30)
        );
        assert!(translation::RequestTimeout::parse("0").is_err());
        assert!(translation::RequestTimeout::parse("abc").is_err());
    }

    #[test]
    fn test_docs_mention_every_variable() {
        let docs = generate_env_docs();
        assert!(docs.contains("BOOKWORM_TRANSLATE_PROVIDER"));
        assert!(docs.contains("BOOKWORM_LINE_SPACING"));
        assert!(docs.contains("BOOKWORM_DATA_DIR"));
    }
}
