//! 翻译系统核心模块
//!
//! - **引擎层** (`engine.rs`): 缓存优先的批量翻译、进度统计与协作式取消
//! - **供应商层** (`provider.rs`): 远程补全接口及其 HTTP 实现
//!
//! ```text
//! TranslationEngine (engine.rs)
//!     ├── TranslationCache (storage/cache.rs)
//!     └── TranslationProvider (provider.rs)
//!             └── OpenAiCompatibleProvider
//! ```

pub mod engine;
pub mod provider;

pub use engine::{batch_prompt, split_segments, EngineStats, TranslationEngine};
pub use provider::{build_provider, OpenAiCompatibleProvider, TranslationProvider};
