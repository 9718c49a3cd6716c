//! 双语导出
//!
//! 只有全书每个段落都有缓存译文时才允许导出。

use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::layout::{TranslationLookup, TRANSLATION_PREFIX};
use crate::reader::error::{ReaderError, ReaderResult};
use crate::translation::TranslationEngine;

/// 章节横幅宽度
pub const BANNER_WIDTH: usize = 60;

/// 导出文件与源文件同目录，文件名加 `_bilingual` 后缀
pub fn export_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{}_bilingual.txt", stem);
    match source.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// 生成双语文本
pub fn render_bilingual(document: &Document, lookup: &dyn TranslationLookup) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut parts: Vec<String> = Vec::new();

    for chapter in &document.chapters {
        parts.push(banner.clone());
        parts.push(chapter.title.clone());
        parts.push(format!("{}\n", banner));

        for paragraph in &chapter.paragraphs {
            parts.push(paragraph.clone());
            if let Some(translated) = lookup.lookup(paragraph).filter(|t| !t.is_empty()) {
                parts.push(format!("{}{}", TRANSLATION_PREFIX, translated));
            }
            parts.push(String::new());
        }
    }

    parts.join("\n")
}

/// 翻译进度 `(done, total)`
pub fn translation_progress(document: &Document, engine: &TranslationEngine) -> (usize, usize) {
    let done = document
        .paragraphs()
        .filter(|p| engine.is_translated(p))
        .count();
    (done, document.paragraph_count())
}

/// 导出双语文件，返回写入的路径
pub fn export_bilingual(document: &Document, engine: &TranslationEngine) -> ReaderResult<PathBuf> {
    let (done, total) = translation_progress(document, engine);
    if done < total {
        return Err(ReaderError::IncompleteTranslation { done, total });
    }

    let path = export_path(&document.book.file_path);
    std::fs::write(&path, render_bilingual(document, engine))?;
    tracing::info!("已导出双语文件: {}", path.display());
    Ok(path)
}
