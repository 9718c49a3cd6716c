//! 纯文本与 Markdown 解析器

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::document::parser::{read_source, DocumentParser};
use crate::document::{Chapter, Document, DocumentError, DocumentResult};

/// 常见的章节标题行
const CHAPTER_PATTERN: &str = r"(?m)^(?:Chapter|CHAPTER|第.{1,10}[章节回]|Part|PART)\s*.{0,100}$";
const PARAGRAPH_BREAK: &str = r"\n\s*\n";
const MARKDOWN_HEADING: &str = r"(?m)^#{1,2}\s+(.+)$";

/// 无章节结构时每节的段落数
const SECTION_SIZE: usize = 50;

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> DocumentResult<&'static Regex> {
    if let Some(re) = cell.get() {
        return Ok(re);
    }
    let re = Regex::new(pattern)
        .map_err(|e| DocumentError::Parse(format!("正则表达式无效: {}", e)))?;
    Ok(cell.get_or_init(|| re))
}

fn chapter_regex() -> DocumentResult<&'static Regex> {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, CHAPTER_PATTERN)
}

fn paragraph_regex() -> DocumentResult<&'static Regex> {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, PARAGRAPH_BREAK)
}

fn heading_regex() -> DocumentResult<&'static Regex> {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, MARKDOWN_HEADING)
}

/// 按空行切分段落，段内空白折叠为单个空格
pub fn split_paragraphs(text: &str) -> DocumentResult<Vec<String>> {
    let breaks = paragraph_regex()?;
    Ok(breaks
        .split(text)
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .collect())
}

/// 纯文本解析器
pub struct TxtParser;

impl TxtParser {
    fn chapters(text: &str) -> DocumentResult<Vec<Chapter>> {
        let headings: Vec<_> = chapter_regex()?.find_iter(text).collect();
        let mut chapters = Vec::new();

        if headings.len() >= 2 {
            let preamble = split_paragraphs(&text[..headings[0].start()])?;
            if !preamble.is_empty() {
                chapters.push(Chapter::new(0, "Preamble", preamble));
            }

            for (i, heading) in headings.iter().enumerate() {
                let end = headings
                    .get(i + 1)
                    .map(|next| next.start())
                    .unwrap_or(text.len());
                let paragraphs = split_paragraphs(&text[heading.end()..end])?;
                if !paragraphs.is_empty() {
                    chapters.push(Chapter::new(
                        chapters.len(),
                        heading.as_str().trim(),
                        paragraphs,
                    ));
                }
            }
        } else {
            for chunk in split_paragraphs(text)?.chunks(SECTION_SIZE) {
                let title = format!("Section {}", chapters.len() + 1);
                chapters.push(Chapter::new(chapters.len(), title, chunk.to_vec()));
            }
        }

        Ok(chapters)
    }
}

impl DocumentParser for TxtParser {
    fn format(&self) -> &'static str {
        "txt"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".txt", ".text"]
    }

    fn parse(&self, path: &Path) -> DocumentResult<Document> {
        let (book, text) = read_source(path, self.format())?;
        let chapters = Self::chapters(&text)?;
        Ok(Document::from_chapters(book, chapters))
    }
}

/// Markdown 解析器：按一、二级标题分章并去除常见标记
pub struct MarkdownParser;

struct Rewrite {
    pattern: &'static str,
    replacement: &'static str,
}

const MARKDOWN_REWRITES: &[Rewrite] = &[
    Rewrite { pattern: r"!\[.*?\]\(.*?\)", replacement: "" },
    Rewrite { pattern: r"\[([^\]]+)\]\([^)]+\)", replacement: "$1" },
    Rewrite { pattern: r"```[\s\S]*?```", replacement: "[code block]" },
    Rewrite { pattern: r"`([^`]+)`", replacement: "$1" },
    Rewrite { pattern: r"\*\*(.+?)\*\*", replacement: "$1" },
    Rewrite { pattern: r"\*(.+?)\*", replacement: "$1" },
    Rewrite { pattern: r"(?m)^[-*+]\s+", replacement: "" },
    Rewrite { pattern: r"(?m)^\d+\.\s+", replacement: "" },
    Rewrite { pattern: r"(?m)^>\s*", replacement: "" },
    Rewrite { pattern: r"(?m)^#{3,6}\s+", replacement: "" },
    Rewrite { pattern: r"(?m)^[-=]{3,}\s*$", replacement: "" },
];

const CODE_BLOCK_MARKER: &str = "[code block]";

fn markdown_rewrites() -> DocumentResult<&'static [(Regex, &'static str)]> {
    static CELL: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    if let Some(compiled) = CELL.get() {
        return Ok(compiled.as_slice());
    }
    let compiled = MARKDOWN_REWRITES
        .iter()
        .map(|r| {
            Regex::new(r.pattern)
                .map(|re| (re, r.replacement))
                .map_err(|e| DocumentError::Parse(format!("正则表达式无效: {}", e)))
        })
        .collect::<DocumentResult<Vec<_>>>()?;
    Ok(CELL.get_or_init(|| compiled).as_slice())
}

impl MarkdownParser {
    fn to_paragraphs(section: &str) -> DocumentResult<Vec<String>> {
        let mut text = section.to_string();
        for (re, replacement) in markdown_rewrites()? {
            text = re.replace_all(&text, *replacement).into_owned();
        }
        Ok(split_paragraphs(&text)?
            .into_iter()
            .filter(|p| p != CODE_BLOCK_MARKER)
            .collect())
    }

    fn chapters(text: &str, fallback_title: &str) -> DocumentResult<Vec<Chapter>> {
        let mut chapters: Vec<Chapter> = Vec::new();
        let mut title = fallback_title.to_string();
        let mut paragraphs: Vec<String> = Vec::new();
        let mut cursor = 0;

        for captures in heading_regex()?.captures_iter(text) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            paragraphs.extend(Self::to_paragraphs(&text[cursor..whole.start()])?);
            if !paragraphs.is_empty() {
                let index = chapters.len();
                chapters.push(Chapter::new(index, title, std::mem::take(&mut paragraphs)));
            }
            title = name.as_str().trim().to_string();
            cursor = whole.end();
        }

        paragraphs.extend(Self::to_paragraphs(&text[cursor..])?);
        if !paragraphs.is_empty() {
            let index = chapters.len();
            chapters.push(Chapter::new(index, title, paragraphs));
        }

        Ok(chapters)
    }
}

impl DocumentParser for MarkdownParser {
    fn format(&self) -> &'static str {
        "md"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".md", ".markdown"]
    }

    fn parse(&self, path: &Path) -> DocumentResult<Document> {
        let (book, text) = read_source(path, self.format())?;
        let chapters = Self::chapters(&text, &book.title)?;
        Ok(Document::from_chapters(book, chapters))
    }
}
