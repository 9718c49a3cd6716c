//! 阅读会话
//!
//! 会话是唯一修改阅读状态的地方。后台任务（预取翻译）只通过完成队列
//! 发回 [`SessionEvent`]，由会话在自己的上下文中逐个应用。
//!
//! ## 预取
//! 翻译模式下每次导航都会重新发起一个预取任务：翻译当前页和后两页的段落。
//! 任务用 [`PrefetchTag`] 标记发起时的代数和光标；新的导航会中止旧任务并递增代数，
//! 过期任务的结果在到达时被丢弃。

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::config::ReaderDefaults;
use crate::document::{Chapter, Document};
use crate::layout::{self, ChapterLayout, LayoutParams, LineSpacing, TranslationLookup, Viewport};
use crate::library::{Bookmark, ProgressStore, ReadingProgress};
use crate::reader::error::{ReaderError, ReaderResult};
use crate::reader::export;
use crate::translation::{TranslationEngine, TranslationError};

/// 预取覆盖当前页之后的页数
pub const PREFETCH_AHEAD: usize = 2;

/// 页眉各部分之间的分隔
const HEADER_SEPARATOR: &str = "  │  ";

/// 阅读位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub chapter: usize,
    pub page: usize,
}

impl Cursor {
    pub fn new(chapter: usize, page: usize) -> Self {
        Self { chapter, page }
    }
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    #[default]
    Idle,
    Translating,
}

/// 预取任务标记
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchTag {
    pub generation: u64,
    pub cursor: Cursor,
}

/// 后台任务的完成事件
#[derive(Debug)]
pub enum SessionEvent {
    PrefetchDone {
        tag: PrefetchTag,
        failures: Vec<TranslationError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// 面向用户的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// 阅读会话
pub struct ReaderSession {
    document: Arc<Document>,
    engine: Arc<TranslationEngine>,
    store: Arc<dyn ProgressStore>,
    params: LayoutParams,
    cursor: Cursor,
    layout: ChapterLayout,
    mode: SessionMode,
    generation: u64,
    prefetch: Option<JoinHandle<()>>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    notices: Vec<Notice>,
}

impl ReaderSession {
    /// 创建会话，光标位于第一章第一页
    pub fn new(
        document: Arc<Document>,
        engine: Arc<TranslationEngine>,
        store: Arc<dyn ProgressStore>,
        params: LayoutParams,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let layout = layout::reflow(&Self::empty_chapter(), &params, None);

        let mut session = Self {
            document,
            engine,
            store,
            params,
            cursor: Cursor::default(),
            layout,
            mode: SessionMode::Idle,
            generation: 0,
            prefetch: None,
            events_tx,
            events_rx,
            notices: Vec::new(),
        };
        session.reflow();
        session
    }

    /// 创建会话并恢复上次的阅读进度
    pub fn open(
        document: Arc<Document>,
        engine: Arc<TranslationEngine>,
        store: Arc<dyn ProgressStore>,
        viewport: Viewport,
        defaults: ReaderDefaults,
    ) -> Self {
        let params = LayoutParams::new(viewport, defaults.spacing(), defaults.dual_page);
        let mut session = Self::new(document, engine, store, params);
        session.restore_progress();
        session
    }

    fn empty_chapter() -> Chapter {
        Chapter::new(0, "", Vec::new())
    }

    // ------------------------------------------------------------------
    // 访问器
    // ------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn engine(&self) -> &Arc<TranslationEngine> {
        &self.engine
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_translating(&self) -> bool {
        self.mode == SessionMode::Translating
    }

    pub fn params(&self) -> LayoutParams {
        self.params
    }

    pub fn layout(&self) -> &ChapterLayout {
        &self.layout
    }

    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.document.chapter(self.cursor.chapter)
    }

    /// 当前预取代数
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn last_chapter(&self) -> usize {
        self.document.chapter_count().saturating_sub(1)
    }

    fn step(&self) -> usize {
        if self.params.dual {
            2
        } else {
            1
        }
    }

    // ------------------------------------------------------------------
    // 排版
    // ------------------------------------------------------------------

    /// 重新分页当前章节并钳制页码
    ///
    /// 新的分页结果整体替换旧值，不存在部分更新的中间状态。
    fn reflow(&mut self) {
        let lookup: Option<&dyn TranslationLookup> = if self.is_translating() {
            Some(&*self.engine)
        } else {
            None
        };

        let layout = match self.document.chapter(self.cursor.chapter) {
            Some(chapter) => layout::reflow(chapter, &self.params, lookup),
            None => layout::reflow(&Self::empty_chapter(), &self.params, lookup),
        };
        self.layout = layout;
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        let last = self.layout.page_count().saturating_sub(1);
        self.cursor.page = self.cursor.page.min(last);
        if self.params.dual {
            self.cursor.page -= self.cursor.page % 2;
        }
    }

    /// 渲染当前视图
    pub fn render(&self) -> Vec<String> {
        layout::render(&self.layout, self.cursor.page, self.params.dual)
    }

    // ------------------------------------------------------------------
    // 导航
    // ------------------------------------------------------------------

    /// 下一页，跨过章末进入下一章第一页
    pub fn next_page(&mut self) -> bool {
        let target = self.cursor.page + self.step();
        if target < self.layout.page_count() {
            self.cursor.page = target;
        } else if self.cursor.chapter < self.last_chapter() {
            self.cursor = Cursor::new(self.cursor.chapter + 1, 0);
            self.reflow();
        } else {
            return false;
        }
        self.after_navigation();
        true
    }

    /// 上一页，跨过章首进入上一章最后一页
    pub fn prev_page(&mut self) -> bool {
        let step = self.step();
        if self.cursor.page >= step {
            self.cursor.page -= step;
        } else if self.cursor.chapter > 0 {
            self.cursor = Cursor::new(self.cursor.chapter - 1, usize::MAX);
            self.reflow();
        } else {
            return false;
        }
        self.after_navigation();
        true
    }

    pub fn next_chapter(&mut self) -> bool {
        if self.cursor.chapter >= self.last_chapter() {
            return false;
        }
        self.go_to(self.cursor.chapter + 1, 0);
        true
    }

    pub fn prev_chapter(&mut self) -> bool {
        if self.cursor.chapter == 0 {
            return false;
        }
        self.go_to(self.cursor.chapter - 1, 0);
        true
    }

    /// 目录跳转
    pub fn jump_to_chapter(&mut self, chapter: usize) {
        self.go_to(chapter, 0);
    }

    pub fn jump_to_bookmark(&mut self, bookmark: &Bookmark) {
        self.go_to(bookmark.chapter_index, bookmark.page_index);
    }

    /// 跳到任意位置，章节和页码都会被钳制
    pub fn go_to(&mut self, chapter: usize, page: usize) {
        self.cursor = Cursor::new(chapter.min(self.last_chapter()), page);
        self.reflow();
        self.after_navigation();
    }

    fn after_navigation(&mut self) {
        self.save_progress();
        if self.is_translating() {
            self.schedule_prefetch();
        }
    }

    /// `(章 + (页+1)/本章页数) / 总章数`，除数为 0 时取 0
    pub fn progress_fraction(&self) -> f64 {
        let chapters = self.document.chapter_count();
        let pages = self.layout.page_count();
        let page_fraction = if pages > 0 {
            (self.cursor.page + 1) as f64 / pages as f64
        } else {
            0.0
        };
        if chapters > 0 {
            (self.cursor.chapter as f64 + page_fraction) / chapters as f64
        } else {
            0.0
        }
    }

    // ------------------------------------------------------------------
    // 持久化
    // ------------------------------------------------------------------

    /// 保存阅读进度，失败只记录
    pub fn save_progress(&mut self) {
        let progress = ReadingProgress::new(
            self.document.book.id.clone(),
            self.cursor.chapter,
            self.cursor.page,
            self.progress_fraction(),
        );
        if let Err(e) = self.store.save_progress(&progress) {
            tracing::warn!("保存阅读进度失败: {}", e);
            self.notify(NoticeLevel::Warning, format!("Failed to save progress: {}", e));
        }
    }

    /// 恢复上次的阅读进度
    pub fn restore_progress(&mut self) {
        match self.store.load_progress(&self.document.book.id) {
            Ok(Some(progress)) => {
                self.cursor = Cursor::new(
                    progress.chapter_index.min(self.last_chapter()),
                    progress.page_index,
                );
                self.reflow();
                tracing::debug!(
                    "恢复阅读进度: 第 {} 章第 {} 页",
                    self.cursor.chapter + 1,
                    self.cursor.page + 1
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("读取阅读进度失败: {}", e);
                self.notify(NoticeLevel::Warning, format!("Failed to load progress: {}", e));
            }
        }
    }

    // ------------------------------------------------------------------
    // 设置
    // ------------------------------------------------------------------

    pub fn increase_spacing(&mut self) -> bool {
        self.set_spacing(self.params.spacing.increase())
    }

    pub fn decrease_spacing(&mut self) -> bool {
        self.set_spacing(self.params.spacing.decrease())
    }

    fn set_spacing(&mut self, spacing: LineSpacing) -> bool {
        if spacing == self.params.spacing {
            return false;
        }
        self.params.spacing = spacing;
        self.reflow();
        true
    }

    pub fn toggle_dual(&mut self) {
        self.params.dual = !self.params.dual;
        self.reflow();
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.params.viewport {
            return;
        }
        self.params.viewport = viewport;
        self.reflow();
    }

    // ------------------------------------------------------------------
    // 书签
    // ------------------------------------------------------------------

    /// 在当前位置添加书签
    pub fn add_bookmark(&mut self, label: Option<&str>) -> Bookmark {
        let bookmark = Bookmark::new(
            self.document.book.id.clone(),
            self.cursor.chapter,
            self.cursor.page,
            label.unwrap_or_default(),
        );

        match self.store.add_bookmark(&bookmark) {
            Ok(()) => {
                let name = self
                    .current_chapter()
                    .map(|c| c.title.clone())
                    .unwrap_or_else(|| format!("Ch {}", self.cursor.chapter + 1));
                self.notify(
                    NoticeLevel::Info,
                    format!("Bookmark: {} P{}", name, self.cursor.page + 1),
                );
            }
            Err(e) => {
                tracing::warn!("保存书签失败: {}", e);
                self.notify(NoticeLevel::Warning, format!("Failed to save bookmark: {}", e));
            }
        }
        bookmark
    }

    /// 删除书签，无论结果如何都会发出提示
    pub fn remove_bookmark(&mut self, bookmark_id: &str) -> bool {
        match self.store.remove_bookmark(bookmark_id) {
            Ok(true) => {
                self.notify(NoticeLevel::Info, "Bookmark removed");
                true
            }
            Ok(false) => {
                self.notify(NoticeLevel::Warning, "Bookmark not found");
                false
            }
            Err(e) => {
                tracing::warn!("删除书签失败: {}", e);
                self.notify(NoticeLevel::Warning, format!("Failed to remove bookmark: {}", e));
                false
            }
        }
    }

    pub fn bookmarks(&mut self) -> Vec<Bookmark> {
        match self.store.list_bookmarks(&self.document.book.id) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("读取书签失败: {}", e);
                self.notify(NoticeLevel::Warning, format!("Failed to load bookmarks: {}", e));
                Vec::new()
            }
        }
    }

    /// 书签的显示名称
    pub fn bookmark_label(bookmark: &Bookmark) -> String {
        if bookmark.label.is_empty() {
            format!(
                "Ch {}, P{}",
                bookmark.chapter_index + 1,
                bookmark.page_index + 1
            )
        } else {
            bookmark.label.clone()
        }
    }

    // ------------------------------------------------------------------
    // 翻译模式
    // ------------------------------------------------------------------

    /// 进入翻译模式
    ///
    /// 若阅读位置之前存在未翻译的段落，光标先回到全书开头，保证翻译从前往后推进。
    pub fn enter_translate_mode(&mut self) -> ReaderResult<()> {
        if !self.engine.is_configured() {
            let provider = self.engine.provider_name().to_string();
            self.notify(
                NoticeLevel::Error,
                format!("Provider [{}] not configured. Set API key in .env", provider),
            );
            return Err(ReaderError::ProviderNotConfigured { provider });
        }
        if self.is_translating() {
            return Ok(());
        }

        self.mode = SessionMode::Translating;
        tracing::info!("进入翻译模式: {}", self.document.book.title);
        self.notify(NoticeLevel::Info, "Translation mode ON");

        if self.has_untranslated_before_cursor() {
            self.cursor = Cursor::default();
            self.notify(
                NoticeLevel::Info,
                "Jumped to start, untranslated content ahead",
            );
        }
        self.reflow();
        self.save_progress();

        self.engine.reset_cancel();
        self.schedule_prefetch();
        Ok(())
    }

    /// 退出翻译模式，取消正在进行的翻译
    pub fn exit_translate_mode(&mut self) {
        if !self.is_translating() {
            return;
        }
        self.mode = SessionMode::Idle;
        self.engine.cancel();
        self.supersede_prefetch();
        self.reflow();
        tracing::info!("退出翻译模式");
        self.notify(NoticeLevel::Info, "Translation mode OFF");
    }

    pub fn toggle_translate(&mut self) -> ReaderResult<()> {
        if self.is_translating() {
            self.exit_translate_mode();
            Ok(())
        } else {
            self.enter_translate_mode()
        }
    }

    /// 当前页第一个段落之前是否有未翻译的段落
    pub fn has_untranslated_before_cursor(&self) -> bool {
        let first = self
            .layout
            .range(self.cursor.page)
            .map(|r| r.start)
            .unwrap_or(0);
        self.document
            .paragraphs_before(self.cursor.chapter, first)
            .any(|p| !self.engine.is_translated(p))
    }

    /// 某页涉及的段落
    pub fn page_paragraphs(&self, page: usize) -> Vec<String> {
        match (self.current_chapter(), self.layout.range(page)) {
            (Some(chapter), Some(range)) if !chapter.paragraphs.is_empty() => {
                let end = range.end.min(chapter.paragraphs.len() - 1);
                chapter.paragraphs[range.start..=end].to_vec()
            }
            _ => Vec::new(),
        }
    }

    /// 全书翻译进度 `(done, total)`
    pub fn translation_progress(&self) -> (usize, usize) {
        export::translation_progress(&self.document, &self.engine)
    }

    // ------------------------------------------------------------------
    // 预取
    // ------------------------------------------------------------------

    /// 发起新的预取任务，取代仍在运行的旧任务
    fn schedule_prefetch(&mut self) {
        self.supersede_prefetch();

        let tag = PrefetchTag {
            generation: self.generation,
            cursor: self.cursor,
        };

        let last_page = (self.cursor.page + PREFETCH_AHEAD)
            .min(self.layout.page_count().saturating_sub(1));
        let batches: Vec<Vec<String>> = (self.cursor.page..=last_page)
            .map(|page| self.page_paragraphs(page))
            .filter(|batch| !batch.is_empty())
            .collect();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("没有可用的异步运行时，跳过预取: {}", e);
                return;
            }
        };

        let engine = Arc::clone(&self.engine);
        let events = self.events_tx.clone();
        tracing::debug!(
            "预取 第 {} 章第 {}..={} 页（代数 {}）",
            tag.cursor.chapter + 1,
            tag.cursor.page + 1,
            last_page + 1,
            tag.generation
        );

        self.prefetch = Some(runtime.spawn(async move {
            let results = join_all(batches.iter().map(|batch| engine.translate_batch(batch))).await;
            let failures = results.into_iter().filter_map(Result::err).collect();
            // 接收端随会话一起释放
            let _ = events.send(SessionEvent::PrefetchDone { tag, failures });
        }));
    }

    /// 使当前预取的结果失效
    ///
    /// 旧任务不会被中止：已发出的请求照常完成并写入缓存，
    /// 它的完成事件因代数不符在 [`Self::handle_event`] 中被丢弃。
    fn supersede_prefetch(&mut self) {
        self.generation += 1;
        if self.prefetch.take().is_some() {
            tracing::debug!("预取已被取代（代数 {}）", self.generation);
        }
    }

    /// 中止当前预取，只在会话结束时使用
    fn abort_prefetch(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.prefetch.take() {
            handle.abort();
        }
    }

    /// 预取任务是否仍在运行
    pub fn prefetch_pending(&self) -> bool {
        self.prefetch
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // 完成队列
    // ------------------------------------------------------------------

    /// 应用一个完成事件；过期事件被丢弃并返回 `false`
    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::PrefetchDone { tag, failures } => {
                let current = tag.generation == self.generation && tag.cursor == self.cursor;
                if !current || !self.is_translating() {
                    tracing::debug!("丢弃过期的预取结果（代数 {}）", tag.generation);
                    return false;
                }

                for failure in failures {
                    self.notify(NoticeLevel::Error, format!("Translation error: {}", failure));
                }
                self.prefetch = None;
                self.reflow();
                true
            }
        }
    }

    /// 等待并应用下一个完成事件
    pub async fn process_next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.handle_event(event),
            None => false,
        }
    }

    /// 应用所有已到达的事件，返回被应用的数量
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.handle_event(event) {
                applied += 1;
            }
        }
        applied
    }

    // ------------------------------------------------------------------
    // 页眉、提示与导出
    // ------------------------------------------------------------------

    /// 页眉文本
    pub fn header(&self) -> String {
        let chapters = self.document.chapter_count();
        let pages = self.layout.page_count();
        let chapter_name = self
            .current_chapter()
            .map(|c| c.title.as_str())
            .unwrap_or("?");

        let page_display = if self.params.dual {
            format!(
                "{}-{}/{}",
                self.cursor.page + 1,
                (self.cursor.page + 2).min(pages),
                pages
            )
        } else {
            format!("{}/{}", self.cursor.page + 1, pages)
        };

        let mut parts = vec![
            format!(" {}", self.document.book.title),
            format!("Ch {}/{}: {}", self.cursor.chapter + 1, chapters, chapter_name),
            format!("P {}", page_display),
            format!("{:.0}%", self.progress_fraction() * 100.0),
            self.params.spacing.label().to_string(),
        ];

        if self.params.dual {
            parts.push("DUAL".to_string());
        }

        if self.is_translating() {
            let (done, total) = self.translation_progress();
            parts.push(format!(
                "Trans {}/{} ({}%)",
                done,
                total,
                done * 100 / total.max(1)
            ));
        }

        parts.join(HEADER_SEPARATOR)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    /// 取出所有待显示的提示
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// 导出双语文件
    pub fn export_bilingual(&mut self) -> ReaderResult<PathBuf> {
        match export::export_bilingual(&self.document, &self.engine) {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.notify(NoticeLevel::Info, format!("Exported: {}", name));
                Ok(path)
            }
            Err(e) => {
                let level = match e {
                    ReaderError::IncompleteTranslation { .. } => NoticeLevel::Warning,
                    _ => NoticeLevel::Error,
                };
                self.notify(level, e.to_string());
                Err(e)
            }
        }
    }

    /// 保存进度并停止后台任务
    pub fn close(&mut self) {
        self.save_progress();
        self.abort_prefetch();
    }
}

impl Drop for ReaderSession {
    fn drop(&mut self) {
        self.abort_prefetch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Book;
    use crate::library::MemoryStore;
    use crate::translation::{CacheEntry, MemoryCache, TranslationCache, TranslationConfig};

    fn document(chapters: usize, paragraphs: usize) -> Arc<Document> {
        let book = Book {
            id: Book::make_id("/tmp/session.txt"),
            file_path: PathBuf::from("/tmp/session.txt"),
            title: "session".into(),
            author: "Unknown".into(),
            format: "txt".into(),
            file_size: 0,
        };
        let chapters = (0..chapters)
            .map(|c| {
                let paragraphs = (0..paragraphs).map(|p| format!("c{}p{}", c, p)).collect();
                Chapter::new(c, format!("Chapter {}", c + 1), paragraphs)
            })
            .collect();
        Arc::new(Document::from_chapters(book, chapters))
    }

    fn session(doc: Arc<Document>, dual: bool) -> (ReaderSession, Arc<MemoryStore>) {
        let engine = Arc::new(TranslationEngine::new(
            TranslationConfig::new("openai", "zh-CN"),
            Arc::new(MemoryCache::new()),
        ));
        let store = Arc::new(MemoryStore::new());
        // 宽 30 高 3、段间距 0：每页 3 段
        let params = LayoutParams::new(Viewport::new(30, 3), LineSpacing::new(0), dual);
        (ReaderSession::new(doc, engine, store.clone(), params), store)
    }

    #[test]
    fn test_next_page_crosses_chapter_boundary() {
        let (mut s, _) = session(document(2, 6), false);
        assert_eq!(s.page_count(), 2);
        assert!(s.next_page());
        assert_eq!(s.cursor(), Cursor::new(0, 1));
        assert!(s.next_page());
        assert_eq!(s.cursor(), Cursor::new(1, 0));
        assert!(s.next_page());
        assert!(!s.next_page());
        assert_eq!(s.cursor(), Cursor::new(1, 1));
    }

    #[test]
    fn test_prev_page_lands_on_last_page_even_in_dual() {
        let (mut s, _) = session(document(2, 9), true);
        // 9 段 → 3 页，双页模式最后一个偶数页是 2
        s.go_to(1, 0);
        assert!(s.prev_page());
        assert_eq!(s.cursor(), Cursor::new(0, 2));
        assert!(s.prev_page());
        assert_eq!(s.cursor(), Cursor::new(0, 0));
        assert!(!s.prev_page());
    }

    #[test]
    fn test_go_to_clamps_without_failing() {
        let (mut s, _) = session(document(3, 6), false);
        s.go_to(99, 99);
        assert_eq!(s.cursor(), Cursor::new(2, 1));

        s.toggle_dual();
        s.go_to(0, 1);
        assert_eq!(s.cursor(), Cursor::new(0, 0));
    }

    #[test]
    fn test_navigation_persists_progress() {
        let (mut s, store) = session(document(2, 6), false);
        s.next_page();
        let saved = store.load_progress(&s.document().book.id).unwrap().unwrap();
        assert_eq!((saved.chapter_index, saved.page_index), (0, 1));
        assert!((saved.progress_fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_progress_fraction_formula() {
        let (mut s, _) = session(document(4, 6), false);
        s.go_to(3, 1);
        assert!((s.progress_fraction() - 1.0).abs() < 1e-9);
        s.go_to(1, 0);
        assert!((s.progress_fraction() - 0.375).abs() < 1e-9);

        let (empty, _) = session(document(0, 0), false);
        assert_eq!(empty.progress_fraction(), 0.0);
    }

    #[test]
    fn test_restore_progress_clamps_chapter() {
        let doc = document(2, 6);
        let engine = Arc::new(TranslationEngine::new(
            TranslationConfig::default(),
            Arc::new(MemoryCache::new()),
        ));
        let store = Arc::new(MemoryStore::new());
        store
            .save_progress(&ReadingProgress::new(doc.book.id.clone(), 9, 9, 1.0))
            .unwrap();

        let s = ReaderSession::open(
            doc,
            engine,
            store,
            Viewport::new(30, 3),
            ReaderDefaults {
                line_spacing: 0,
                dual_page: false,
            },
        );
        assert_eq!(s.cursor(), Cursor::new(1, 1));
    }

    #[test]
    fn test_spacing_changes_reflow() {
        let (mut s, _) = session(document(1, 6), false);
        assert!(!s.decrease_spacing());
        assert!(s.increase_spacing());
        // 6 段 + 5 个空行 = 11 行
        assert_eq!(s.page_count(), 4);
        s.resize(Viewport::new(30, 11));
        assert_eq!(s.page_count(), 1);
    }

    #[test]
    fn test_remove_bookmark_always_notifies() {
        let (mut s, _) = session(document(1, 6), false);
        let bookmark = s.add_bookmark(None);
        s.take_notices();

        assert!(s.remove_bookmark(&bookmark.id));
        assert!(!s.remove_bookmark(&bookmark.id));
        let notices = s.take_notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].message, "Bookmark removed");
        assert_eq!(notices[1].level, NoticeLevel::Warning);
    }

    #[test]
    fn test_bookmark_label_fallback() {
        let bookmark = Bookmark::new("b", 1, 4, "");
        assert_eq!(ReaderSession::bookmark_label(&bookmark), "Ch 2, P5");
        let bookmark = Bookmark::new("b", 1, 4, "here");
        assert_eq!(ReaderSession::bookmark_label(&bookmark), "here");
    }

    #[test]
    fn test_translate_mode_requires_provider() {
        let (mut s, _) = session(document(1, 3), false);
        let err = s.enter_translate_mode().unwrap_err();
        assert!(matches!(err, ReaderError::ProviderNotConfigured { ref provider } if provider == "openai"));
        assert!(!s.is_translating());
        assert_eq!(s.take_notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_header_parts() {
        let (mut s, _) = session(document(2, 6), true);
        s.go_to(1, 0);
        let header = s.header();
        assert!(header.starts_with(" session  │  Ch 2/2: Chapter 2"));
        assert!(header.contains("P 1-2/2"));
        assert!(header.contains("75%"));
        assert!(header.contains("Compact"));
        assert!(header.ends_with("DUAL"));
    }

    #[test]
    fn test_gap_detection_uses_first_paragraph_of_page() {
        let doc = document(2, 6);
        let cache = Arc::new(MemoryCache::new());
        for p in doc.chapters[0].paragraphs.iter() {
            cache
                .store(&CacheEntry::new(p, "t", "zh-CN", "test"))
                .unwrap();
        }
        let engine = Arc::new(TranslationEngine::new(TranslationConfig::default(), cache));
        let params = LayoutParams::new(Viewport::new(30, 3), LineSpacing::new(0), false);
        let mut s = ReaderSession::new(doc, engine, Arc::new(MemoryStore::new()), params);

        s.go_to(1, 0);
        assert!(!s.has_untranslated_before_cursor());
        s.go_to(1, 1);
        assert!(s.has_untranslated_before_cursor());
    }

    #[test]
    fn test_page_paragraphs_follow_ranges() {
        let (s, _) = session(document(1, 6), false);
        assert_eq!(s.page_paragraphs(1), vec!["c0p3", "c0p4", "c0p5"]);
        assert!(s.page_paragraphs(5).is_empty());
    }
}
