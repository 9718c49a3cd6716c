//! Bookworm 命令行入口

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};

use bookworm::document::load_document;
use bookworm::layout::{self, LayoutParams, LineSpacing, TranslationLookup, Viewport};
use bookworm::reader::{self, ReaderError, ReaderSession};
use bookworm::config::{config_dir, CONFIG_FILE};
use bookworm::env::generate_env_docs;
use bookworm::{AppConfig, ConfigManager, ProgressStore, RedbStore, TranslationEngine};

/// Page through ebooks in the terminal with cached bilingual translation
#[derive(Parser, Debug)]
#[command(name = "bookworm", version, about)]
struct Cli {
    /// Explicit .env file, searched before the default locations
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print rendered pages of a chapter
    Pages {
        file: PathBuf,

        /// Chapter number, starting at 1
        #[arg(long, default_value_t = 1)]
        chapter: usize,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Number of views to print
        #[arg(long, default_value_t = 1)]
        count: usize,

        #[arg(long, default_value_t = 80)]
        width: usize,

        #[arg(long, default_value_t = 24)]
        height: usize,

        /// Blank lines between paragraphs (0-3); defaults to the configured value
        #[arg(long)]
        spacing: Option<u8>,

        /// Side-by-side dual page layout
        #[arg(long, default_value_t = false)]
        dual: bool,

        /// Interleave cached translations
        #[arg(long, default_value_t = false)]
        translated: bool,
    },

    /// Translate the whole book into the cache
    Translate { file: PathBuf },

    /// Write <name>_bilingual.txt next to the book
    Export { file: PathBuf },

    /// Show translation progress, reading progress and bookmarks
    Status { file: PathBuf },

    /// Show configuration locations and supported environment variables
    Config {
        /// Write an example config.toml if none exists
        #[arg(long, default_value_t = false)]
        write: bool,
    },
}

/// 已加载的运行环境
struct Context {
    config: AppConfig,
    store: Arc<RedbStore>,
    engine: Arc<TranslationEngine>,
}

impl Context {
    fn load(env_file: Option<&Path>) -> Result<Self, ReaderError> {
        let config = ConfigManager::load(env_file)?;
        config.ensure_dirs()?;
        init_logging(&config);

        let store = Arc::new(RedbStore::open(config.db_path())?);
        let engine = Arc::new(TranslationEngine::new(
            config.translation.clone(),
            store.clone(),
        ));

        Ok(Self {
            config,
            store,
            engine,
        })
    }
}

fn init_logging(config: &AppConfig) {
    let level = tracing::Level::from_str(&config.log_level).unwrap_or(tracing::Level::INFO);
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", config.log_path().display(), e);
            return;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ReaderError::IncompleteTranslation { done, total }) => {
            eprintln!(
                "Translation incomplete: {}/{} ({}%)",
                done,
                total,
                done * 100 / total.max(1)
            );
            ExitCode::from(1)
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<(), ReaderError> {
    let context = Context::load(cli.env_file.as_deref())?;

    match cli.command {
        Command::Pages {
            file,
            chapter,
            page,
            count,
            width,
            height,
            spacing,
            dual,
            translated,
        } => {
            let spacing = spacing
                .map(LineSpacing::new)
                .unwrap_or_else(|| context.config.reader.spacing());
            let params = LayoutParams::new(Viewport::new(width, height), spacing, dual);
            print_pages(
                &context,
                &file,
                chapter.saturating_sub(1),
                page.saturating_sub(1),
                count,
                params,
                translated,
            )
            .await
        }
        Command::Translate { file } => translate(&context, &file).await,
        Command::Export { file } => {
            let document = load_document(&file).await?;
            let path = reader::export_bilingual(&document, &context.engine)?;
            println!("Exported: {}", path.display());
            Ok(())
        }
        Command::Status { file } => status(&context, &file).await,
        Command::Config { write } => show_config(&context, write),
    }
}

async fn print_pages(
    context: &Context,
    file: &Path,
    chapter: usize,
    page: usize,
    count: usize,
    params: LayoutParams,
    translated: bool,
) -> Result<(), ReaderError> {
    let document = load_document(file).await?;
    let Some(chapter) = document.chapter(chapter.min(document.chapter_count().saturating_sub(1)))
    else {
        println!("(empty)");
        return Ok(());
    };

    let lookup: Option<&dyn TranslationLookup> = if translated {
        Some(&*context.engine)
    } else {
        None
    };
    let chapter_layout = layout::reflow(chapter, &params, lookup);

    let step = if params.dual { 2 } else { 1 };
    let first = page.min(chapter_layout.page_count().saturating_sub(1));
    let first = first - first % step;

    for view in (first..chapter_layout.page_count()).step_by(step).take(count.max(1)) {
        println!(
            "── {} · {} · {}/{} ──",
            document.book.title,
            chapter.title,
            view + 1,
            chapter_layout.page_count()
        );
        for line in layout::render(&chapter_layout, view, params.dual) {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn translate(context: &Context, file: &Path) -> Result<(), ReaderError> {
    let engine = &context.engine;
    if !engine.is_configured() {
        return Err(ReaderError::ProviderNotConfigured {
            provider: engine.provider_name().to_string(),
        });
    }

    let document = load_document(file).await?;
    let paragraphs = document.all_paragraphs();

    let watcher = {
        let engine = Arc::clone(engine);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling after the current batch...");
                engine.cancel();
            }
        })
    };

    let result = engine
        .translate_all(&paragraphs, |done, total| {
            eprint!(
                "\rTranslating {}/{} ({}%)",
                done,
                total,
                done * 100 / total.max(1)
            );
            let _ = std::io::stderr().flush();
        })
        .await;
    watcher.abort();
    eprintln!();

    result?;
    let done = engine.count_translated(&paragraphs);
    if engine.is_cancelled() {
        println!("Cancelled: {}/{} paragraphs translated", done, paragraphs.len());
    } else {
        println!("Translated {}/{} paragraphs", done, paragraphs.len());
    }
    engine.close();
    Ok(())
}

async fn status(context: &Context, file: &Path) -> Result<(), ReaderError> {
    let document = load_document(file).await?;
    let (done, total) = reader::translation_progress(&document, &context.engine);

    println!("Title:      {}", document.book.title);
    println!("Chapters:   {}", document.chapter_count());
    println!(
        "Translated: {}/{} ({}%) -> {} via {}",
        done,
        total,
        done * 100 / total.max(1),
        context.engine.target_lang(),
        context.engine.provider_name()
    );

    match context.store.load_progress(&document.book.id)? {
        Some(progress) => println!(
            "Progress:   chapter {}, page {} ({:.0}%)",
            progress.chapter_index + 1,
            progress.page_index + 1,
            progress.progress_fraction * 100.0
        ),
        None => println!("Progress:   not started"),
    }

    let bookmarks = context.store.list_bookmarks(&document.book.id)?;
    if bookmarks.is_empty() {
        println!("Bookmarks:  none");
    } else {
        println!("Bookmarks:");
        for bookmark in &bookmarks {
            println!("  - {}", ReaderSession::bookmark_label(bookmark));
        }
    }
    Ok(())
}

fn show_config(context: &Context, write: bool) -> Result<(), ReaderError> {
    let config_file = config_dir().map(|dir| dir.join(CONFIG_FILE));

    match &config_file {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: (no config directory)"),
    }
    println!("Data dir:    {}", context.config.data_dir().display());
    println!(
        "Provider:    {} ({})",
        context.engine.provider_name(),
        if context.engine.is_configured() {
            "configured"
        } else {
            "not configured"
        }
    );
    println!();
    print!("{}", generate_env_docs());

    if write {
        let Some(path) = config_file else {
            return Ok(());
        };
        if path.exists() {
            println!("\n{} already exists, not overwritten", path.display());
        } else {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            ConfigManager::generate_example_config(&path)?;
            println!("\nWrote {}", path.display());
        }
    }
    Ok(())
}
