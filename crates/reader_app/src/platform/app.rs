use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use reader_core::{IconVariant, TabId, TabRegistry};
use reader_engine::{
    decode_page, AtomicFileWriter, FallbackClipboard, KeyValueStore, MemoryClipboard, MemoryStore,
    Page, SessionController, SummarySink, TabListener, UnavailableClipboard,
};
use reader_logging::{reader_info, reader_trace, reader_warn};

use super::cli::Cli;
use super::persistence::FileStore;

/// The single page this process works on.
const TAB: TabId = 1;

/// Progress of a streamed summary, reported as a character count.
struct LogSink;

impl SummarySink for LogSink {
    fn partial(&self, text: &str) {
        reader_trace!("summary: {} chars received", text.chars().count());
    }
}

pub async fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let bytes = fs::read(&cli.input).with_context(|| format!("reading {:?}", cli.input))?;
    let decoded = decode_page(&bytes).with_context(|| format!("decoding {:?}", cli.input))?;
    reader_info!("Loaded {:?} as {}", cli.input, decoded.encoding);

    let store: Arc<dyn KeyValueStore> = match &cli.state_dir {
        Some(dir) => Arc::new(FileStore::open(dir.clone())),
        None => Arc::new(MemoryStore::new()),
    };
    let registry = Arc::new(Mutex::new(TabRegistry::new()));
    let page = Page::parse(cli.url.clone(), &decoded.html);
    let mut controller = SessionController::new(page, cli.reader_config())
        .with_store(store)
        .with_listener(Box::new(TabListener::new(TAB, registry.clone())));

    if let Some(key) = &cli.api_key {
        if !controller.save_api_key(key).await {
            reader_warn!("API key was not stored");
        }
    }

    if let Err(err) = controller.toggle().await {
        eprintln!("{}", err.user_message());
        reader_warn!("Reading mode unavailable for {}: {}", cli.url, err);
        return Ok(ExitCode::FAILURE);
    }
    let view = controller.state().view();
    reader_info!("Session {:?}, images shown: {}", view.phase, view.show_images);

    if let Some(path) = &cli.markdown {
        let clipboard = FallbackClipboard::new(UnavailableClipboard, MemoryClipboard::new());
        let markdown = controller
            .copy_markdown(&clipboard)
            .await
            .ok_or_else(|| anyhow!("markdown export failed"))?;
        write_file(path, &markdown)?;
    }

    if cli.summarize {
        match controller.summarize(false, &LogSink).await {
            Ok(summary) => println!("{}", summary_text(&summary)),
            Err(err) => eprintln!("Summary unavailable: {err}"),
        }
    }

    let html = controller.page().html();
    match &cli.output {
        Some(path) => {
            write_file(path, &html)?;
        }
        None => println!("{html}"),
    }

    if let Ok(registry) = registry.lock() {
        let icon = IconVariant::for_state(registry.is_active(TAB));
        if let Some((_, path)) = icon.paths().first() {
            reader_info!("Toolbar icon: {path}");
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn write_file(path: &Path, content: &str) -> anyhow::Result<PathBuf> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("invalid output path {path:?}"))?;
    let written = AtomicFileWriter::new(dir)
        .write(name, content)
        .with_context(|| format!("writing {path:?}"))?;
    reader_info!("Wrote {:?}", written);
    Ok(written)
}

fn summary_text(summary: &reader_engine::Summary) -> String {
    let mut out = Vec::new();
    if !summary.summary.is_empty() {
        out.push(format!("Overview\n{}", summary.summary));
    }
    let tags = summary.tag_list();
    if !tags.is_empty() {
        out.push(format!("Tags\n{}", tags.join(", ")));
    }
    if !summary.key_points.is_empty() {
        let points: Vec<String> = summary.key_points.iter().map(|p| format!("- {p}")).collect();
        out.push(format!("Key points\n{}", points.join("\n")));
    }
    if !summary.conclusion.is_empty() {
        out.push(format!("Conclusion\n{}", summary.conclusion));
    }
    if !summary.reflection.is_empty() {
        out.push(format!("Reflection\n{}", summary.reflection));
    }
    out.join("\n\n")
}
