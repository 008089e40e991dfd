//! Reader engine: page model, content pipeline and the effect runner behind
//! reading mode.
mod clipboard;
mod config;
mod decode;
mod dom;
mod error;
mod extract;
mod markdown;
mod notify;
mod outline;
mod page;
mod persist;
mod render;
mod sanitize;
mod selection;
mod session;
mod store;
mod suitability;
mod summary;
mod typography;
mod viewer;

pub use clipboard::{
    Clipboard, ClipboardError, FallbackClipboard, MemoryClipboard, UnavailableClipboard,
};
pub use config::{NoticeTiming, ReaderConfig, SuitabilityConfig, SummaryConfig};
pub use decode::{decode_page, DecodeError, DecodedPage};
pub use dom::{ControlButton, Document, DomNode, ElementData, Role};
pub use error::{ExtractionError, PageError, ReaderError, SanitizeError, SuitabilityError};
pub use extract::{
    Article, ExtractedContent, ExtractionAdapter, Extractor, ReadabilityLikeExtractor,
};
pub use markdown::{
    clean_markdown, export_html, export_markdown, Converter, Html2MdConverter, PlainTextConverter,
};
pub use notify::{ChannelListener, DetachedListener, NotifyError, StateListener, TabListener};
pub use outline::{progress_percent, sync_progress, Outline, OutlineEntry, ScrollMetrics};
pub use page::Page;
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use render::{
    apply_image_fit, apply_styles, content_images, control_name, parse_control, render,
    rendered_title, ImageFit, IMAGE_INDEX_ATTR, SHOW_IMAGES_ATTR,
};
pub use sanitize::{sanitize, sanitize_html};
pub use selection::Selection;
pub use session::{
    Command, SessionController, API_KEY_INVALID, API_KEY_SAVED, MARKDOWN_COPIED,
    MARKDOWN_COPY_FAILED, NO_OUTLINE, SELECTION_COPIED, SELECTION_COPY_FAILED,
};
pub use store::{
    load_api_key, load_settings, save_api_key, save_settings, settings_from_json,
    settings_to_json, KeyValueStore, MemoryStore, StoreError, API_KEY_KEY, SETTINGS_KEY,
};
pub use suitability::SuitabilityClassifier;
pub use summary::{
    delta_content, render_summary_html, summary_input, ChannelSummarySink, NullSummarySink,
    ReqwestSummaryClient, SseLines, Summarizer, Summary, SummaryClient, SummaryError,
    SummaryInput, SummarySink,
};
pub use typography::{collapse_whitespace, is_cjk, normalize_text};
pub use viewer::{ImageViewer, Key, ViewerImage, Viewport};
