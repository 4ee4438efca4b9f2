use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memoir_common::{AssetStore, MediaCategory, MediaRef, StorageError};
use printpdf::image_crate::{self, DynamicImage, GenericImageView};

use super::layout::{self, Cursor, PageMetrics};
use super::pdf::PdfSink;

/// An answered entry as the compiler consumes it.
#[derive(Clone, Debug)]
pub struct EntryRecord {
    pub id: i32,
    pub answer: String,
    pub image: Option<MediaRef>,
}

/// The book fields the compiler needs.
#[derive(Clone, Debug)]
pub struct BookRecord {
    pub id: i32,
    pub owner_id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub cover_image: Option<MediaRef>,
}

/// Read contract over the owner's answered entries.
///
/// Order is significant and must be stable (insertion order).
#[async_trait]
pub trait EntrySource: Send + Sync {
    async fn list_answered(&self, owner_id: i32) -> Result<Vec<EntryRecord>, CompileError>;
}

/// Contract over book records: lookup plus the artifact-reference write-back.
#[async_trait]
pub trait BookRecords: Send + Sync {
    async fn get(&self, book_id: i32) -> Result<Option<BookRecord>, CompileError>;

    async fn set_artifact(
        &self,
        book_id: i32,
        artifact: &MediaRef,
        at: DateTime<Utc>,
    ) -> Result<(), CompileError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("book {0} not found")]
    BookNotFound(i32),
    #[error("no answered entries to compile")]
    NoAnsweredEntries,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("repository error: {0}")]
    Repository(String),
    #[error("render error: {0}")]
    Render(String),
}

/// A logical page in the compiled document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    Cover,
    Title,
    Entry(i32),
}

/// What happened to one entry during compilation.
///
/// Explicit values rather than log lines, so callers and tests can observe
/// the per-entry behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryRender {
    /// Image and text both rendered.
    Rendered,
    /// The image reference was missing or undecodable; text rendered alone.
    RenderedTextOnly,
    /// The entry contributed nothing to the document.
    Skipped(String),
}

#[derive(Debug)]
pub struct CompileOutcome {
    pub artifact: MediaRef,
    /// Logical page outline, in order. Continuation pages produced by
    /// overflowing entry text are not listed separately.
    pub pages: Vec<PageKind>,
    /// One element per entry returned by the source, in source order.
    pub entries: Vec<(i32, EntryRender)>,
}

/// Compiles an owner's answered entries into a single paginated PDF.
///
/// Compilation is a view: entries are never mutated or deleted. Scope is the
/// whole owner; the book contributes cover art and title/subtitle only.
pub struct DocumentCompiler {
    assets: Arc<dyn AssetStore>,
    metrics: PageMetrics,
}

impl DocumentCompiler {
    pub fn new(assets: Arc<dyn AssetStore>) -> Self {
        Self {
            assets,
            metrics: PageMetrics::default(),
        }
    }

    /// Compile the document and persist the artifact reference on the book.
    ///
    /// Fails with `BookNotFound` if the book is absent or owned by someone
    /// else, and with `NoAnsweredEntries` if the owner has nothing eligible;
    /// neither failure writes to the asset store. Concurrent compiles for the
    /// same book race benignly: the last writer's artifact reference wins,
    /// and superseded artifacts are left orphaned.
    pub async fn compile(
        &self,
        owner_id: i32,
        book_id: i32,
        books: &dyn BookRecords,
        entries: &dyn EntrySource,
    ) -> Result<CompileOutcome, CompileError> {
        let book = books
            .get(book_id)
            .await?
            .filter(|b| b.owner_id == owner_id)
            .ok_or(CompileError::BookNotFound(book_id))?;

        let records = entries.list_answered(owner_id).await?;
        if !records.iter().any(|e| !e.answer.trim().is_empty()) {
            return Err(CompileError::NoAnsweredEntries);
        }

        tracing::info!(owner_id, book_id, entries = records.len(), "compiling document");

        let mut sink = PdfSink::new(&book.title, self.metrics)
            .map_err(|e| CompileError::Render(e.to_string()))?;
        let mut pages = Vec::new();
        let mut outcomes = Vec::new();
        // The sink opens with one blank page already present.
        let mut first_page_used = false;
        let mut next_page = |sink: &mut PdfSink| {
            if first_page_used {
                sink.add_page();
            } else {
                first_page_used = true;
            }
        };

        if let Some(cover_ref) = &book.cover_image {
            if let Some(image) = self.load_image(cover_ref, "cover").await {
                next_page(&mut sink);
                self.render_cover(&sink, &image);
                pages.push(PageKind::Cover);
            }
        }

        if let Some(subtitle) = book.subtitle.as_deref().filter(|s| !s.trim().is_empty())
            && !book.title.trim().is_empty()
        {
            next_page(&mut sink);
            self.render_title(&sink, &book.title, subtitle);
            pages.push(PageKind::Title);
        }

        for entry in &records {
            if entry.answer.trim().is_empty() {
                outcomes.push((entry.id, EntryRender::Skipped("empty answer".into())));
                continue;
            }

            next_page(&mut sink);
            let render = self.render_entry(&mut sink, entry).await;
            pages.push(PageKind::Entry(entry.id));
            outcomes.push((entry.id, render));
        }

        let bytes = sink
            .finish()
            .map_err(|e| CompileError::Render(e.to_string()))?;

        // The store fsyncs before the reference becomes visible, so a
        // returned reference is safe to serve immediately.
        let artifact = self
            .assets
            .store(&bytes, MediaCategory::Document, "pdf")
            .await?;

        books.set_artifact(book_id, &artifact, Utc::now()).await?;

        tracing::info!(owner_id, book_id, %artifact, pages = pages.len(), "document compiled");

        Ok(CompileOutcome {
            artifact,
            pages,
            entries: outcomes,
        })
    }

    fn render_cover(&self, sink: &PdfSink, image: &DynamicImage) {
        let (w, h) = image.dimensions();
        let cover = layout::compose_cover(w, h, &self.metrics);
        sink.image(image, cover.x, cover.y, cover.size.width, cover.size.height);
    }

    fn render_title(&self, sink: &PdfSink, title: &str, subtitle: &str) {
        let comp = layout::compose_title(&self.metrics);
        sink.text(
            subtitle,
            comp.subtitle_size,
            layout::centered_x(subtitle, comp.subtitle_size, &self.metrics),
            comp.subtitle_y,
        );
        sink.text(
            title,
            comp.title_size,
            layout::centered_x(title, comp.title_size, &self.metrics),
            comp.title_y,
        );
    }

    /// Render one entry onto a fresh page: fitted image first (when its
    /// reference resolves and decodes), answer text below, overflowing onto
    /// continuation pages.
    async fn render_entry(&self, sink: &mut PdfSink, entry: &EntryRecord) -> EntryRender {
        let mut cursor = Cursor::new(self.metrics);
        let mut render = EntryRender::RenderedTextOnly;

        match &entry.image {
            Some(image_ref) => {
                if let Some(image) = self.load_image(image_ref, "entry image").await {
                    let (w, h) = image.dimensions();
                    let fitted = layout::fit_to_width(w, h, &self.metrics);
                    let placed =
                        cursor.place(fitted.height + layout::line_height(layout::BODY_FONT_SIZE));
                    sink.image(
                        &image,
                        self.metrics.margins.left,
                        placed.y,
                        fitted.width,
                        fitted.height,
                    );
                    render = EntryRender::Rendered;
                }
            }
            None => render = EntryRender::Rendered,
        }

        let lines = layout::wrap_text(
            &entry.answer,
            layout::BODY_FONT_SIZE,
            self.metrics.content_width(),
        );
        for line in lines {
            let placed = cursor.place(layout::line_height(layout::BODY_FONT_SIZE));
            if placed.page_break {
                sink.add_page();
            }
            sink.text(
                &line,
                layout::BODY_FONT_SIZE,
                self.metrics.margins.left,
                placed.y,
            );
        }

        render
    }

    /// Fetch and decode an optional image. Any failure is recoverable here:
    /// the caller renders without the image.
    async fn load_image(&self, media_ref: &MediaRef, what: &str) -> Option<DynamicImage> {
        let bytes = match self.assets.read(media_ref).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(%media_ref, %err, "skipping unresolvable {what}");
                return None;
            }
        };
        match image_crate::load_from_memory(&bytes) {
            Ok(image) => Some(image),
            Err(err) => {
                tracing::warn!(%media_ref, %err, "skipping undecodable {what}");
                None
            }
        }
    }
}
