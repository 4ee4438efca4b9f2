//! End-to-end compiler tests against in-memory repositories and a
//! tempdir-backed filesystem store.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memoir_common::storage::filesystem::FilesystemAssetStore;
use memoir_common::{AssetStore, MediaCategory, MediaRef};
use memoir_server::compile::{
    BookRecord, BookRecords, CompileError, DocumentCompiler, EntryRecord, EntryRender,
    EntrySource, PageKind,
};
use printpdf::image_crate::{DynamicImage, ImageFormat};

struct FakeEntries(Vec<EntryRecord>);

#[async_trait]
impl EntrySource for FakeEntries {
    async fn list_answered(&self, _owner_id: i32) -> Result<Vec<EntryRecord>, CompileError> {
        Ok(self.0.clone())
    }
}

struct FakeBooks {
    book: Option<BookRecord>,
    artifact: Mutex<Option<(i32, MediaRef, DateTime<Utc>)>>,
}

impl FakeBooks {
    fn holding(book: BookRecord) -> Self {
        Self {
            book: Some(book),
            artifact: Mutex::new(None),
        }
    }

    fn empty() -> Self {
        Self {
            book: None,
            artifact: Mutex::new(None),
        }
    }

    fn persisted_artifact(&self) -> Option<MediaRef> {
        self.artifact.lock().unwrap().as_ref().map(|(_, r, _)| r.clone())
    }
}

#[async_trait]
impl BookRecords for FakeBooks {
    async fn get(&self, book_id: i32) -> Result<Option<BookRecord>, CompileError> {
        Ok(self.book.clone().filter(|b| b.id == book_id))
    }

    async fn set_artifact(
        &self,
        book_id: i32,
        artifact: &MediaRef,
        at: DateTime<Utc>,
    ) -> Result<(), CompileError> {
        *self.artifact.lock().unwrap() = Some((book_id, artifact.clone(), at));
        Ok(())
    }
}

async fn temp_assets() -> (Arc<dyn AssetStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemAssetStore::new(dir.path().join("assets"), 64 * 1024 * 1024)
        .await
        .unwrap();
    (Arc::new(store), dir)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::new_rgb8(width, height);
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn book(id: i32, owner_id: i32, cover: Option<MediaRef>) -> BookRecord {
    BookRecord {
        id,
        owner_id,
        title: "My Year".into(),
        subtitle: Some("2024".into()),
        cover_image: cover,
    }
}

fn answered(id: i32, answer: &str, image: Option<MediaRef>) -> EntryRecord {
    EntryRecord {
        id,
        answer: answer.into(),
        image,
    }
}

#[tokio::test]
async fn cover_title_and_one_page_per_entry() {
    let (assets, _dir) = temp_assets().await;
    let cover = assets
        .store(&png_bytes(350, 600), MediaCategory::Cover, "png")
        .await
        .unwrap();
    let photo = assets
        .store(&png_bytes(800, 600), MediaCategory::EntryImage, "png")
        .await
        .unwrap();

    let books = FakeBooks::holding(book(7, 1, Some(cover)));
    let entries = FakeEntries(vec![
        answered(1, "We hiked the ridge at dawn.", Some(photo)),
        answered(2, "Quiet week. Mostly rain.", None),
    ]);

    let outcome = DocumentCompiler::new(assets.clone())
        .compile(1, 7, &books, &entries)
        .await
        .unwrap();

    assert_eq!(
        outcome.pages,
        vec![
            PageKind::Cover,
            PageKind::Title,
            PageKind::Entry(1),
            PageKind::Entry(2),
        ]
    );
    assert_eq!(
        outcome.entries,
        vec![(1, EntryRender::Rendered), (2, EntryRender::Rendered)]
    );

    // The artifact reference is non-empty, persisted, and resolvable.
    assert!(!outcome.artifact.to_string().is_empty());
    assert_eq!(books.persisted_artifact(), Some(outcome.artifact.clone()));
    let bytes = assets.read(&outcome.artifact).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn zero_answered_entries_fails_without_store_writes() {
    let (assets, dir) = temp_assets().await;
    let books = FakeBooks::holding(book(7, 1, None));
    let entries = FakeEntries(vec![]);

    let result = DocumentCompiler::new(assets)
        .compile(1, 7, &books, &entries)
        .await;

    assert!(matches!(result, Err(CompileError::NoAnsweredEntries)));
    assert!(books.persisted_artifact().is_none());

    let pdf_dir = dir.path().join("assets").join("pdf");
    assert_eq!(std::fs::read_dir(pdf_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn whitespace_answers_do_not_count_as_eligible() {
    let (assets, _dir) = temp_assets().await;
    let books = FakeBooks::holding(book(7, 1, None));
    let entries = FakeEntries(vec![answered(1, "   ", None)]);

    let result = DocumentCompiler::new(assets)
        .compile(1, 7, &books, &entries)
        .await;

    assert!(matches!(result, Err(CompileError::NoAnsweredEntries)));
}

#[tokio::test]
async fn missing_book_is_not_found() {
    let (assets, _dir) = temp_assets().await;
    let books = FakeBooks::empty();
    let entries = FakeEntries(vec![answered(1, "answered", None)]);

    let result = DocumentCompiler::new(assets)
        .compile(1, 7, &books, &entries)
        .await;

    assert!(matches!(result, Err(CompileError::BookNotFound(7))));
}

#[tokio::test]
async fn another_owners_book_is_hidden() {
    let (assets, _dir) = temp_assets().await;
    let books = FakeBooks::holding(book(7, 2, None));
    let entries = FakeEntries(vec![answered(1, "answered", None)]);

    let result = DocumentCompiler::new(assets)
        .compile(1, 7, &books, &entries)
        .await;

    assert!(matches!(result, Err(CompileError::BookNotFound(7))));
}

#[tokio::test]
async fn unresolvable_cover_skips_cover_page_without_aborting() {
    let (assets, _dir) = temp_assets().await;
    let phantom = MediaRef::parse("media/cover/gone.png").unwrap();
    let books = FakeBooks::holding(book(7, 1, Some(phantom)));
    let entries = FakeEntries(vec![answered(1, "still compiles", None)]);

    let outcome = DocumentCompiler::new(assets)
        .compile(1, 7, &books, &entries)
        .await
        .unwrap();

    assert_eq!(outcome.pages, vec![PageKind::Title, PageKind::Entry(1)]);
    assert!(books.persisted_artifact().is_some());
}

#[tokio::test]
async fn missing_subtitle_skips_title_page() {
    let (assets, _dir) = temp_assets().await;
    let mut record = book(7, 1, None);
    record.subtitle = None;
    let books = FakeBooks::holding(record);
    let entries = FakeEntries(vec![answered(1, "no front matter", None)]);

    let outcome = DocumentCompiler::new(assets)
        .compile(1, 7, &books, &entries)
        .await
        .unwrap();

    assert_eq!(outcome.pages, vec![PageKind::Entry(1)]);
}

#[tokio::test]
async fn missing_entry_image_renders_text_only() {
    let (assets, _dir) = temp_assets().await;
    let phantom = MediaRef::parse("media/entryImage/gone.png").unwrap();
    let books = FakeBooks::holding(book(7, 1, None));
    let entries = FakeEntries(vec![answered(1, "the photo is lost", Some(phantom))]);

    let outcome = DocumentCompiler::new(assets)
        .compile(1, 7, &books, &entries)
        .await
        .unwrap();

    assert_eq!(outcome.pages, vec![PageKind::Title, PageKind::Entry(1)]);
    assert_eq!(outcome.entries, vec![(1, EntryRender::RenderedTextOnly)]);
}

#[tokio::test]
async fn undecodable_entry_image_renders_text_only() {
    let (assets, _dir) = temp_assets().await;
    let garbage = assets
        .store(b"not an image at all", MediaCategory::EntryImage, "png")
        .await
        .unwrap();
    let books = FakeBooks::holding(book(7, 1, None));
    let entries = FakeEntries(vec![answered(1, "bad bytes behind the ref", Some(garbage))]);

    let outcome = DocumentCompiler::new(assets)
        .compile(1, 7, &books, &entries)
        .await
        .unwrap();

    assert_eq!(outcome.entries, vec![(1, EntryRender::RenderedTextOnly)]);
}

#[tokio::test]
async fn long_answers_flow_onto_continuation_pages() {
    let (assets, _dir) = temp_assets().await;
    let books = FakeBooks::holding(book(7, 1, None));
    let long_answer = "A sentence that repeats. ".repeat(500);
    let entries = FakeEntries(vec![answered(1, &long_answer, None)]);

    let outcome = DocumentCompiler::new(assets.clone())
        .compile(1, 7, &books, &entries)
        .await
        .unwrap();

    // Continuation pages do not add logical pages.
    assert_eq!(outcome.pages, vec![PageKind::Title, PageKind::Entry(1)]);
    let bytes = assets.read(&outcome.artifact).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn recompiling_overwrites_the_artifact_reference() {
    let (assets, _dir) = temp_assets().await;
    let books = FakeBooks::holding(book(7, 1, None));
    let entries = FakeEntries(vec![answered(1, "same content", None)]);
    let compiler = DocumentCompiler::new(assets.clone());

    let first = compiler.compile(1, 7, &books, &entries).await.unwrap();
    let second = compiler.compile(1, 7, &books, &entries).await.unwrap();

    assert_ne!(first.artifact, second.artifact);
    assert_eq!(books.persisted_artifact(), Some(second.artifact.clone()));
    // The superseded artifact is left orphaned, not deleted.
    assert!(assets.exists(&first.artifact).await.unwrap());
    assert!(assets.exists(&second.artifact).await.unwrap());
}

#[tokio::test]
async fn entries_are_never_mutated_by_compilation() {
    let (assets, _dir) = temp_assets().await;
    let books = FakeBooks::holding(book(7, 1, None));
    let records = vec![
        answered(1, "first", None),
        answered(2, "second", None),
    ];
    let entries = FakeEntries(records.clone());

    DocumentCompiler::new(assets)
        .compile(1, 7, &books, &entries)
        .await
        .unwrap();

    // Compile is a view: the source still holds every record unchanged.
    let after = entries.list_answered(1).await.unwrap();
    assert_eq!(after.len(), records.len());
    assert_eq!(after[0].answer, "first");
    assert_eq!(after[1].answer, "second");
}
