pub mod compiler;
pub mod layout;
pub mod pdf;
pub mod repo;

pub use compiler::{
    BookRecord, BookRecords, CompileError, CompileOutcome, DocumentCompiler, EntryRecord,
    EntryRender, EntrySource, PageKind,
};
