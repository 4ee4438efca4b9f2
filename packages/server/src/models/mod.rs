pub mod book;
pub mod compile;
pub mod entry;
pub mod shared;
