//! sea-orm-backed implementations of the compiler's repository contracts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memoir_common::MediaRef;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use super::compiler::{BookRecord, BookRecords, CompileError, EntryRecord, EntrySource};
use crate::entity::{book, entry};

fn repo_err(err: sea_orm::DbErr) -> CompileError {
    CompileError::Repository(err.to_string())
}

/// Parse a stored reference string, tolerating rows with malformed values.
fn parse_ref(stored: Option<&str>, what: &str) -> Option<MediaRef> {
    let stored = stored?;
    match MediaRef::parse(stored) {
        Ok(r) => Some(r),
        Err(err) => {
            tracing::warn!(stored, %err, "ignoring malformed {what} reference");
            None
        }
    }
}

pub struct DbEntrySource<'a> {
    pub db: &'a DatabaseConnection,
}

#[async_trait]
impl EntrySource for DbEntrySource<'_> {
    async fn list_answered(&self, owner_id: i32) -> Result<Vec<EntryRecord>, CompileError> {
        let rows = entry::Entity::find()
            .filter(entry::Column::OwnerId.eq(owner_id))
            .filter(entry::Column::Answer.is_not_null())
            .order_by_asc(entry::Column::Id)
            .all(self.db)
            .await
            .map_err(repo_err)?;

        Ok(rows
            .into_iter()
            .map(|row| EntryRecord {
                id: row.id,
                answer: row.answer.unwrap_or_default(),
                image: parse_ref(row.image.as_deref(), "entry image"),
            })
            .collect())
    }
}

pub struct DbBookRecords<'a> {
    pub db: &'a DatabaseConnection,
}

#[async_trait]
impl BookRecords for DbBookRecords<'_> {
    async fn get(&self, book_id: i32) -> Result<Option<BookRecord>, CompileError> {
        let row = book::Entity::find_by_id(book_id)
            .one(self.db)
            .await
            .map_err(repo_err)?;

        Ok(row.map(|row| BookRecord {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            subtitle: row.subtitle,
            cover_image: parse_ref(row.cover_image.as_deref(), "cover"),
        }))
    }

    async fn set_artifact(
        &self,
        book_id: i32,
        artifact: &MediaRef,
        at: DateTime<Utc>,
    ) -> Result<(), CompileError> {
        let update = book::ActiveModel {
            id: Set(book_id),
            pdf: Set(Some(artifact.to_string())),
            compiled_at: Set(Some(at)),
            ..Default::default()
        };

        book::Entity::update(update)
            .exec(self.db)
            .await
            .map_err(repo_err)?;

        Ok(())
    }
}
