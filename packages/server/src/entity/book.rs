use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "book")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub owner_id: i32,

    pub title: String,

    pub subtitle: Option<String>,

    /// Media reference (`media/cover/…`) for the cover art.
    pub cover_image: Option<String>,

    /// Media reference (`media/pdf/…`) of the last compiled document.
    /// Overwritten on every compile; at most one live artifact per book.
    pub pdf: Option<String>,

    pub compiled_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
