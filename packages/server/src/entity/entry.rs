use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning user. Accounts live in an external system; only the id is kept.
    pub owner_id: i32,

    /// The prompt issued to the owner.
    pub prompt: String,

    /// The owner's answer. Presence (non-empty) makes the entry eligible for
    /// compilation.
    pub answer: Option<String>,

    /// Media reference (`media/entryImage/…`) for an attached image.
    pub image: Option<String>,

    /// Media reference (`media/entryAudio/…`) for an attached recording.
    pub audio: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
