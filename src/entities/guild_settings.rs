//! Guild settings entity - One document per guild holding its prefixes and language.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Guild settings database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guild_settings")]
pub struct Model {
    /// Discord guild ID, stored as text
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Custom prefixes as a JSON array; an empty array means the defaults apply
    pub prefixes: String,
    /// Language tag (e.g. `en_US`); None means the default language
    pub language: Option<String>,
    /// When this document was last written
    pub updated_at: DateTimeUtc,
}

/// Guild settings have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
