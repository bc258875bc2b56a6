use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    /// Dotted identifier such as `users.view`; the only thing checks look at.
    #[sea_orm(unique)]
    pub key: String,
    /// Free-text label used to group permissions in admin screens.
    pub group: Option<String>,
    pub description: Option<String>,

    #[sea_orm(has_many, via = "role_has_permission")]
    pub roles: HasMany<super::role::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
