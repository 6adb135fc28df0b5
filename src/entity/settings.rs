use sea_orm::entity::prelude::*;

pub const STORE_SETTINGS_KEY: &str = "store";
pub const ROLE_ACCESS_KEY: &str = "role_access";
pub const SIGNAGE_SETTINGS_KEY: &str = "signage";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: Json,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
