use sea_orm::entity::prelude::*;

use crate::domain::Parent;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "parents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub full_name: String,
    pub nik: String,
    #[sea_orm(unique)]
    pub nik_hash: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub occupation: Option<String>,
    pub address: Option<String>,
    #[sea_orm(unique)]
    pub user_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Parent {
    fn from(model: Model) -> Self {
        Parent {
            id: model.id,
            full_name: model.full_name,
            nik: model.nik,
            nik_hash: model.nik_hash,
            phone: model.phone,
            email: model.email,
            occupation: model.occupation,
            address: model.address,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
