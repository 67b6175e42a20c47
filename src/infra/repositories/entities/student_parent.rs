use sea_orm::entity::prelude::*;

use crate::domain::ParentLink;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "student_parents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub parent_id: Uuid,
    /// FATHER, MOTHER, ... (stored upper-cased)
    pub relationship_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ParentLink {
    fn from(model: Model) -> Self {
        ParentLink {
            parent_id: model.parent_id,
            relationship_type: model.relationship_type,
        }
    }
}
