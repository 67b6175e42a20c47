//! Student database entity.

use sea_orm::entity::prelude::*;

use crate::domain::{Gender, GuardianRef, Student};
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub nisn: String,
    pub full_name: String,
    pub gender: String,
    pub birth_place: Option<String>,
    pub birth_date: Option<Date>,
    pub address: Option<String>,
    pub nik: String,
    #[sea_orm(unique)]
    pub nik_hash: String,
    pub no_kk: Option<String>,
    /// Id in `parents` or `guardians`, selected by `guardian_type`
    pub guardian_id: Option<Uuid>,
    pub guardian_type: Option<String>,
    #[sea_orm(unique)]
    pub user_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Student {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let gender = Gender::from_column(&model.gender).ok_or_else(|| {
            AppError::internal(format!(
                "student {} has unknown gender {:?}",
                model.id, model.gender
            ))
        })?;
        let guardian = GuardianRef::from_columns(model.guardian_id, model.guardian_type.as_deref())?;

        Ok(Student {
            id: model.id,
            nisn: model.nisn,
            full_name: model.full_name,
            gender,
            birth_place: model.birth_place,
            birth_date: model.birth_date,
            address: model.address,
            nik: model.nik,
            nik_hash: model.nik_hash,
            no_kk: model.no_kk,
            guardian,
            user_id: model.user_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
