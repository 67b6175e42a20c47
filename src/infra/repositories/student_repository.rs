//! Student repository, including the guardian pointer and the parent pivot.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::{guardian, parent, student, student_parent};
use super::unique_violation;
use crate::domain::{GuardianKind, GuardianRef, Parent, ParentLink, Student};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Student>>;

    async fn find_by_nisn(&self, nisn: &str) -> AppResult<Option<Student>>;

    /// Lookup by NIK blind index.
    async fn find_by_nik_hash(&self, nik_hash: &str) -> AppResult<Option<Student>>;

    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Student>>;

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<Student>, u64)>;

    async fn create(&self, student: Student) -> AppResult<Student>;

    /// Persist every column except the guardian pointer.
    async fn update(&self, student: Student) -> AppResult<Student>;

    /// Delete the student and its parent links.
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Point the student at a parent, a guardian, or nobody.
    ///
    /// Runs in one transaction: the student must exist and a set target must
    /// exist in the table its kind names.
    async fn set_guardian(&self, id: Uuid, guardian: GuardianRef) -> AppResult<Student>;

    /// Linked parents with the relationship recorded on the pivot.
    async fn parents_of(&self, id: Uuid) -> AppResult<Vec<(Parent, String)>>;

    /// Replace the student's parent links with `links` in one transaction.
    async fn sync_parents(&self, id: Uuid, links: Vec<ParentLink>) -> AppResult<()>;
}

pub struct StudentStore {
    db: DatabaseConnection,
}

impl StudentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_one(
        &self,
        filter: sea_orm::sea_query::SimpleExpr,
    ) -> AppResult<Option<Student>> {
        student::Entity::find()
            .filter(filter)
            .one(&self.db)
            .await?
            .map(Student::try_from)
            .transpose()
    }
}

/// Number of students whose guardian pointer targets `(kind, target_id)`.
async fn guardian_references<C: ConnectionTrait>(
    db: &C,
    kind: GuardianKind,
    target_id: Uuid,
) -> AppResult<u64> {
    Ok(student::Entity::find()
        .filter(student::Column::GuardianType.eq(kind.tag()))
        .filter(student::Column::GuardianId.eq(target_id))
        .count(db)
        .await?)
}

/// Refuse to remove a record some student still names as guardian.
pub(super) async fn ensure_not_guardian<C: ConnectionTrait>(
    db: &C,
    kind: GuardianKind,
    target_id: Uuid,
) -> AppResult<()> {
    let count = guardian_references(db, kind, target_id).await?;
    if count > 0 {
        return Err(AppError::conflict(format!(
            "{} {} is the guardian of {} student(s)",
            kind, target_id, count
        )));
    }
    Ok(())
}

fn to_active_model(s: Student) -> student::ActiveModel {
    let (guardian_id, guardian_type) = s.guardian.to_columns();
    student::ActiveModel {
        id: Set(s.id),
        nisn: Set(s.nisn),
        full_name: Set(s.full_name),
        gender: Set(s.gender.as_str().to_string()),
        birth_place: Set(s.birth_place),
        birth_date: Set(s.birth_date),
        address: Set(s.address),
        nik: Set(s.nik),
        nik_hash: Set(s.nik_hash),
        no_kk: Set(s.no_kk),
        guardian_id: Set(guardian_id),
        guardian_type: Set(guardian_type),
        user_id: Set(s.user_id),
        created_at: Set(s.created_at),
        updated_at: Set(s.updated_at),
    }
}

#[async_trait]
impl StudentRepository for StudentStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Student>> {
        self.find_one(student::Column::Id.eq(id)).await
    }

    async fn find_by_nisn(&self, nisn: &str) -> AppResult<Option<Student>> {
        self.find_one(student::Column::Nisn.eq(nisn)).await
    }

    async fn find_by_nik_hash(&self, nik_hash: &str) -> AppResult<Option<Student>> {
        self.find_one(student::Column::NikHash.eq(nik_hash)).await
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Student>> {
        self.find_one(student::Column::UserId.eq(user_id)).await
    }

    async fn list(&self, params: PaginationParams) -> AppResult<(Vec<Student>, u64)> {
        let paginator = student::Entity::find()
            .order_by_asc(student::Column::FullName)
            .paginate(&self.db, params.limit());
        let total = paginator.num_items().await?;
        let students = paginator
            .fetch_page(params.page.saturating_sub(1))
            .await?
            .into_iter()
            .map(Student::try_from)
            .collect::<AppResult<Vec<_>>>()?;
        Ok((students, total))
    }

    async fn create(&self, student: Student) -> AppResult<Student> {
        let model = to_active_model(student)
            .insert(&self.db)
            .await
            .map_err(|e| unique_violation(e, "Student"))?;
        Student::try_from(model)
    }

    async fn update(&self, s: Student) -> AppResult<Student> {
        let existing = student::Entity::find_by_id(s.id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Student")?;

        let mut active: student::ActiveModel = existing.into();
        active.nisn = Set(s.nisn);
        active.full_name = Set(s.full_name);
        active.gender = Set(s.gender.as_str().to_string());
        active.birth_place = Set(s.birth_place);
        active.birth_date = Set(s.birth_date);
        active.address = Set(s.address);
        active.nik = Set(s.nik);
        active.nik_hash = Set(s.nik_hash);
        active.no_kk = Set(s.no_kk);
        active.user_id = Set(s.user_id);
        active.updated_at = Set(chrono::Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| unique_violation(e, "Student"))?;
        Student::try_from(model)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let txn = self.db.begin().await?;

        student_parent::Entity::delete_many()
            .filter(student_parent::Column::StudentId.eq(id))
            .exec(&txn)
            .await?;

        let result = student::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Student"));
        }

        txn.commit().await?;
        Ok(())
    }

    async fn set_guardian(&self, id: Uuid, guardian_ref: GuardianRef) -> AppResult<Student> {
        let txn = self.db.begin().await?;

        let existing = student::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_not_found("Student")?;

        match guardian_ref.target() {
            Some((GuardianKind::Parent, target_id)) => {
                parent::Entity::find_by_id(target_id)
                    .one(&txn)
                    .await?
                    .ok_or_not_found("Parent")?;
            }
            Some((GuardianKind::Guardian, target_id)) => {
                guardian::Entity::find_by_id(target_id)
                    .one(&txn)
                    .await?
                    .ok_or_not_found("Guardian")?;
            }
            None => {}
        }

        let (guardian_id, guardian_type) = guardian_ref.to_columns();
        let mut active: student::ActiveModel = existing.into();
        active.guardian_id = Set(guardian_id);
        active.guardian_type = Set(guardian_type);
        active.updated_at = Set(chrono::Utc::now());
        let model = active.update(&txn).await?;

        txn.commit().await?;
        Student::try_from(model)
    }

    async fn parents_of(&self, id: Uuid) -> AppResult<Vec<(Parent, String)>> {
        let links = student_parent::Entity::find()
            .filter(student_parent::Column::StudentId.eq(id))
            .all(&self.db)
            .await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let parent_ids: Vec<Uuid> = links.iter().map(|l| l.parent_id).collect();
        let parents = parent::Entity::find()
            .filter(parent::Column::Id.is_in(parent_ids))
            .order_by_asc(parent::Column::FullName)
            .all(&self.db)
            .await?;

        Ok(parents
            .into_iter()
            .filter_map(|model| {
                let relationship = links
                    .iter()
                    .find(|l| l.parent_id == model.id)?
                    .relationship_type
                    .clone();
                Some((Parent::from(model), relationship))
            })
            .collect())
    }

    async fn sync_parents(&self, id: Uuid, links: Vec<ParentLink>) -> AppResult<()> {
        let txn = self.db.begin().await?;

        student::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_not_found("Student")?;

        for link in &links {
            parent::Entity::find_by_id(link.parent_id)
                .one(&txn)
                .await?
                .ok_or_not_found("Parent")?;
        }

        student_parent::Entity::delete_many()
            .filter(student_parent::Column::StudentId.eq(id))
            .exec(&txn)
            .await?;

        if !links.is_empty() {
            let rows = links.into_iter().map(|link| student_parent::ActiveModel {
                student_id: Set(id),
                parent_id: Set(link.parent_id),
                relationship_type: Set(link.relationship_type),
            });
            student_parent::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await?;
        }

        student::Entity::update_many()
            .col_expr(student::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(student::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }
}
