//! Migration: students, parents, guardians, employees and the
//! student-parent pivot.
//!
//! `nik` columns hold ciphertext; `nik_hash` holds the blind index used for
//! uniqueness and lookups.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn timestamps(table: &mut TableCreateStatement, created: impl IntoIden, updated: impl IntoIden) {
    table
        .col(
            ColumnDef::new(created)
                .timestamp_with_time_zone()
                .not_null(),
        )
        .col(
            ColumnDef::new(updated)
                .timestamp_with_time_zone()
                .not_null(),
        );
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut parents = Table::create();
        parents
            .table(Parents::Table)
            .if_not_exists()
            .col(ColumnDef::new(Parents::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Parents::FullName).string().not_null())
            .col(ColumnDef::new(Parents::Nik).text().not_null())
            .col(ColumnDef::new(Parents::NikHash).string_len(64).not_null().unique_key())
            .col(ColumnDef::new(Parents::Phone).string().null())
            .col(ColumnDef::new(Parents::Email).string().null())
            .col(ColumnDef::new(Parents::Occupation).string().null())
            .col(ColumnDef::new(Parents::Address).text().null())
            .col(ColumnDef::new(Parents::UserId).uuid().null().unique_key())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_parents_user")
                    .from(Parents::Table, Parents::UserId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            );
        timestamps(&mut parents, Parents::CreatedAt, Parents::UpdatedAt);
        manager.create_table(parents.to_owned()).await?;

        let mut guardians = Table::create();
        guardians
            .table(Guardians::Table)
            .if_not_exists()
            .col(ColumnDef::new(Guardians::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Guardians::FullName).string().not_null())
            .col(ColumnDef::new(Guardians::Nik).text().not_null())
            .col(ColumnDef::new(Guardians::NikHash).string_len(64).not_null().unique_key())
            .col(ColumnDef::new(Guardians::Phone).string().null())
            .col(ColumnDef::new(Guardians::Email).string().null())
            .col(
                ColumnDef::new(Guardians::RelationshipToStudent)
                    .string()
                    .not_null(),
            )
            .col(ColumnDef::new(Guardians::Address).text().null())
            .col(ColumnDef::new(Guardians::UserId).uuid().null().unique_key())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_guardians_user")
                    .from(Guardians::Table, Guardians::UserId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            );
        timestamps(&mut guardians, Guardians::CreatedAt, Guardians::UpdatedAt);
        manager.create_table(guardians.to_owned()).await?;

        let mut employees = Table::create();
        employees
            .table(Employees::Table)
            .if_not_exists()
            .col(ColumnDef::new(Employees::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Employees::FullName).string().not_null())
            .col(ColumnDef::new(Employees::Nik).text().not_null())
            .col(ColumnDef::new(Employees::NikHash).string_len(64).not_null().unique_key())
            .col(ColumnDef::new(Employees::Nip).string().null().unique_key())
            .col(ColumnDef::new(Employees::Position).string().null())
            .col(ColumnDef::new(Employees::Phone).string().null())
            .col(ColumnDef::new(Employees::Email).string().null())
            .col(ColumnDef::new(Employees::Address).text().null())
            .col(ColumnDef::new(Employees::UserId).uuid().null().unique_key())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_employees_user")
                    .from(Employees::Table, Employees::UserId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            );
        timestamps(&mut employees, Employees::CreatedAt, Employees::UpdatedAt);
        manager.create_table(employees.to_owned()).await?;

        // guardian_id points into parents or guardians depending on
        // guardian_type, so it carries no foreign key.
        let mut students = Table::create();
        students
            .table(Students::Table)
            .if_not_exists()
            .col(ColumnDef::new(Students::Id).uuid().not_null().primary_key())
            .col(ColumnDef::new(Students::Nisn).string().not_null().unique_key())
            .col(ColumnDef::new(Students::FullName).string().not_null())
            .col(ColumnDef::new(Students::Gender).string_len(6).not_null())
            .col(ColumnDef::new(Students::BirthPlace).string().null())
            .col(ColumnDef::new(Students::BirthDate).date().null())
            .col(ColumnDef::new(Students::Address).text().null())
            .col(ColumnDef::new(Students::Nik).text().not_null())
            .col(ColumnDef::new(Students::NikHash).string_len(64).not_null().unique_key())
            .col(ColumnDef::new(Students::NoKk).text().null())
            .col(ColumnDef::new(Students::GuardianId).uuid().null())
            .col(ColumnDef::new(Students::GuardianType).string_len(16).null())
            .col(ColumnDef::new(Students::UserId).uuid().null().unique_key())
            .foreign_key(
                ForeignKey::create()
                    .name("fk_students_user")
                    .from(Students::Table, Students::UserId)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::SetNull),
            );
        timestamps(&mut students, Students::CreatedAt, Students::UpdatedAt);
        manager.create_table(students.to_owned()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_students_guardian")
                    .table(Students::Table)
                    .col(Students::GuardianType)
                    .col(Students::GuardianId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StudentParents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(StudentParents::StudentId).uuid().not_null())
                    .col(ColumnDef::new(StudentParents::ParentId).uuid().not_null())
                    .col(
                        ColumnDef::new(StudentParents::RelationshipType)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(StudentParents::StudentId)
                            .col(StudentParents::ParentId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_parents_student")
                            .from(StudentParents::Table, StudentParents::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_parents_parent")
                            .from(StudentParents::Table, StudentParents::ParentId)
                            .to(Parents::Table, Parents::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StudentParents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Guardians::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parents::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Parents {
    Table,
    Id,
    FullName,
    Nik,
    NikHash,
    Phone,
    Email,
    Occupation,
    Address,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Guardians {
    Table,
    Id,
    FullName,
    Nik,
    NikHash,
    Phone,
    Email,
    RelationshipToStudent,
    Address,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Employees {
    Table,
    Id,
    FullName,
    Nik,
    NikHash,
    Nip,
    Position,
    Phone,
    Email,
    Address,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Students {
    Table,
    Id,
    Nisn,
    FullName,
    Gender,
    BirthPlace,
    BirthDate,
    Address,
    Nik,
    NikHash,
    NoKk,
    GuardianId,
    GuardianType,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum StudentParents {
    Table,
    StudentId,
    ParentId,
    RelationshipType,
}
