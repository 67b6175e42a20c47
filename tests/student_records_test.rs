//! Student records, guardian pointers, parent links and encrypted NIKs
//! against a real database.

mod common;

use uuid::Uuid;

use school_api::domain::{
    GuardianKind, NewGuardian, ParentLink, PersonInput, PersonPatch, ParentPatch, StudentPatch,
};
use school_api::errors::AppError;
use school_api::services::{
    GuardianManager, GuardianService, ParentManager, ParentService, StudentManager,
    StudentService,
};

const STUDENT_NIK: &str = "3273010101100001";
const FATHER_NIK: &str = "3273010101800001";
const MOTHER_NIK: &str = "3273010101800002";
const UNCLE_NIK: &str = "3273010101700001";

struct Managers {
    students: StudentManager<school_api::infra::Persistence>,
    parents: ParentManager<school_api::infra::Persistence>,
    guardians: GuardianManager<school_api::infra::Persistence>,
}

async fn managers() -> Managers {
    let app = common::seeded().await;
    Managers {
        students: StudentManager::new(app.uow.clone(), app.cipher.clone()),
        parents: ParentManager::new(app.uow.clone(), app.cipher.clone()),
        guardians: GuardianManager::new(app.uow.clone(), app.cipher.clone()),
    }
}

fn uncle() -> NewGuardian {
    NewGuardian {
        person: PersonInput {
            full_name: "Pak Budi".to_string(),
            nik: UNCLE_NIK.to_string(),
            ..Default::default()
        },
        relationship_to_student: "uncle".to_string(),
    }
}

#[tokio::test]
async fn test_student_nik_round_trips_through_encryption() {
    let m = managers().await;

    let created = m
        .students
        .create_student(common::new_student("0012345678", STUDENT_NIK))
        .await
        .unwrap();
    let loaded = m.students.get_student(created.id).await.unwrap();

    assert_eq!(loaded.nik, STUDENT_NIK);
    assert_eq!(loaded.no_kk.as_deref(), Some("3273000000000001"));
    assert!(loaded.guardian.is_none());
}

#[tokio::test]
async fn test_duplicate_student_nik_conflicts() {
    let m = managers().await;
    m.students
        .create_student(common::new_student("0012345678", STUDENT_NIK))
        .await
        .unwrap();

    let err = m
        .students
        .create_student(common::new_student("0099999999", STUDENT_NIK))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_malformed_nik_is_rejected() {
    let m = managers().await;

    let err = m
        .students
        .create_student(common::new_student("0012345678", "12345"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_parent_nik_update_to_taken_value_conflicts() {
    let m = managers().await;
    m.parents
        .create_parent(common::new_parent("Ayah", FATHER_NIK))
        .await
        .unwrap();
    let mother = m
        .parents
        .create_parent(common::new_parent("Ibu", MOTHER_NIK))
        .await
        .unwrap();

    let err = m
        .parents
        .update_parent(
            mother.id,
            ParentPatch {
                person: PersonPatch {
                    nik: Some(FATHER_NIK.to_string()),
                    ..Default::default()
                },
                occupation: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_guardian_pointer_resolves_both_kinds() {
    let m = managers().await;
    let student = m
        .students
        .create_student(common::new_student("0012345678", STUDENT_NIK))
        .await
        .unwrap();
    let father = m
        .parents
        .create_parent(common::new_parent("Ayah", FATHER_NIK))
        .await
        .unwrap();
    let uncle = m.guardians.create_guardian(uncle()).await.unwrap();

    m.students
        .set_guardian(student.id, father.id, GuardianKind::Parent)
        .await
        .unwrap();
    let info = m.students.guardian_of(student.id).await.unwrap().unwrap();
    assert_eq!(info.kind, GuardianKind::Parent);
    assert_eq!(info.relationship, "PARENT");
    assert_eq!(info.full_name, "Ayah");

    m.students
        .set_guardian(student.id, uncle.id, GuardianKind::Guardian)
        .await
        .unwrap();
    let info = m.students.guardian_of(student.id).await.unwrap().unwrap();
    assert_eq!(info.kind, GuardianKind::Guardian);
    assert_eq!(info.relationship, "UNCLE");

    let view = m.students.remove_guardian(student.id).await.unwrap();
    assert!(view.guardian.is_none());
    assert!(m.students.guardian_of(student.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_guardian_pointer_to_missing_target_is_not_found() {
    let m = managers().await;
    let student = m
        .students
        .create_student(common::new_student("0012345678", STUDENT_NIK))
        .await
        .unwrap();

    let err = m
        .students
        .set_guardian(student.id, Uuid::new_v4(), GuardianKind::Guardian)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound("Guardian")));
    assert!(m.students.guardian_of(student.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_deleting_referenced_guardian_conflicts() {
    let m = managers().await;
    let student = m
        .students
        .create_student(common::new_student("0012345678", STUDENT_NIK))
        .await
        .unwrap();
    let uncle = m.guardians.create_guardian(uncle()).await.unwrap();
    m.students
        .set_guardian(student.id, uncle.id, GuardianKind::Guardian)
        .await
        .unwrap();

    let err = m.guardians.delete_guardian(uncle.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    m.students.remove_guardian(student.id).await.unwrap();
    m.guardians.delete_guardian(uncle.id).await.unwrap();
}

#[tokio::test]
async fn test_sync_parents_replaces_links() {
    let m = managers().await;
    let student = m
        .students
        .create_student(common::new_student("0012345678", STUDENT_NIK))
        .await
        .unwrap();
    let father = m
        .parents
        .create_parent(common::new_parent("Ayah", FATHER_NIK))
        .await
        .unwrap();
    let mother = m
        .parents
        .create_parent(common::new_parent("Ibu", MOTHER_NIK))
        .await
        .unwrap();

    let linked = m
        .students
        .sync_parents(
            student.id,
            vec![
                ParentLink {
                    parent_id: father.id,
                    relationship_type: "father".to_string(),
                },
                ParentLink {
                    parent_id: mother.id,
                    relationship_type: "mother".to_string(),
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(linked.len(), 2);

    let linked = m
        .students
        .sync_parents(
            student.id,
            vec![ParentLink {
                parent_id: mother.id,
                relationship_type: "Mother".to_string(),
            }],
        )
        .await
        .unwrap();

    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].parent.id, mother.id);
    assert_eq!(linked[0].parent.nik, MOTHER_NIK);
    assert_eq!(linked[0].relationship_type, "MOTHER");
}

#[tokio::test]
async fn test_failed_sync_leaves_links_untouched() {
    let m = managers().await;
    let student = m
        .students
        .create_student(common::new_student("0012345678", STUDENT_NIK))
        .await
        .unwrap();
    let father = m
        .parents
        .create_parent(common::new_parent("Ayah", FATHER_NIK))
        .await
        .unwrap();
    m.students
        .sync_parents(
            student.id,
            vec![ParentLink {
                parent_id: father.id,
                relationship_type: "FATHER".to_string(),
            }],
        )
        .await
        .unwrap();

    let duplicate = m
        .students
        .sync_parents(
            student.id,
            vec![
                ParentLink {
                    parent_id: father.id,
                    relationship_type: "FATHER".to_string(),
                },
                ParentLink {
                    parent_id: father.id,
                    relationship_type: "STEPFATHER".to_string(),
                },
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(duplicate, AppError::BadRequest(_)));

    let missing = m
        .students
        .sync_parents(
            student.id,
            vec![ParentLink {
                parent_id: Uuid::new_v4(),
                relationship_type: "FATHER".to_string(),
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound("Parent")));

    let linked = m.students.parents_of(student.id).await.unwrap();
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].parent.id, father.id);
}

#[tokio::test]
async fn test_update_keeps_untouched_fields() {
    let m = managers().await;
    let student = m
        .students
        .create_student(common::new_student("0012345678", STUDENT_NIK))
        .await
        .unwrap();

    let updated = m
        .students
        .update_student(
            student.id,
            StudentPatch {
                full_name: Some("Andi P.".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.full_name, "Andi P.");
    assert_eq!(updated.nisn, "0012345678");
    assert_eq!(updated.nik, STUDENT_NIK);
}
