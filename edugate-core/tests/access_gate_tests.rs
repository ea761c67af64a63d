// File: edugate-core/tests/access_gate_tests.rs

use chrono::{Duration, Utc};
use uuid::Uuid;

use edugate_common::models::{
    AccessDecision, DenyReason, NewCodePool, PageRequest, PoolEntitlements, Resource,
};
use edugate_core::test_utils::fixtures::{Catalog, Services, in_days, seed_catalog, student};
use edugate_core::test_utils::MemoryStore;
use edugate_core::Error;

async fn setup() -> (Services, Catalog, Uuid) {
    let store = MemoryStore::new();
    let catalog = seed_catalog(&store).await;
    let s = student("Reader");
    let id = s.student_id;
    store.add_student(s).await;
    (Services::new(store), catalog, id)
}

/// Creates a pool with the given grants and redeems one of its codes.
async fn grant(svc: &Services, student_id: Uuid, entitlements: PoolEntitlements) -> Result<Uuid, Error> {
    let created = svc
        .codes
        .create_pool(NewCodePool {
            name: "Grant".into(),
            entitlements,
            code_count: 1,
            expiration: in_days(30),
        })
        .await?;
    let code = svc.store.code_values(created.pool_id).await.remove(0);
    svc.redemptions.redeem(student_id, &code).await?;
    Ok(created.pool_id)
}

fn lectures_only(material: Uuid) -> PoolEntitlements {
    PoolEntitlements {
        materials_with_questions: vec![],
        materials_with_lectures: vec![material],
        courses: vec![],
    }
}

#[tokio::test]
async fn test_resolution_is_idempotent() -> Result<(), Error> {
    let (svc, catalog, s) = setup().await;
    grant(&svc, s, lectures_only(catalog.m1.material_id)).await?;
    grant(
        &svc,
        s,
        PoolEntitlements {
            materials_with_questions: vec![catalog.m1.material_id, catalog.m2.material_id],
            materials_with_lectures: vec![],
            courses: vec![catalog.course_m2.course_id],
        },
    )
    .await?;

    let first = svc.entitlements.resolve_access(s).await?;
    let second = svc.entitlements.resolve_access(s).await?;
    assert_eq!(first, second);
    assert_eq!(first.pools.len(), 2);
    assert!(first.can_view_lectures(catalog.m1.material_id));
    assert!(!first.can_view_lectures(catalog.m2.material_id));
    assert!(first.can_view_questions(catalog.m2.material_id));
    Ok(())
}

#[tokio::test]
async fn test_revoked_code_stops_granting() -> Result<(), Error> {
    let (svc, catalog, s) = setup().await;
    grant(&svc, s, lectures_only(catalog.m1.material_id)).await?;
    let code = svc.store.snapshot().await.redemptions[0].code_value.clone();

    svc.store.revoke_code(&code).await;
    let set = svc.entitlements.resolve_access(s).await?;
    assert!(set.is_empty());
    assert!(!set.has_material(catalog.m1.material_id));
    Ok(())
}

#[tokio::test]
async fn test_pool_expiring_after_redemption_stops_granting() -> Result<(), Error> {
    let (svc, catalog, s) = setup().await;
    let pool_id = grant(&svc, s, lectures_only(catalog.m1.material_id)).await?;
    assert!(svc.entitlements.resolve_access(s).await?.can_view_lectures(catalog.m1.material_id));

    svc.store.set_pool_expiration(pool_id, Utc::now() - Duration::seconds(1)).await;
    let set = svc.entitlements.resolve_access(s).await?;
    assert!(set.is_empty());

    let history = svc.redemptions.redemption_history(s).await?;
    assert_eq!(history.len(), 1);
    assert!(!history[0].is_active);
    Ok(())
}

#[tokio::test]
async fn test_unknown_student_is_not_found() {
    let (svc, _, _) = setup().await;
    let result = svc.entitlements.resolve_access(Uuid::new_v4()).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_require_access_decisions() -> Result<(), Error> {
    let (svc, catalog, s) = setup().await;
    let m1 = catalog.m1.material_id;

    let denied = svc.gate.require_access(s, Resource::Material(m1)).await?;
    assert_eq!(denied, AccessDecision::Denied(DenyReason::NotEntitled));

    grant(&svc, s, lectures_only(m1)).await?;
    assert!(svc.gate.require_access(s, Resource::Material(m1)).await?.is_allowed());
    assert!(svc.gate.require_access(s, Resource::MaterialLectures(m1)).await?.is_allowed());
    assert!(!svc.gate.require_access(s, Resource::MaterialQuestions(m1)).await?.is_allowed());

    // Course and video access flow from the parent material.
    assert!(svc
        .gate
        .require_access(s, Resource::Course(catalog.course_m1.course_id))
        .await?
        .is_allowed());
    assert!(svc
        .gate
        .require_access(s, Resource::Video(catalog.video_m1.video_id))
        .await?
        .is_allowed());
    assert!(!svc
        .gate
        .require_access(s, Resource::Course(catalog.course_m2.course_id))
        .await?
        .is_allowed());

    let missing = svc.gate.require_access(s, Resource::Course(Uuid::new_v4())).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_direct_course_grant_without_material() -> Result<(), Error> {
    let (svc, catalog, s) = setup().await;
    grant(
        &svc,
        s,
        PoolEntitlements {
            materials_with_questions: vec![],
            materials_with_lectures: vec![],
            courses: vec![catalog.course_m2.course_id],
        },
    )
    .await?;

    let videos = svc
        .gate
        .videos(s, catalog.course_m2.course_id, PageRequest::default())
        .await?;
    assert_eq!(videos.total_docs, 0);
    let courses = svc
        .gate
        .courses(s, catalog.m2.material_id, PageRequest::default())
        .await?;
    assert_eq!(courses.docs.len(), 1);
    assert!(!svc
        .gate
        .require_access(s, Resource::Material(catalog.m2.material_id))
        .await?
        .is_allowed());
    Ok(())
}

#[tokio::test]
async fn test_lecture_teaser_policy() -> Result<(), Error> {
    let (svc, catalog, s) = setup().await;
    let m1 = catalog.m1.material_id;

    let teaser = svc.gate.lectures(s, m1).await?;
    assert!(!teaser.has_full_access);
    assert_eq!(teaser.lectures.len(), 3);
    assert_eq!(teaser.lectures[0], catalog.lectures_m1[0]);
    for lecture in &teaser.lectures[1..] {
        let file = lecture.file.as_ref().unwrap();
        assert!(file.access_url.is_none());
        assert!(!file.filename.is_empty());
    }

    // A question-only grant does not unlock lectures.
    grant(
        &svc,
        s,
        PoolEntitlements {
            materials_with_questions: vec![m1],
            materials_with_lectures: vec![],
            courses: vec![],
        },
    )
    .await?;
    assert!(!svc.gate.lectures(s, m1).await?.has_full_access);

    grant(&svc, s, lectures_only(m1)).await?;
    let full = svc.gate.lectures(s, m1).await?;
    assert!(full.has_full_access);
    assert_eq!(full.lectures, catalog.lectures_m1);
    Ok(())
}

#[tokio::test]
async fn test_course_files_hide_urls_without_access() -> Result<(), Error> {
    let (svc, catalog, s) = setup().await;
    let course = catalog.course_m1.course_id;

    let listing = svc.gate.course_files(s, course).await?;
    assert!(!listing.has_full_access);
    assert_eq!(listing.files.len(), 2);
    assert!(listing
        .files
        .iter()
        .all(|f| f.file.as_ref().is_some_and(|a| a.access_url.is_none() && !a.filename.is_empty())));

    grant(&svc, s, lectures_only(catalog.m1.material_id)).await?;
    let listing = svc.gate.course_files(s, course).await?;
    assert!(listing.has_full_access);
    assert_eq!(listing.files, catalog.files_course_m1);
    Ok(())
}

#[tokio::test]
async fn test_hard_gated_reads_are_forbidden() -> Result<(), Error> {
    let (svc, catalog, s) = setup().await;
    let page = PageRequest::default();

    let videos = svc.gate.videos(s, catalog.course_m1.course_id, page).await;
    assert!(matches!(videos, Err(Error::Forbidden(_))));
    let questions = svc.gate.questions(s, catalog.m1.material_id, page).await;
    assert!(matches!(questions, Err(Error::Forbidden(_))));
    let video = svc.gate.video(s, catalog.video_m1.video_id).await;
    assert!(matches!(video, Err(Error::Forbidden(_))));

    grant(
        &svc,
        s,
        PoolEntitlements {
            materials_with_questions: vec![catalog.m1.material_id],
            materials_with_lectures: vec![],
            courses: vec![],
        },
    )
    .await?;
    let questions = svc.gate.questions(s, catalog.m1.material_id, page).await?;
    assert_eq!(questions.docs, vec![catalog.question_m1.clone()]);
    let videos = svc.gate.videos(s, catalog.course_m1.course_id, page).await?;
    assert_eq!(videos.docs, vec![catalog.video_m1.clone()]);
    Ok(())
}

#[tokio::test]
async fn test_catalog_listings_follow_entitlements() -> Result<(), Error> {
    let (svc, catalog, s) = setup().await;
    let page = PageRequest::default();

    assert_eq!(svc.gate.universities(s, page).await?.total_docs, 0);

    grant(&svc, s, lectures_only(catalog.m2.material_id)).await?;

    let universities = svc.gate.universities(s, page).await?;
    assert_eq!(universities.docs, vec![catalog.university.clone()]);

    let colleges = svc
        .gate
        .colleges(s, Some(catalog.university.university_id), page)
        .await?;
    assert_eq!(colleges.docs, vec![catalog.college.clone()]);

    let materials = svc.gate.materials(s, Some(catalog.college.college_id), page).await?;
    assert_eq!(materials.docs, vec![catalog.m2.clone()]);

    let courses = svc.gate.courses(s, catalog.m1.material_id, page).await?;
    assert!(courses.docs.is_empty());

    let unknown = svc.gate.materials(s, Some(Uuid::new_v4()), page).await;
    assert!(matches!(unknown, Err(Error::NotFound(_))));
    Ok(())
}
