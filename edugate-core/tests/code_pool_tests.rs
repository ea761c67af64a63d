// File: edugate-core/tests/code_pool_tests.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use mockall::mock;
use uuid::Uuid;

use edugate_common::error::ConflictCause;
use edugate_common::models::{
    CODE_LENGTH, Code, CodePool, CodeUsageFilter, Page, PageRequest, PoolDeletion, PoolFilter,
    PoolSummary,
};
use edugate_common::traits::{AccountRepository, CodePoolRepository};
use edugate_core::services::CodePoolService;
use edugate_core::test_utils::fixtures::{Services, in_days, pool_request, seed_catalog, student};
use edugate_core::test_utils::MemoryStore;
use edugate_core::Error;

mock! {
    PoolRepo {}
    #[async_trait]
    impl CodePoolRepository for PoolRepo {
        async fn create_pool(&self, pool: &CodePool, code_values: &[String]) -> Result<(), Error>;
        async fn get_pool(&self, pool_id: Uuid) -> Result<Option<CodePool>, Error>;
        async fn list_pools(&self, filter: &PoolFilter, page: PageRequest) -> Result<Page<PoolSummary>, Error>;
        async fn list_codes(&self, pool_id: Uuid) -> Result<Vec<Code>, Error>;
        async fn get_code(&self, code_value: &str) -> Result<Option<Code>, Error>;
        async fn delete_pool_cascade(&self, pool_id: Uuid) -> Result<PoolDeletion, Error>;
    }
}

#[tokio::test]
async fn test_create_pool_generates_unique_codes() -> Result<(), Error> {
    let store = MemoryStore::new();
    let catalog = seed_catalog(&store).await;
    let svc = Services::new(store);

    let created = svc
        .codes
        .create_pool(pool_request("  Algebra2024  ", 50, in_days(7), &[catalog.m1.material_id]))
        .await?;
    assert_eq!(created.name, "Algebra2024");
    assert_eq!(created.code_count, 50);

    let codes = svc.store.code_values(created.pool_id).await;
    assert_eq!(codes.len(), 50);
    assert!(codes.iter().all(|c| c.len() == CODE_LENGTH));
    Ok(())
}

#[tokio::test]
async fn test_create_pool_rejects_unknown_entitlements() -> Result<(), Error> {
    let store = MemoryStore::new();
    let catalog = seed_catalog(&store).await;
    let svc = Services::new(store);

    let mut req = pool_request("Broken", 5, in_days(7), &[catalog.m1.material_id, Uuid::new_v4()]);
    req.entitlements.courses = vec![Uuid::new_v4()];
    match svc.codes.create_pool(req).await {
        Err(Error::Validation(fields)) => {
            let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(names, vec!["materials", "courses"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(svc.store.snapshot().await.pools.is_empty());

    let past = svc
        .codes
        .create_pool(pool_request("Past", 5, Utc::now() - Duration::hours(1), &[]))
        .await;
    assert!(matches!(past, Err(Error::Validation(_))));
    let too_many = svc
        .codes
        .create_pool(pool_request("Huge", 10_001, in_days(1), &[]))
        .await;
    assert!(matches!(too_many, Err(Error::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn test_collision_regenerates_batch() -> Result<(), Error> {
    let catalog = MemoryStore::new();
    let mut repo = MockPoolRepo::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let batches: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(Vec::new()));

    let (c, b) = (calls.clone(), batches.clone());
    repo.expect_create_pool().times(3).returning(move |_, codes| {
        b.lock().unwrap().push(codes.to_vec());
        if c.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(Error::Conflict(ConflictCause::CodeCollision))
        } else {
            Ok(())
        }
    });

    let svc = CodePoolService::new(Arc::new(repo), Arc::new(catalog));
    let created = svc.create_pool(pool_request("Retry", 4, in_days(1), &[])).await?;
    assert_eq!(created.code_count, 4);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let batches = batches.lock().unwrap();
    assert_ne!(batches[0], batches[1]);
    Ok(())
}

#[tokio::test]
async fn test_collision_gives_up_after_retries() {
    let mut repo = MockPoolRepo::new();
    repo.expect_create_pool()
        .times(4)
        .returning(|_, _| Err(Error::Conflict(ConflictCause::CodeCollision)));

    let svc = CodePoolService::new(Arc::new(repo), Arc::new(MemoryStore::new()));
    let result = svc.create_pool(pool_request("Unlucky", 1, in_days(1), &[])).await;
    assert!(matches!(result, Err(Error::Conflict(ConflictCause::CodeCollision))));
}

#[tokio::test]
async fn test_delete_guard_keeps_everything() -> Result<(), Error> {
    let store = MemoryStore::new();
    let catalog = seed_catalog(&store).await;
    let svc = Services::new(store);
    let s = student("Owner");
    let sid = s.student_id;
    svc.store.add_student(s).await;

    let created = svc
        .codes
        .create_pool(pool_request("Guarded", 3, in_days(7), &[catalog.m1.material_id]))
        .await?;
    let code = svc.store.code_values(created.pool_id).await.remove(0);
    svc.redemptions.redeem(sid, &code).await?;

    let before = svc.store.snapshot().await;
    let result = svc.codes.delete_pool(created.pool_id).await;
    assert!(matches!(result, Err(Error::Conflict(ConflictCause::PoolHasUsedCodes))));

    let after = svc.store.snapshot().await;
    assert_eq!(before.pools, after.pools);
    assert_eq!(before.codes, after.codes);
    assert_eq!(before.redemptions, after.redemptions);
    Ok(())
}

#[tokio::test]
async fn test_delete_cascades_to_every_student() -> Result<(), Error> {
    let store = MemoryStore::new();
    let catalog = seed_catalog(&store).await;
    let svc = Services::new(store);

    let created = svc
        .codes
        .create_pool(pool_request("Cascade", 3, in_days(7), &[catalog.m1.material_id]))
        .await?;
    let keep = svc
        .codes
        .create_pool(pool_request("Keep", 1, in_days(7), &[catalog.m2.material_id]))
        .await?;
    let codes = svc.store.code_values(created.pool_id).await;
    let keep_code = svc.store.code_values(keep.pool_id).await.remove(0);

    let mut students = Vec::new();
    for (i, code) in codes.iter().take(2).enumerate() {
        let s = student(&format!("cascade{i}"));
        let sid = s.student_id;
        svc.store.add_student(s).await;
        svc.redemptions.redeem(sid, code).await?;
        // Revoked afterwards, so the pool has no used codes left.
        svc.store.revoke_code(code).await;
        students.push(sid);
    }
    svc.redemptions.redeem(students[0], &keep_code).await?;

    let deletion = svc.codes.delete_pool(created.pool_id).await?;
    assert_eq!(deletion.codes_removed, 3);
    assert_eq!(deletion.redemptions_removed, 2);

    let state = svc.store.snapshot().await;
    assert!(!state.pools.contains_key(&created.pool_id));
    assert!(state.codes.values().all(|c| c.pool_id != created.pool_id));
    assert_eq!(svc.store.list_redemptions(students[0]).await?.len(), 1);
    assert!(svc.store.list_redemptions(students[1]).await?.is_empty());

    let again = svc.codes.delete_pool(created.pool_id).await;
    assert!(matches!(again, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_pool_codes_filter_and_paging() -> Result<(), Error> {
    let store = MemoryStore::new();
    let catalog = seed_catalog(&store).await;
    let svc = Services::new(store);
    let s = student("Pager");
    let sid = s.student_id;
    svc.store.add_student(s).await;

    let created = svc
        .codes
        .create_pool(pool_request("Paged", 5, in_days(7), &[catalog.m1.material_id]))
        .await?;
    let code = svc.store.code_values(created.pool_id).await.remove(0);
    svc.redemptions.redeem(sid, &code).await?;

    let unused = svc
        .codes
        .get_pool_codes(created.pool_id, CodeUsageFilter::Unused, PageRequest::new(Some(1), Some(3))?)
        .await?;
    assert_eq!(unused.total_codes, 4);
    assert_eq!(unused.total_used, 1);
    assert_eq!(unused.codes.len(), 3);
    assert!(unused.codes.iter().all(|c| !c.is_used));

    let used = svc
        .codes
        .get_pool_codes(created.pool_id, CodeUsageFilter::Used, PageRequest::default())
        .await?;
    assert_eq!(used.codes.len(), 1);
    assert_eq!(used.codes[0].code_value, code);

    let missing = svc
        .codes
        .get_pool_codes(Uuid::new_v4(), CodeUsageFilter::All, PageRequest::default())
        .await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_list_pools_filters_and_counts() -> Result<(), Error> {
    let store = MemoryStore::new();
    let catalog = seed_catalog(&store).await;
    let svc = Services::new(store);

    svc.codes
        .create_pool(pool_request("Algebra Spring", 2, in_days(7), &[catalog.m1.material_id]))
        .await?;
    svc.codes
        .create_pool(pool_request("Mechanics", 3, in_days(30), &[catalog.m2.material_id]))
        .await?;

    let by_name = svc
        .codes
        .list_pools(
            &PoolFilter {
                name: Some("algebra".into()),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await?;
    assert_eq!(by_name.total_docs, 1);
    assert_eq!(by_name.docs[0].total_codes, 2);
    assert_eq!(by_name.docs[0].used_codes, 0);

    let by_material = svc
        .codes
        .list_pools(
            &PoolFilter {
                material: Some(catalog.m2.material_id),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await?;
    assert_eq!(by_material.docs[0].pool.name, "Mechanics");

    let bad_range = svc
        .codes
        .list_pools(
            &PoolFilter {
                expiration_from: Some(in_days(10)),
                expiration_to: Some(in_days(1)),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await;
    assert!(matches!(bad_range, Err(Error::Validation(_))));

    let all = svc.codes.list_pools(&PoolFilter::default(), PageRequest::default()).await?;
    assert_eq!(all.total_docs, 2);
    Ok(())
}
