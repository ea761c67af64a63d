// File: edugate-core/tests/postgres_tests.rs
//
// Needs a running Postgres; see `test_utils::helpers` for the URLs it reads.

use std::sync::Arc;

use uuid::Uuid;

use edugate_common::error::ConflictCause;
use edugate_common::traits::{AccountRepository, CodePoolRepository};
use edugate_core::repositories::{
    PostgresAccountRepository, PostgresCatalogRepository, PostgresCodePoolRepository,
    PostgresRedemptionStore,
};
use edugate_core::services::{CodePoolService, EntitlementService, RedemptionService};
use edugate_core::test_utils::fixtures::{in_days, pool_request, student};
use edugate_core::test_utils::helpers::setup_test_database;
use edugate_core::Error;

struct PgServices {
    pools: Arc<PostgresCodePoolRepository>,
    accounts: Arc<PostgresAccountRepository>,
    codes: CodePoolService,
    redemptions: RedemptionService,
    entitlements: EntitlementService,
}

async fn pg_services() -> Result<PgServices, Error> {
    let db = setup_test_database().await?;
    let pool = db.pool().clone();
    let pools = Arc::new(PostgresCodePoolRepository::new(pool.clone()));
    let accounts = Arc::new(PostgresAccountRepository::new(pool.clone()));
    let catalog = Arc::new(PostgresCatalogRepository::new(pool.clone()));
    let store = Arc::new(PostgresRedemptionStore::new(pool));
    Ok(PgServices {
        codes: CodePoolService::new(pools.clone(), catalog),
        redemptions: RedemptionService::new(store, pools.clone(), accounts.clone()),
        entitlements: EntitlementService::new(pools.clone(), accounts.clone()),
        pools,
        accounts,
    })
}

#[tokio::test]
#[ignore]
async fn test_pg_redemption_and_delete_guard() -> Result<(), Error> {
    let pg = pg_services().await?;
    let s = student("Postgres");
    pg.accounts.create_student(&s).await?;

    let created = pg.codes.create_pool(pool_request("PG pool", 3, in_days(5), &[])).await?;
    let codes = pg.pools.list_codes(created.pool_id).await?;
    assert_eq!(codes.len(), 3);

    let receipt = pg.redemptions.redeem(s.student_id, &codes[0].code_value).await?;
    assert_eq!(receipt.pool_id, created.pool_id);

    let again = pg.redemptions.redeem(s.student_id, &codes[1].code_value).await;
    assert!(matches!(again, Err(Error::DuplicateRedemptionInPool)));
    let code = pg.pools.get_code(&codes[1].code_value).await?.unwrap();
    assert!(!code.is_used);

    let set = pg.entitlements.resolve_access(s.student_id).await?;
    assert!(set.pools.contains(&created.pool_id));

    let refused = pg.codes.delete_pool(created.pool_id).await;
    assert!(matches!(refused, Err(Error::Conflict(ConflictCause::PoolHasUsedCodes))));
    assert!(pg.pools.get_pool(created.pool_id).await?.is_some());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_pg_concurrent_redemption_single_winner() -> Result<(), Error> {
    let pg = Arc::new(pg_services().await?);
    let created = pg.codes.create_pool(pool_request("Race", 1, in_days(5), &[])).await?;
    let code = pg.pools.list_codes(created.pool_id).await?.remove(0).code_value;

    let mut ids = Vec::new();
    for i in 0..6 {
        let s = student(&format!("racer{i}"));
        pg.accounts.create_student(&s).await?;
        ids.push(s.student_id);
    }

    let mut handles = Vec::new();
    for id in ids {
        let pg = pg.clone();
        let code = code.clone();
        handles.push(tokio::spawn(async move { pg.redemptions.redeem(id, &code).await }));
    }

    let mut winners = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => winners += 1,
            Err(Error::CodeAlreadyUsed) | Err(Error::Conflict(ConflictCause::WriteConflict)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(winners, 1);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_pg_unknown_student_cannot_redeem() -> Result<(), Error> {
    let pg = pg_services().await?;
    let created = pg.codes.create_pool(pool_request("Nobody", 1, in_days(5), &[])).await?;
    let code = pg.pools.list_codes(created.pool_id).await?.remove(0).code_value;

    let result = pg.redemptions.redeem(Uuid::new_v4(), &code).await;
    assert!(matches!(result, Err(Error::Unauthorized(_))));
    assert!(!pg.pools.get_code(&code).await?.unwrap().is_used);
    Ok(())
}
