use chrono::Duration;
use rentwatch::model::Source;
use rentwatch::service::error::ServiceError;
use rentwatch::service::listing_service::IngestResult;
use rentwatch::service::listing_service::ListingService;

mod common;

#[tokio::test]
async fn test_upsert_is_idempotent_on_identity() {
    let (db, db_path) = common::setup_db().await;
    let service = ListingService::new(db.clone());

    let mut payload = common::payload("immobiliare", "42");
    payload.price = Some(1000.0);

    let first = service.ingest(payload.clone()).await.expect("first ingest");
    let IngestResult::Created { listing: created } = first else {
        panic!("first ingest of a new identity must be Created");
    };
    assert_eq!(created.price, Some(1000.0));
    assert!(created.is_active);

    // Same identity again with a new price: one row, mutable fields
    // overwritten, scraped_at untouched, updated_at advanced.
    payload.price = Some(1100.0);
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let second = service.ingest(payload).await.expect("second ingest");
    let IngestResult::Updated { listing: updated } = second else {
        panic!("re-ingest of a known identity must be Updated");
    };

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.price, Some(1100.0));
    assert_eq!(updated.scraped_at, created.scraped_at);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(db.listing.count().await.unwrap(), 1);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_same_external_id_on_other_source_is_a_new_listing() {
    let (db, db_path) = common::setup_db().await;
    let service = ListingService::new(db.clone());

    service
        .ingest(common::payload("immobiliare", "42"))
        .await
        .unwrap();
    service
        .ingest(common::payload("idealista", "42"))
        .await
        .unwrap();

    assert_eq!(db.listing.count().await.unwrap(), 2);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_unknown_source_is_rejected() {
    let (db, db_path) = common::setup_db().await;
    let service = ListingService::new(db.clone());

    let err = service
        .ingest(common::payload("zillow", "1"))
        .await
        .expect_err("unknown source must fail validation");
    assert!(matches!(err, ServiceError::Validation { .. }));
    assert_eq!(db.listing.count().await.unwrap(), 0);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_floor_and_property_type_derivation() {
    let (db, db_path) = common::setup_db().await;
    let service = ListingService::new(db.clone());

    let mut payload = common::payload("immobiliare", "floor-1");
    payload.floor = Some("1".to_string());
    payload.total_floors = Some(4);
    payload.property_type = Some("Casa".to_string());
    let listing = service.ingest(payload).await.unwrap();
    let listing = listing.listing();

    assert_eq!(listing.floor_number, Some(1));
    assert_eq!(listing.is_first_floor, Some(true));
    assert_eq!(listing.is_top_floor, Some(false));
    assert_eq!(listing.property_type.as_deref(), Some("house"));
    assert_eq!(listing.property_type_raw.as_deref(), Some("Casa"));

    // Unparsable floor stays unknown on every derived field.
    let mut payload = common::payload("immobiliare", "floor-2");
    payload.floor = Some("da definire".to_string());
    let listing = service.ingest(payload).await.unwrap();
    let listing = listing.listing();

    assert_eq!(listing.floor_number, None);
    assert_eq!(listing.is_first_floor, None);
    assert_eq!(listing.is_top_floor, None);

    common::teardown_db(db_path).await;
}

#[tokio::test]
async fn test_deactivate_stale_retires_only_matching_source() {
    let (db, db_path) = common::setup_db().await;
    let service = ListingService::new(db.clone());

    let old = service
        .ingest(common::payload("immobiliare", "old"))
        .await
        .unwrap();
    service
        .ingest(common::payload("idealista", "other-site"))
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    // Zero retention: everything scraped before "now" is stale.
    let retired = service
        .deactivate_stale(Source::Immobiliare, Duration::zero())
        .await
        .unwrap();
    assert_eq!(retired, 1);

    // The row survives deactivation; only is_active flips.
    let stored = db.listing.select(old.listing().id).await.unwrap().unwrap();
    assert!(!stored.is_active);

    let other = db
        .listing
        .select_by_identity(Source::Idealista, "other-site")
        .await
        .unwrap()
        .unwrap();
    assert!(other.is_active);

    // Re-scraping a retired listing reactivates it.
    service
        .ingest(common::payload("immobiliare", "old"))
        .await
        .unwrap();
    let revived = db.listing.select(old.listing().id).await.unwrap().unwrap();
    assert!(revived.is_active);

    common::teardown_db(db_path).await;
}
