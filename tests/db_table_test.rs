use chrono::Duration;
use chrono::Utc;
use rentwatch::model::FilterCriteria;
use rentwatch::model::FilterModel;
use rentwatch::model::NewListing;
use rentwatch::model::Source;

mod common;

// --- 1. Test Harness Macro ---
// Handles setup, execution, and teardown automatically.
macro_rules! db_test {
    ($name:ident, |$db:ident| $body:block) => {
        #[tokio::test]
        async fn $name() {
            let ($db, db_path) = common::setup_db().await;

            // Execute the test logic
            $body

            common::teardown_db(db_path).await;
        }
    };
}

// --- 2. Data Fixture Macros ---
// Helpers to quickly insert data with defaults, allowing overrides.

macro_rules! create_listing {
    ($db:expr, $ext_id:expr) => {
        create_listing!($db, $ext_id, {})
    };
    ($db:expr, $ext_id:expr, { $($field:ident : $val:expr),* }) => {
        {
            #[allow(unused_mut)]
            let mut listing = new_listing($ext_id);
            $(listing.$field = $val.into();)*
            $db.listing
                .upsert(&listing, Utc::now())
                .await
                .expect("Failed to upsert listing")
        }
    };
}

macro_rules! create_filter {
    ($db:expr, $user_id:expr) => {
        create_filter!($db, $user_id, {})
    };
    ($db:expr, $user_id:expr, { $($field:ident : $val:expr),* }) => {
        {
            common::create_user(&$db, $user_id).await;
            #[allow(unused_mut)]
            let mut filter = new_filter($user_id);
            $(filter.$field = $val.into();)*
            $db.filter
                .insert(&filter)
                .await
                .expect("Failed to insert filter")
        }
    };
}

fn new_listing(external_id: &str) -> NewListing {
    NewListing {
        source: Source::Immobiliare,
        external_id: external_id.to_string(),
        url: format!("https://immobiliare.example/ads/{external_id}"),
        title: format!("Listing {external_id}"),
        city: "Roma".to_string(),
        price: None,
        currency: None,
        property_type: None,
        property_type_raw: None,
        rooms: None,
        area: None,
        year_built: None,
        floor_raw: None,
        floor_number: None,
        total_floors: None,
        is_first_floor: None,
        is_top_floor: None,
        renovation: None,
        furnished: None,
        pets_allowed: None,
        children_friendly: None,
        agency_commission: None,
        park_nearby: None,
        noisy_roads_nearby: None,
    }
}

fn new_filter(user_id: i64) -> FilterModel {
    FilterModel {
        id: 0,
        user_id,
        name: "saved search".to_string(),
        criteria: sqlx::types::Json(FilterCriteria::default()),
        is_active: true,
        notification_enabled: true,
        notification_frequency_hours: 6,
        last_notification_sent: None,
    }
}

// --- 3. Tests ---

mod listing_table_tests {
    use super::*;

    db_test!(upsert_conflict_keeps_one_row, |db| {
        let first = create_listing!(db, "42", { price: Some(1000.0) });
        let second = create_listing!(db, "42", { price: Some(1200.0) });

        assert_eq!(first.id, second.id);
        assert_eq!(second.price, Some(1200.0));
        assert_eq!(second.scraped_at, first.scraped_at);
        assert_eq!(db.listing.count().await.unwrap(), 1);
    });

    db_test!(select_by_identity, |db| {
        create_listing!(db, "42");
        let found = db
            .listing
            .select_by_identity(Source::Immobiliare, "42")
            .await
            .unwrap();
        assert!(found.is_some());

        let missing = db
            .listing
            .select_by_identity(Source::Subito, "42")
            .await
            .unwrap();
        assert!(missing.is_none());
    });

    db_test!(select_candidates_filters_inactive_and_old, |db| {
        let cutoff = Utc::now();
        create_listing!(db, "fresh");
        let stale = create_listing!(db, "stale");

        db.listing
            .deactivate_stale(Source::Immobiliare, Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        // Reactivate only one of them through a re-scrape.
        create_listing!(db, "fresh");

        let candidates = db.listing.select_candidates(cutoff).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].external_id, "fresh");
        assert_ne!(candidates[0].id, stale.id);
    });
}

mod filter_table_tests {
    use super::*;

    db_test!(select_due_skips_dormant_and_cooling, |db| {
        let now = Utc::now();

        let eligible_new = create_filter!(db, 1);
        let eligible_past = create_filter!(db, 2, {
            last_notification_sent: Some(now - Duration::hours(7))
        });
        let _cooling = create_filter!(db, 3, {
            last_notification_sent: Some(now - Duration::hours(1))
        });
        let _dormant = create_filter!(db, 4, { is_active: false });
        let _muted = create_filter!(db, 5, { notification_enabled: false });

        let due = db.filter.select_due(now).await.unwrap();
        let due_ids: Vec<i64> = due.iter().map(|f| f.id).collect();
        assert_eq!(due_ids, vec![eligible_new, eligible_past]);
    });

    db_test!(set_last_notification_sent_starts_cooldown, |db| {
        let now = Utc::now();
        let id = create_filter!(db, 1);

        db.filter.set_last_notification_sent(id, now).await.unwrap();

        assert!(db.filter.select_due(now).await.unwrap().is_empty());

        // Eligible again exactly at the frequency boundary.
        let later = now + Duration::hours(6);
        let due = db.filter.select_due(later).await.unwrap();
        assert_eq!(due.len(), 1);
    });

    db_test!(select_all_by_user_id, |db| {
        create_filter!(db, 1);
        create_filter!(db, 1);
        create_filter!(db, 2);

        assert_eq!(db.filter.select_all_by_user_id(1).await.unwrap().len(), 2);
        assert_eq!(db.filter.select_all_by_user_id(2).await.unwrap().len(), 1);
    });
}

mod delivery_record_table_tests {
    use super::*;

    db_test!(insert_once_enforces_pair_uniqueness, |db| {
        common::create_user(&db, 1).await;
        let listing = create_listing!(db, "42");
        let now = Utc::now();

        let first = db
            .delivery_record
            .insert_once(1, listing.id, Some(10), now)
            .await
            .unwrap();
        let second = db
            .delivery_record
            .insert_once(1, listing.id, Some(11), now)
            .await
            .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(db.delivery_record.count().await.unwrap(), 1);
        assert!(db.delivery_record.exists(1, listing.id).await.unwrap());
        assert!(!db.delivery_record.exists(2, listing.id).await.unwrap());
    });

    db_test!(select_all_by_user_id, |db| {
        common::create_user(&db, 1).await;
        let a = create_listing!(db, "a");
        let b = create_listing!(db, "b");
        let now = Utc::now();

        db.delivery_record
            .insert_once(1, a.id, None, now)
            .await
            .unwrap();
        db.delivery_record
            .insert_once(1, b.id, None, now + Duration::seconds(1))
            .await
            .unwrap();

        let records = db.delivery_record.select_all_by_user_id(1).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].listing_id, a.id);
    });
}

db_test!(delete_all_tables_empties_everything, |db| {
    let listing = create_listing!(db, "42");
    let _ = create_filter!(db, 1);
    db.delivery_record
        .insert_once(1, listing.id, None, Utc::now())
        .await
        .unwrap();

    db.delete_all_tables().await.unwrap();

    assert_eq!(db.listing.count().await.unwrap(), 0);
    assert_eq!(db.delivery_record.count().await.unwrap(), 0);
    assert!(db.filter.select_all_by_user_id(1).await.unwrap().is_empty());
    assert!(db.user.select(1).await.unwrap().is_none());
});

mod user_table_tests {
    use super::*;

    db_test!(replace_and_select, |db| {
        let user = common::create_user(&db, 7).await;

        let fetched = db.user.select(7).await.unwrap().unwrap();
        assert_eq!(fetched.channel_preferences.0, user.channel_preferences.0);

        assert!(db.user.select(8).await.unwrap().is_none());
    });

    db_test!(preferences_update_keeps_filters, |db| {
        let id = create_filter!(db, 7);

        // Second write of the same user must not cascade into filters.
        common::create_user(&db, 7).await;

        assert!(db.filter.select(id).await.unwrap().is_some());
    });
}
