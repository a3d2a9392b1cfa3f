use std::env;

use chrono::{SubsecRound, Utc};
use sqlx::PgPool;

use ev_boats_api::{
    database::{BoatStore, MongoStore, PostgresStore},
    models::{BoatKey, BoatPatch, BoatStatus, NewBoat, Reading},
};

async fn setup_mongo_store() -> MongoStore {
    dotenvy::dotenv().ok();
    let uri = env::var("MONGO_URI").expect("Environment variable MONGO_URI required");
    let database = format!("boats_test_{}", Utc::now().timestamp_micros());

    MongoStore::from_uri(&uri, Some(&database))
        .await
        .expect("Failed to connect to MongoDB")
}

/// Exercise the collection semantics every store shares
async fn check_store(store: &dyn BoatStore) {
    let mut alpha = NewBoat::new("Alpha").with_id("b1");
    alpha.readings.lat = Some(1.0);
    alpha.readings.lon = Some(2.0);
    // Stores keep millisecond precision at least
    alpha.timestamp = Utc::now().trunc_subsecs(3);

    let created = store.insert(alpha.clone()).await.unwrap();
    assert_eq!(created.name, "Alpha");
    assert_eq!(created.status, BoatStatus::Online);
    assert_eq!(created.timestamp, alpha.timestamp);

    let duplicate = store
        .insert(NewBoat::new("Alpha II").with_id("b1"))
        .await
        .unwrap();

    let fetched = store
        .get(&BoatKey::RecordId(created.record_id))
        .await
        .unwrap()
        .expect("Created boat not found");
    assert_eq!(fetched, created);

    let key = BoatKey::CustomId("b1".to_string());
    let updated = store
        .update(
            &key,
            &BoatPatch {
                readings: vec![(Reading::Lat, Some(3.0)), (Reading::Lon, None)],
                status: Some(BoatStatus::Offline),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("Boat to update not found");
    assert_eq!(updated.record_id, created.record_id);
    assert_eq!(updated.readings.lat, Some(3.0));
    assert_eq!(updated.readings.lon, None);
    assert_eq!(updated.status, BoatStatus::Offline);
    assert_eq!(updated.name, "Alpha");

    let deleted = store.delete(&key).await.unwrap().unwrap();
    assert_eq!(deleted.record_id, created.record_id);

    let remaining = store.list().await.unwrap();
    assert_eq!(remaining, vec![duplicate]);

    let missing = BoatKey::CustomId("nope".to_string());
    assert!(store.update(&missing, &BoatPatch::default()).await.unwrap().is_none());
    assert!(store.delete(&missing).await.unwrap().is_none());
}

#[ignore = "requires DATABASE_URL"]
#[sqlx::test]
async fn test_postgres_store(pool: PgPool) {
    let store = PostgresStore::new(pool).await.unwrap();
    check_store(&store).await;
}

#[ignore = "requires MONGO_URI"]
#[tokio::test]
async fn test_mongo_store() {
    let store = setup_mongo_store().await;
    check_store(&store).await;
}
