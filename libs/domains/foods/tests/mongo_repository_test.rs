//! MongoDB repository tests
//!
//! Verify the real persistence behavior the service relies on:
//! duplicate-key detection, owner-scoped deletes, and atomic counters.

use domain_foods::error::FoodError;
use domain_foods::models::{CreateFood, Food};
use domain_foods::mongodb::{MongoFoodRepository, MongoSequenceRepository};
use domain_foods::repository::{FoodRepository, SequenceRepository};
use test_utils::TestMongo;

fn sample_food(code: &str, user_id: &str) -> Food {
    Food::from_create(
        &CreateFood {
            code: Some(code.to_string()),
            product_name: "Dark chocolate".into(),
            generic_name: Some("chocolate".into()),
            brands: Some("Acme".into()),
            image_url: None,
            nutriments: None,
        },
        code.to_string(),
        Some(user_id.to_string()),
    )
}

#[tokio::test]
#[ignore] // Requires Docker
async fn insert_find_save_roundtrip() {
    let mongo = TestMongo::new().await;
    let repo = MongoFoodRepository::new(&mongo.database("foods_roundtrip"));
    repo.init_indexes().await.unwrap();

    let food = sample_food("5901234123457", "user-1");
    repo.insert(&food).await.unwrap();

    let found = repo.find_by_id("5901234123457").await.unwrap().unwrap();
    assert_eq!(found, food);

    let mut updated = found;
    updated.keywords = vec!["chocolate".into(), "dark".into()];
    repo.save(&updated).await.unwrap();

    let found = repo.find_by_id("5901234123457").await.unwrap().unwrap();
    assert_eq!(found.keywords, vec!["chocolate", "dark"]);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn duplicate_insert_is_reported_as_duplicate_code() {
    let mongo = TestMongo::new().await;
    let repo = MongoFoodRepository::new(&mongo.database("foods_duplicate"));
    repo.init_indexes().await.unwrap();

    let food = sample_food("12345678", "user-1");
    repo.insert(&food).await.unwrap();

    let err = repo.insert(&food).await.unwrap_err();
    assert!(matches!(err, FoodError::DuplicateCode(code) if code == "12345678"));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn delete_is_scoped_to_the_owner() {
    let mongo = TestMongo::new().await;
    let repo = MongoFoodRepository::new(&mongo.database("foods_delete"));

    repo.insert(&sample_food("12345678", "user-1")).await.unwrap();

    // Another user must not be able to remove it
    assert!(!repo.delete_by_id_and_user("12345678", "user-2").await.unwrap());
    assert!(repo.find_by_id("12345678").await.unwrap().is_some());

    assert!(repo.delete_by_id_and_user("12345678", "user-1").await.unwrap());
    assert!(repo.find_by_id("12345678").await.unwrap().is_none());

    // Repeat delete is a no-op
    assert!(!repo.delete_by_id_and_user("12345678", "user-1").await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn find_all_by_user_filters_ownership() {
    let mongo = TestMongo::new().await;
    let repo = MongoFoodRepository::new(&mongo.database("foods_by_user"));

    repo.insert(&sample_food("12345678", "user-1")).await.unwrap();
    repo.insert(&sample_food("123456789012", "user-1")).await.unwrap();
    repo.insert(&sample_food("5901234123457", "user-2")).await.unwrap();

    let foods = repo.find_all_by_user("user-1", 0, 10).await.unwrap();
    assert_eq!(foods.len(), 2);
    assert!(foods.iter().all(|f| f.user_id.as_deref() == Some("user-1")));

    // Pagination is stable over the _id sort
    let first = repo.find_all_by_user("user-1", 0, 1).await.unwrap();
    let second = repo.find_all_by_user("user-1", 1, 1).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_ne!(first[0].id, second[0].id);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn sequence_is_monotonic_and_starts_at_one() {
    let mongo = TestMongo::new().await;
    let sequences = MongoSequenceRepository::new(&mongo.database("foods_sequence"));

    assert_eq!(sequences.next("food_code").await.unwrap(), 1);
    assert_eq!(sequences.next("food_code").await.unwrap(), 2);
    assert_eq!(sequences.next("food_code").await.unwrap(), 3);

    // Independent counters don't interfere
    assert_eq!(sequences.next("other").await.unwrap(), 1);
    assert_eq!(sequences.next("food_code").await.unwrap(), 4);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn concurrent_sequence_increments_never_collide() {
    let mongo = TestMongo::new().await;
    let sequences =
        std::sync::Arc::new(MongoSequenceRepository::new(&mongo.database("foods_seq_conc")));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let sequences = sequences.clone();
        handles.push(tokio::spawn(async move {
            sequences.next("food_code").await.unwrap()
        }));
    }

    let mut values = Vec::new();
    for handle in handles {
        values.push(handle.await.unwrap());
    }
    values.sort_unstable();
    values.dedup();
    assert_eq!(values.len(), 10);
}
