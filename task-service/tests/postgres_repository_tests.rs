mod common;

use std::sync::Arc;

use chrono::Timelike;
use chrono::Utc;
use common::TestDb;
use task_service::domain::identity::models::Identity;
use task_service::domain::identity::models::IdentityId;
use task_service::domain::identity::models::Username;
use task_service::domain::identity::ports::IdentityRepository;
use task_service::identity::errors::IdentityError;
use task_service::outbound::repositories::PostgresIdentityRepository;

fn identity(username: &str) -> Identity {
    Identity {
        id: IdentityId::new(),
        username: Username::new(username.to_string()).unwrap(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        // Postgres keeps microseconds
        created_at: Utc::now().with_nanosecond(0).unwrap(),
    }
}

#[tokio::test]
async fn test_create_and_find() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repository = PostgresIdentityRepository::new(db.pool.clone());

    assert_eq!(repository.count().await.unwrap(), 0);

    let created = repository.create(identity("alice")).await.unwrap();

    let by_id = repository.find_by_id(&created.id).await.unwrap();
    assert_eq!(by_id.as_ref(), Some(&created));

    let by_username = repository
        .find_by_username(&created.username)
        .await
        .unwrap();
    assert_eq!(by_username, Some(created));

    assert_eq!(repository.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_find_missing() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repository = PostgresIdentityRepository::new(db.pool.clone());

    assert_eq!(repository.find_by_id(&IdentityId::new()).await.unwrap(), None);
    assert_eq!(
        repository
            .find_by_username(&Username::new("nobody".to_string()).unwrap())
            .await
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repository = PostgresIdentityRepository::new(db.pool.clone());

    repository.create(identity("alice")).await.unwrap();
    let result = repository.create(identity("alice")).await;

    assert!(matches!(
        result,
        Err(IdentityError::UsernameAlreadyExists(name)) if name == "alice"
    ));
    assert_eq!(repository.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_creates_store_one() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repository = Arc::new(PostgresIdentityRepository::new(db.pool.clone()));

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let repository = Arc::clone(&repository);
            tokio::spawn(async move { repository.create(identity("alice")).await })
        })
        .collect();

    let mut successes = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert!(matches!(e, IdentityError::UsernameAlreadyExists(_))),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(repository.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_corrupt_row_is_store_error() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let repository = PostgresIdentityRepository::new(db.pool.clone());

    let id = IdentityId::new();
    sqlx::query("INSERT INTO identities (id, username, password_hash) VALUES ($1, $2, $3)")
        .bind(id.0)
        .bind("a b")
        .bind("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA")
        .execute(&db.pool)
        .await
        .unwrap();

    let result = repository.find_by_id(&id).await;
    assert!(matches!(result, Err(IdentityError::DatabaseError(_))));
}
