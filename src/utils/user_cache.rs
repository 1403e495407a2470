use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use std::time::Duration;

use crate::model::user::User;
use crate::store::directory::UserRow;

/// Hot lookup path for the actor-resolution middleware and the engines'
/// authorization guards. Records are keyed by user id; every directory
/// write invalidates its entry, the TTL catches anything else.
static USER_CACHE: Lazy<Cache<String, User>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(100_000)
        .time_to_live(Duration::from_secs(600))
        .build()
});

pub async fn store(user: &User) {
    USER_CACHE.insert(user.id.clone(), user.clone()).await;
}

pub async fn get(id: &str) -> Option<User> {
    USER_CACHE.get(id).await
}

pub async fn invalidate(id: &str) {
    USER_CACHE.invalidate(id).await;
}

async fn batch_store(users: &[User]) {
    let futures: Vec<_> = users
        .iter()
        .map(|u| USER_CACHE.insert(u.id.clone(), u.clone()))
        .collect();

    futures::future::join_all(futures).await;
}

/// Pre-populate the cache from the directory table in batches.
pub async fn warmup_user_cache(pool: &SqlitePool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, username, password, role, job_title, employee_code, company_name, manager_name FROM users",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let user = row?.into_user()?;
        batch.push(user);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_store(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_store(&batch).await;
    }

    tracing::info!(users = total_count, "User cache warmup complete");

    Ok(())
}
