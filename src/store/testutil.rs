use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use crate::model::role::Role;
use crate::model::user::User;

/// One-connection pool so the whole test sees a single in-memory database.
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

pub(crate) fn make_user(name: &str, role: Role, company: &str) -> User {
    let id = Uuid::new_v4().to_string();
    User {
        username: format!("{}-{}", name.to_lowercase().replace(' ', "."), &id[..8]),
        id,
        name: name.to_string(),
        password: "secret".to_string(),
        role,
        job_title: None,
        employee_code: None,
        company_name: Some(company.to_string()),
        manager_name: None,
    }
}

pub(crate) async fn seed_user(pool: &SqlitePool, user: &User) {
    sqlx::query(
        "INSERT INTO users (id, name, username, password, role, job_title, employee_code, company_name, manager_name) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.username)
    .bind(&user.password)
    .bind(user.role.to_string())
    .bind(&user.job_title)
    .bind(&user.employee_code)
    .bind(&user.company_name)
    .bind(&user.manager_name)
    .execute(pool)
    .await
    .expect("failed to seed user");
}
