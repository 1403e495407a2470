use std::str::FromStr;

use serde::Deserialize;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;
use crate::model::role::Role;
use crate::model::user::{User, company_key};
use crate::store::events::{ChangeEvent, ChangeFeed};
use crate::utils::user_cache;

#[derive(FromRow)]
pub(crate) struct UserRow {
    id: String,
    name: String,
    username: String,
    password: String,
    role: String,
    job_title: Option<String>,
    employee_code: Option<String>,
    company_name: Option<String>,
    manager_name: Option<String>,
}

const USER_COLUMNS: &str =
    "id, name, username, password, role, job_title, employee_code, company_name, manager_name";

impl UserRow {
    pub(crate) fn into_user(self) -> Result<User, Error> {
        let role = Role::from_str(&self.role)
            .map_err(|_| Error::Transport(format!("unknown role {:?} in storage", self.role)))?;
        Ok(User {
            id: self.id,
            name: self.name,
            username: self.username,
            password: self.password,
            role,
            job_title: self.job_title,
            employee_code: self.employee_code,
            company_name: self.company_name,
            manager_name: self.manager_name,
        })
    }
}

pub(crate) async fn fetch_user(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<User>, Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(UserRow::into_user).transpose()
}

pub(crate) async fn fetch_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>, Error> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY name"
    ))
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(UserRow::into_user).collect()
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewUser {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane.doe")]
    pub username: String,
    pub password: String,
    pub role: Role,
    pub job_title: Option<String>,
    pub employee_code: Option<String>,
    #[schema(example = "Acme Coffee", nullable = true)]
    pub company_name: Option<String>,
    pub manager_name: Option<String>,
}

/// Shallow update: absent fields keep their current value. The username is
/// the login identity and stays fixed.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub job_title: Option<String>,
    pub employee_code: Option<String>,
    pub company_name: Option<String>,
    pub manager_name: Option<String>,
}

/// User records plus the role/company guards every other component consults.
#[derive(Clone)]
pub struct Directory {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl Directory {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        Directory { pool, feed }
    }

    /// Verbatim credential compare against the stored field, mirroring the
    /// source system. `None` means the credentials did not match.
    pub async fn login(&self, username: &str, password: &str) -> Result<Option<User>, Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => {
                let user = row.into_user()?;
                Ok((user.password == password).then_some(user))
            }
            None => Ok(None),
        }
    }

    /// Cached lookup; the cache is invalidated by every directory write.
    pub async fn user(&self, id: &str) -> Result<User, Error> {
        if let Some(user) = user_cache::get(id).await {
            return Ok(user);
        }
        let mut conn = self.pool.acquire().await?;
        let user = fetch_user(&mut conn, id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        user_cache::store(&user).await;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_all_users(&mut conn).await
    }

    pub async fn create(&self, actor: &User, new: NewUser) -> Result<User, Error> {
        if !actor.role.is_management() {
            return Err(Error::forbidden("only managers and supervisors may create users"));
        }
        if actor.role == Role::Manager
            && company_key(new.company_name.as_deref()) != actor.company_key()
        {
            return Err(Error::forbidden(
                "managers may only create users in their own company",
            ));
        }
        let username = new.username.trim();
        if username.is_empty() || new.password.is_empty() || new.name.trim().is_empty() {
            return Err(Error::validation("name, username and password are required"));
        }

        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? LIMIT 1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        if taken {
            return Err(Error::validation("username already taken"));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            username: username.to_string(),
            password: new.password,
            role: new.role,
            job_title: new.job_title,
            employee_code: new.employee_code,
            company_name: new.company_name,
            manager_name: new.manager_name,
        };
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
        .execute(&self.pool)
        .await?;

        user_cache::store(&user).await;
        self.feed.publish(ChangeEvent::Users {
            id: user.id.clone(),
        });
        Ok(user)
    }

    pub async fn update(&self, actor: &User, id: &str, patch: UpdateUser) -> Result<User, Error> {
        let mut tx = self.pool.begin().await?;
        let current = fetch_user(&mut tx, id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        if !actor.manages(&current) {
            return Err(Error::forbidden("not allowed to edit this user"));
        }
        if actor.role == Role::Manager {
            if let Some(company) = &patch.company_name {
                if company_key(Some(company)) != actor.company_key() {
                    return Err(Error::forbidden(
                        "managers may not move users to another company",
                    ));
                }
            }
        }

        let updated = User {
            id: current.id,
            name: patch.name.unwrap_or(current.name),
            username: current.username,
            password: patch.password.unwrap_or(current.password),
            role: patch.role.unwrap_or(current.role),
            job_title: patch.job_title.or(current.job_title),
            employee_code: patch.employee_code.or(current.employee_code),
            company_name: patch.company_name.or(current.company_name),
            manager_name: patch.manager_name.or(current.manager_name),
        };
        sqlx::query(
            "UPDATE users SET name = ?, password = ?, role = ?, job_title = ?, \
             employee_code = ?, company_name = ?, manager_name = ? WHERE id = ?",
        )
        .bind(&updated.name)
        .bind(&updated.password)
        .bind(updated.role.to_string())
        .bind(&updated.job_title)
        .bind(&updated.employee_code)
        .bind(&updated.company_name)
        .bind(&updated.manager_name)
        .bind(&updated.id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        user_cache::invalidate(id).await;
        user_cache::store(&updated).await;
        self.feed.publish(ChangeEvent::Users { id: id.to_string() });
        Ok(updated)
    }

    /// Removes the user record only; schedule rows stay behind.
    pub async fn delete(&self, actor: &User, id: &str) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        let target = fetch_user(&mut tx, id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        if !actor.manages(&target) {
            return Err(Error::forbidden("not allowed to delete this user"));
        }
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        user_cache::invalidate(id).await;
        self.feed.publish(ChangeEvent::Users { id: id.to_string() });
        Ok(())
    }
}
