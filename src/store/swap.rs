use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::Error;
use crate::model::role::Role;
use crate::model::swap_request::{NewSwapRequest, SwapRequest, SwapStatus};
use crate::model::user::User;
use crate::store::directory::fetch_user;
use crate::store::events::{ChangeEvent, ChangeFeed};
use crate::store::schedule::{clear_day, fetch_day, write_day};

/// Drives a two-employee, cross-day shift exchange through its approval
/// pipeline and performs the exchange exactly once, in the same transaction
/// as the final status write.
#[derive(Clone)]
pub struct SwapEngine {
    pool: SqlitePool,
    feed: ChangeFeed,
}

#[derive(FromRow)]
struct SwapRow {
    id: String,
    requester_id: String,
    target_id: String,
    requester_date: NaiveDate,
    target_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
}

impl SwapRow {
    fn into_request(self) -> Result<SwapRequest, Error> {
        let status = SwapStatus::from_str(&self.status).map_err(|_| {
            Error::Transport(format!("unknown swap status {:?} in storage", self.status))
        })?;
        Ok(SwapRequest {
            id: self.id,
            requester_id: self.requester_id,
            target_id: self.target_id,
            requester_date: self.requester_date,
            target_date: self.target_date,
            status,
            created_at: self.created_at,
        })
    }
}

const SWAP_COLUMNS: &str =
    "id, requester_id, target_id, requester_date, target_date, status, created_at";

async fn fetch_swap(conn: &mut SqliteConnection, id: &str) -> Result<Option<SwapRequest>, Error> {
    let row = sqlx::query_as::<_, SwapRow>(&format!(
        "SELECT {SWAP_COLUMNS} FROM swap_requests WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(SwapRow::into_request).transpose()
}

/// Managers adjudicate swaps touching their own company (either party
/// qualifies); supervisors adjudicate everything.
fn may_adjudicate(actor: &User, requester: &User, target: &User) -> bool {
    match actor.role {
        Role::Supervisor => true,
        Role::Manager => actor.same_company(requester) || actor.same_company(target),
        Role::Employee => false,
    }
}

impl SwapEngine {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        SwapEngine { pool, feed }
    }

    /// Opens a swap in PENDING_TARGET. The requester must be the actor, the
    /// target must be a different user of the same company, and both dates
    /// must be today or later.
    pub async fn create(&self, actor: &User, new: NewSwapRequest) -> Result<SwapRequest, Error> {
        if actor.id != new.requester_id {
            return Err(Error::forbidden("swaps are requested on one's own behalf"));
        }
        if new.requester_id == new.target_id {
            return Err(Error::validation("cannot swap a shift with yourself"));
        }
        let today = Utc::now().date_naive();
        if new.requester_date < today || new.target_date < today {
            return Err(Error::validation("swap dates must be today or later"));
        }

        let mut tx = self.pool.begin().await?;
        let requester = fetch_user(&mut tx, &new.requester_id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        let target = fetch_user(&mut tx, &new.target_id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        if !requester.same_company(&target) {
            return Err(Error::forbidden(
                "swap target must belong to the same company",
            ));
        }

        let request = SwapRequest {
            id: Uuid::new_v4().to_string(),
            requester_id: new.requester_id,
            target_id: new.target_id,
            requester_date: new.requester_date,
            target_date: new.target_date,
            status: SwapStatus::PendingTarget,
            created_at: Utc::now(),
        };
        sqlx::query(&format!(
            "INSERT INTO swap_requests ({SWAP_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&request.id)
        .bind(&request.requester_id)
        .bind(&request.target_id)
        .bind(request.requester_date)
        .bind(request.target_date)
        .bind(request.status.to_string())
        .bind(request.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.feed.publish(ChangeEvent::SwapRequests {
            id: request.id.clone(),
        });
        Ok(request)
    }

    /// Applies one state-machine transition. Terminal requests never move
    /// again and never touch schedules; the transition table is enforced
    /// here, not in the caller.
    pub async fn decide(
        &self,
        actor: &User,
        id: &str,
        next: SwapStatus,
    ) -> Result<SwapRequest, Error> {
        let mut tx = self.pool.begin().await?;
        let mut request = fetch_swap(&mut tx, id)
            .await?
            .ok_or(Error::NotFound("swap request"))?;
        if request.status.is_terminal() {
            return Err(Error::conflict("swap request already resolved"));
        }

        let requester = fetch_user(&mut tx, &request.requester_id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        let target = fetch_user(&mut tx, &request.target_id)
            .await?
            .ok_or(Error::NotFound("user"))?;

        match (request.status, next) {
            (SwapStatus::PendingTarget, SwapStatus::PendingManager) => {
                if actor.id != request.target_id {
                    return Err(Error::forbidden(
                        "only the swap target may accept the proposal",
                    ));
                }
            }
            (SwapStatus::PendingTarget, SwapStatus::Rejected) => {
                if actor.id != request.target_id && !may_adjudicate(actor, &requester, &target) {
                    return Err(Error::forbidden("not allowed to decline this swap"));
                }
            }
            (SwapStatus::PendingManager, SwapStatus::Approved)
            | (SwapStatus::PendingManager, SwapStatus::Rejected) => {
                if !may_adjudicate(actor, &requester, &target) {
                    return Err(Error::forbidden(
                        "only a company manager or a supervisor may decide this swap",
                    ));
                }
            }
            (from, to) => {
                return Err(Error::Validation(format!(
                    "a swap cannot move from {from} to {to}"
                )));
            }
        }

        sqlx::query("UPDATE swap_requests SET status = ? WHERE id = ?")
            .bind(next.to_string())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        request.status = next;

        // the exchange commits or rolls back together with the status write,
        // so a half-performed swap cannot persist
        if next == SwapStatus::Approved {
            exchange(&mut tx, &request).await?;
        }
        tx.commit().await?;

        info!(swap_id = %request.id, status = %next, "Swap request updated");
        self.feed.publish(ChangeEvent::SwapRequests {
            id: request.id.clone(),
        });
        if next == SwapStatus::Approved {
            self.feed.publish(ChangeEvent::Schedules {
                user_id: request.requester_id.clone(),
            });
            self.feed.publish(ChangeEvent::Schedules {
                user_id: request.target_id.clone(),
            });
        }
        Ok(request)
    }

    /// Employees see swaps they are party to; managers their company's;
    /// supervisors everything.
    pub async fn list_visible_to(&self, actor: &User) -> Result<Vec<SwapRequest>, Error> {
        let mut conn = self.pool.acquire().await?;
        let users = crate::store::directory::fetch_all_users(&mut conn).await?;
        let rows = sqlx::query_as::<_, SwapRow>(&format!(
            "SELECT {SWAP_COLUMNS} FROM swap_requests ORDER BY created_at DESC"
        ))
        .fetch_all(&mut *conn)
        .await?;

        let mut visible = Vec::new();
        for row in rows {
            let request = row.into_request()?;
            let included = match actor.role {
                Role::Supervisor => true,
                Role::Employee => {
                    request.requester_id == actor.id || request.target_id == actor.id
                }
                Role::Manager => users
                    .iter()
                    .filter(|u| {
                        u.id == request.requester_id || u.id == request.target_id
                    })
                    .any(|u| actor.same_company(u)),
            };
            if included {
                visible.push(request);
            }
        }
        Ok(visible)
    }
}

/// Moves whatever sits at the two slots across the two schedules. An absent
/// entry is "nothing to move": the opposite slot ends up cleared. Entries
/// are re-stamped with the date they land on.
async fn exchange(conn: &mut SqliteConnection, request: &SwapRequest) -> Result<(), Error> {
    let from_requester = fetch_day(conn, &request.requester_id, request.requester_date).await?;
    let from_target = fetch_day(conn, &request.target_id, request.target_date).await?;

    clear_day(conn, &request.requester_id, request.requester_date).await?;
    clear_day(conn, &request.target_id, request.target_date).await?;

    if let Some(mut day) = from_target {
        day.date = request.requester_date;
        write_day(conn, &request.requester_id, &day).await?;
    }
    if let Some(mut day) = from_requester {
        day.date = request.target_date;
        write_day(conn, &request.target_id, &day).await?;
    }
    Ok(())
}
