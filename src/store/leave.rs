use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::Error;
use crate::model::day::{DayPatch, DayType};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::role::Role;
use crate::model::user::{User, company_key};
use crate::store::directory::fetch_user;
use crate::store::events::{ChangeEvent, ChangeFeed};
use crate::store::schedule::{fetch_day, write_day};

/// Single-approval workflow that ends in a schedule stamp: on approval the
/// requested classification is merged into the requester's day, in the same
/// transaction as the status write.
#[derive(Clone)]
pub struct LeaveEngine {
    pool: SqlitePool,
    feed: ChangeFeed,
}

#[derive(FromRow)]
struct LeaveRow {
    id: String,
    user_id: String,
    user_name: String,
    leave_type: String,
    date: NaiveDate,
    early_leave_time: Option<String>,
    status: String,
    company_name: Option<String>,
    manager_id: String,
    created_at: DateTime<Utc>,
}

const LEAVE_COLUMNS: &str = "id, user_id, user_name, leave_type, date, early_leave_time, status, \
                             company_name, manager_id, created_at";

impl LeaveRow {
    fn into_request(self) -> Result<LeaveRequest, Error> {
        let leave_type = DayType::from_str(&self.leave_type).map_err(|_| {
            Error::Transport(format!(
                "unknown leave type {:?} in storage",
                self.leave_type
            ))
        })?;
        let status = LeaveStatus::from_str(&self.status).map_err(|_| {
            Error::Transport(format!(
                "unknown leave status {:?} in storage",
                self.status
            ))
        })?;
        let early_leave_time = self
            .early_leave_time
            .as_deref()
            .map(|raw| {
                chrono::NaiveTime::parse_from_str(raw, "%H:%M")
                    .map_err(|_| Error::Transport(format!("bad time {raw:?} in storage")))
            })
            .transpose()?;
        Ok(LeaveRequest {
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            leave_type,
            date: self.date,
            early_leave_time,
            status,
            company_name: self.company_name,
            manager_id: self.manager_id,
            created_at: self.created_at,
        })
    }
}

async fn fetch_leave(conn: &mut SqliteConnection, id: &str) -> Result<Option<LeaveRequest>, Error> {
    let row = sqlx::query_as::<_, LeaveRow>(&format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(LeaveRow::into_request).transpose()
}

fn may_adjudicate(actor: &User, request: &LeaveRequest) -> bool {
    match actor.role {
        Role::Supervisor => true,
        Role::Manager => actor.company_key() == company_key(request.company_name.as_deref()),
        Role::Employee => false,
    }
}

impl LeaveEngine {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        LeaveEngine { pool, feed }
    }

    /// Persists a new request in PENDING. The leave type is restricted to the
    /// requestable classifications, the time-of-leaving accompanies exactly
    /// the EARLY_LEAVE type, and the assigned approver must be a manager of
    /// the requester's company.
    pub async fn create(&self, actor: &User, new: NewLeaveRequest) -> Result<LeaveRequest, Error> {
        if actor.id != new.user_id {
            return Err(Error::forbidden("leave is requested on one's own behalf"));
        }
        if !new.leave_type.is_leave_kind() {
            return Err(Error::Validation(format!(
                "{} cannot be requested as leave",
                new.leave_type
            )));
        }
        match (new.leave_type, new.early_leave_time) {
            (DayType::EarlyLeave, None) => {
                return Err(Error::validation(
                    "an early-leave request needs the time of leaving",
                ));
            }
            (t, Some(_)) if t != DayType::EarlyLeave => {
                return Err(Error::validation(
                    "only early-leave requests carry a time of leaving",
                ));
            }
            _ => {}
        }

        let mut tx = self.pool.begin().await?;
        let manager = fetch_user(&mut tx, &new.manager_id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        if manager.role != Role::Manager || !manager.same_company(actor) {
            return Err(Error::validation(
                "the assigned approver must be a manager of your company",
            ));
        }

        let request = LeaveRequest {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            user_name: actor.name.clone(),
            leave_type: new.leave_type,
            date: new.date,
            early_leave_time: new.early_leave_time,
            status: LeaveStatus::Pending,
            company_name: actor.company_name.clone(),
            manager_id: new.manager_id,
            created_at: Utc::now(),
        };
        sqlx::query(&format!(
            "INSERT INTO leave_requests ({LEAVE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&request.id)
        .bind(&request.user_id)
        .bind(&request.user_name)
        .bind(request.leave_type.to_string())
        .bind(request.date)
        .bind(
            request
                .early_leave_time
                .map(|t| t.format("%H:%M").to_string()),
        )
        .bind(request.status.to_string())
        .bind(&request.company_name)
        .bind(&request.manager_id)
        .bind(request.created_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.feed.publish(ChangeEvent::LeaveRequests {
            id: request.id.clone(),
        });
        Ok(request)
    }

    /// Approves or rejects a pending request. Approval merges the leave
    /// classification into the requester's schedule without discarding an
    /// underlying shift the classification can still carry.
    pub async fn decide(
        &self,
        actor: &User,
        id: &str,
        decision: LeaveStatus,
    ) -> Result<LeaveRequest, Error> {
        if decision == LeaveStatus::Pending {
            return Err(Error::validation("a request cannot return to pending"));
        }

        let mut tx = self.pool.begin().await?;
        let mut request = fetch_leave(&mut tx, id)
            .await?
            .ok_or(Error::NotFound("leave request"))?;
        if request.status.is_terminal() {
            return Err(Error::conflict("leave request already resolved"));
        }
        if !may_adjudicate(actor, &request) {
            return Err(Error::forbidden(
                "only a company manager or a supervisor may decide this request",
            ));
        }

        sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
            .bind(decision.to_string())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        request.status = decision;

        if decision == LeaveStatus::Approved {
            let existing = fetch_day(&mut tx, &request.user_id, request.date).await?;
            let day = DayPatch::day(request.leave_type).apply_to(existing.as_ref(), request.date)?;
            write_day(&mut tx, &request.user_id, &day).await?;
        }
        tx.commit().await?;

        info!(leave_id = %request.id, status = %decision, "Leave request updated");
        self.feed.publish(ChangeEvent::LeaveRequests {
            id: request.id.clone(),
        });
        if decision == LeaveStatus::Approved {
            self.feed.publish(ChangeEvent::Schedules {
                user_id: request.user_id.clone(),
            });
        }
        Ok(request)
    }

    /// Employees see their own history; managers their company's requests;
    /// supervisors everything.
    pub async fn list_visible_to(&self, actor: &User) -> Result<Vec<LeaveRequest>, Error> {
        let rows = sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut visible = Vec::new();
        for row in rows {
            let request = row.into_request()?;
            let included = match actor.role {
                Role::Supervisor => true,
                Role::Manager => {
                    actor.company_key() == company_key(request.company_name.as_deref())
                }
                Role::Employee => request.user_id == actor.id,
            };
            if included {
                visible.push(request);
            }
        }
        Ok(visible)
    }
}
