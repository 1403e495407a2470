use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::error::Error;
use crate::model::day::{DayPatch, DayType, ScheduleDay, Shift};
use crate::model::role::Role;
use crate::model::user::User;
use crate::store::directory::{fetch_all_users, fetch_user};
use crate::store::events::{ChangeEvent, ChangeFeed};

/// Per-(user,date) schedule rows. Every mutation is a transactional
/// read-merge-write of exactly the rows it names, so edits to unrelated
/// dates can never overwrite each other.
#[derive(Clone)]
pub struct ScheduleStore {
    pool: SqlitePool,
    feed: ChangeFeed,
}

#[derive(FromRow)]
struct DayRow {
    user_id: String,
    date: NaiveDate,
    day_type: String,
    shift: Option<String>,
    minutes: Option<i64>,
}

impl DayRow {
    fn into_day(self) -> Result<ScheduleDay, Error> {
        let day_type = DayType::from_str(&self.day_type).map_err(|_| {
            Error::Transport(format!("unknown day type {:?} in storage", self.day_type))
        })?;
        let shift = self
            .shift
            .as_deref()
            .map(serde_json::from_str::<Shift>)
            .transpose()?;
        Ok(ScheduleDay {
            date: self.date,
            day_type,
            shift,
            minutes: self.minutes.map(|m| m as u32),
        })
    }
}

pub(crate) async fn fetch_day(
    conn: &mut SqliteConnection,
    user_id: &str,
    date: NaiveDate,
) -> Result<Option<ScheduleDay>, Error> {
    let row = sqlx::query_as::<_, DayRow>(
        "SELECT user_id, date, day_type, shift, minutes FROM schedule_days WHERE user_id = ? AND date = ?",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(&mut *conn)
    .await?;
    row.map(DayRow::into_day).transpose()
}

pub(crate) async fn write_day(
    conn: &mut SqliteConnection,
    user_id: &str,
    day: &ScheduleDay,
) -> Result<(), Error> {
    let shift = day.shift.as_ref().map(serde_json::to_string).transpose()?;
    sqlx::query(
        "INSERT INTO schedule_days (user_id, date, day_type, shift, minutes) \
         VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(user_id, date) DO UPDATE SET \
         day_type = excluded.day_type, shift = excluded.shift, minutes = excluded.minutes",
    )
    .bind(user_id)
    .bind(day.date)
    .bind(day.day_type.to_string())
    .bind(shift)
    .bind(day.minutes.map(i64::from))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(crate) async fn clear_day(
    conn: &mut SqliteConnection,
    user_id: &str,
    date: NaiveDate,
) -> Result<(), Error> {
    sqlx::query("DELETE FROM schedule_days WHERE user_id = ? AND date = ?")
        .bind(user_id)
        .bind(date)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

impl ScheduleStore {
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        ScheduleStore { pool, feed }
    }

    /// Full schedule for one user, empty when no day has been written yet.
    /// Visible to the user themself, managers of their company, supervisors.
    pub async fn schedule_for(
        &self,
        actor: &User,
        user_id: &str,
    ) -> Result<BTreeMap<NaiveDate, ScheduleDay>, Error> {
        let mut conn = self.pool.acquire().await?;
        let target = fetch_user(&mut conn, user_id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        if !actor.may_view_schedule_of(&target) {
            return Err(Error::forbidden("not allowed to view this schedule"));
        }

        let rows = sqlx::query_as::<_, DayRow>(
            "SELECT user_id, date, day_type, shift, minutes FROM schedule_days \
             WHERE user_id = ? ORDER BY date",
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter()
            .map(|row| row.into_day().map(|day| (day.date, day)))
            .collect()
    }

    /// Cross-user snapshot for roster dashboards. Supervisors see every
    /// company; everyone else sees their own company only.
    pub async fn all_schedules(
        &self,
        actor: &User,
    ) -> Result<HashMap<String, BTreeMap<NaiveDate, ScheduleDay>>, Error> {
        let mut conn = self.pool.acquire().await?;
        let users = fetch_all_users(&mut conn).await?;
        let visible: HashSet<String> = users
            .into_iter()
            .filter(|u| actor.role == Role::Supervisor || actor.same_company(u))
            .map(|u| u.id)
            .collect();

        let rows = sqlx::query_as::<_, DayRow>(
            "SELECT user_id, date, day_type, shift, minutes FROM schedule_days ORDER BY user_id, date",
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut schedules: HashMap<String, BTreeMap<NaiveDate, ScheduleDay>> = HashMap::new();
        for row in rows {
            if !visible.contains(&row.user_id) {
                continue;
            }
            let user_id = row.user_id.clone();
            let day = row.into_day()?;
            schedules.entry(user_id).or_default().insert(day.date, day);
        }
        Ok(schedules)
    }

    /// Transactional merge-write of a single day. Fields absent from the
    /// patch keep their stored value; see [`DayPatch::apply_to`].
    pub async fn upsert_day(
        &self,
        actor: &User,
        user_id: &str,
        date: NaiveDate,
        patch: &DayPatch,
    ) -> Result<ScheduleDay, Error> {
        let mut tx = self.pool.begin().await?;
        let target = fetch_user(&mut tx, user_id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        if !actor.manages(&target) {
            return Err(Error::forbidden("only a company manager or a supervisor may edit schedules"));
        }

        let existing = fetch_day(&mut tx, user_id, date).await?;
        let day = patch.apply_to(existing.as_ref(), date)?;
        write_day(&mut tx, user_id, &day).await?;
        tx.commit().await?;

        self.feed.publish(ChangeEvent::Schedules {
            user_id: user_id.to_string(),
        });
        Ok(day)
    }

    /// Same merge as [`upsert_day`] applied to a set of dates, all of which
    /// land in one transaction (the "apply to every day of the week" edit).
    pub async fn upsert_batch(
        &self,
        actor: &User,
        user_id: &str,
        days: &BTreeMap<NaiveDate, DayPatch>,
    ) -> Result<Vec<ScheduleDay>, Error> {
        if days.is_empty() {
            return Err(Error::validation("no days provided"));
        }
        let mut tx = self.pool.begin().await?;
        let target = fetch_user(&mut tx, user_id)
            .await?
            .ok_or(Error::NotFound("user"))?;
        if !actor.manages(&target) {
            return Err(Error::forbidden("only a company manager or a supervisor may edit schedules"));
        }

        let mut written = Vec::with_capacity(days.len());
        for (date, patch) in days {
            let existing = fetch_day(&mut tx, user_id, *date).await?;
            let day = patch.apply_to(existing.as_ref(), *date)?;
            write_day(&mut tx, user_id, &day).await?;
            written.push(day);
        }
        tx.commit().await?;

        self.feed.publish(ChangeEvent::Schedules {
            user_id: user_id.to_string(),
        });
        Ok(written)
    }
}
