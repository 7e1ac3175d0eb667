use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder, Result};
use uuid::Uuid;

use crate::{
    db::Db,
    models::{CheckInLogEntryRow, CheckInLogRow, CheckInStatus},
    pagination::LimitOffset,
};

const LOG_COLUMNS: &str =
    "id, member_id, check_in_time, check_out_time, status, reason, created_at";

#[derive(Debug, Clone)]
pub struct NewCheckInLog {
    pub member_id: Uuid,
    pub check_in_time: DateTime<Utc>,
    pub status: CheckInStatus,
    pub reason: Option<String>,
}

/// Filter for the check-in history. The time range is inclusive on both ends
/// and applies to `check_in_time`.
#[derive(Debug, Clone, Default)]
pub struct CheckInLogFilter {
    pub member_id: Option<Uuid>,
    pub status: Option<CheckInStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct CheckInLogRepo {
    db: Db,
}

impl CheckInLogRepo {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create(&self, data: &NewCheckInLog) -> Result<Option<CheckInLogRow>> {
        let sql = format!(
            "INSERT INTO check_in_logs (member_id, check_in_time, status, reason)
             VALUES ($1, $2, $3, $4)
             RETURNING {LOG_COLUMNS}"
        );
        sqlx::query_as::<_, CheckInLogRow>(&sql)
            .bind(data.member_id)
            .bind(data.check_in_time)
            .bind(data.status.as_str())
            .bind(&data.reason)
            .fetch_optional(&self.db)
            .await
    }

    /// Most recent admitted visit that has not been checked out yet. Denied
    /// attempts are never open visits.
    pub async fn find_latest_open(&self, member_id: Uuid) -> Result<Option<CheckInLogRow>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM check_in_logs
             WHERE member_id = $1 AND status = 'ALLOWED' AND check_out_time IS NULL
             ORDER BY check_in_time DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, CheckInLogRow>(&sql)
            .bind(member_id)
            .fetch_optional(&self.db)
            .await
    }

    /// Most recent log for the member, open or closed.
    pub async fn find_latest(&self, member_id: Uuid) -> Result<Option<CheckInLogRow>> {
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM check_in_logs
             WHERE member_id = $1
             ORDER BY check_in_time DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, CheckInLogRow>(&sql)
            .bind(member_id)
            .fetch_optional(&self.db)
            .await
    }

    /// Stamp the checkout time on a still-open visit.
    ///
    /// Returns `None` when the row is gone or was closed in the meantime, so two
    /// racing checkouts cannot both succeed.
    pub async fn close(
        &self,
        id: Uuid,
        check_out_time: DateTime<Utc>,
    ) -> Result<Option<CheckInLogRow>> {
        let sql = format!(
            "UPDATE check_in_logs SET check_out_time = $2
             WHERE id = $1 AND status = 'ALLOWED' AND check_out_time IS NULL
             RETURNING {LOG_COLUMNS}"
        );
        sqlx::query_as::<_, CheckInLogRow>(&sql)
            .bind(id)
            .bind(check_out_time)
            .fetch_optional(&self.db)
            .await
    }

    /// Close every open visit of the member at `at`. Returns how many were closed.
    pub async fn close_open_visits(&self, member_id: Uuid, at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE check_in_logs SET check_out_time = $2
             WHERE member_id = $1 AND status = 'ALLOWED' AND check_out_time IS NULL",
        )
        .bind(member_id)
        .bind(at)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list(
        &self,
        filter: &CheckInLogFilter,
        page: LimitOffset,
    ) -> Result<Vec<CheckInLogEntryRow>> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT l.id, l.member_id, l.check_in_time, l.check_out_time, l.status, l.reason,
                    l.created_at, m.name AS member_name, m.member_id AS member_code,
                    p.title AS package_title
             FROM check_in_logs l
             JOIN members m ON m.id = l.member_id
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id
             WHERE 1=1",
        );
        push_log_filters(&mut query, filter);
        query.push(" ORDER BY l.check_in_time DESC LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset);

        query
            .build_query_as::<CheckInLogEntryRow>()
            .fetch_all(&self.db)
            .await
    }

    pub async fn count(&self, filter: &CheckInLogFilter) -> Result<i64> {
        let mut query =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM check_in_logs l WHERE 1=1");
        push_log_filters(&mut query, filter);

        let row = query.build_query_as::<(i64,)>().fetch_one(&self.db).await?;
        Ok(row.0)
    }
}

fn push_log_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &CheckInLogFilter) {
    if let Some(member_id) = filter.member_id {
        query.push(" AND l.member_id = ");
        query.push_bind(member_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND l.status = ");
        query.push_bind(status.as_str());
    }
    if let Some(from) = filter.from {
        query.push(" AND l.check_in_time >= ");
        query.push_bind(from);
    }
    if let Some(to) = filter.to {
        query.push(" AND l.check_in_time <= ");
        query.push_bind(to);
    }
}
