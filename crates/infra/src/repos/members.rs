use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Postgres, QueryBuilder, Result};
use uuid::Uuid;

use crate::{db::Db, models::MemberRow, pagination::LimitOffset};

/// Select list shared by every member query. Expects the member table aliased
/// as `m` and the package table as `p`.
const MEMBER_COLUMNS: &str = r#"
    m.id, m.member_id, m.name, m.email, m.phone, m.password_hash, m.status,
    m.membership_package_id, p.title AS package_title, p.duration_days AS package_duration_days,
    m.start_date, m.end_date, m.deleted_at, m.created_at, m.updated_at
"#;

/// Validity filter used by the admin member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipActivity {
    Active,
    Expired,
}

#[derive(Debug, Clone, Default)]
pub struct MemberFilter {
    pub status: Option<String>,
    pub activity: Option<MembershipActivity>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateMemberData {
    pub member_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub membership_package_id: Uuid,
}

#[derive(Clone)]
pub struct MemberRepo {
    db: Db,
}

impl MemberRepo {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: Uuid, include_deleted: bool) -> Result<Option<MemberRow>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id
             WHERE m.id = $1 AND ($2 OR m.deleted_at IS NULL)"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .bind(include_deleted)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn get_by_business_id(
        &self,
        member_id: &str,
        include_deleted: bool,
    ) -> Result<Option<MemberRow>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id
             WHERE m.member_id = $1 AND ($2 OR m.deleted_at IS NULL)"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(member_id)
            .bind(include_deleted)
            .fetch_optional(&self.db)
            .await
    }

    /// Live (not soft-deleted) member with this email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<MemberRow>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id
             WHERE LOWER(m.email) = LOWER($1) AND m.deleted_at IS NULL"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await
    }

    /// Any member with this email, soft-deleted ones included.
    pub async fn get_any_by_email(&self, email: &str) -> Result<Option<MemberRow>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id
             WHERE LOWER(m.email) = LOWER($1)
             ORDER BY m.deleted_at NULLS FIRST, m.created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn phone_in_use(&self, phone: &str) -> Result<bool> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM members WHERE phone = $1 AND deleted_at IS NULL)",
        )
        .bind(phone)
        .fetch_one(&self.db)
        .await?;
        Ok(row.0)
    }

    pub async fn business_id_exists(&self, member_id: &str) -> Result<bool> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM members WHERE member_id = $1)")
                .bind(member_id)
                .fetch_one(&self.db)
                .await?;
        Ok(row.0)
    }

    pub async fn list(
        &self,
        filter: &MemberFilter,
        page: LimitOffset,
        now: DateTime<Utc>,
    ) -> Result<Vec<MemberRow>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {MEMBER_COLUMNS} FROM members m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id
             WHERE m.deleted_at IS NULL"
        ));
        push_member_filters(&mut query, filter, now);
        query.push(" ORDER BY m.created_at DESC LIMIT ");
        query.push_bind(page.limit);
        query.push(" OFFSET ");
        query.push_bind(page.offset);

        query.build_query_as::<MemberRow>().fetch_all(&self.db).await
    }

    pub async fn count(&self, filter: &MemberFilter, now: DateTime<Utc>) -> Result<i64> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM members m WHERE m.deleted_at IS NULL",
        );
        push_member_filters(&mut query, filter, now);

        let row = query.build_query_as::<(i64,)>().fetch_one(&self.db).await?;
        Ok(row.0)
    }

    /// Approved, live members whose validity window closed before `now`.
    pub async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<MemberRow>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id
             WHERE m.status = 'APPROVED' AND m.end_date < $1 AND m.deleted_at IS NULL
             ORDER BY m.end_date ASC"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(now)
            .fetch_all(&self.db)
            .await
    }

    /// Approved, live members whose validity window ends inside `[from, to]`.
    pub async fn list_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MemberRow>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM members m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id
             WHERE m.status = 'APPROVED' AND m.end_date >= $1 AND m.end_date <= $2
               AND m.deleted_at IS NULL
             ORDER BY m.end_date ASC"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.db)
            .await
    }

    pub async fn approve(
        &self,
        id: Uuid,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Option<MemberRow>> {
        let sql = format!(
            "WITH m AS (
                UPDATE members
                SET status = 'APPROVED', start_date = $2, end_date = $3, updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {MEMBER_COLUMNS} FROM m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .bind(start_date)
            .bind(end_date)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn set_status(&self, id: Uuid, status: &str) -> Result<Option<MemberRow>> {
        let sql = format!(
            "WITH m AS (
                UPDATE members SET status = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {MEMBER_COLUMNS} FROM m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn set_end_date(
        &self,
        id: Uuid,
        end_date: DateTime<Utc>,
    ) -> Result<Option<MemberRow>> {
        let sql = format!(
            "WITH m AS (
                UPDATE members SET end_date = $2, updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
             )
             SELECT {MEMBER_COLUMNS} FROM m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .bind(end_date)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn soft_delete(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<MemberRow>> {
        let sql = format!(
            "WITH m AS (
                UPDATE members SET deleted_at = $2, updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
             )
             SELECT {MEMBER_COLUMNS} FROM m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn restore(&self, id: Uuid) -> Result<Option<MemberRow>> {
        let sql = format!(
            "WITH m AS (
                UPDATE members SET deleted_at = NULL, updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NOT NULL
                RETURNING *
             )
             SELECT {MEMBER_COLUMNS} FROM m
             LEFT JOIN membership_packages p ON p.id = m.membership_package_id"
        );
        sqlx::query_as::<_, MemberRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }
}

/// Insert a PENDING member. Takes an executor so registration can run it
/// inside the same transaction as the image inserts.
pub async fn create_member<'e>(
    executor: impl PgExecutor<'e>,
    data: &CreateMemberData,
) -> Result<MemberRow> {
    let sql = format!(
        "WITH m AS (
            INSERT INTO members (member_id, name, email, phone, password_hash, status, membership_package_id)
            VALUES ($1, $2, $3, $4, $5, 'PENDING', $6)
            RETURNING *
         )
         SELECT {MEMBER_COLUMNS} FROM m
         LEFT JOIN membership_packages p ON p.id = m.membership_package_id"
    );
    sqlx::query_as::<_, MemberRow>(&sql)
        .bind(&data.member_id)
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.password_hash)
        .bind(data.membership_package_id)
        .fetch_one(executor)
        .await
}

fn push_member_filters(
    query: &mut QueryBuilder<'_, Postgres>,
    filter: &MemberFilter,
    now: DateTime<Utc>,
) {
    if let Some(status) = &filter.status {
        query.push(" AND m.status = ");
        query.push_bind(status.clone());
    }

    match filter.activity {
        Some(MembershipActivity::Active) => {
            query.push(" AND m.status = 'APPROVED' AND m.end_date >= ");
            query.push_bind(now);
        }
        Some(MembershipActivity::Expired) => {
            query.push(" AND m.status = 'APPROVED' AND m.end_date < ");
            query.push_bind(now);
        }
        None => {}
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.trim());
        query.push(" AND (m.name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR m.email ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR m.phone ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR m.member_id ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}
