use async_trait::async_trait;
use chrono::{DateTime, Utc};
use infra::{
    models::{CheckInLogEntryRow, CheckInLogRow, MemberRow},
    pagination::LimitOffset,
    repos::{CheckInLogFilter, CheckInLogRepo, MemberRepo, NewCheckInLog},
};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, sqlx::Error>;

/// Member lookups needed by the door and the expiration sweeps.
///
/// Every lookup takes `include_deleted` explicitly; list queries never return
/// soft-deleted members.
#[async_trait]
pub trait MemberStore: Send + Sync {
    async fn find_by_business_id(
        &self,
        member_id: &str,
        include_deleted: bool,
    ) -> StoreResult<Option<MemberRow>>;

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> StoreResult<Option<MemberRow>>;

    async fn list_expired(&self, now: DateTime<Utc>) -> StoreResult<Vec<MemberRow>>;

    async fn list_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<MemberRow>>;
}

#[async_trait]
pub trait CheckInLogStore: Send + Sync {
    /// `Ok(None)` means the insert produced no row.
    async fn create_log(&self, data: &NewCheckInLog) -> StoreResult<Option<CheckInLogRow>>;

    /// Latest admitted visit without a checkout.
    async fn find_latest_open_log(&self, member_id: Uuid) -> StoreResult<Option<CheckInLogRow>>;

    /// Close the visit only if it is still open. `Ok(None)` when another
    /// checkout got there first.
    async fn close_log(
        &self,
        id: Uuid,
        check_out_time: DateTime<Utc>,
    ) -> StoreResult<Option<CheckInLogRow>>;

    /// Close every open visit of the member. Returns how many were closed.
    async fn close_open_visits(&self, member_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64>;

    async fn list_logs(
        &self,
        filter: &CheckInLogFilter,
        page: LimitOffset,
    ) -> StoreResult<Vec<CheckInLogEntryRow>>;

    async fn count_logs(&self, filter: &CheckInLogFilter) -> StoreResult<i64>;
}

#[async_trait]
impl MemberStore for MemberRepo {
    async fn find_by_business_id(
        &self,
        member_id: &str,
        include_deleted: bool,
    ) -> StoreResult<Option<MemberRow>> {
        self.get_by_business_id(member_id, include_deleted).await
    }

    async fn find_by_id(&self, id: Uuid, include_deleted: bool) -> StoreResult<Option<MemberRow>> {
        self.get_by_id(id, include_deleted).await
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> StoreResult<Vec<MemberRow>> {
        MemberRepo::list_expired(self, now).await
    }

    async fn list_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<MemberRow>> {
        MemberRepo::list_expiring_between(self, from, to).await
    }
}

#[async_trait]
impl CheckInLogStore for CheckInLogRepo {
    async fn create_log(&self, data: &NewCheckInLog) -> StoreResult<Option<CheckInLogRow>> {
        self.create(data).await
    }

    async fn find_latest_open_log(&self, member_id: Uuid) -> StoreResult<Option<CheckInLogRow>> {
        self.find_latest_open(member_id).await
    }

    async fn close_log(
        &self,
        id: Uuid,
        check_out_time: DateTime<Utc>,
    ) -> StoreResult<Option<CheckInLogRow>> {
        self.close(id, check_out_time).await
    }

    async fn close_open_visits(&self, member_id: Uuid, at: DateTime<Utc>) -> StoreResult<u64> {
        CheckInLogRepo::close_open_visits(self, member_id, at).await
    }

    async fn list_logs(
        &self,
        filter: &CheckInLogFilter,
        page: LimitOffset,
    ) -> StoreResult<Vec<CheckInLogEntryRow>> {
        self.list(filter, page).await
    }

    async fn count_logs(&self, filter: &CheckInLogFilter) -> StoreResult<i64> {
        self.count(filter).await
    }
}
