use sqlx::Result;
use uuid::Uuid;

use crate::{db::Db, models::MembershipPackageRow};

const PACKAGE_COLUMNS: &str = "id, title, description, price::TEXT AS price, duration_days, \
                               sort_order, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct MembershipPackageRepo {
    db: Db,
}

impl MembershipPackageRepo {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self, is_active: Option<bool>) -> Result<Vec<MembershipPackageRow>> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM membership_packages
             WHERE deleted_at IS NULL AND ($1::BOOLEAN IS NULL OR is_active = $1)
             ORDER BY sort_order ASC, created_at DESC"
        );
        sqlx::query_as::<_, MembershipPackageRow>(&sql)
            .bind(is_active)
            .fetch_all(&self.db)
            .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<MembershipPackageRow>> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM membership_packages
             WHERE id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, MembershipPackageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    /// Package a new member may sign up for.
    pub async fn get_active(&self, id: Uuid) -> Result<Option<MembershipPackageRow>> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM membership_packages
             WHERE id = $1 AND is_active = TRUE AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, MembershipPackageRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }
}
