use sqlx::Result;
use uuid::Uuid;

use crate::{db::Db, models::AdminRow};

const ADMIN_COLUMNS: &str = "id, name, email, phone, image, password_hash, status, \
                             last_login_at, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct UpdateAdminProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateAdmin {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone)]
pub struct AdminRepo {
    db: Db,
}

impl AdminRepo {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<AdminRow>> {
        let sql = format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<AdminRow>> {
        let sql = format!(
            "SELECT {ADMIN_COLUMNS} FROM admins
             WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn create(&self, data: &CreateAdmin) -> Result<AdminRow> {
        let sql = format!(
            "INSERT INTO admins (name, email, password_hash, status)
             VALUES ($1, $2, $3, 'ACTIVE')
             RETURNING {ADMIN_COLUMNS}"
        );
        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(&data.name)
            .bind(&data.email)
            .bind(&data.password_hash)
            .fetch_one(&self.db)
            .await
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE admins SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn update_profile(
        &self,
        id: Uuid,
        data: &UpdateAdminProfile,
    ) -> Result<Option<AdminRow>> {
        let sql = format!(
            "UPDATE admins
             SET name = COALESCE($2, name),
                 phone = COALESCE($3, phone),
                 image = COALESCE($4, image),
                 updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {ADMIN_COLUMNS}"
        );
        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .bind(&data.name)
            .bind(&data.phone)
            .bind(&data.image)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<AdminRow>> {
        let sql = format!(
            "UPDATE admins SET password_hash = $2, updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {ADMIN_COLUMNS}"
        );
        sqlx::query_as::<_, AdminRow>(&sql)
            .bind(id)
            .bind(password_hash)
            .fetch_optional(&self.db)
            .await
    }
}
