use sqlx::{PgExecutor, Result};
use uuid::Uuid;

use crate::{
    db::Db,
    models::{ImageKind, MemberImageRow},
};

const IMAGE_COLUMNS: &str =
    "id, member_id, kind, image_url, description, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CreateMemberImage {
    pub member_id: Uuid,
    pub kind: ImageKind,
    pub image_url: String,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct MemberImageRepo {
    db: Db,
}

impl MemberImageRepo {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list_by_member(&self, member_id: Uuid) -> Result<Vec<MemberImageRow>> {
        let sql = format!(
            "SELECT {IMAGE_COLUMNS} FROM member_images
             WHERE member_id = $1
             ORDER BY kind DESC, created_at ASC"
        );
        sqlx::query_as::<_, MemberImageRow>(&sql)
            .bind(member_id)
            .fetch_all(&self.db)
            .await
    }

    pub async fn update_description(
        &self,
        id: Uuid,
        description: Option<&str>,
    ) -> Result<Option<MemberImageRow>> {
        let sql = format!(
            "UPDATE member_images SET description = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {IMAGE_COLUMNS}"
        );
        sqlx::query_as::<_, MemberImageRow>(&sql)
            .bind(id)
            .bind(description)
            .fetch_optional(&self.db)
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM member_images WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Insert an image reference. A member keeps a single profile image, so adding
/// a new one drops the previous reference first.
pub async fn create_image(
    conn: &mut sqlx::PgConnection,
    data: &CreateMemberImage,
) -> Result<MemberImageRow> {
    if data.kind == ImageKind::Profile {
        delete_profile_images(&mut *conn, data.member_id).await?;
    }

    let sql = format!(
        "INSERT INTO member_images (member_id, kind, image_url, description)
         VALUES ($1, $2, $3, $4)
         RETURNING {IMAGE_COLUMNS}"
    );
    sqlx::query_as::<_, MemberImageRow>(&sql)
        .bind(data.member_id)
        .bind(data.kind.as_str())
        .bind(&data.image_url)
        .bind(&data.description)
        .fetch_one(&mut *conn)
        .await
}

async fn delete_profile_images<'e>(executor: impl PgExecutor<'e>, member_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM member_images WHERE member_id = $1 AND kind = 'PROFILE'")
        .bind(member_id)
        .execute(executor)
        .await?;
    Ok(())
}
