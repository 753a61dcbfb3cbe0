use actix_web::web::{Data, Json, Path};
use sqlx::{query, query_as, PgPool};

use crate::context::UserInfo;
use crate::error::Error;
use crate::models::notification::Notification;
use crate::response::UpdateResponse;

pub async fn list(user_info: UserInfo, db: Data<PgPool>) -> Result<Json<Vec<Notification>>, Error> {
    let notifications = query_as(
        "SELECT * FROM notifications WHERE user_id = $1 AND is_read = false ORDER BY created_at DESC",
    )
    .bind(user_info.id)
    .fetch_all(&mut db.acquire().await?)
    .await?;
    Ok(Json(notifications))
}

pub async fn mark_read(user_info: UserInfo, notification_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<UpdateResponse>, Error> {
    let updated = query("UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2")
        .bind(notification_id.into_inner().0)
        .bind(user_info.id)
        .execute(&mut db.acquire().await?)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(Error::NotFound("notification"));
    }
    Ok(Json(UpdateResponse::new(updated)))
}
