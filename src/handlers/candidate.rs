use actix_multipart::Multipart;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use serde::Serialize;
use sqlx::{query, query_as, FromRow, PgPool};

use crate::context::UserInfo;
use crate::error::Error;
use crate::handlers::upload::collect_form;
use crate::storer::FileStorer;

#[derive(Debug, Serialize, FromRow)]
pub struct CandidateProfile {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub phone: Option<String>,
    pub work: Option<String>,
    pub year: Option<String>,
    pub education_level: Option<String>,
    pub location: Option<String>,
    pub about: Option<String>,
    pub image: Option<String>,
    pub cv: Option<String>,
}

const PROFILE_COLUMNS: &str = "
    a.id, a.user_id, u.username, u.first_name, u.last_name, u.email,
    a.gender, a.phone, a.work, a.year, a.education_level, a.location, a.about, a.image, a.cv
    FROM applicants AS a
    JOIN users AS u ON a.user_id = u.id";

pub async fn list(db: Data<PgPool>) -> Result<Json<Vec<CandidateProfile>>, Error> {
    let candidates = query_as(&format!("SELECT {}", PROFILE_COLUMNS))
        .fetch_all(&mut db.acquire().await?)
        .await?;
    Ok(Json(candidates))
}

pub async fn detail(applicant_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<CandidateProfile>, Error> {
    let candidate = query_as(&format!("SELECT {} WHERE a.id = $1", PROFILE_COLUMNS))
        .bind(applicant_id.into_inner().0)
        .fetch_optional(&mut db.acquire().await?)
        .await?
        .ok_or(Error::NotFound("candidate"))?;
    Ok(Json(candidate))
}

pub async fn profile(user_info: UserInfo, db: Data<PgPool>) -> Result<Json<CandidateProfile>, Error> {
    let profile = query_as(&format!("SELECT {} WHERE a.user_id = $1", PROFILE_COLUMNS))
        .bind(user_info.id)
        .fetch_optional(&mut db.acquire().await?)
        .await?
        .ok_or(Error::NotFound("applicant profile"))?;
    Ok(Json(profile))
}

pub async fn update_profile<S: FileStorer>(
    user_info: UserInfo,
    mut payload: Multipart,
    db: Data<PgPool>,
    storer: Data<S>,
) -> Result<HttpResponse, Error> {
    let form = collect_form(&mut payload, storer.get_ref()).await?;
    let mut tx = db.begin().await?;
    let updated = query(
        "UPDATE applicants
        SET phone = $1, gender = $2, work = $3, year = $4, education_level = $5, location = $6, about = $7
        WHERE user_id = $8",
    )
    .bind(form.require("phone")?)
    .bind(form.require("gender")?)
    .bind(form.require("work")?)
    .bind(form.require("year")?)
    .bind(form.require("education_level")?)
    .bind(form.require("location")?)
    .bind(form.require("about")?)
    .bind(user_info.id)
    .execute(&mut tx)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(Error::NotFound("applicant profile"));
    }
    query("UPDATE users SET email = $1, first_name = $2, last_name = $3 WHERE id = $4")
        .bind(form.require("email")?)
        .bind(form.require("first_name")?)
        .bind(form.require("last_name")?)
        .bind(user_info.id)
        .execute(&mut tx)
        .await?;
    if let Some(image) = form.file("image") {
        query("UPDATE applicants SET image = $1 WHERE user_id = $2")
            .bind(image)
            .bind(user_info.id)
            .execute(&mut tx)
            .await?;
    }
    if let Some(cv) = form.file("cv") {
        query("UPDATE applicants SET cv = $1 WHERE user_id = $2")
            .bind(cv)
            .bind(user_info.id)
            .execute(&mut tx)
            .await?;
    }
    tx.commit().await?;
    Ok(HttpResponse::Ok().finish())
}
