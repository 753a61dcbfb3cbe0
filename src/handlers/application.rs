use actix_multipart::Multipart;
use actix_web::{
    http::StatusCode,
    web::{Data, Json, Path},
    HttpResponse,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, query_scalar, FromRow, PgPool};

use crate::context::UserInfo;
use crate::error::{is_unique_violation, Error};
use crate::handlers::upload::collect_form;
use crate::models::application::{ApplicationStatus, Transition};
use crate::models::job::{ApplyState, Job};
use crate::response::{DeleteResponse, List, UpdateResponse};
use crate::storer::FileStorer;

#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub state: ApplyState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

pub async fn apply<S: FileStorer>(
    user_info: UserInfo,
    job_id: Path<(i32,)>,
    mut payload: Multipart,
    db: Data<PgPool>,
    storer: Data<S>,
) -> Result<HttpResponse, Error> {
    let job_id = job_id.into_inner().0;
    let mut tx = db.begin().await?;
    let applicant_id: i32 = query_scalar("SELECT id FROM applicants WHERE user_id = $1")
        .bind(user_info.id)
        .fetch_optional(&mut tx)
        .await?
        .ok_or(Error::NotFound("applicant profile"))?;
    let job: Job = query_as("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&mut tx)
        .await?
        .ok_or(Error::NotFound("job"))?;
    let today = Local::now().date_naive();
    let state = ApplyState::for_window(job.start_date, job.end_date, today);
    if state != ApplyState::Open {
        return Ok(HttpResponse::Ok().json(ApplyResponse { state, id: None }));
    }
    let already_applied: bool = query_scalar("SELECT EXISTS(SELECT id FROM applications WHERE job_id = $1 AND applicant_id = $2)")
        .bind(job_id)
        .bind(applicant_id)
        .fetch_one(&mut tx)
        .await?;
    if already_applied {
        return Err(Error::BusinessError("You have already applied for this job.".into()));
    }
    let form = collect_form(&mut payload, storer.get_ref()).await?;
    let resume = form
        .file("resume")
        .ok_or_else(|| Error::BusinessError("All fields are required. Please upload your resume.".into()))?;
    let inserted = query_as::<_, (i32,)>(
        "INSERT INTO applications (job_id, company_id, applicant_id, resume, apply_date) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(job_id)
    .bind(job.company_id)
    .bind(applicant_id)
    .bind(resume)
    .bind(today)
    .fetch_one(&mut tx)
    .await;
    // the unique constraint catches the submission that lost the race
    let (id,) = match inserted {
        Ok(row) => row,
        Err(ref e) if is_unique_violation(e) => {
            return Err(Error::BusinessError("You have already applied for this job.".into()))
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit().await?;
    Ok(HttpResponse::build(StatusCode::CREATED).json(ApplyResponse {
        state: ApplyState::Open,
        id: Some(id),
    }))
}

#[derive(Debug, Serialize, FromRow)]
pub struct AppliedJob {
    pub id: i32,
    pub job_id: i32,
    pub title: String,
    pub company_name: String,
    pub location: String,
    pub status: ApplicationStatus,
    pub apply_date: NaiveDate,
}

pub async fn applied(user_info: UserInfo, db: Data<PgPool>) -> Result<Json<List<AppliedJob>>, Error> {
    let mut conn = db.acquire().await?;
    let applicant_id: i32 = query_scalar("SELECT id FROM applicants WHERE user_id = $1")
        .bind(user_info.id)
        .fetch_optional(&mut conn)
        .await?
        .ok_or(Error::NotFound("applicant profile"))?;
    let total: i64 = query_scalar("SELECT COUNT(*) FROM applications WHERE applicant_id = $1")
        .bind(applicant_id)
        .fetch_one(&mut conn)
        .await?;
    let list = query_as(
        "SELECT a.id, a.job_id, j.title, c.company_name, j.location, a.status, a.apply_date
        FROM applications AS a
        JOIN jobs AS j ON a.job_id = j.id
        JOIN companies AS c ON a.company_id = c.id
        WHERE a.applicant_id = $1
        ORDER BY a.apply_date DESC",
    )
    .bind(applicant_id)
    .fetch_all(&mut conn)
    .await?;
    Ok(Json(List::new(list, total)))
}

pub async fn delete_applied(user_info: UserInfo, application_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<DeleteResponse>, Error> {
    let deleted = query(
        "DELETE FROM applications
        WHERE id = $1
        AND applicant_id IN (SELECT id FROM applicants WHERE user_id = $2)",
    )
    .bind(application_id.into_inner().0)
    .bind(user_info.id)
    .execute(&mut db.acquire().await?)
    .await?
    .rows_affected();
    if deleted == 0 {
        return Err(Error::NotFound("application"));
    }
    Ok(Json(DeleteResponse::new(deleted)))
}

#[derive(Debug, Serialize, FromRow)]
pub struct ApplicantReview {
    pub id: i32,
    pub job_id: i32,
    pub job_title: String,
    pub applicant_id: i32,
    pub applicant_name: String,
    pub resume: String,
    pub status: ApplicationStatus,
    pub apply_date: NaiveDate,
}

pub async fn review_list(user_info: UserInfo, db: Data<PgPool>) -> Result<Json<Vec<ApplicantReview>>, Error> {
    let list = query_as(
        "SELECT a.id, a.job_id, j.title AS job_title, a.applicant_id, u.username AS applicant_name, a.resume, a.status, a.apply_date
        FROM applications AS a
        JOIN jobs AS j ON a.job_id = j.id
        JOIN applicants AS ap ON a.applicant_id = ap.id
        JOIN users AS u ON ap.user_id = u.id
        JOIN companies AS c ON a.company_id = c.id
        WHERE c.user_id = $1
        ORDER BY a.apply_date DESC",
    )
    .bind(user_info.id)
    .fetch_all(&mut db.acquire().await?)
    .await?;
    Ok(Json(list))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ApplicationStatus,
}

#[derive(Debug, FromRow)]
struct ReviewRow {
    status: ApplicationStatus,
    applicant_user_id: i32,
    job_title: String,
}

/// Status write and notification insert commit together; re-setting the
/// current status changes nothing and notifies nobody.
pub async fn set_status(
    application_id: Path<(i32,)>,
    Json(StatusUpdate { status }): Json<StatusUpdate>,
    db: Data<PgPool>,
) -> Result<Json<UpdateResponse>, Error> {
    let application_id = application_id.into_inner().0;
    let mut tx = db.begin().await?;
    let row: ReviewRow = query_as(
        "SELECT a.status, ap.user_id AS applicant_user_id, j.title AS job_title
        FROM applications AS a
        JOIN applicants AS ap ON a.applicant_id = ap.id
        JOIN jobs AS j ON a.job_id = j.id
        WHERE a.id = $1
        FOR UPDATE OF a",
    )
    .bind(application_id)
    .fetch_optional(&mut tx)
    .await?
    .ok_or(Error::NotFound("application"))?;
    match row.status.transition(status).map_err(|e| Error::BusinessError(e.into()))? {
        Transition::Stay => Ok(Json(UpdateResponse::new(0))),
        Transition::Enter(next) => {
            query("UPDATE applications SET status = $1 WHERE id = $2")
                .bind(next)
                .bind(application_id)
                .execute(&mut tx)
                .await?;
            let message = next
                .notification_message(&row.job_title)
                .ok_or_else(|| Error::ServerError("no notification text for target status".into()))?;
            query("INSERT INTO notifications (user_id, message) VALUES ($1, $2)")
                .bind(row.applicant_user_id)
                .bind(message)
                .execute(&mut tx)
                .await?;
            tx.commit().await?;
            Ok(Json(UpdateResponse::new(1)))
        }
    }
}

pub async fn delete_applicant(application_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<DeleteResponse>, Error> {
    let deleted = query("DELETE FROM applications WHERE id = $1")
        .bind(application_id.into_inner().0)
        .execute(&mut db.acquire().await?)
        .await?
        .rows_affected();
    Ok(Json(DeleteResponse::new(deleted)))
}
