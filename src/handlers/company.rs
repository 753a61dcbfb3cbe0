use actix_multipart::Multipart;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::{query, query_as, query_scalar, FromRow, PgPool};

use crate::context::UserInfo;
use crate::error::Error;
use crate::handlers::upload::{collect_form, FormData};
use crate::models::company::Company;
use crate::models::job::Job;
use crate::response::{CreateResponse, DeleteResponse};
use crate::storer::FileStorer;

pub async fn employers(db: Data<PgPool>) -> Result<Json<Vec<Company>>, Error> {
    let companies = query_as("SELECT * FROM companies ORDER BY company_name")
        .fetch_all(&mut db.acquire().await?)
        .await?;
    Ok(Json(companies))
}

#[derive(Debug, Serialize)]
pub struct Vacancies {
    pub company: Company,
    pub jobs: Vec<Job>,
}

pub async fn vacancies(company_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<Vacancies>, Error> {
    let company_id = company_id.into_inner().0;
    let mut conn = db.acquire().await?;
    let company: Company = query_as("SELECT * FROM companies WHERE id = $1")
        .bind(company_id)
        .fetch_optional(&mut conn)
        .await?
        .ok_or(Error::NotFound("company"))?;
    let jobs = query_as("SELECT * FROM jobs WHERE company_id = $1 ORDER BY creation_date DESC")
        .bind(company_id)
        .fetch_all(&mut conn)
        .await?;
    Ok(Json(Vacancies { company, jobs }))
}

#[derive(Debug, Serialize, FromRow)]
pub struct CompanyProfile {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company_name: String,
    pub phone: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
}

pub async fn profile(user_info: UserInfo, db: Data<PgPool>) -> Result<Json<CompanyProfile>, Error> {
    let profile = query_as(
        "SELECT c.id, c.user_id, u.username, u.first_name, u.last_name, u.email,
            c.company_name, c.phone, c.description, c.website, c.image
        FROM companies AS c
        JOIN users AS u ON c.user_id = u.id
        WHERE c.user_id = $1",
    )
    .bind(user_info.id)
    .fetch_optional(&mut db.acquire().await?)
    .await?
    .ok_or(Error::NotFound("company profile"))?;
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
        "UPDATE companies SET company_name = $1, phone = $2, description = $3, website = $4 WHERE user_id = $5",
    )
    .bind(form.require("company_name")?)
    .bind(form.require("phone")?)
    .bind(form.require("description")?)
    .bind(form.require("website")?)
    .bind(user_info.id)
    .execute(&mut tx)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(Error::NotFound("company profile"));
    }
    query("UPDATE users SET first_name = $1, last_name = $2 WHERE id = $3")
        .bind(form.require("first_name")?)
        .bind(form.require("last_name")?)
        .bind(user_info.id)
        .execute(&mut tx)
        .await?;
    if let Some(image) = form.file("image") {
        query("UPDATE companies SET image = $1 WHERE user_id = $2")
            .bind(image)
            .bind(user_info.id)
            .execute(&mut tx)
            .await?;
    }
    tx.commit().await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn my_jobs(user_info: UserInfo, db: Data<PgPool>) -> Result<Json<Vec<Job>>, Error> {
    let jobs = query_as(
        "SELECT j.*
        FROM jobs AS j
        JOIN companies AS c ON j.company_id = c.id
        WHERE c.user_id = $1
        ORDER BY j.creation_date DESC",
    )
    .bind(user_info.id)
    .fetch_all(&mut db.acquire().await?)
    .await?;
    Ok(Json(jobs))
}

fn parse_date(form: &FormData, name: &str) -> Result<NaiveDate, Error> {
    Ok(NaiveDate::parse_from_str(form.require(name)?, "%Y-%m-%d")?)
}

pub async fn add_job<S: FileStorer>(
    user_info: UserInfo,
    mut payload: Multipart,
    db: Data<PgPool>,
    storer: Data<S>,
) -> Result<Json<CreateResponse>, Error> {
    let form = collect_form(&mut payload, storer.get_ref()).await?;
    let start_date = parse_date(&form, "start_date")?;
    let end_date = parse_date(&form, "end_date")?;
    let salary: i64 = form.require("salary")?.parse()?;
    let logo = form
        .file("logo")
        .ok_or_else(|| Error::BusinessError("All fields are required.".into()))?;
    let mut tx = db.begin().await?;
    let company_id: i32 = query_scalar("SELECT id FROM companies WHERE user_id = $1")
        .bind(user_info.id)
        .fetch_optional(&mut tx)
        .await?
        .ok_or(Error::NotFound("company profile"))?;
    let (id,): (i32,) = query_as(
        "INSERT INTO jobs (company_id, title, start_date, end_date, salary, image, experience, location, skills, description, job_type, work_location)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id",
    )
    .bind(company_id)
    .bind(form.require("job_title")?)
    .bind(start_date)
    .bind(end_date)
    .bind(salary)
    .bind(logo)
    .bind(form.require("experience")?)
    .bind(form.require("location")?)
    .bind(form.require("skills")?)
    .bind(form.require("description")?)
    .bind(form.require("job_type")?)
    .bind(form.require("work_location")?)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(Json(CreateResponse { id }))
}

pub async fn job_detail(job_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<Job>, Error> {
    let job = query_as("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id.into_inner().0)
        .fetch_optional(&mut db.acquire().await?)
        .await?
        .ok_or(Error::NotFound("job"))?;
    Ok(Json(job))
}

pub async fn edit_job<S: FileStorer>(
    job_id: Path<(i32,)>,
    mut payload: Multipart,
    db: Data<PgPool>,
    storer: Data<S>,
) -> Result<HttpResponse, Error> {
    let job_id = job_id.into_inner().0;
    let form = collect_form(&mut payload, storer.get_ref()).await?;
    let salary: i64 = form.require("salary")?.parse()?;
    let mut tx = db.begin().await?;
    let updated = query(
        "UPDATE jobs
        SET title = $1, salary = $2, experience = $3, location = $4, skills = $5, description = $6, job_type = $7, work_location = $8
        WHERE id = $9",
    )
    .bind(form.require("job_title")?)
    .bind(salary)
    .bind(form.require("experience")?)
    .bind(form.require("location")?)
    .bind(form.require("skills")?)
    .bind(form.require("description")?)
    .bind(form.require("job_type")?)
    .bind(form.require("work_location")?)
    .bind(job_id)
    .execute(&mut tx)
    .await?
    .rows_affected();
    if updated == 0 {
        return Err(Error::NotFound("job"));
    }
    // dates and the image are only touched when the form carries them
    if let Some(start_date) = form.get("start_date") {
        query("UPDATE jobs SET start_date = $1 WHERE id = $2")
            .bind(NaiveDate::parse_from_str(start_date, "%Y-%m-%d")?)
            .bind(job_id)
            .execute(&mut tx)
            .await?;
    }
    if let Some(end_date) = form.get("end_date") {
        query("UPDATE jobs SET end_date = $1 WHERE id = $2")
            .bind(NaiveDate::parse_from_str(end_date, "%Y-%m-%d")?)
            .bind(job_id)
            .execute(&mut tx)
            .await?;
    }
    if let Some(image) = form.file("image") {
        query("UPDATE jobs SET image = $1 WHERE id = $2")
            .bind(image)
            .bind(job_id)
            .execute(&mut tx)
            .await?;
    }
    tx.commit().await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn delete_job(job_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<DeleteResponse>, Error> {
    let deleted = query("DELETE FROM jobs WHERE id = $1")
        .bind(job_id.into_inner().0)
        .execute(&mut db.acquire().await?)
        .await?
        .rows_affected();
    Ok(Json(DeleteResponse::new(deleted)))
}
