use actix_web::web::{Data, Json, Path, Query};
use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{query_as, FromRow, PgPool, Postgres, QueryBuilder};

use crate::error::Error;
use crate::models::job::{ApplyState, Job, SortOption};
use crate::response::List;

pub const PAGE_SIZE: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct ListingParams {
    q: Option<String>,
    sort: Option<String>,
    job_type: Option<String>,
    experience: Option<String>,
    posted_within: Option<String>,
    page: Option<i64>,
}

fn split_list(param: Option<&str>) -> Vec<String> {
    param
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

// the whole filter is ignored when any entry fails to parse
fn posted_cutoff(param: Option<&str>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let days: Vec<i64> = split_list(param).iter().map(|d| d.parse()).collect::<Result<_, _>>().ok()?;
    days.into_iter().min().map(|d| now - Duration::days(d))
}

fn push_filters(
    builder: &mut QueryBuilder<Postgres>,
    q: &Option<String>,
    job_types: &[String],
    experiences: &[String],
    cutoff: &Option<DateTime<Utc>>,
) {
    if let Some(q) = q.as_deref().filter(|q| !q.is_empty()) {
        builder.push(" AND title ILIKE ");
        builder.push_bind(format!("%{}%", q));
    }
    if !job_types.is_empty() {
        builder.push(" AND job_type = ANY(");
        builder.push_bind(job_types.to_vec());
        builder.push(")");
    }
    if !experiences.is_empty() {
        builder.push(" AND experience = ANY(");
        builder.push_bind(experiences.to_vec());
        builder.push(")");
    }
    if let Some(cutoff) = cutoff {
        builder.push(" AND creation_date >= ");
        builder.push_bind(*cutoff);
    }
}

pub async fn listing(Query(params): Query<ListingParams>, db: Data<PgPool>) -> Result<Json<List<Job>>, Error> {
    let job_types = split_list(params.job_type.as_deref());
    let experiences = split_list(params.experience.as_deref());
    let cutoff = posted_cutoff(params.posted_within.as_deref(), Utc::now());
    let sort = SortOption::parse(params.sort.as_deref());
    let page = params.page.unwrap_or(1).max(1);

    let mut conn = db.acquire().await?;
    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs WHERE 1 = 1");
    push_filters(&mut count_query, &params.q, &job_types, &experiences, &cutoff);
    let (total,): (i64,) = count_query.build_query_as().fetch_one(&mut conn).await?;

    let mut list_query = QueryBuilder::<Postgres>::new("SELECT * FROM jobs WHERE 1 = 1");
    push_filters(&mut list_query, &params.q, &job_types, &experiences, &cutoff);
    list_query.push(" ORDER BY ");
    list_query.push(sort.order_clause());
    list_query.push(" LIMIT ");
    list_query.push_bind(PAGE_SIZE);
    list_query.push(" OFFSET ");
    list_query.push_bind((page - 1) * PAGE_SIZE);
    let jobs: Vec<Job> = list_query.build_query_as().fetch_all(&mut conn).await?;
    Ok(Json(List::new(jobs, total)))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

pub async fn home(Query(SearchParams { q }): Query<SearchParams>, db: Data<PgPool>) -> Result<Json<Vec<Job>>, Error> {
    let mut conn = db.acquire().await?;
    let jobs = match q.filter(|q| !q.is_empty()) {
        Some(q) => {
            query_as("SELECT * FROM jobs WHERE title ILIKE $1 ORDER BY creation_date DESC")
                .bind(format!("%{}%", q))
                .fetch_all(&mut conn)
                .await?
        }
        None => {
            query_as("SELECT * FROM jobs ORDER BY creation_date DESC LIMIT 5")
                .fetch_all(&mut conn)
                .await?
        }
    };
    Ok(Json(jobs))
}

#[derive(Debug, Serialize)]
pub struct JobDetail {
    #[serde(flatten)]
    pub job: Job,
    pub apply_state: ApplyState,
}

pub async fn detail(job_id: Path<(i32,)>, db: Data<PgPool>) -> Result<Json<JobDetail>, Error> {
    let job: Job = query_as("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id.into_inner().0)
        .fetch_optional(&mut db.acquire().await?)
        .await?
        .ok_or(Error::NotFound("job"))?;
    let apply_state = ApplyState::for_window(job.start_date, job.end_date, Local::now().date_naive());
    Ok(Json(JobDetail { job, apply_state }))
}

#[derive(Debug, Serialize, FromRow)]
pub struct CompanyCard {
    pub id: i32,
    pub company_name: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CandidateCard {
    pub id: i32,
    pub username: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub jobs: Vec<Job>,
    pub companies: Vec<CompanyCard>,
    pub candidates: Vec<CandidateCard>,
}

pub async fn search(Query(SearchParams { q }): Query<SearchParams>, db: Data<PgPool>) -> Result<Json<SearchResults>, Error> {
    let pattern = format!("%{}%", q.unwrap_or_default());
    let mut conn = db.acquire().await?;
    let jobs: Vec<Job> = query_as("SELECT * FROM jobs WHERE title ILIKE $1 ORDER BY creation_date DESC")
        .bind(&pattern)
        .fetch_all(&mut conn)
        .await?;
    let companies: Vec<CompanyCard> = query_as("SELECT id, company_name, image FROM companies WHERE company_name ILIKE $1")
        .bind(&pattern)
        .fetch_all(&mut conn)
        .await?;
    let candidates: Vec<CandidateCard> = query_as(
        "SELECT a.id, u.username, a.image
        FROM applicants AS a
        JOIN users AS u ON a.user_id = u.id
        WHERE u.username ILIKE $1",
    )
    .bind(&pattern)
    .fetch_all(&mut conn)
    .await?;
    Ok(Json(SearchResults { jobs, companies, candidates }))
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(Some("full-time,part-time")), vec!["full-time", "part-time"]);
        assert_eq!(split_list(Some(" full-time , ")), vec!["full-time"]);
        assert!(split_list(Some("")).is_empty());
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_posted_cutoff_uses_smallest_window() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        let cutoff = posted_cutoff(Some("30,7"), now).unwrap();
        assert_eq!(cutoff, now - Duration::days(7));
    }

    #[test]
    fn test_posted_cutoff_ignores_bad_input() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        assert_eq!(posted_cutoff(Some("7,soon"), now), None);
        assert_eq!(posted_cutoff(Some(""), now), None);
        assert_eq!(posted_cutoff(None, now), None);
    }

    #[test]
    fn test_filters_render_into_sql() {
        use sqlx::Execute;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs WHERE 1 = 1");
        push_filters(
            &mut builder,
            &Some("engineer".into()),
            &["full-time".to_owned()],
            &[],
            &None,
        );
        let query = builder.build();
        let sql = query.sql();
        assert!(sql.contains("title ILIKE"));
        assert!(sql.contains("job_type = ANY("));
        assert!(!sql.contains("experience"));
        assert!(!sql.contains("creation_date >="));
    }
}
