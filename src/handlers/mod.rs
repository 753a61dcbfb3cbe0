pub mod application;
pub mod candidate;
pub mod company;
pub mod contact;
pub mod job;
pub mod notification;
pub mod upload;

use std::ops::Add;

use actix_web::{
    cookie::{time::OffsetDateTime, Cookie, CookieBuilder},
    http::StatusCode,
    web::{Data, Json},
    HttpResponse, HttpResponseBuilder,
};
use hex::ToHex;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, query_scalar, PgPool};

use crate::context::UserInfo;
use crate::error::Error;
use crate::middlewares::jwt::{gen_token, Claim, JWT_SECRET, JWT_TOKEN};
use crate::models::user::User;
use sha2::{Digest, Sha256};

fn hash_password(pass: &str, slt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pass);
    hasher.update(slt);
    hasher.finalize().encode_hex()
}

fn random_salt() -> String {
    let chars = vec![
        '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
        'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    ];
    let mut slt = String::new();
    let mut rng = thread_rng();
    for _ in 0..32 {
        let i = rng.gen_range(0..chars.len());
        slt.push(chars[i]);
    }
    slt
}

#[derive(Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub kind: String,
}

pub async fn login(Json(Login { username, password }): Json<Login>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    let mut conn = db.acquire().await?;
    let user = query_as::<_, User>(r#"SELECT * FROM users WHERE username = $1 OR email = $1"#)
        .bind(&username)
        .fetch_optional(&mut conn)
        .await?
        .ok_or_else(|| Error::BusinessError("Invalid username or password.".into()))?;
    if hash_password(&password, &user.salt) != user.password {
        return Err(Error::BusinessError("Invalid username or password.".into()));
    }
    let kind: Option<String> = query_scalar(
        "SELECT kind FROM applicants WHERE user_id = $1
        UNION ALL
        SELECT kind FROM companies WHERE user_id = $1",
    )
    .bind(user.id)
    .fetch_optional(&mut conn)
    .await?;
    let kind = kind.ok_or_else(|| Error::BusinessError("User type not recognized or invalid account.".into()))?;
    let claim = Claim {
        user: user.id.to_string(),
        exp: chrono::Utc::now().add(chrono::Duration::days(30)).timestamp(),
    };
    let secret = dotenv::var(JWT_SECRET)?;
    let token = gen_token(secret.as_bytes(), &claim)?;
    Ok(HttpResponse::build(StatusCode::OK)
        .cookie(Cookie::new(JWT_TOKEN, token))
        .json(LoginResponse { kind }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSignup {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    password1: String,
    password2: String,
    gender: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanySignup {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    password1: String,
    password2: String,
    phone: String,
    company_name: String,
}

fn check_passwords(fields: &[&String], password1: &str, password2: &str) -> Result<(), Error> {
    if fields.iter().any(|f| f.is_empty()) {
        return Err(Error::BusinessError("All fields are required.".into()));
    }
    if password1 != password2 {
        return Err(Error::BusinessError("Passwords do not match.".into()));
    }
    Ok(())
}

async fn create_user(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>, username: &str, first_name: &str, last_name: &str, email: &str, password: &str) -> Result<i32, Error> {
    let username_taken: bool = query_scalar("SELECT EXISTS(SELECT id FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(&mut *tx)
        .await?;
    if username_taken {
        return Err(Error::BusinessError("Username already taken.".into()));
    }
    let email_taken: bool = query_scalar("SELECT EXISTS(SELECT id FROM users WHERE email = $1)")
        .bind(email)
        .fetch_one(&mut *tx)
        .await?;
    if email_taken {
        return Err(Error::BusinessError("Email already taken.".into()));
    }
    let slt = random_salt();
    let (id,): (i32,) = query_as(
        "INSERT INTO users (username, first_name, last_name, email, password, salt) VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(hash_password(password, &slt))
    .bind(slt)
    .fetch_one(&mut *tx)
    .await?;
    Ok(id)
}

pub async fn signup_candidate(Json(data): Json<CandidateSignup>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    check_passwords(
        &[&data.username, &data.first_name, &data.last_name, &data.email, &data.password1, &data.password2, &data.gender],
        &data.password1,
        &data.password2,
    )?;
    let mut tx = db.begin().await?;
    let user_id = create_user(&mut tx, &data.username, &data.first_name, &data.last_name, &data.email, &data.password1).await?;
    query("INSERT INTO applicants (user_id, kind, gender) VALUES ($1, 'applicant', $2)")
        .bind(user_id)
        .bind(&data.gender)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(HttpResponse::build(StatusCode::CREATED).finish())
}

pub async fn signup_company(Json(data): Json<CompanySignup>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    check_passwords(
        &[&data.username, &data.first_name, &data.last_name, &data.email, &data.password1, &data.password2, &data.phone, &data.company_name],
        &data.password1,
        &data.password2,
    )?;
    let mut tx = db.begin().await?;
    let user_id = create_user(&mut tx, &data.username, &data.first_name, &data.last_name, &data.email, &data.password1).await?;
    query("INSERT INTO companies (user_id, kind, company_name, phone, status) VALUES ($1, 'company', $2, $3, 'pending')")
        .bind(user_id)
        .bind(&data.company_name)
        .bind(&data.phone)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(HttpResponse::build(StatusCode::CREATED).finish())
}

fn expired_cookie() -> Cookie<'static> {
    CookieBuilder::new(JWT_TOKEN, "").expires(OffsetDateTime::now_utc()).finish()
}

pub async fn logout() -> HttpResponse {
    HttpResponseBuilder::new(StatusCode::OK).cookie(expired_cookie()).finish()
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    old_password: String,
    new_password1: String,
    new_password2: String,
}

pub async fn change_password(user_info: UserInfo, Json(data): Json<PasswordChange>, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    if data.new_password1.is_empty() || data.new_password2.is_empty() {
        return Err(Error::BusinessError("All fields are required.".into()));
    }
    if data.new_password1 != data.new_password2 {
        return Err(Error::BusinessError("Passwords do not match.".into()));
    }
    let mut tx = db.begin().await?;
    let user: User = query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_info.id)
        .fetch_optional(&mut tx)
        .await?
        .ok_or(Error::NotFound("user"))?;
    if hash_password(&data.old_password, &user.salt) != user.password {
        return Err(Error::BusinessError("Please correct the error(s) below.".into()));
    }
    let slt = random_salt();
    query("UPDATE users SET password = $1, salt = $2 WHERE id = $3")
        .bind(hash_password(&data.new_password1, &slt))
        .bind(slt)
        .bind(user_info.id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(HttpResponse::new(StatusCode::OK))
}

pub async fn delete_account(user_info: UserInfo, db: Data<PgPool>) -> Result<HttpResponse, Error> {
    query("DELETE FROM users WHERE id = $1")
        .bind(user_info.id)
        .execute(&mut db.acquire().await?)
        .await?;
    Ok(HttpResponseBuilder::new(StatusCode::OK).cookie(expired_cookie()).finish())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hash_depends_on_salt() {
        let a = hash_password("hunter2", "salt-a");
        let b = hash_password("hunter2", "salt-b");
        assert_ne!(a, b);
        assert_eq!(a, hash_password("hunter2", "salt-a"));
    }

    #[test]
    fn test_salt_length() {
        let slt = random_salt();
        assert_eq!(slt.len(), 32);
        assert!(slt.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_mismatched_passwords_rejected() {
        let username = "someone".to_owned();
        let err = check_passwords(&[&username], "pass-one", "pass-two").unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match.");
        assert!(check_passwords(&[&username], "pass-one", "pass-one").is_ok());
    }
}
