use actix_web::http::StatusCode;
use actix_web::ResponseError;
use thiserror::Error as ThisError;

use std::num;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("dotenv error")]
    DotEnvError(#[from] dotenv::Error),

    #[error("jwt error")]
    JWTError(#[from] jsonwebtoken::errors::Error),

    #[error("multipart error: {0}")]
    MultipartError(#[from] actix_multipart::MultipartError),

    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("mail error: {0}")]
    MailError(String),

    #[error("{0}")]
    BusinessError(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("parse int error: {0}")]
    ParseIntError(#[from] num::ParseIntError),

    #[error("failed to parse date")]
    ParseDate(#[from] chrono::ParseError),

    #[error("server error: {0}")]
    ServerError(String),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::BusinessError(_) | Error::ParseIntError(_) | Error::ParseDate(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(e) = err {
        return e.code().as_deref() == Some("23505");
    }
    false
}
