use serde::Serialize;
use sqlx::{FromRow, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Type)]
#[sqlx(type_name = "company_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Pending,
    Approved,
}

#[derive(Debug, Serialize, FromRow)]
pub struct Company {
    pub id: i32,
    pub user_id: i32,
    pub kind: String,
    pub company_name: String,
    pub phone: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
    pub status: CompanyStatus,
}
