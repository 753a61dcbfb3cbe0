use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Serialize, FromRow)]
pub struct Job {
    pub id: i32,
    pub company_id: i32,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub salary: i64,
    pub image: Option<String>,
    pub experience: String,
    pub location: String,
    pub skills: String,
    pub description: String,
    pub job_type: String,
    pub work_location: String,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyState {
    NotYetOpen,
    Open,
    Closed,
}

impl ApplyState {
    pub fn for_window(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        if end < today {
            ApplyState::Closed
        } else if start > today {
            ApplyState::NotYetOpen
        } else {
            ApplyState::Open
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOption {
    CreationDateDesc,
    CreationDateAsc,
    SalaryAsc,
    SalaryDesc,
    TitleAsc,
    TitleDesc,
}

impl SortOption {
    // unrecognized options fall back to the default ordering
    pub fn parse(opt: Option<&str>) -> Self {
        match opt {
            Some("creation_date_asc") => SortOption::CreationDateAsc,
            Some("salary_asc") => SortOption::SalaryAsc,
            Some("salary_desc") => SortOption::SalaryDesc,
            Some("title_asc") => SortOption::TitleAsc,
            Some("title_desc") => SortOption::TitleDesc,
            _ => SortOption::CreationDateDesc,
        }
    }

    pub fn order_clause(&self) -> &'static str {
        match self {
            SortOption::CreationDateDesc => "creation_date DESC",
            SortOption::CreationDateAsc => "creation_date ASC",
            SortOption::SalaryAsc => "salary ASC",
            SortOption::SalaryDesc => "salary DESC",
            SortOption::TitleAsc => "title ASC",
            SortOption::TitleDesc => "title DESC",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_apply_window() {
        let start = date(2026, 3, 1);
        let end = date(2026, 3, 31);
        assert_eq!(ApplyState::for_window(start, end, date(2026, 2, 28)), ApplyState::NotYetOpen);
        assert_eq!(ApplyState::for_window(start, end, date(2026, 3, 1)), ApplyState::Open);
        assert_eq!(ApplyState::for_window(start, end, date(2026, 3, 31)), ApplyState::Open);
        assert_eq!(ApplyState::for_window(start, end, date(2026, 4, 1)), ApplyState::Closed);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(SortOption::parse(Some("salary_desc")), SortOption::SalaryDesc);
        assert_eq!(SortOption::parse(Some("title_asc")), SortOption::TitleAsc);
        assert_eq!(SortOption::parse(None), SortOption::CreationDateDesc);
        assert_eq!(SortOption::parse(Some("no_such_option")), SortOption::CreationDateDesc);
        assert_eq!(SortOption::parse(Some("")), SortOption::CreationDateDesc);
    }

    #[test]
    fn test_order_clause_matches_option() {
        assert_eq!(SortOption::parse(Some("salary_desc")).order_clause(), "salary DESC");
        assert_eq!(SortOption::parse(Some("bogus")).order_clause(), "creation_date DESC");
    }
}
