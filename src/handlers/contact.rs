use actix_web::{
    web::{Data, Json},
    HttpRequest, HttpResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{query_scalar, PgPool};

use crate::error::Error;
use crate::mailer::{Mail, MailQueue};
use crate::middlewares::jwt::{verify_token, JWT_SECRET, JWT_TOKEN};

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub message: &'static str,
}

// the contact page is public, so a logged-in caller is recognized from the
// token directly instead of going through the auth middleware
fn authenticated_user(req: &HttpRequest) -> Option<i32> {
    let secret = dotenv::var(JWT_SECRET).ok()?;
    let token = req
        .cookie(JWT_TOKEN)
        .map(|c| c.value().to_owned())
        .or_else(|| {
            req.headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim_start_matches("Bearer ").to_owned())
        })?;
    verify_token(secret.as_bytes(), &token).ok()?.user.parse().ok()
}

pub async fn contact(
    req: HttpRequest,
    Json(form): Json<ContactForm>,
    db: Data<PgPool>,
    queue: Data<MailQueue>,
) -> Result<HttpResponse, Error> {
    let user_email: Option<String> = match authenticated_user(&req) {
        Some(user_id) => {
            query_scalar("SELECT email FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&mut db.acquire().await?)
                .await?
        }
        None => None,
    };
    let email = form.email.clone().filter(|e| !e.is_empty()).or(user_email);
    let email = match (form.name.is_empty(), email, form.message.is_empty()) {
        (false, Some(email), false) => email,
        _ => return Err(Error::BusinessError("Please fill in all the fields.".into())),
    };
    let mail = Mail {
        subject: format!("New Contact Form Submission: {}", form.subject.unwrap_or_default()),
        body: format!("Name: {}\nEmail: {}\n\nMessage:\n{}", form.name, email, form.message),
        reply_to: email,
    };
    if let Err(e) = queue.enqueue(mail) {
        log::error!("error sending contact email: {}", e);
        return Err(Error::BusinessError(
            "An error occurred while sending the message. Please try again.".into(),
        ));
    }
    Ok(HttpResponse::Ok().json(ContactResponse {
        message: "Your message has been sent successfully!",
    }))
}
