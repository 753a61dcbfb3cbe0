mod context;
mod error;
mod handlers;
mod mailer;
mod middlewares;
pub mod models;
pub mod response;
mod storer;

use actix_web::web::{delete, get, post, put, resource, scope, Data};
use actix_web::HttpServer;
use sqlx::postgres::PgPoolOptions;

use mailer::{SmtpMailer, RETRY_DELAY};
use middlewares::jwt::Jwt;
use middlewares::owner::Owner;
use storer::LocalStorer;

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();
    std::env::set_var("RUST_LOG", "actix_web=info");
    env_logger::init();
    let upload_path = dotenv::var("UPLOAD_PATH").expect("environment variable UPLOAD_PATH not been set");
    let database_url = dotenv::var("DATABASE_URL").expect("environment variable DATABASE_URL not been set");
    let jwt_secret = dotenv::var(middlewares::jwt::JWT_SECRET).expect("environment variable JWT_SECRET not been set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to database");
    let smtp_mailer = SmtpMailer::from_env().expect("failed to configure mail transport");
    let mail_queue = mailer::spawn_dispatcher(smtp_mailer, RETRY_DELAY);
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(LocalStorer::new(&upload_path)))
            .app_data(Data::new(mail_queue.clone()))
            .service(actix_files::Files::new("/media", upload_path.clone()))
            .service(
                scope("")
                    .service(resource("login").route(post().to(handlers::login)))
                    .service(resource("logout").route(post().to(handlers::logout)))
                    .service(
                        scope("signup")
                            .route("candidate", post().to(handlers::signup_candidate))
                            .route("company", post().to(handlers::signup_company)),
                    )
                    .service(resource("home").route(get().to(handlers::job::home)))
                    .service(resource("search").route(get().to(handlers::job::search)))
                    .service(resource("contact").route(post().to(handlers::contact::contact)))
                    .service(
                        scope("candidates")
                            .route("", get().to(handlers::candidate::list))
                            .route("{applicant_id}", get().to(handlers::candidate::detail)),
                    )
                    .service(
                        scope("employers")
                            .route("", get().to(handlers::company::employers))
                            .route("{company_id}/vacancies", get().to(handlers::company::vacancies)),
                    )
                    .service(
                        scope("jobs")
                            .route("", get().to(handlers::job::listing))
                            .service(resource("{job_id}").route(get().to(handlers::job::detail)))
                            .service(
                                resource("{job_id}/apply")
                                    .wrap(Jwt::new(jwt_secret.as_bytes().to_owned()))
                                    .route(post().to(handlers::application::apply::<LocalStorer>)),
                            ),
                    )
                    .service(
                        scope("")
                            .wrap(Jwt::new(jwt_secret.as_bytes().to_owned()))
                            .service(resource("account").route(delete().to(handlers::delete_account)))
                            .service(resource("settings/password").route(put().to(handlers::change_password)))
                            .service(
                                resource("profile")
                                    .route(get().to(handlers::candidate::profile))
                                    .route(put().to(handlers::candidate::update_profile::<LocalStorer>)),
                            )
                            .service(
                                scope("applied")
                                    .route("", get().to(handlers::application::applied))
                                    .route("{application_id}", delete().to(handlers::application::delete_applied)),
                            )
                            .service(
                                scope("notifications")
                                    .route("", get().to(handlers::notification::list))
                                    .route("{notification_id}/read", put().to(handlers::notification::mark_read)),
                            )
                            .service(
                                scope("company")
                                    .service(
                                        resource("profile")
                                            .route(get().to(handlers::company::profile))
                                            .route(put().to(handlers::company::update_profile::<LocalStorer>)),
                                    )
                                    .service(
                                        scope("jobs")
                                            .route("", get().to(handlers::company::my_jobs))
                                            .route("", post().to(handlers::company::add_job::<LocalStorer>))
                                            .service(
                                                scope("{job_id}")
                                                    .wrap(Owner::new(
                                                        pool.clone(),
                                                        "SELECT EXISTS(SELECT j.id FROM jobs AS j JOIN companies AS c ON j.company_id = c.id WHERE c.user_id = $1 AND j.id = $2)",
                                                        "job_id",
                                                    ))
                                                    .route("", get().to(handlers::company::job_detail))
                                                    .route("", put().to(handlers::company::edit_job::<LocalStorer>))
                                                    .route("", delete().to(handlers::company::delete_job)),
                                            ),
                                    )
                                    .service(
                                        scope("applications")
                                            .route("", get().to(handlers::application::review_list))
                                            .service(
                                                scope("{application_id}")
                                                    .wrap(Owner::new(
                                                        pool.clone(),
                                                        "SELECT EXISTS(SELECT a.id FROM applications AS a JOIN companies AS c ON a.company_id = c.id WHERE c.user_id = $1 AND a.id = $2)",
                                                        "application_id",
                                                    ))
                                                    .route("status", post().to(handlers::application::set_status))
                                                    .route("", delete().to(handlers::application::delete_applicant)),
                                            ),
                                    ),
                            ),
                    ),
            )
    })
    .bind(("0.0.0.0", 8000))?
    .run()
    .await
}
