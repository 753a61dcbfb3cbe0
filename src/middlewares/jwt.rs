use std::future::{ready, Future, Ready};
use std::pin::Pin;

use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorUnauthorized,
    Error, HttpMessage,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::context::UserInfo;

pub static JWT_TOKEN: &str = "JWT_TOKEN";
pub static JWT_SECRET: &str = "JWT_SECRET";

#[derive(Debug, Deserialize, Serialize)]
pub struct Claim {
    pub user: String,
    pub exp: i64,
}

pub fn gen_token(secret: &[u8], claim: &Claim) -> Result<String, crate::error::Error> {
    let token = encode(&Header::new(Algorithm::HS256), claim, &EncodingKey::from_secret(secret))?;
    Ok(token)
}

pub fn verify_token(secret: &[u8], token: &str) -> Result<Claim, crate::error::Error> {
    let data = decode::<Claim>(token, &DecodingKey::from_secret(secret), &Validation::new(Algorithm::HS256))?;
    Ok(data.claims)
}

pub struct Jwt {
    secret: Vec<u8>,
}

impl Jwt {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }
}

impl<S> Transform<S, ServiceRequest> for Jwt
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error>,
    S::Future: 'static,
{
    type Response = S::Response;
    type Error = Error;
    type Transform = JwtMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddleware {
            secret: self.secret.clone(),
            service,
        }))
    }
}

pub struct JwtMiddleware<S> {
    secret: Vec<u8>,
    service: S,
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start_matches("Bearer ").to_owned())
        .or_else(|| req.cookie(JWT_TOKEN).map(|c| c.value().to_owned()))
}

impl<S> Service<ServiceRequest> for JwtMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error>,
    S::Future: 'static,
{
    type Response = S::Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    fn poll_ready(&self, ctx: &mut core::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = match bearer_token(&req) {
            Some(token) => token,
            None => return Box::pin(async move { Err(ErrorUnauthorized("no token in request")) }),
        };
        match verify_token(&self.secret, &token) {
            Err(e) => Box::pin(async move { Err(ErrorUnauthorized(e)) }),
            Ok(claim) => match claim.user.parse::<i32>() {
                Err(e) => Box::pin(async move { Err(ErrorUnauthorized(e)) }),
                Ok(id) => {
                    req.extensions_mut().insert(UserInfo { id });
                    let fut = self.service.call(req);
                    Box::pin(async move { fut.await })
                }
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_gen_and_verify_token() {
        let secret = b"0123456789";
        let claim = Claim {
            user: "42".into(),
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        let token = gen_token(secret, &claim).unwrap();
        let verified = verify_token(secret, &token).unwrap();
        assert_eq!(verified.user, "42");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claim = Claim {
            user: "42".into(),
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        let token = gen_token(b"secret-a", &claim).unwrap();
        assert!(verify_token(b"secret-b", &token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = b"0123456789";
        let claim = Claim {
            user: "42".into(),
            exp: chrono::Utc::now().timestamp() - 3600,
        };
        let token = gen_token(secret, &claim).unwrap();
        assert!(verify_token(secret, &token).is_err());
    }
}
