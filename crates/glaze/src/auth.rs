// Copyright 2026 Marta Vidal
use std::convert::Infallible;
use std::future::{ready, Ready};

use actix_session::{Session, SessionExt};
use actix_web::body::MessageBody;
use actix_web::dev::{Payload, ServiceRequest, ServiceResponse};
use actix_web::{FromRequest, HttpRequest};
use actix_web_lab::middleware::Next;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::GlazeError;

pub const SESSION_USER_KEY: &str = "current_user";

/// Session-backed current-user lookup.
///
/// A thin wrapper over the cookie session: `login` stores any serializable
/// user value under [`SESSION_USER_KEY`], `current_user` reads it back.
/// Stored JSON `null` counts as unauthenticated.
pub struct UserSession(Session);

impl UserSession {
    pub fn new(session: Session) -> UserSession {
        UserSession(session)
    }

    pub fn login<U: Serialize>(&self, user: &U) -> Result<(), GlazeError> {
        self.0.insert(SESSION_USER_KEY, user)?;
        Ok(())
    }

    pub fn logout(&self) {
        self.0.purge();
    }

    pub fn current_user(&self) -> Option<JsonValue> {
        match self.0.get::<JsonValue>(SESSION_USER_KEY) {
            Ok(user) => user.filter(|value| !value.is_null()),
            Err(err) => {
                log::warn!("discarding unreadable session user: {err}");
                None
            }
        }
    }
}

impl FromRequest for UserSession {
    type Error = Infallible;
    type Future = Ready<Result<UserSession, Infallible>>;

    fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
        ready(Ok(UserSession(req.get_session())))
    }
}

/// Anonymous-only guard, composed at route-registration time:
///
/// ```ignore
/// web::resource("/login")
///     .wrap(from_fn(reject_authenticated))
///     .route(web::get().to(login_form))
/// ```
///
/// When the session carries a current user, the request fails with 403
/// before the wrapped handler runs; otherwise it passes through unchanged.
pub async fn reject_authenticated(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    if UserSession::new(req.get_session()).current_user().is_some() {
        return Err(GlazeError::Forbidden.into());
    }
    next.call(req).await
}
