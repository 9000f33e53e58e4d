// Copyright 2026 Marta Vidal
use actix_csrf::extractor::{Csrf, CsrfGuarded, CsrfToken};
use actix_web::web::Form;
use actix_web::{post, web, Responder, Result};
use minijinja::context;
use serde::Deserialize;
use serde_json::json;

use glaze::{PageHandler, TemplateRenderer, UserSession};

#[derive(Deserialize)]
pub struct LoginForm {
    csrf_token: CsrfToken,
    username: String,
}

impl CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &CsrfToken {
        &self.csrf_token
    }
}

pub async fn login_form(
    token: CsrfToken,
    handler: PageHandler,
    tmpl_env: TemplateRenderer,
) -> Result<impl Responder> {
    let handler = handler.with_xsrf(token.get());
    let ctx = handler.assemble(context!(
        page_name => "login",
    ))?;
    tmpl_env.render("pages/login.html", ctx)
}

pub async fn login(form: Csrf<Form<LoginForm>>, session: UserSession) -> Result<impl Responder> {
    session.login(&json!({ "username": &form.username }))?;
    log::info!("user {:?} signed in", &form.username);
    Ok(web::Redirect::to("/").see_other())
}

#[post("/logout")]
pub async fn logout(session: UserSession) -> Result<impl Responder> {
    session.logout();
    Ok(web::Redirect::to("/").see_other())
}
