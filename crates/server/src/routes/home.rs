use actix_web::{get, Responder, Result};
use minijinja::context;

use glaze::{PageHandler, TemplateRenderer};

#[get("/")]
pub async fn route(handler: PageHandler, tmpl_env: TemplateRenderer) -> Result<impl Responder> {
    let ctx = handler.assemble(context!(
        page_name => "home",
    ))?;
    tmpl_env.render("pages/home.html", ctx)
}
