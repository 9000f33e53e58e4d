mod config;
mod middlewares;
mod routes;

use std::sync::Arc;

use actix_cors::Cors;
use actix_csrf::CsrfMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::{
    http::{header, Method, StatusCode},
    middleware::{ErrorHandlers, Logger},
    web, App, HttpServer,
};
use actix_web_lab::middleware::from_fn;
use minijinja::value::Value;
use rand::rngs::StdRng;

use config::SERVER_CONFIG;
use glaze::{build_reloader, reject_authenticated, SiteSettings, UiHelpers};
use middlewares::not_found;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let site = SiteSettings::from_sources("./server", "GLAZE")
        .expect("site configuration could not be loaded");

    // MiniJinja
    if site.get_debug() {
        log::info!("template auto-reloading is enabled");
    } else {
        log::info!("template auto-reloading is disabled; run with GLAZE_DEBUG=true to enable");
    }

    // Secret Key
    let cookie_secret_key;
    if SERVER_CONFIG.get_cookie_key_bytes().len() < 64 {
        cookie_secret_key = Key::generate();
    } else {
        cookie_secret_key = Key::from(SERVER_CONFIG.get_cookie_key_bytes());
    }

    let site = Arc::new(site);
    let tmpl_reloader = web::Data::new(build_reloader(Arc::clone(&site)));
    let site_data = web::Data::from(Arc::clone(&site));

    // UI helpers available to every page
    let mut ui = UiHelpers::new();
    ui.insert("app_version", env!("CARGO_PKG_VERSION"));
    ui.insert(
        "shout",
        Value::from_function(|text: String| text.to_uppercase()),
    );
    let ui_data = web::Data::new(ui);

    log::info!(
        "starting HTTP server at http://{}:{}",
        &SERVER_CONFIG.get_bind_address(),
        &SERVER_CONFIG.get_port()
    );

    // start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin_fn(|origin, _req_head| {
                SERVER_CONFIG.is_allowed_origin(origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600);

        let csrf = CsrfMiddleware::<StdRng>::new().set_cookie(Method::GET, "/login");

        let site = Arc::clone(&site);
        App::new()
            .app_data(site_data.clone())
            .app_data(tmpl_reloader.clone())
            .app_data(ui_data.clone())
            .configure(|cfg| {
                // the media service is only mounted when media_path is set
                if site.get_media_path().is_some() {
                    cfg.service(glaze::media_service(&site).expect("media_path is set"));
                }
            })
            .service(routes::home::route)
            .service(
                web::resource("/login")
                    .wrap(from_fn(reject_authenticated))
                    .route(web::get().to(routes::auth::login_form))
                    .route(web::post().to(routes::auth::login)),
            )
            .service(routes::auth::logout)
            .wrap(csrf)
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                cookie_secret_key.clone(),
            ))
            .wrap(cors)
            .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found::handler_fn))
            .wrap(Logger::default())
    })
    .bind((
        SERVER_CONFIG.get_bind_address().clone(),
        *SERVER_CONFIG.get_port(),
    ))?
    .workers(*SERVER_CONFIG.get_workers())
    .run()
    .await
}
