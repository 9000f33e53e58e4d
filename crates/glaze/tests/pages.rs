// Copyright 2026 Marta Vidal
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::{test, web, App, HttpResponse, Responder};
use actix_web_lab::middleware::from_fn;
use minijinja::context;
use serde_json::json;

use glaze::{
    build_reloader, media_service, reject_authenticated, PageHandler, SiteSettings,
    TemplateRenderer, UiHelpers, UserSession,
};

fn site_fixture() -> (tempfile::TempDir, Arc<SiteSettings>) {
    let dir = tempfile::tempdir().unwrap();
    let templates = dir.path().join("templates");
    std::fs::create_dir_all(templates.join("pages")).unwrap();
    std::fs::write(
        templates.join("pages").join("home.html"),
        "{{ sitename }}|{{ domain }}|\
         {% if me %}{{ me.username }}{% else %}anonymous{% endif %}|\
         {{ static('css/site.css') }}|{{ app_version }}",
    )
    .unwrap();
    let media = dir.path().join("media");
    std::fs::create_dir_all(media.join("css")).unwrap();
    std::fs::write(media.join("css").join("site.css"), "body { margin: 0 }").unwrap();

    let settings = Arc::new(
        SiteSettings::builder()
            .template_path(templates)
            .site_domain("example.com")
            .site_name("Example")
            .media_path(media)
            .build(),
    );
    (dir, settings)
}

async fn home(handler: PageHandler, tmpl_env: TemplateRenderer) -> actix_web::Result<impl Responder> {
    let ctx = handler.assemble(context!(page_name => "home"))?;
    tmpl_env.render("pages/home.html", ctx)
}

async fn login(session: UserSession) -> actix_web::Result<impl Responder> {
    session.login(&json!({ "username": "ada" }))?;
    Ok(HttpResponse::Ok().finish())
}

#[actix_rt::test]
async fn renders_page_for_anonymous_visitor() {
    let (_dir, settings) = site_fixture();
    let mut ui = UiHelpers::new();
    ui.insert("app_version", "9.9.9");

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(Arc::clone(&settings)))
            .app_data(web::Data::new(build_reloader(Arc::clone(&settings))))
            .app_data(web::Data::new(ui))
            .route("/", web::get().to(home))
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                Key::generate(),
            )),
    )
    .await;

    let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert!(res.status().is_success());
    let body = test::read_body(res).await;
    assert_eq!(
        body,
        "Example|example.com|anonymous|/media/css/site.css|9.9.9"
    );
}

#[actix_rt::test]
async fn me_reflects_session_login() {
    let (_dir, settings) = site_fixture();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(Arc::clone(&settings)))
            .app_data(web::Data::new(build_reloader(Arc::clone(&settings))))
            .route("/", web::get().to(home))
            .route("/login", web::post().to(login))
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                Key::generate(),
            )),
    )
    .await;

    let res =
        test::call_service(&app, test::TestRequest::post().uri("/login").to_request()).await;
    assert!(res.status().is_success());
    let session_cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "id")
        .expect("session cookie")
        .into_owned();

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/")
            .cookie(session_cookie)
            .to_request(),
    )
    .await;
    assert!(res.status().is_success());
    let body = test::read_body(res).await;
    assert_eq!(body, "Example|example.com|ada|/media/css/site.css|");
}

#[actix_rt::test]
async fn guard_rejects_authenticated_users_before_the_handler() {
    let (_dir, settings) = site_fixture();
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = Arc::clone(&hits);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(Arc::clone(&settings)))
            .route("/login", web::post().to(login))
            .service(
                web::resource("/signup")
                    .wrap(from_fn(reject_authenticated))
                    .route(web::get().to(move || {
                        let hits = Arc::clone(&handler_hits);
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            HttpResponse::Ok().body("signup")
                        }
                    })),
            )
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                Key::generate(),
            )),
    )
    .await;

    // anonymous visitors pass through, the handler runs once
    let res = test::call_service(&app, test::TestRequest::get().uri("/signup").to_request()).await;
    assert!(res.status().is_success());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let res =
        test::call_service(&app, test::TestRequest::post().uri("/login").to_request()).await;
    let session_cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "id")
        .expect("session cookie")
        .into_owned();

    // a logged-in visitor gets 403 and the handler never runs
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/signup")
            .cookie(session_cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), actix_web::http::StatusCode::FORBIDDEN);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[actix_rt::test]
async fn media_service_serves_files_under_prefix() {
    let (_dir, settings) = site_fixture();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(Arc::clone(&settings)))
            .service(media_service(&settings).unwrap()),
    )
    .await;

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/media/css/site.css").to_request(),
    )
    .await;
    assert!(res.status().is_success());
    let body = test::read_body(res).await;
    assert_eq!(body, "body { margin: 0 }");

    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/media/missing.css").to_request(),
    )
    .await;
    assert_eq!(res.status(), actix_web::http::StatusCode::NOT_FOUND);
}
