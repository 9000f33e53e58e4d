// Copyright 2026 Marta Vidal
use std::future::{ready, Ready};
use std::sync::Arc;

use actix_web::dev::Payload;
use actix_web::{error, web, FromRequest, HttpRequest};
use actix_web_lab::respond::Html;
use minijinja::{path_loader, AutoEscape, Environment};
use minijinja_autoreload::AutoReloader;

use crate::error::GlazeError;
use crate::settings::SiteSettings;

/// Builds the MiniJinja environment for a site.
///
/// An explicit `template_loader` wins; otherwise a path loader over
/// `template_path` is installed (failing when neither is set). Autoescaping
/// is off for every template name: pages emit markup fragments (the xsrf
/// field, helper output) that must land in the document verbatim.
pub fn build_environment(settings: &SiteSettings) -> Result<Environment<'static>, GlazeError> {
    let mut env = Environment::new();
    if let Some(loader) = settings.get_template_loader() {
        let loader = Arc::clone(loader);
        env.set_loader(move |name: &str| loader(name));
    } else {
        env.set_loader(path_loader(settings.require_template_path()?));
    }
    env.set_auto_escape_callback(|_name| AutoEscape::None);
    Ok(env)
}

/// Wraps [`build_environment`] in an auto-reloader. The closure is invoked
/// every time the environment is outdated to recreate it.
pub fn build_reloader(settings: Arc<SiteSettings>) -> AutoReloader {
    AutoReloader::new(move |notifier| {
        let env = build_environment(&settings).map_err(|err| {
            minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
        })?;
        // if watch_path is never called, no fs watcher is created
        if settings.get_debug() {
            if let Ok(path) = settings.require_template_path() {
                notifier.watch_path(path, true);
            }
        }
        Ok(env)
    })
}

/// Per-request handle on the shared template environment.
///
/// Extracted from app data; `render` turns a template name and context into
/// an HTML response, mapping template failures to 500s with a log line.
pub struct TemplateRenderer {
    env: web::Data<AutoReloader>,
}

impl TemplateRenderer {
    pub fn from_req(req: &HttpRequest) -> actix_web::Result<TemplateRenderer> {
        req.app_data::<web::Data<AutoReloader>>()
            .cloned()
            .map(|env| TemplateRenderer { env })
            .ok_or_else(|| error::ErrorInternalServerError("template reloader is not configured"))
    }

    pub fn render(
        &self,
        name: &str,
        ctx: impl Into<minijinja::value::Value>,
    ) -> actix_web::Result<Html> {
        self.env
            .acquire_env()
            .map_err(|err| {
                log::error!("could not acquire template environment: {err}");
                error::ErrorInternalServerError("template environment unavailable")
            })?
            .get_template(name)
            .map_err(|err| {
                log::error!("could not find template {name:?}: {err}");
                error::ErrorInternalServerError("template not found")
            })?
            .render(ctx.into())
            .map(Html)
            .map_err(|err| {
                log::error!("{err}");
                error::ErrorInternalServerError("template error")
            })
    }
}

impl FromRequest for TemplateRenderer {
    type Error = actix_web::Error;
    type Future = Ready<Result<TemplateRenderer, actix_web::Error>>;

    fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
        ready(TemplateRenderer::from_req(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_build_environment_requires_template_source() {
        let settings = SiteSettings::builder().build();
        assert!(matches!(
            build_environment(&settings),
            Err(GlazeError::MissingSetting("template_path"))
        ));
    }

    #[test]
    fn test_build_environment_from_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.html"), "Hello {{ name }}!").unwrap();
        let settings = SiteSettings::builder().template_path(dir.path()).build();

        let env = build_environment(&settings).unwrap();
        let out = env
            .get_template("hello.html")
            .unwrap()
            .render(context!(name => "World"))
            .unwrap();
        assert_eq!(out, "Hello World!");
    }

    #[test]
    fn test_explicit_loader_wins_over_template_path() {
        let settings = SiteSettings::builder()
            .template_path("/nonexistent")
            .template_loader(Arc::new(|name: &str| {
                Ok(Some(format!("loaded:{name}")))
            }))
            .build();

        let env = build_environment(&settings).unwrap();
        let out = env.get_template("page.html").unwrap().render(()).unwrap();
        assert_eq!(out, "loaded:page.html");
    }

    #[test]
    fn test_autoescape_is_off_even_for_html_names() {
        let settings = SiteSettings::builder()
            .template_loader(Arc::new(|_| Ok(Some("{{ markup }}".to_string()))))
            .build();

        let env = build_environment(&settings).unwrap();
        let out = env
            .get_template("page.html")
            .unwrap()
            .render(context!(markup => "<b>bold</b>"))
            .unwrap();
        assert_eq!(out, "<b>bold</b>");
    }

    #[test]
    fn test_reloader_serves_environment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("page.html"), "v1").unwrap();
        let settings = Arc::new(
            SiteSettings::builder()
                .template_path(dir.path())
                .build(),
        );

        let reloader = build_reloader(settings);
        let env = reloader.acquire_env().unwrap();
        assert_eq!(env.get_template("page.html").unwrap().render(()).unwrap(), "v1");
    }
}
