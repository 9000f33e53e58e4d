// Copyright 2026 Marta Vidal
use std::collections::BTreeMap;
use std::future::{ready, Ready};
use std::sync::Arc;

use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::{error, web, FromRequest, HttpRequest};
use minijinja::value::{StructObject, Value};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::auth::UserSession;
use crate::error::GlazeError;
use crate::media;
use crate::settings::SiteSettings;

/// Cookie under which the CSRF middleware publishes the token for this
/// exchange. Routes that obtain the token through an extractor instead
/// should pass it in with [`PageHandler::with_xsrf`].
pub const XSRF_COOKIE: &str = "Csrf-Token";

/// Form field name emitted by `xsrf_form_html`.
pub const XSRF_FIELD: &str = "csrf_token";

/// Read-only snapshot of the inbound exchange, captured once at extraction
/// time and handed to templates under the `request` key.
#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub method: String,
}

/// Application-wide registry of extra names merged into every render
/// context. Entries may be plain values or `Value::from_function` callables;
/// on a name collision with the assembler's own keys, the helper wins.
#[derive(Debug, Clone, Default)]
pub struct UiHelpers {
    entries: BTreeMap<String, Value>,
}

impl UiHelpers {
    pub fn new() -> UiHelpers {
        UiHelpers::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Per-request object tying together the site settings, a snapshot of the
/// request, the session's current user and the enabled UI helpers.
///
/// Created per inbound request by the `FromRequest` impl (or with
/// [`PageHandler::new`] outside actix) and discarded once the response is
/// sent; nothing assembled from it is cached across requests.
pub struct PageHandler {
    settings: Arc<SiteSettings>,
    request: RequestInfo,
    current_user: Option<JsonValue>,
    include_host: bool,
    ui: UiHelpers,
    xsrf: Option<String>,
}

impl PageHandler {
    pub fn new(settings: Arc<SiteSettings>, request: RequestInfo) -> PageHandler {
        PageHandler {
            settings,
            request,
            current_user: None,
            include_host: false,
            ui: UiHelpers::default(),
            xsrf: None,
        }
    }

    pub fn from_req(req: &HttpRequest) -> actix_web::Result<PageHandler> {
        let settings = req
            .app_data::<web::Data<SiteSettings>>()
            .cloned()
            .ok_or_else(|| error::ErrorInternalServerError("site settings are not configured"))?
            .into_inner();
        let ui = req
            .app_data::<web::Data<UiHelpers>>()
            .map(|helpers| helpers.get_ref().clone())
            .unwrap_or_default();
        let current_user = UserSession::new(req.get_session()).current_user();
        let info = req.connection_info();
        let request = RequestInfo {
            scheme: info.scheme().to_string(),
            host: info.host().to_string(),
            path: req.path().to_string(),
            method: req.method().to_string(),
        };
        drop(info);
        let xsrf = req.cookie(XSRF_COOKIE).map(|c| c.value().to_string());

        Ok(PageHandler {
            settings,
            request,
            current_user,
            include_host: false,
            ui,
            xsrf,
        })
    }

    pub fn with_current_user(mut self, user: JsonValue) -> PageHandler {
        self.current_user = Some(user);
        self
    }

    pub fn with_include_host(mut self, include_host: bool) -> PageHandler {
        self.include_host = include_host;
        self
    }

    pub fn with_ui(mut self, ui: UiHelpers) -> PageHandler {
        self.ui = ui;
        self
    }

    pub fn with_xsrf(mut self, token: impl Into<String>) -> PageHandler {
        self.xsrf = Some(token.into());
        self
    }

    pub fn get_settings(&self) -> &SiteSettings {
        &self.settings
    }

    pub fn get_request(&self) -> &RequestInfo {
        &self.request
    }

    pub fn get_current_user(&self) -> Option<&JsonValue> {
        self.current_user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn get_include_host(&self) -> bool {
        self.include_host
    }

    /// Explicit form of the anonymous-only guard for use at the top of a
    /// handler body. Fails before any other work happens.
    pub fn require_unauthenticated(&self) -> Result<(), GlazeError> {
        if self.current_user.is_some() {
            Err(GlazeError::Forbidden)
        } else {
            Ok(())
        }
    }

    /// Resolves a logical asset path to a URL.
    ///
    /// An explicit `include_host` wins; otherwise the handler's own
    /// `include_host` policy applies (false unless set). With host inclusion
    /// the relative URL is prefixed with `scheme://host` from the request
    /// snapshot.
    pub fn media_url(
        &self,
        asset_path: &str,
        include_host: Option<bool>,
    ) -> Result<String, GlazeError> {
        let relative = media::resolve(&self.settings, asset_path)?;
        if include_host.unwrap_or(self.include_host) {
            Ok(format!(
                "{}://{}{}",
                self.request.scheme, self.request.host, relative
            ))
        } else {
            Ok(relative)
        }
    }

    /// Hidden-input markup carrying the CSRF token, or an empty string when
    /// no token accompanies this exchange.
    pub fn xsrf_form_html(&self) -> String {
        match &self.xsrf {
            Some(token) => {
                format!("<input type=\"hidden\" name=\"{XSRF_FIELD}\" value=\"{token}\">")
            }
            None => String::new(),
        }
    }

    /// Builds the render context for this request.
    ///
    /// Merge order: route-supplied `extra` entries first, then the fixed
    /// entries, then the UI helpers, so later sources win on a name
    /// collision. The map is built fresh on every call.
    pub fn assemble(&self, extra: Value) -> Result<Value, GlazeError> {
        self.settings.require_template_path()?;
        let domain = self.settings.require_site_domain()?;
        let sitename = self.settings.require_site_name()?;

        let mut ctx: BTreeMap<String, Value> = BTreeMap::new();

        if let Ok(keys) = extra.try_iter() {
            for key in keys {
                if let Some(name) = key.as_str() {
                    if let Ok(item) = extra.get_item(&key) {
                        ctx.insert(name.to_string(), item);
                    }
                }
            }
        }

        ctx.insert("xsrf".to_string(), self.xsrf_value());
        ctx.insert(
            "request".to_string(),
            Value::from_serializable(&self.request),
        );
        ctx.insert(
            "settings".to_string(),
            Value::from_serializable(self.settings.as_ref()),
        );
        ctx.insert(
            "me".to_string(),
            match &self.current_user {
                Some(user) => Value::from_serializable(user),
                None => Value::from(()),
            },
        );
        ctx.insert("static".to_string(), self.static_fn());
        ctx.insert("domain".to_string(), Value::from(domain));
        ctx.insert("sitename".to_string(), Value::from(sitename));
        ctx.insert(
            "handler".to_string(),
            Value::from_struct_object(HandlerView::of(self)),
        );

        for (name, value) in self.ui.entries() {
            ctx.insert(name.to_string(), value.clone());
        }

        Ok(Value::from_iter(ctx))
    }

    /// The `static(path, include_host=?)` template callable, bound to this
    /// request's scheme, host and host-inclusion policy.
    fn static_fn(&self) -> Value {
        let settings = Arc::clone(&self.settings);
        let scheme = self.request.scheme.clone();
        let host = self.request.host.clone();
        let default_include = self.include_host;
        Value::from_function(
            move |asset_path: String, include_host: Option<bool>| -> Result<String, minijinja::Error> {
                let relative = media::resolve(&settings, &asset_path).map_err(|err| {
                    minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
                })?;
                if include_host.unwrap_or(default_include) {
                    Ok(format!("{scheme}://{host}{relative}"))
                } else {
                    Ok(relative)
                }
            },
        )
    }

    fn xsrf_value(&self) -> Value {
        let fragment = self.xsrf_form_html();
        Value::from_function(move || Value::from_safe_string(fragment.clone()))
    }
}

impl FromRequest for PageHandler {
    type Error = actix_web::Error;
    type Future = Ready<Result<PageHandler, actix_web::Error>>;

    fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
        ready(PageHandler::from_req(req))
    }
}

/// Template-visible view of the handler, exposed under the `handler` key for
/// pages that need deeper introspection than the fixed context entries.
#[derive(Debug)]
struct HandlerView {
    method: String,
    path: String,
    scheme: String,
    host: String,
    include_host: bool,
    authenticated: bool,
}

impl HandlerView {
    fn of(handler: &PageHandler) -> HandlerView {
        HandlerView {
            method: handler.request.method.clone(),
            path: handler.request.path.clone(),
            scheme: handler.request.scheme.clone(),
            host: handler.request.host.clone(),
            include_host: handler.include_host,
            authenticated: handler.current_user.is_some(),
        }
    }
}

impl StructObject for HandlerView {
    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "method" => Some(Value::from(self.method.as_str())),
            "path" => Some(Value::from(self.path.as_str())),
            "scheme" => Some(Value::from(self.scheme.as_str())),
            "host" => Some(Value::from(self.host.as_str())),
            "include_host" => Some(Value::from(self.include_host)),
            "authenticated" => Some(Value::from(self.authenticated)),
            _ => None,
        }
    }

    fn static_fields(&self) -> Option<&'static [&'static str]> {
        Some(&[
            "method",
            "path",
            "scheme",
            "host",
            "include_host",
            "authenticated",
        ])
    }
}
