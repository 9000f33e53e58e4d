// Copyright 2026 Marta Vidal
//! Template rendering and media helpers for Actix Web applications.
//!
//! Three small pieces, composed through the usual actix extractor and
//! middleware seams:
//!
//! - [`PageHandler`] assembles the per-request MiniJinja render context
//!   (request snapshot, settings, current user, `static()` asset callable,
//!   site identity, enabled UI helpers).
//! - [`media`] resolves logical asset paths to URLs under a configurable
//!   prefix and serves the files through `actix-files`.
//! - [`auth`] supplies the session-backed current-user lookup and the
//!   anonymous-only route guard.

pub mod auth;
pub mod context;
pub mod error;
pub mod media;
pub mod renderer;
pub mod settings;

pub use auth::{reject_authenticated, UserSession};
pub use context::{PageHandler, RequestInfo, UiHelpers};
pub use error::GlazeError;
pub use media::{media_service, MediaHandler, PrefixMediaHandler, StaticOverlay};
pub use renderer::{build_environment, build_reloader, TemplateRenderer};
pub use settings::SiteSettings;
