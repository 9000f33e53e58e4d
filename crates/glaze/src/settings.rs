// Copyright 2026 Marta Vidal
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::Config;
use serde::Serialize;

use crate::error::GlazeError;
use crate::media::{MediaHandler, PrefixMediaHandler};

pub const DEFAULT_MEDIA_URL_PREFIX: &str = "/media/";

/// Loader callback handed to MiniJinja when an application supplies its own
/// template source instead of a `template_path` directory.
pub type TemplateLoader =
    Arc<dyn Fn(&str) -> Result<Option<String>, minijinja::Error> + Send + Sync>;

/// Process-wide site configuration.
///
/// Built once at startup and shared by reference (`Arc`) into every
/// per-request component; no field is ever mutated after construction.
/// Settings that are only required by some features are `Option`s with a
/// matching `require_*` accessor that fails with
/// [`GlazeError::MissingSetting`] at the point of use.
#[derive(Clone, Serialize)]
pub struct SiteSettings {
    template_path: Option<PathBuf>,
    #[serde(skip)]
    template_loader: Option<TemplateLoader>,
    debug: bool,
    site_domain: Option<String>,
    site_name: Option<String>,
    media_path: Option<PathBuf>,
    media_url_prefix: String,
    #[serde(skip)]
    media_handler: Arc<dyn MediaHandler>,
}

impl SiteSettings {
    pub fn builder() -> SiteSettingsBuilder {
        SiteSettingsBuilder::default()
    }

    /// Reads the recognized site keys out of an already-built `Config`.
    /// Unknown keys are ignored; missing optional keys stay unset.
    pub fn from_config(settings: &Config) -> SiteSettings {
        let mut builder = SiteSettings::builder();
        if let Ok(path) = settings.get_string("template_path") {
            builder = builder.template_path(path);
        }
        if let Ok(path) = settings.get_string("media_path") {
            builder = builder.media_path(path);
        }
        if let Ok(prefix) = settings.get_string("media_url_prefix") {
            builder = builder.media_url_prefix(prefix);
        }
        if let Ok(domain) = settings.get_string("site_domain") {
            builder = builder.site_domain(domain);
        }
        if let Ok(name) = settings.get_string("site_name") {
            builder = builder.site_name(name);
        }
        builder
            .debug(settings.get_bool("debug").unwrap_or(false))
            .build()
    }

    /// Builds the usual source stack (optional config file plus prefixed
    /// environment variables) and reads the site keys from it.
    pub fn from_sources(file_name: &str, env_prefix: &str) -> Result<SiteSettings, GlazeError> {
        let settings = Config::builder()
            .add_source(config::File::with_name(file_name).required(false))
            .add_source(config::Environment::with_prefix(env_prefix))
            .build()?;
        Ok(SiteSettings::from_config(&settings))
    }

    pub fn get_template_path(&self) -> Option<&Path> {
        self.template_path.as_deref()
    }

    pub fn get_template_loader(&self) -> Option<&TemplateLoader> {
        self.template_loader.as_ref()
    }

    pub fn get_debug(&self) -> bool {
        self.debug
    }

    pub fn get_site_domain(&self) -> Option<&str> {
        self.site_domain.as_deref()
    }

    pub fn get_site_name(&self) -> Option<&str> {
        self.site_name.as_deref()
    }

    pub fn get_media_path(&self) -> Option<&Path> {
        self.media_path.as_deref()
    }

    pub fn get_media_url_prefix(&self) -> &str {
        &self.media_url_prefix
    }

    pub fn get_media_handler(&self) -> &Arc<dyn MediaHandler> {
        &self.media_handler
    }

    pub fn require_template_path(&self) -> Result<&Path, GlazeError> {
        self.template_path
            .as_deref()
            .ok_or(GlazeError::MissingSetting("template_path"))
    }

    pub fn require_site_domain(&self) -> Result<&str, GlazeError> {
        self.site_domain
            .as_deref()
            .ok_or(GlazeError::MissingSetting("site_domain"))
    }

    pub fn require_site_name(&self) -> Result<&str, GlazeError> {
        self.site_name
            .as_deref()
            .ok_or(GlazeError::MissingSetting("site_name"))
    }

    pub fn require_media_path(&self) -> Result<&Path, GlazeError> {
        self.media_path
            .as_deref()
            .ok_or(GlazeError::MissingSetting("media_path"))
    }
}

impl fmt::Debug for SiteSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteSettings")
            .field("template_path", &self.template_path)
            .field("debug", &self.debug)
            .field("site_domain", &self.site_domain)
            .field("site_name", &self.site_name)
            .field("media_path", &self.media_path)
            .field("media_url_prefix", &self.media_url_prefix)
            .finish_non_exhaustive()
    }
}

pub struct SiteSettingsBuilder {
    template_path: Option<PathBuf>,
    template_loader: Option<TemplateLoader>,
    debug: bool,
    site_domain: Option<String>,
    site_name: Option<String>,
    media_path: Option<PathBuf>,
    media_url_prefix: String,
    media_handler: Arc<dyn MediaHandler>,
}

impl Default for SiteSettingsBuilder {
    fn default() -> SiteSettingsBuilder {
        SiteSettingsBuilder {
            template_path: None,
            template_loader: None,
            debug: false,
            site_domain: None,
            site_name: None,
            media_path: None,
            media_url_prefix: DEFAULT_MEDIA_URL_PREFIX.to_string(),
            media_handler: Arc::new(PrefixMediaHandler),
        }
    }
}

impl SiteSettingsBuilder {
    pub fn template_path(mut self, path: impl Into<PathBuf>) -> SiteSettingsBuilder {
        self.template_path = Some(path.into());
        self
    }

    pub fn template_loader(mut self, loader: TemplateLoader) -> SiteSettingsBuilder {
        self.template_loader = Some(loader);
        self
    }

    pub fn debug(mut self, debug: bool) -> SiteSettingsBuilder {
        self.debug = debug;
        self
    }

    pub fn site_domain(mut self, domain: impl Into<String>) -> SiteSettingsBuilder {
        self.site_domain = Some(domain.into());
        self
    }

    pub fn site_name(mut self, name: impl Into<String>) -> SiteSettingsBuilder {
        self.site_name = Some(name.into());
        self
    }

    pub fn media_path(mut self, path: impl Into<PathBuf>) -> SiteSettingsBuilder {
        self.media_path = Some(path.into());
        self
    }

    pub fn media_url_prefix(mut self, prefix: impl Into<String>) -> SiteSettingsBuilder {
        self.media_url_prefix = prefix.into();
        self
    }

    pub fn media_handler(mut self, handler: Arc<dyn MediaHandler>) -> SiteSettingsBuilder {
        self.media_handler = handler;
        self
    }

    pub fn build(self) -> SiteSettings {
        SiteSettings {
            template_path: self.template_path,
            template_loader: self.template_loader,
            debug: self.debug,
            site_domain: self.site_domain,
            site_name: self.site_name,
            media_path: self.media_path,
            media_url_prefix: self.media_url_prefix,
            media_handler: self.media_handler,
        }
    }
}
