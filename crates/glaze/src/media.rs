// Copyright 2026 Marta Vidal
use std::path::PathBuf;

use actix_files::Files;

use crate::error::GlazeError;
use crate::settings::SiteSettings;

/// Temporary static-serving view derived from `media_path` and
/// `media_url_prefix` for a single resolution. Always a local copy; the
/// originating [`SiteSettings`] is never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticOverlay {
    pub static_root: PathBuf,
    pub static_url_prefix: String,
}

impl StaticOverlay {
    pub fn derive(settings: &SiteSettings) -> Result<StaticOverlay, GlazeError> {
        let static_root = settings.require_media_path()?.to_path_buf();
        Ok(StaticOverlay {
            static_root,
            static_url_prefix: settings.get_media_url_prefix().to_string(),
        })
    }
}

/// Turns a logical asset path into a relative URL. The built-in
/// [`PrefixMediaHandler`] joins the prefix and the path; applications that
/// serve media through a CDN or with content-hashed names install their own
/// handler via `SiteSettingsBuilder::media_handler`.
pub trait MediaHandler: Send + Sync {
    fn make_static_url(&self, overlay: &StaticOverlay, asset_path: &str) -> String;
}

pub struct PrefixMediaHandler;

impl MediaHandler for PrefixMediaHandler {
    fn make_static_url(&self, overlay: &StaticOverlay, asset_path: &str) -> String {
        format!(
            "{}/{}",
            overlay.static_url_prefix.trim_end_matches('/'),
            asset_path.trim_start_matches('/')
        )
    }
}

/// Resolves a logical asset path to a host-relative URL.
///
/// Derives the [`StaticOverlay`] (failing when `media_path` is unset) and
/// hands it to the configured media handler. Host inclusion is layered on
/// top by `PageHandler::media_url`, which knows the request's scheme and
/// host.
pub fn resolve(settings: &SiteSettings, asset_path: &str) -> Result<String, GlazeError> {
    let overlay = StaticOverlay::derive(settings)?;
    Ok(settings
        .get_media_handler()
        .make_static_url(&overlay, asset_path))
}

/// The serving side of the media feature: an `actix_files::Files` service
/// mounted under `media_url_prefix`. Requires `media_path` at construction
/// time, before any request is served.
pub fn media_service(settings: &SiteSettings) -> Result<Files, GlazeError> {
    let overlay = StaticOverlay::derive(settings)?;
    let mount = mount_path(&overlay.static_url_prefix);
    Ok(Files::new(&mount, overlay.static_root)
        .use_etag(true)
        .use_last_modified(true))
}

fn mount_path(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    fn settings() -> SiteSettings {
        SiteSettings::builder().media_path("/var/www/media").build()
    }

    #[test]
    fn test_resolve_joins_prefix_and_path() {
        let settings = settings();
        assert_eq!(
            resolve(&settings, "css/site.css").unwrap(),
            "/media/css/site.css"
        );
        assert_eq!(
            resolve(&settings, "/css/site.css").unwrap(),
            "/media/css/site.css"
        );
    }

    #[test]
    fn test_resolve_honors_custom_prefix() {
        let settings = SiteSettings::builder()
            .media_path("/var/www/media")
            .media_url_prefix("/assets/")
            .build();
        assert_eq!(resolve(&settings, "logo.png").unwrap(), "/assets/logo.png");
    }

    #[test]
    fn test_resolve_without_media_path_fails() {
        let settings = SiteSettings::builder().build();
        assert!(matches!(
            resolve(&settings, "logo.png"),
            Err(GlazeError::MissingSetting("media_path"))
        ));
    }

    #[test]
    fn test_resolve_leaves_settings_untouched() {
        let settings = settings();
        for _ in 0..3 {
            resolve(&settings, "a/b.js").unwrap();
        }
        assert_eq!(settings.get_media_path(), Some(Path::new("/var/www/media")));
        assert_eq!(settings.get_media_url_prefix(), "/media/");
    }

    #[test]
    fn test_custom_media_handler_is_used() {
        struct HashedHandler;
        impl MediaHandler for HashedHandler {
            fn make_static_url(&self, overlay: &StaticOverlay, asset_path: &str) -> String {
                format!(
                    "{}/{}?v=deadbeef",
                    overlay.static_url_prefix.trim_end_matches('/'),
                    asset_path
                )
            }
        }

        let settings = SiteSettings::builder()
            .media_path("/var/www/media")
            .media_handler(Arc::new(HashedHandler))
            .build();
        assert_eq!(
            resolve(&settings, "app.js").unwrap(),
            "/media/app.js?v=deadbeef"
        );
    }

    #[test]
    fn test_media_service_requires_media_path() {
        let settings = SiteSettings::builder().build();
        assert!(matches!(
            media_service(&settings),
            Err(GlazeError::MissingSetting("media_path"))
        ));
    }

    #[test]
    fn test_mount_path_normalization() {
        assert_eq!(mount_path("/media/"), "/media");
        assert_eq!(mount_path("/assets"), "/assets");
        assert_eq!(mount_path("/"), "/");
    }
}
