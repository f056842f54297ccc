//! Types related to [`CookieStoreConfig`].
use std::path::Path;

use anyhow::Context;
use cookie::SameSite;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};

use crate::entry::CookieOptions;
use crate::errors::ConfigLoadError;

/// The prefix of the environment variables that override configuration values.
///
/// Nested keys are separated by a double underscore, e.g.
/// `COOKIES_DEFAULTS__SAME_SITE=strict`.
pub const ENV_PREFIX: &str = "COOKIES_";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
/// Configure how a [`CookieStore`](crate::CookieStore) handles outgoing cookies.
pub struct CookieStoreConfig {
    /// Attributes applied to outgoing cookies that don't set them explicitly.
    #[serde(default)]
    pub defaults: DefaultCookieAttributes,
    /// Reject deletions of cookies the request's origin can't own.
    ///
    /// Default is `true`.
    #[serde(default = "default_strict_origin")]
    pub strict_origin: bool,
}

impl Default for CookieStoreConfig {
    fn default() -> Self {
        Self {
            defaults: DefaultCookieAttributes::default(),
            strict_origin: default_strict_origin(),
        }
    }
}

impl CookieStoreConfig {
    /// Load the configuration by merging together, in order of increasing precedence:
    ///
    /// 1. The built-in defaults
    /// 2. The YAML file at `configuration_file`, if provided
    /// 3. Environment variables prefixed with [`ENV_PREFIX`]
    pub fn load(configuration_file: Option<&Path>) -> Result<Self, ConfigLoadError> {
        let span = tracing::info_span!(
            "Loading cookie configuration",
            configuration.file = ?configuration_file,
        );
        let _guard = span.enter();

        let mut figment = Figment::new();
        if let Some(path) = configuration_file {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .context("Failed to load hierarchical cookie configuration")
            .map_err(ConfigLoadError)
    }
}

fn default_strict_origin() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
/// Attributes applied to every outgoing cookie that leaves them unset.
pub struct DefaultCookieAttributes {
    /// The `Path` attribute.
    ///
    /// By default, the attribute is set to `/`.
    #[serde(default = "default_path")]
    pub path: Option<String>,
    /// The `Domain` attribute.
    ///
    /// By default, the attribute is not set.
    #[serde(default)]
    pub domain: Option<String>,
    /// The `Secure` attribute.
    ///
    /// By default, the attribute is not set.
    #[serde(default)]
    pub secure: Option<bool>,
    /// The `HttpOnly` attribute.
    ///
    /// By default, the attribute is not set.
    #[serde(default)]
    pub http_only: Option<bool>,
    /// The [`SameSite`] attribute.
    ///
    /// Accepts `strict`, `lax`, `none`, or a boolean: `true` is `Strict`,
    /// `false` leaves the attribute out.
    /// By default, the attribute is not set.
    #[serde(default, with = "same_site")]
    pub same_site: Option<SameSite>,
}

impl Default for DefaultCookieAttributes {
    fn default() -> Self {
        Self {
            path: default_path(),
            domain: None,
            secure: None,
            http_only: None,
            same_site: None,
        }
    }
}

impl DefaultCookieAttributes {
    /// Fill in the attributes `options` leaves unset.
    pub(crate) fn apply(&self, options: &mut CookieOptions) {
        if options.path.is_none() {
            options.path.clone_from(&self.path);
        }
        if options.domain.is_none() {
            options.domain.clone_from(&self.domain);
        }
        options.secure = options.secure.or(self.secure);
        options.http_only = options.http_only.or(self.http_only);
        options.same_site = options.same_site.or(self.same_site);
    }
}

fn default_path() -> Option<String> {
    Some("/".to_string())
}

// Deserialization and serialization routines for the `same_site` attribute.
mod same_site {
    use cookie::SameSite;
    use serde::{Deserializer, Serializer, de};
    use std::fmt;

    pub fn serialize<S>(value: &Option<SameSite>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(same_site) => {
                let same_site = match same_site {
                    SameSite::Strict => "Strict",
                    SameSite::Lax => "Lax",
                    SameSite::None => "None",
                };
                serializer.serialize_some(same_site)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SameSite>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SameSiteVisitor;

        impl<'de> de::Visitor<'de> for SameSiteVisitor {
            type Value = Option<SameSite>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("`strict`, `lax`, `none`, a boolean or null")
            }

            // `true` is shorthand for `Strict`, `false` leaves the attribute out.
            fn visit_bool<E>(self, value: bool) -> Result<Option<SameSite>, E>
            where
                E: de::Error,
            {
                Ok(value.then_some(SameSite::Strict))
            }

            fn visit_str<E>(self, value: &str) -> Result<Option<SameSite>, E>
            where
                E: de::Error,
            {
                match value {
                    "Strict" | "strict" => Ok(Some(SameSite::Strict)),
                    "Lax" | "lax" => Ok(Some(SameSite::Lax)),
                    "None" | "none" => Ok(Some(SameSite::None)),
                    _ => Err(de::Error::unknown_variant(
                        value,
                        &["Strict", "Lax", "None"],
                    )),
                }
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Option<SameSite>, D::Error>
            where
                D: de::Deserializer<'de>,
            {
                deserializer.deserialize_any(self)
            }

            fn visit_none<E>(self) -> Result<Option<SameSite>, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_unit<E>(self) -> Result<Option<SameSite>, E>
            where
                E: de::Error,
            {
                Ok(None)
            }
        }

        deserializer.deserialize_option(SameSiteVisitor)
    }
}
