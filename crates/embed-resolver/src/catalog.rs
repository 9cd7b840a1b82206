//! Catalog records and the rule choosing which embed URL to resolve.
//!
//! Records come from an external catalog API; only the fields the pipeline
//! needs are modelled, everything else is ignored on deserialization.

use serde::{Deserialize, Deserializer, Serialize};

pub const LEGACY_SERVER: &str = "UQLOAD (Old)";
pub const CURRENT_SERVER: &str = "UQLOAD (New)";

/// A catalog record that may carry embed URLs.
pub trait EmbedSource {
    fn legacy_url(&self) -> Option<&str>;

    fn current_url(&self) -> Option<&str>;

    fn display_title(&self) -> String;

    /// Labels of the servers this record can be played from.
    fn available_servers(&self) -> Vec<&'static str> {
        let mut servers = Vec::with_capacity(2);
        if non_blank(self.legacy_url()).is_some() {
            servers.push(LEGACY_SERVER);
        }
        if non_blank(self.current_url()).is_some() {
            servers.push(CURRENT_SERVER);
        }
        servers
    }
}

fn non_blank(url: Option<&str>) -> Option<&str> {
    url.filter(|u| !u.trim().is_empty())
}

/// The embed URL to resolve: the legacy one when present, else the current one.
pub fn select_embed_url<S: EmbedSource + ?Sized>(source: &S) -> Option<&str> {
    non_blank(source.legacy_url()).or_else(|| non_blank(source.current_url()))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub details_link: Option<String>,
    #[serde(default)]
    pub uqload_old_url: Option<String>,
    #[serde(default)]
    pub uqload_new_url: Option<String>,
    #[serde(default)]
    pub tmdb_id: Option<String>,
    #[serde(default)]
    pub tmdb_title: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
}

impl EmbedSource for Movie {
    fn legacy_url(&self) -> Option<&str> {
        self.uqload_old_url.as_deref()
    }

    fn current_url(&self) -> Option<&str> {
        self.uqload_new_url.as_deref()
    }

    fn display_title(&self) -> String {
        self.tmdb_title.clone().unwrap_or_else(|| self.title.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Episode {
    pub id: Option<String>,
    pub number: Option<u32>,
    pub title: Option<String>,
    pub index: Option<u32>,
    pub uqload_old_url: Option<String>,
    pub uqload_new_url: Option<String>,
}

impl Episode {
    pub fn episode_number(&self) -> u32 {
        self.number.or(self.index).unwrap_or(1)
    }
}

impl EmbedSource for Episode {
    fn legacy_url(&self) -> Option<&str> {
        self.uqload_old_url.as_deref()
    }

    fn current_url(&self) -> Option<&str> {
        self.uqload_new_url.as_deref()
    }

    fn display_title(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("Episode {}", self.episode_number()))
    }
}

/// Either record kind, as read from an untyped JSON document.
///
/// A record carrying an episode `number` or `index` is an [`Episode`], even
/// when it also has a `title`; any other titled record is a [`Movie`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CatalogRecord {
    Movie(Movie),
    Episode(Episode),
}

const EPISODE_KEYS: &[&str] = &["number", "index"];

impl<'de> Deserialize<'de> for CatalogRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        let has_episode_key = EPISODE_KEYS
            .iter()
            .any(|key| value.get(key).is_some_and(|v| !v.is_null()));

        let record = if has_episode_key || value.get("title").is_none() {
            serde_json::from_value(value).map(Self::Episode)
        } else {
            serde_json::from_value(value).map(Self::Movie)
        };
        record.map_err(serde::de::Error::custom)
    }
}

impl CatalogRecord {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn source(&self) -> &dyn EmbedSource {
        match self {
            Self::Movie(movie) => movie,
            Self::Episode(episode) => episode,
        }
    }
}

impl EmbedSource for CatalogRecord {
    fn legacy_url(&self) -> Option<&str> {
        self.source().legacy_url()
    }

    fn current_url(&self) -> Option<&str> {
        self.source().current_url()
    }

    fn display_title(&self) -> String {
        self.source().display_title()
    }
}
