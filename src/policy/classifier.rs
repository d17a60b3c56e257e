//! Request Classifier
//!
//! Maps a request to the resource class (and so the namespace and policy)
//! that governs it. Checks run in a fixed order, tile then api then static,
//! and the first match wins.

use std::collections::HashSet;

use axum::http::Method;
use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::cache::CacheKey;
use crate::error::{CacheError, Result};
use crate::fetch::FetchRequest;
use crate::policy::{ClassifierRules, ResourceClass};

// == Resource Hint ==
/// Declared destination of a request, as browsers report in `Sec-Fetch-Dest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceHint {
    None,
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Other,
}

impl ResourceHint {
    /// Parses a `Sec-Fetch-Dest` value.
    pub fn from_fetch_dest(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "empty" => ResourceHint::None,
            "document" | "iframe" | "frame" => ResourceHint::Document,
            "script" | "worker" | "sharedworker" | "serviceworker" => ResourceHint::Script,
            "style" => ResourceHint::Style,
            "image" => ResourceHint::Image,
            "font" => ResourceHint::Font,
            "manifest" => ResourceHint::Manifest,
            _ => ResourceHint::Other,
        }
    }

    fn is_static_content(&self) -> bool {
        matches!(
            self,
            ResourceHint::Document
                | ResourceHint::Script
                | ResourceHint::Style
                | ResourceHint::Manifest
        )
    }
}

// == Request Classifier ==
/// Deterministic, side-effect free request classification.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    rules: ClassifierRules,
    tile_path: Regex,
    /// Canonical warm-set URLs, always static
    warm_urls: HashSet<String>,
}

impl RequestClassifier {
    /// Compiles the rules. Fails only on an invalid tile path pattern.
    pub fn new(rules: ClassifierRules) -> Result<Self> {
        let tile_path = Regex::new(&rules.tile_path_pattern).map_err(|err| {
            CacheError::InvalidRequest(format!(
                "invalid tile path pattern {:?}: {}",
                rules.tile_path_pattern, err
            ))
        })?;
        Ok(Self {
            rules,
            tile_path,
            warm_urls: HashSet::new(),
        })
    }

    /// Marks `urls` as static regardless of path or hint, so warmed
    /// entries are read back on the first real request.
    pub fn with_warm_set(mut self, urls: &[Url]) -> Self {
        self.warm_urls = urls
            .iter()
            .map(|url| CacheKey::get(url).url().to_string())
            .collect();
        self
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    // == Classify ==
    /// Returns the class of a request.
    pub fn classify(&self, method: &Method, url: &Url, hint: ResourceHint) -> ResourceClass {
        if *method != Method::GET {
            return ResourceClass::Passthrough;
        }
        if !matches!(url.scheme(), "http" | "https") {
            return ResourceClass::Passthrough;
        }

        let path = url.path();

        if self.is_tile(url, path) {
            ResourceClass::Tile
        } else if self.is_api(path) {
            ResourceClass::Api
        } else if self.is_static(url, path, hint) {
            ResourceClass::Static
        } else {
            ResourceClass::Passthrough
        }
    }

    /// Classifies a full request.
    pub fn classify_request(&self, request: &FetchRequest) -> ResourceClass {
        self.classify(&request.method, &request.url, request.hint)
    }

    fn is_tile(&self, url: &Url, path: &str) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        self.rules
            .tile_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
            && self.tile_path.is_match(path)
    }

    fn is_api(&self, path: &str) -> bool {
        self.rules
            .api_path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
            || self
                .rules
                .api_path_suffixes
                .iter()
                .any(|suffix| path.ends_with(suffix.as_str()))
    }

    fn is_static(&self, url: &Url, path: &str, hint: ResourceHint) -> bool {
        hint.is_static_content()
            || self.warm_urls.contains(CacheKey::get(url).url())
            || self
                .rules
                .static_path_prefixes
                .iter()
                .any(|prefix| path.starts_with(prefix.as_str()))
    }
}
