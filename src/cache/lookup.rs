//! Cache-first external lookups.
//!
//! The fetcher is whatever answers a free-text query (a web search in
//! practice). It is only called when the cache cannot answer.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::cache::store::{Clock, SystemClock, TtlCache};
use crate::types::identifiers::EntityId;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Lookup failed: {message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait Fetcher {
    fn fetch(&self, query: &str) -> Result<String, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<String, FetchError>,
{
    fn fetch(&self, query: &str) -> Result<String, FetchError> {
        self(query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Exact query hit.
    Cache,
    /// Every fresh result for the entity, combined.
    EntityCache { queries: usize },
    Fetched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    pub text: String,
    pub source: LookupSource,
    pub entity: Option<EntityId>,
}

pub struct CachedLookup<F, C = SystemClock> {
    fetcher: F,
    cache: TtlCache<C>,
    reuse_entity_results: bool,
}

impl<F, C> CachedLookup<F, C>
where
    F: Fetcher,
    C: Clock,
{
    /// With `reuse_entity_results`, any fresh data for an entity answers every
    /// query about it and no fetch happens until the entity expires.
    pub fn new(fetcher: F, cache: TtlCache<C>, reuse_entity_results: bool) -> Self {
        Self {
            fetcher,
            cache,
            reuse_entity_results,
        }
    }

    pub fn cache(&self) -> &TtlCache<C> {
        &self.cache
    }

    pub fn into_cache(self) -> TtlCache<C> {
        self.cache
    }

    /// Answer `query`, keyed by `entity` or, failing that, by a name guessed
    /// from the query. Without any entity the result is fetched and not cached.
    pub fn lookup(&mut self, entity: Option<&str>, query: &str) -> Result<LookupOutcome, FetchError> {
        let entity = match entity {
            Some(name) => EntityId::new(name),
            None => entity_from_query(query).as_deref().and_then(EntityId::new),
        };

        if let Some(key) = &entity {
            let reuse = self.reuse_entity_results;
            let hit = self.cache.with_lock(|cache| {
                if reuse {
                    let all = cache.get_all(key.as_str());
                    if all.is_empty() {
                        return None;
                    }
                    let combined = combine_cached(&all);
                    cache.put(key.as_str(), query, &combined);
                    Some((combined, LookupSource::EntityCache { queries: all.len() }))
                } else {
                    cache
                        .get(key.as_str(), query)
                        .map(|text| (text, LookupSource::Cache))
                }
            });

            if let Some((text, source)) = hit {
                tracing::debug!(entity = %key, ?source, "cache hit");
                return Ok(LookupOutcome { text, source, entity });
            }
            tracing::debug!(entity = %key, "cache miss");
        }

        tracing::info!(query, "performing external lookup");
        let text = self.fetcher.fetch(query)?;

        if let Some(key) = &entity {
            self.cache
                .with_lock(|cache| cache.put(key.as_str(), query, &text));
        }

        Ok(LookupOutcome {
            text,
            source: LookupSource::Fetched,
            entity,
        })
    }
}

fn combine_cached(all: &BTreeMap<String, String>) -> String {
    all.iter()
        .map(|(query, result)| format!("=== Cached: {query} ===\n{result}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn leading_verb() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(what is|find|search for|get|show me)\s+").expect("Invalid regex pattern")
    })
}

fn metric_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\s+(roce|roe|pe|p/e|debt|equity|ratio|financial|ratios|benchmark|news|recent|2024|2023)",
        )
        .expect("Invalid regex pattern")
    })
}

fn stop_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(the|a|an|for|of|in|on|at|to|from)\b").expect("Invalid regex pattern")
    })
}

/// Best-effort company name from a free-text query: drop a leading verb
/// phrase, cut at the first metric keyword, strip stop words. Needs more than
/// two characters to count.
pub fn entity_from_query(query: &str) -> Option<String> {
    let lower = query.to_lowercase();
    let cleaned = leading_verb().replace(&lower, "");
    let head = metric_keyword().split(&cleaned).next().unwrap_or_default();
    let without_stop_words = stop_word().replace_all(head.trim(), "");
    let candidate = without_stop_words.trim();

    if candidate.chars().count() > 2 {
        Some(candidate.to_uppercase())
    } else {
        None
    }
}
