//! Identity lookup collaborator.
//!
//! The gate only needs to know whether a principal exists; the profile store
//! itself (database, user service) lives outside this crate behind
//! [`IdentityLookup`].

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

/// Stored profile of a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
}

/// Identity store failures.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("identity store unavailable: {0}")]
    Unavailable(String),

    #[error("identity store could not be loaded: {0}")]
    Load(String),
}

/// Resolves identity ids to stored profiles.
///
/// `Ok(None)` means the store answered and the identity does not exist;
/// `Err` means the store could not answer.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn find_identity(&self, identity_id: &str)
        -> Result<Option<IdentityProfile>, LookupError>;
}

#[async_trait]
impl<T: IdentityLookup + ?Sized> IdentityLookup for Arc<T> {
    async fn find_identity(
        &self,
        identity_id: &str,
    ) -> Result<Option<IdentityProfile>, LookupError> {
        (**self).find_identity(identity_id).await
    }
}

/// Identity store held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityLookup {
    profiles: HashMap<String, IdentityProfile>,
}

impl InMemoryIdentityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a list of profiles. Later duplicates win.
    pub fn from_profiles(profiles: impl IntoIterator<Item = IdentityProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Load profiles from a JSON array file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LookupError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LookupError::Load(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse profiles from a JSON array.
    pub fn from_json(content: &str) -> Result<Self, LookupError> {
        let profiles: Vec<IdentityProfile> =
            serde_json::from_str(content).map_err(|e| LookupError::Load(e.to_string()))?;
        Ok(Self::from_profiles(profiles))
    }

    pub fn insert(&mut self, profile: IdentityProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl IdentityLookup for InMemoryIdentityLookup {
    async fn find_identity(
        &self,
        identity_id: &str,
    ) -> Result<Option<IdentityProfile>, LookupError> {
        Ok(self.profiles.get(identity_id).cloned())
    }
}

/// Bounded TTL cache in front of another lookup.
///
/// Only found profiles are cached; "not found" and errors always go to the
/// inner store so a newly created identity is seen immediately.
pub struct CachedIdentityLookup<L> {
    inner: L,
    cache: Cache<String, Arc<IdentityProfile>>,
}

impl<L: IdentityLookup> CachedIdentityLookup<L> {
    /// Wrap `inner` with a cache of at most `max_capacity` entries.
    pub fn new(inner: L, ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }
}

#[async_trait]
impl<L: IdentityLookup> IdentityLookup for CachedIdentityLookup<L> {
    async fn find_identity(
        &self,
        identity_id: &str,
    ) -> Result<Option<IdentityProfile>, LookupError> {
        if let Some(cached) = self.cache.get(identity_id).await {
            return Ok(Some((*cached).clone()));
        }

        let profile = self.inner.find_identity(identity_id).await?;
        if let Some(ref profile) = profile {
            self.cache
                .insert(identity_id.to_string(), Arc::new(profile.clone()))
                .await;
        }
        Ok(profile)
    }
}
