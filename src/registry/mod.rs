//! The alias registry.
//!
//! Owns every link in the process. Allocation is an atomic insert-if-absent
//! on a sharded map. Clicks and analytics are updated under the record's
//! shard lock. Each mutation bumps a change counter that the persister
//! watches.

pub mod alias;
pub mod error;
pub mod expiry;
pub mod secret;
pub mod utm;
pub mod validate;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::analytics::{ClickEvent, ClickStats, Visit};
use crate::models::LinkRecord;
use crate::storage::PersistedDocument;

pub use alias::ReservedAliases;
pub use error::{RegistryError, RegistryResult};
pub use expiry::ExpiryPolicy;
pub use utm::UtmSettings;

#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Length of generated aliases
    pub alias_length: usize,
    pub max_alias_length: usize,
    pub reserved: ReservedAliases,
    pub enforce_ownership: bool,
    pub utm: UtmSettings,
    pub analytics_enabled: bool,
    pub max_click_events: usize,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            alias_length: 6,
            max_alias_length: 32,
            reserved: ReservedAliases::default(),
            enforce_ownership: true,
            utm: UtmSettings::default(),
            analytics_enabled: true,
            max_click_events: 100,
        }
    }
}

/// Input for `Registry::create_link`
#[derive(Debug, Clone)]
pub struct NewLink {
    pub target_url: String,
    pub alias: Option<String>,
    pub owner_id: Option<String>,
    pub expiry: ExpiryPolicy,
    pub password: Option<String>,
    pub utm_enabled: bool,
}

impl NewLink {
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            alias: None,
            owner_id: None,
            expiry: ExpiryPolicy::Never,
            password: None,
            utm_enabled: false,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_expiry(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_utm(mut self, enabled: bool) -> Self {
        self.utm_enabled = enabled;
        self
    }
}

struct LinkEntry {
    /// Insertion order, used for listing
    seq: u64,
    record: LinkRecord,
    stats: ClickStats,
}

pub struct Registry {
    links: DashMap<String, LinkEntry>,
    next_seq: AtomicU64,
    settings: RegistrySettings,
    changes: watch::Sender<u64>,
}

impl Registry {
    pub fn new(mut settings: RegistrySettings) -> Self {
        if settings.alias_length == 0 {
            warn!("generated alias length of 0 is unusable, using 1");
            settings.alias_length = 1;
        }
        let (changes, _) = watch::channel(0);
        Self {
            links: DashMap::new(),
            next_seq: AtomicU64::new(0),
            settings,
            changes,
        }
    }

    /// Rebuild a registry from a persisted document.
    ///
    /// Links are ordered by creation time, then alias. Analytics without a
    /// matching link are dropped.
    pub fn from_document(settings: RegistrySettings, document: PersistedDocument) -> Self {
        let registry = Self::new(settings);
        let PersistedDocument {
            links,
            mut analytics,
        } = document;

        let mut records: Vec<LinkRecord> = links.into_values().collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.alias.cmp(&b.alias))
        });

        for record in records {
            let stats = analytics.remove(&record.alias).unwrap_or_default();
            let seq = registry.reserve_seq();
            registry
                .links
                .insert(record.alias.clone(), LinkEntry { seq, record, stats });
        }

        if !analytics.is_empty() {
            debug!(
                orphaned = analytics.len(),
                "dropping analytics for links that no longer exist"
            );
        }
        registry
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    fn reserve_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    fn notify_changed(&self) {
        self.changes.send_modify(|generation| *generation += 1);
    }

    /// Receiver that observes a counter bumped on every mutation
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Number of mutations applied so far
    pub fn generation(&self) -> u64 {
        *self.changes.borrow()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn create_link(&self, new: NewLink) -> RegistryResult<String> {
        self.create_link_at(new, Utc::now())
    }

    /// Create a link as of `now`; returns the requested or generated alias.
    pub fn create_link_at(&self, new: NewLink, now: DateTime<Utc>) -> RegistryResult<String> {
        validate::validate_target_url(&new.target_url)?;
        if let Some(requested) = new.alias.as_deref() {
            alias::validate_requested_alias(
                requested,
                self.settings.max_alias_length,
                &self.settings.reserved,
            )?;
        }
        let expires_at = new.expiry.resolve(now)?;

        let mut record = LinkRecord {
            alias: String::new(),
            target_url: new.target_url,
            owner_id: new.owner_id,
            created_at: now,
            click_count: 0,
            expires_at,
            password_hash: secret::process_new_secret(new.password.as_deref())
                .map_err(|e| RegistryError::Internal(e.to_string()))?,
            utm_enabled: new.utm_enabled,
        };

        let alias = match new.alias {
            Some(requested) => match self.links.entry(requested.clone()) {
                Entry::Occupied(_) => return Err(RegistryError::AliasConflict),
                Entry::Vacant(slot) => {
                    record.alias.clone_from(&requested);
                    slot.insert(LinkEntry {
                        seq: self.reserve_seq(),
                        record,
                        stats: ClickStats::default(),
                    });
                    requested
                }
            },
            None => loop {
                let candidate = alias::generate_alias(self.settings.alias_length);
                if self.settings.reserved.contains(&candidate) {
                    continue;
                }
                if let Entry::Vacant(slot) = self.links.entry(candidate.clone()) {
                    record.alias.clone_from(&candidate);
                    slot.insert(LinkEntry {
                        seq: self.reserve_seq(),
                        record,
                        stats: ClickStats::default(),
                    });
                    break candidate;
                }
                debug!(alias = %candidate, "generated alias collided, retrying");
            },
        };

        self.notify_changed();
        info!(alias = %alias, expiry = %new.expiry, "created link");
        Ok(alias)
    }

    pub fn resolve(
        &self,
        alias: &str,
        password: Option<&str>,
        visit: &Visit,
    ) -> RegistryResult<String> {
        self.resolve_at(alias, password, visit, Utc::now())
    }

    /// Resolve an alias for a redirect as of `now`, counting the click.
    ///
    /// The returned target is always usable as a `Location` header value.
    pub fn resolve_at(
        &self,
        alias: &str,
        password: Option<&str>,
        visit: &Visit,
        now: DateTime<Utc>,
    ) -> RegistryResult<String> {
        let event = self
            .settings
            .analytics_enabled
            .then(|| ClickEvent::from_visit(visit, now));

        // Password verification is slow, so it runs without holding the shard lock
        let checked_hash = {
            let entry = self.links.get(alias).ok_or(RegistryError::NotFound)?;
            if entry.record.is_expired(now) {
                return Err(RegistryError::Expired);
            }
            entry.record.password_hash.clone()
        };
        if let Some(hash) = checked_hash.as_deref() {
            if !password.is_some_and(|supplied| secret::verify_secret(supplied, hash)) {
                return Err(RegistryError::PasswordRequired);
            }
        }

        let target = {
            let mut guard = self.links.get_mut(alias).ok_or(RegistryError::NotFound)?;
            let entry = &mut *guard;

            // The alias may have been deleted and recreated in between
            if entry.record.password_hash != checked_hash {
                return Err(RegistryError::PasswordRequired);
            }
            if entry.record.is_expired(now) {
                return Err(RegistryError::Expired);
            }

            let target = if entry.record.utm_enabled {
                utm::decorate(&entry.record.target_url, alias, now, &self.settings.utm)
            } else {
                entry.record.target_url.clone()
            };
            let Some(location) = validate::redirect_location(&target) else {
                warn!(alias = %alias, target_url = %target, "stored target is not a usable redirect location");
                return Err(RegistryError::UnusableTarget);
            };

            entry.record.click_count += 1;
            if let Some(event) = event {
                entry.stats.record(event, self.settings.max_click_events);
            }
            location
        };

        self.notify_changed();
        debug!(alias = %alias, "resolved link");
        Ok(target)
    }

    /// Remove a link and its analytics.
    pub fn delete_link(&self, alias: &str, requester: Option<&str>) -> RegistryResult<()> {
        match self.links.entry(alias.to_string()) {
            Entry::Vacant(_) => Err(RegistryError::NotFound),
            Entry::Occupied(slot) => {
                if !self.may_delete(&slot.get().record, requester) {
                    return Err(RegistryError::Unauthorized);
                }
                slot.remove();
                self.notify_changed();
                info!(alias = %alias, "deleted link");
                Ok(())
            }
        }
    }

    fn may_delete(&self, record: &LinkRecord, requester: Option<&str>) -> bool {
        if !self.settings.enforce_ownership {
            return true;
        }
        match record.owner_id.as_deref() {
            None => true,
            Some(owner) => requester == Some(owner),
        }
    }

    /// Links in insertion order, filtered to `owner` when given.
    pub fn list_links(&self, owner: Option<&str>) -> Vec<LinkRecord> {
        let mut found: Vec<(u64, LinkRecord)> = self
            .links
            .iter()
            .filter(|entry| owner.is_none() || entry.record.owner_id.as_deref() == owner)
            .map(|entry| (entry.seq, entry.record.clone()))
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found.into_iter().map(|(_, record)| record).collect()
    }

    pub fn link(&self, alias: &str) -> RegistryResult<LinkRecord> {
        self.links
            .get(alias)
            .map(|entry| entry.record.clone())
            .ok_or(RegistryError::NotFound)
    }

    /// A link together with its click analytics
    pub fn stats(&self, alias: &str) -> RegistryResult<(LinkRecord, ClickStats)> {
        self.links
            .get(alias)
            .map(|entry| (entry.record.clone(), entry.stats.clone()))
            .ok_or(RegistryError::NotFound)
    }

    /// Copy the full state into a persistable document
    pub fn snapshot(&self) -> PersistedDocument {
        let mut document = PersistedDocument::default();
        for entry in self.links.iter() {
            let alias = entry.key().clone();
            if !entry.stats.is_empty() {
                document.analytics.insert(alias.clone(), entry.stats.clone());
            }
            document.links.insert(alias, entry.record.clone());
        }
        document
    }
}
