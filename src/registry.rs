//! Generation-time site registry and JSON manifest.
//!
//! The resolution path cannot tell whether two sites that share an id were
//! meant to mutate together. The generator records every site here and
//! [`SiteRegistry::validate`] rejects ids shared across change groups.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchError};
use crate::selector::{MutantId, SiteId, SiteRange};
use crate::site::VariantSite;

/// Manifest format version written by [`SiteRegistry::save`].
pub const MANIFEST_VERSION: u32 = 1;

/// One instrumented site as recorded by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Assigned id.
    pub id: SiteId,
    /// Human-readable location, e.g. `lib.c:24`.
    pub label: String,
    /// Change the site belongs to. Sites of one group mutate together.
    pub change_group: String,
    /// Ids reported to the pre-selection hook.
    pub range: SiteRange,
}

impl SiteRecord {
    /// Variant site matching this record.
    pub fn site(&self) -> VariantSite {
        VariantSite::assigned(self.id).with_range(self.range)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SiteManifest {
    version: u32,
    sites: Vec<SiteRecord>,
}

/// Ordered collection of site records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRegistry {
    sites: Vec<SiteRecord>,
    // `None` once `u32::MAX` is taken.
    next_id: Option<SiteId>,
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteRegistry {
    /// Empty registry; the first allocated id is 1.
    pub fn new() -> Self {
        Self {
            sites: Vec::new(),
            next_id: Some(SiteId::FIRST),
        }
    }

    /// Record a new site. Reuses the id of an existing site in the same change group.
    ///
    /// Fails with [`SwitchError::IdSpaceExhausted`] when a new group needs an
    /// id and `u32::MAX` is already taken.
    pub fn allocate(
        &mut self,
        label: impl Into<String>,
        change_group: impl Into<String>,
    ) -> Result<VariantSite> {
        let change_group = change_group.into();
        let existing = self
            .sites
            .iter()
            .find(|record| record.change_group == change_group)
            .map(|record| record.id);
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.next_id.ok_or(SwitchError::IdSpaceExhausted)?;
                self.next_id = id.successor();
                id
            }
        };
        let record = SiteRecord {
            id,
            label: label.into(),
            change_group,
            range: SiteRange::single(id),
        };
        let site = record.site();
        self.sites.push(record);
        Ok(site)
    }

    /// Record a site with an id chosen elsewhere. Fails on a conflicting id or inverted range.
    pub fn register(&mut self, record: SiteRecord) -> Result<VariantSite> {
        check_range(&record)?;
        if let Some(other) = self
            .sites
            .iter()
            .find(|other| other.id == record.id && other.change_group != record.change_group)
        {
            return Err(SwitchError::ConflictingSiteId {
                id: record.id,
                first: other.change_group.clone(),
                second: record.change_group,
            });
        }
        self.next_id = match (self.next_id, record.id.successor()) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
        let site = record.site();
        self.sites.push(record);
        Ok(site)
    }

    /// All records in registration order.
    pub fn sites(&self) -> &[SiteRecord] {
        &self.sites
    }

    /// Records carrying `id`.
    pub fn sites_with_id(&self, id: SiteId) -> impl Iterator<Item = &SiteRecord> {
        self.sites.iter().filter(move |record| record.id == id)
    }

    /// Distinct mutant ids a campaign has to run, ascending.
    pub fn mutant_ids(&self) -> Vec<MutantId> {
        self.sites
            .iter()
            .map(|record| MutantId::from(record.id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Check that every shared id stays within one change group and every range is ordered.
    pub fn validate(&self) -> Result<()> {
        let mut owners: BTreeMap<SiteId, &str> = BTreeMap::new();
        for record in &self.sites {
            check_range(record)?;
            match owners.get(&record.id) {
                Some(group) if *group != record.change_group => {
                    return Err(SwitchError::ConflictingSiteId {
                        id: record.id,
                        first: (*group).to_string(),
                        second: record.change_group.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    owners.insert(record.id, &record.change_group);
                }
            }
        }
        tracing::debug!(
            sites = self.sites.len(),
            mutants = owners.len(),
            "site registry validated"
        );
        Ok(())
    }

    /// Write the registry as a JSON manifest.
    pub fn save(&self, path: &Path) -> Result<()> {
        let manifest = SiteManifest {
            version: MANIFEST_VERSION,
            sites: self.sites.clone(),
        };
        let json = serde_json::to_string_pretty(&manifest)?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), sites = self.sites.len(), "wrote site manifest");
        Ok(())
    }

    /// Read and validate a JSON manifest.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let manifest: SiteManifest = serde_json::from_str(&raw)?;
        if manifest.version != MANIFEST_VERSION {
            tracing::warn!(
                found = manifest.version,
                expected = MANIFEST_VERSION,
                "site manifest version differs"
            );
        }
        let next_id = match manifest.sites.iter().map(|record| record.id).max() {
            Some(highest) => highest.successor(),
            None => Some(SiteId::FIRST),
        };
        let registry = Self {
            sites: manifest.sites,
            next_id,
        };
        registry.validate()?;
        Ok(registry)
    }
}

fn check_range(record: &SiteRecord) -> Result<()> {
    if record.range.is_ordered() {
        Ok(())
    } else {
        Err(SwitchError::InvertedRange {
            start: record.range.start,
            end: record.range.end,
        })
    }
}
