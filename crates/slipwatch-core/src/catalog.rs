//! Catalog of documents to check during one pass.
//!
//! The catalog is rebuilt from the term listings at the start of every pass and
//! never persisted. Identities are kept in a `BTreeMap`, so iteration is always
//! in sorted identity order.
//!
//! When the same identity is listed under more than one term, the later term
//! wins. The earlier listings are not dropped silently: they are kept on the
//! winning entry as [`SupersededListing`]s.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{CatalogError, CatalogSource, Period, PeriodRange};

/// One opinion link as it appears on a term listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Link text: the case name.
    pub name: String,
    /// Absolute URL of the document.
    pub location: String,
}

impl Listing {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupersededListing {
    pub period: Period,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub identity: String,
    pub location: String,
    /// Term the winning listing came from.
    pub period: Period,
    /// Earlier listings of the same identity, oldest first.
    pub superseded: Vec<SupersededListing>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listing; a later insert for the same identity replaces the location.
    ///
    /// Returns `true` if an earlier listing was superseded.
    pub fn insert(&mut self, period: Period, listing: Listing) -> bool {
        let Listing { name, location } = listing;
        match self.entries.get_mut(&name) {
            Some(entry) => {
                debug!(
                    identity = %name,
                    old_period = %entry.period,
                    new_period = %period,
                    "listing superseded by later term"
                );
                let previous = SupersededListing {
                    period: entry.period,
                    location: std::mem::replace(&mut entry.location, location),
                };
                entry.superseded.push(previous);
                entry.period = period;
                true
            }
            None => {
                self.entries.insert(
                    name.clone(),
                    CatalogEntry {
                        identity: name,
                        location,
                        period,
                        superseded: Vec::new(),
                    },
                );
                false
            }
        }
    }

    pub fn get(&self, identity: &str) -> Option<&CatalogEntry> {
        self.entries.get(identity)
    }

    /// Entries in sorted identity order.
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Case-insensitive regex restricting which identities are cataloged.
#[derive(Debug, Clone)]
pub struct IdentityFilter {
    pattern: Regex,
}

impl IdentityFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, identity: &str) -> bool {
        self.pattern.is_match(identity)
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Outcome of listing one term.
#[derive(Debug)]
pub struct PeriodSummary {
    pub period: Period,
    /// Number of opinion links on the listing, before filtering.
    pub listed: Result<usize, CatalogError>,
}

#[derive(Debug)]
pub struct CatalogBuild {
    pub catalog: Catalog,
    pub periods: Vec<PeriodSummary>,
}

impl CatalogBuild {
    pub fn unavailable(&self) -> impl Iterator<Item = &PeriodSummary> {
        self.periods.iter().filter(|p| p.listed.is_err())
    }
}

/// List every term in `range` and merge the results into one catalog.
///
/// Terms that cannot be listed contribute nothing and are reported in
/// [`CatalogBuild::periods`].
pub async fn build_catalog<S>(
    source: &S,
    range: PeriodRange,
    filter: Option<&IdentityFilter>,
) -> CatalogBuild
where
    S: CatalogSource + ?Sized,
{
    let mut catalog = Catalog::new();
    let mut periods = Vec::with_capacity(range.len());

    for period in range.iter() {
        match source.list_period(period).await {
            Ok(listings) => {
                let listed = listings.len();
                for listing in listings {
                    if filter.is_some_and(|f| !f.matches(&listing.name)) {
                        continue;
                    }
                    catalog.insert(period, listing);
                }
                debug!(%period, listed, "term listed");
                periods.push(PeriodSummary {
                    period,
                    listed: Ok(listed),
                });
            }
            Err(e) => {
                warn!(%period, error = %e, "skipping term");
                periods.push(PeriodSummary {
                    period,
                    listed: Err(e),
                });
            }
        }
    }

    info!(
        terms = periods.len(),
        documents = catalog.len(),
        "catalog built"
    );
    CatalogBuild { catalog, periods }
}
