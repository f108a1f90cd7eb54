//! In-memory stand-in for the opinion site.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use slipwatch_core::{
    CatalogEntry, CatalogError, CatalogSource, Listing, Period, ProbeError, RetrieveError,
    RevisionDescriptor, RevisionSource,
};

pub const T1: &str = "Mon, 22 Sep 2014 10:00:00 GMT";
pub const T2: &str = "Tue, 23 Sep 2014 08:30:00 GMT";

#[derive(Clone)]
struct Doc {
    revision: String,
    body: Vec<u8>,
    download_fails: bool,
}

#[derive(Default)]
struct State {
    docs: HashMap<String, Doc>,
    unreachable: Vec<String>,
    listings: Vec<Listing>,
    failing_terms: Vec<Period>,
    retrievals: HashMap<String, usize>,
}

#[derive(Default)]
pub struct FakeSite {
    state: Mutex<State>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(self, location: &str, revision: &str, body: &[u8]) -> Self {
        self.revise(location, revision, body);
        self
    }

    pub fn unreachable(self, location: &str) -> Self {
        self.state.lock().unwrap().unreachable.push(location.into());
        self
    }

    pub fn failing_download(self, location: &str) -> Self {
        self.set_download_fails(location, true);
        self
    }

    /// Listed under every term the catalog builder asks for.
    pub fn listed(self, name: &str, location: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .listings
            .push(Listing::new(name, location));
        self
    }

    /// Listing for `period` answers with a server error.
    pub fn failing_term(self, period: Period) -> Self {
        self.state.lock().unwrap().failing_terms.push(period);
        self
    }

    pub fn revise(&self, location: &str, revision: &str, body: &[u8]) {
        self.state.lock().unwrap().docs.insert(
            location.into(),
            Doc {
                revision: revision.into(),
                body: body.to_vec(),
                download_fails: false,
            },
        );
    }

    pub fn heal_download(&self, location: &str) {
        self.set_download_fails(location, false);
    }

    pub fn retrievals(&self, location: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.retrievals.get(location).copied().unwrap_or(0)
    }

    fn set_download_fails(&self, location: &str, fails: bool) {
        let mut state = self.state.lock().unwrap();
        if let Some(doc) = state.docs.get_mut(location) {
            doc.download_fails = fails;
        }
    }
}

#[async_trait]
impl CatalogSource for FakeSite {
    async fn list_period(&self, period: Period) -> Result<Vec<Listing>, CatalogError> {
        let state = self.state.lock().unwrap();
        if state.failing_terms.contains(&period) {
            return Err(CatalogError::PeriodUnavailable {
                period,
                reason: "server returned 503".into(),
            });
        }
        Ok(state.listings.clone())
    }
}

#[async_trait]
impl RevisionSource for FakeSite {
    async fn probe(&self, entry: &CatalogEntry) -> Result<RevisionDescriptor, ProbeError> {
        let state = self.state.lock().unwrap();
        if state.unreachable.contains(&entry.location) {
            return Err(ProbeError::Unreachable("connection refused".into()));
        }
        let doc = state
            .docs
            .get(&entry.location)
            .ok_or(ProbeError::Status { status: 404 })?;
        Ok(RevisionDescriptor {
            identity: entry.identity.clone(),
            revision: doc.revision.clone(),
            fingerprint: format!("etag-{}", entry.location),
        })
    }

    async fn retrieve(&self, location: &str) -> Result<Vec<u8>, RetrieveError> {
        let mut state = self.state.lock().unwrap();
        *state.retrievals.entry(location.to_string()).or_default() += 1;
        match state.docs.get(location) {
            Some(doc) if doc.download_fails => Err(RetrieveError::Status { status: 502 }),
            Some(doc) => Ok(doc.body.clone()),
            None => Err(RetrieveError::Status { status: 404 }),
        }
    }
}
