//! Group probing of FTP locators.
//!
//! All locators sharing a [`ParentKey`] are answered from one directory
//! listing: one connection, one `CWD`, one `LIST`. A file is reachable when
//! its name appears in the listing of its parent directory. Listings live in
//! a [`DirectoryCache`] owned by the caller for the duration of one run.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};

use super::{DirectoryCache, FtpConnector, Listing, TcpFtpConnector};
use crate::config::Config;
use crate::error_handling::{OutcomeType, ProbeError};
use crate::locator::{Credentials, Locator, ParentKey};
use crate::record::ProbeRecord;
use crate::retry::RetryPolicy;

/// Probes a group of FTP locators that share a parent directory.
#[async_trait]
pub trait FtpProbe: Send + Sync {
    /// Returns one record per locator, in input order.
    ///
    /// The listing of `key` is looked up in `cache` first and stored there
    /// once fetched.
    ///
    /// # Errors
    ///
    /// Returns the connection error when the server cannot be used at all
    /// (refused, unresolvable, login rejected). Timeouts and listing failures
    /// are not errors; they become failed records.
    async fn probe_group(
        &self,
        key: &ParentKey,
        locators: &[Locator],
        cache: &DirectoryCache,
    ) -> Result<Vec<ProbeRecord>, ProbeError>;
}

enum GroupFailure {
    ConnectTimeout(ProbeError),
    Listing(ProbeError),
    Fatal(ProbeError),
}

/// FTP prober backed by a connector.
pub struct FtpProber {
    connector: Arc<dyn FtpConnector>,
    policy: RetryPolicy,
}

impl FtpProber {
    pub fn new(connector: Arc<dyn FtpConnector>, policy: RetryPolicy) -> Self {
        Self { connector, policy }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(TcpFtpConnector::from_config(config)),
            RetryPolicy::from_config(config),
        )
    }

    async fn fetch_listing(
        &self,
        key: &ParentKey,
        credentials: Option<&Credentials>,
    ) -> Result<Listing, GroupFailure> {
        let label = key.to_string();
        let connected = self
            .policy
            .execute(
                &label,
                || self.connector.connect(key, credentials),
                |e: &ProbeError| e.is_timeout(),
            )
            .await;

        let mut session = match connected.result {
            Ok(session) => session,
            Err(e) if e.is_timeout() => return Err(GroupFailure::ConnectTimeout(e)),
            Err(e) => return Err(GroupFailure::Fatal(e)),
        };

        let listed = async {
            if !key.is_root() {
                session.cwd(&key.parent).await?;
            }
            session.list().await
        }
        .await;

        if let Err(e) = session.quit().await {
            debug!("QUIT failed for {}: {}", label, e);
        }

        let raw = listed.map_err(GroupFailure::Listing)?;
        let listing = Listing::parse(key, &raw, Utc::now().naive_utc());
        debug!("Listed {} files in {}", listing.len(), label);
        Ok(listing)
    }
}

fn records_from_listing(listing: &Listing, locators: &[Locator]) -> Vec<ProbeRecord> {
    locators
        .iter()
        .map(|locator| match listing.get(&locator.file_name()) {
            Some(entry) => ProbeRecord::from_ftp_entry(locator.raw(), entry),
            None => {
                debug!("{} not found in its directory listing", locator);
                ProbeRecord::failed(locator.raw(), OutcomeType::FtpNotFound)
            }
        })
        .collect()
}

fn failed_records(locators: &[Locator], outcome: OutcomeType) -> Vec<ProbeRecord> {
    locators
        .iter()
        .map(|locator| ProbeRecord::failed(locator.raw(), outcome))
        .collect()
}

#[async_trait]
impl FtpProbe for FtpProber {
    async fn probe_group(
        &self,
        key: &ParentKey,
        locators: &[Locator],
        cache: &DirectoryCache,
    ) -> Result<Vec<ProbeRecord>, ProbeError> {
        let credentials = locators.first().and_then(Locator::credentials);

        let listing = cache
            .get_or_list(key, || self.fetch_listing(key, credentials.as_ref()))
            .await;

        match listing {
            Ok(listing) => Ok(records_from_listing(&listing, locators)),
            Err(GroupFailure::ConnectTimeout(e)) => {
                warn!(
                    "Connection to {} timed out ({}), {} locators unreachable",
                    key,
                    e,
                    locators.len()
                );
                Ok(failed_records(locators, OutcomeType::FtpConnectTimeout))
            }
            Err(GroupFailure::Listing(e)) => {
                warn!("Could not list {}: {}", key, e);
                Ok(failed_records(locators, OutcomeType::FtpListingFailed))
            }
            Err(GroupFailure::Fatal(e)) => Err(e),
        }
    }
}
