//! Probe orchestration.
//!
//! Classifies the input, fails invalid and unsupported locators on the spot,
//! and dispatches the rest: each HTTP locator and each FTP parent directory is
//! one task. Tasks run on a semaphore-bounded pool; with the default
//! concurrency of one they run strictly one after another.
//!
//! Every input element yields exactly one record, whatever happens: probe
//! failures, fatal FTP errors, task panics and cancellation all produce
//! failure records.

mod grouping;

use std::future::Future;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::OwnedSemaphorePermit;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error_handling::{InitializationError, OutcomeType, ProbeError, ProbeStats, RunError};
use crate::ftp::{DirectoryCache, FtpProbe, FtpProber};
use crate::http::{HttpProbe, HttpProber};
use crate::initialization::{init_client, init_semaphore};
use crate::locator::ParentKey;
use crate::record::ProbeRecord;

use grouping::{plan, Job};

enum JobOutput {
    Records(Vec<ProbeRecord>),
    FtpFatal { key: ParentKey, error: ProbeError },
}

/// Dispatches locators to the protocol probers.
pub struct Orchestrator {
    http: Arc<dyn HttpProbe>,
    ftp: Arc<dyn FtpProbe>,
    max_host_length: usize,
    max_concurrency: usize,
    abort_on_ftp_error: bool,
    stats: Arc<ProbeStats>,
}

impl Orchestrator {
    /// Creates an orchestrator around the given probers.
    ///
    /// Host length limit, concurrency and the FTP abort switch come from `config`.
    pub fn new(http: Arc<dyn HttpProbe>, ftp: Arc<dyn FtpProbe>, config: &Config) -> Self {
        Self {
            http,
            ftp,
            max_host_length: config.max_host_length,
            max_concurrency: config.max_concurrency.max(1),
            abort_on_ftp_error: config.abort_on_ftp_error,
            stats: Arc::new(ProbeStats::new()),
        }
    }

    /// Creates an orchestrator with network probers built from `config`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, InitializationError> {
        let client = init_client(config)?;
        Ok(Self::new(
            Arc::new(HttpProber::from_config(client, config)),
            Arc::new(FtpProber::from_config(config)),
            config,
        ))
    }

    /// Outcome counters of the current (or last) run.
    ///
    /// The counters are reset when a run starts.
    pub fn stats(&self) -> Arc<ProbeStats> {
        Arc::clone(&self.stats)
    }

    /// Probes every locator and returns one record per input element.
    ///
    /// Record order is not guaranteed.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::FatalFtp`] when `abort_on_ftp_error` is set and an
    /// FTP server refuses the connection.
    pub async fn run<S: AsRef<str>>(&self, raws: &[S]) -> Result<Vec<ProbeRecord>, RunError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let result = self.run_into(raws, tx, CancellationToken::new()).await;

        let mut records = Vec::with_capacity(raws.len());
        while let Some(record) = rx.recv().await {
            records.push(record);
        }
        result.map(|()| records)
    }

    /// Probes every locator, sending each record on `sink` as soon as it exists.
    ///
    /// Once `cancel` fires no new task is dispatched; tasks already running
    /// finish, and every locator not yet dispatched gets a `Cancelled` record.
    /// FTP listings are cached for this run only.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::FatalFtp`] when `abort_on_ftp_error` is set and an
    /// FTP server refuses the connection. Dispatch stops as with cancellation,
    /// and all records are still sent before returning.
    pub async fn run_into<S: AsRef<str>>(
        &self,
        raws: &[S],
        sink: UnboundedSender<ProbeRecord>,
        cancel: CancellationToken,
    ) -> Result<(), RunError> {
        self.stats.reset();
        let plan = plan(raws, self.max_host_length);
        info!(
            "Probing {} locators: {} jobs, {} settled without network",
            raws.len(),
            plan.jobs.len(),
            plan.immediate.len()
        );
        for record in plan.immediate {
            self.emit(&sink, record);
        }

        let semaphore = init_semaphore(self.max_concurrency);
        let cache = Arc::new(DirectoryCache::new());
        let mut pending = plan.jobs.into_iter().peekable();
        let mut tasks = FuturesUnordered::new();
        let mut fatal: Option<RunError> = None;

        while fatal.is_none() && pending.peek().is_some() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Cancellation requested, no new probes will start");
                    break;
                }
                Some((covered, result)) = tasks.next(), if !tasks.is_empty() => {
                    self.complete(&sink, covered, result, &mut fatal);
                }
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    let Ok(permit) = permit else {
                        warn!("Semaphore closed, stopping dispatch");
                        break;
                    };
                    if let Some(job) = pending.next() {
                        tasks.push(self.spawn_job(job, permit, Arc::clone(&cache)));
                    }
                }
            }
        }

        let undispatched: Vec<Job> = pending.collect();
        if !undispatched.is_empty() {
            info!("{} jobs were not dispatched", undispatched.len());
        }
        for job in undispatched {
            for raw in job.raws() {
                self.emit(&sink, ProbeRecord::failed(raw, OutcomeType::Cancelled));
            }
        }

        while let Some((covered, result)) = tasks.next().await {
            self.complete(&sink, covered, result, &mut fatal);
        }

        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn spawn_job(
        &self,
        job: Job,
        permit: OwnedSemaphorePermit,
        cache: Arc<DirectoryCache>,
    ) -> impl Future<Output = (Vec<String>, Result<JobOutput, JoinError>)> {
        let raws = job.raws();
        let http = Arc::clone(&self.http);
        let ftp = Arc::clone(&self.ftp);

        let handle = tokio::spawn(async move {
            let _permit = permit;
            match job {
                Job::Http(locator) => JobOutput::Records(vec![http.probe(&locator).await]),
                Job::FtpGroup(key, locators) => match ftp.probe_group(&key, &locators, &cache).await {
                    Ok(records) => JobOutput::Records(records),
                    Err(error) => JobOutput::FtpFatal { key, error },
                },
            }
        });

        async move { (raws, handle.await) }
    }

    fn complete(
        &self,
        sink: &UnboundedSender<ProbeRecord>,
        raws: Vec<String>,
        result: Result<JobOutput, JoinError>,
        fatal: &mut Option<RunError>,
    ) {
        match result {
            Ok(JobOutput::Records(records)) => {
                for record in records {
                    self.emit(sink, record);
                }
            }
            Ok(JobOutput::FtpFatal { key, error }) => {
                error!("Cannot use FTP server for {}: {}", key, error);
                for raw in raws {
                    self.emit(sink, ProbeRecord::failed(raw, OutcomeType::FtpFatal));
                }
                if self.abort_on_ftp_error && fatal.is_none() {
                    *fatal = Some(RunError::FatalFtp {
                        parent: key.to_string(),
                        source: error,
                    });
                }
            }
            Err(join_error) => {
                warn!("Probe task failed: {:?}", join_error);
                for raw in raws {
                    self.emit(sink, ProbeRecord::failed(raw, OutcomeType::TaskFailed));
                }
            }
        }
    }

    fn emit(&self, sink: &UnboundedSender<ProbeRecord>, record: ProbeRecord) {
        self.stats.increment(record.outcome());
        debug!("{}", record);
        if sink.send(record).is_err() {
            debug!("Record receiver dropped");
        }
    }
}
