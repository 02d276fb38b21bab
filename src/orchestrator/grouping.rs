//! Splitting raw input into probe jobs.

use std::collections::HashMap;

use log::{info, warn};

use crate::error_handling::OutcomeType;
use crate::locator::{classify, Locator, LocatorKind, ParentKey};
use crate::record::ProbeRecord;

/// One unit of dispatch: a single HTTP locator or a whole FTP directory.
#[derive(Debug, Clone)]
pub(crate) enum Job {
    Http(Locator),
    FtpGroup(ParentKey, Vec<Locator>),
}

impl Job {
    /// Raw strings of every locator covered by this job.
    pub(crate) fn raws(&self) -> Vec<String> {
        match self {
            Job::Http(locator) => vec![locator.raw().to_string()],
            Job::FtpGroup(_, locators) => locators.iter().map(|l| l.raw().to_string()).collect(),
        }
    }
}

/// Classified input: records needing no network, and jobs in first-appearance order.
#[derive(Debug, Default)]
pub(crate) struct Plan {
    pub immediate: Vec<ProbeRecord>,
    pub jobs: Vec<Job>,
}

/// Classifies every raw locator and groups FTP locators by parent directory.
pub(crate) fn plan<S: AsRef<str>>(raws: &[S], max_host_length: usize) -> Plan {
    let mut plan = Plan::default();
    let mut ftp_groups: HashMap<ParentKey, usize> = HashMap::new();

    for raw in raws {
        let locator = match classify(raw.as_ref(), max_host_length) {
            Ok(locator) => locator,
            Err(invalid) => {
                warn!("Skipping {}", invalid);
                plan.immediate
                    .push(ProbeRecord::failed(invalid.raw, OutcomeType::InvalidLocator));
                continue;
            }
        };

        match locator.kind() {
            LocatorKind::Http => plan.jobs.push(Job::Http(locator)),
            LocatorKind::Ftp => {
                let key = locator.parent_key();
                match ftp_groups.get(&key) {
                    Some(&idx) => {
                        if let Job::FtpGroup(_, members) = &mut plan.jobs[idx] {
                            members.push(locator);
                        }
                    }
                    None => {
                        ftp_groups.insert(key.clone(), plan.jobs.len());
                        plan.jobs.push(Job::FtpGroup(key, vec![locator]));
                    }
                }
            }
            LocatorKind::Unsupported => {
                info!("No prober for scheme {:?}: {}", locator.scheme(), locator);
                plan.immediate
                    .push(ProbeRecord::failed(locator.raw(), OutcomeType::UnsupportedScheme));
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_HOST_LENGTH;

    #[test]
    fn test_plan_groups_ftp_siblings() {
        let raws = [
            "ftp://ftp.example.com/pub/a.csv",
            "http://example.com/x.csv",
            "ftp://ftp.example.com/pub/b.csv",
            "ftp://ftp.example.com/other/c.csv",
            "ftp://ftp.example.com/pub/d.csv",
        ];
        let plan = plan(&raws, MAX_HOST_LENGTH);

        assert!(plan.immediate.is_empty());
        assert_eq!(plan.jobs.len(), 3);
        match &plan.jobs[0] {
            Job::FtpGroup(key, members) => {
                assert_eq!(key.parent, "/pub");
                assert_eq!(members.len(), 3);
            }
            other => panic!("expected FTP group, got {other:?}"),
        }
        assert!(matches!(plan.jobs[1], Job::Http(_)));
        assert_eq!(plan.jobs[2].raws(), vec!["ftp://ftp.example.com/other/c.csv".to_string()]);
    }

    #[test]
    fn test_plan_fails_invalid_and_unsupported_immediately() {
        let long_host = format!("http://{}.com/x", "h".repeat(61));
        let raws = vec![
            "not a url".to_string(),
            "mailto:someone@example.com".to_string(),
            "gopher://example.com/1".to_string(),
            long_host.clone(),
        ];
        let plan = plan(&raws, MAX_HOST_LENGTH);

        assert!(plan.jobs.is_empty());
        let outcomes: Vec<_> = plan.immediate.iter().map(|r| (r.url(), r.outcome())).collect();
        assert_eq!(
            outcomes,
            vec![
                ("not a url", OutcomeType::InvalidLocator),
                ("mailto:someone@example.com", OutcomeType::InvalidLocator),
                ("gopher://example.com/1", OutcomeType::UnsupportedScheme),
                (long_host.as_str(), OutcomeType::InvalidLocator),
            ]
        );
    }
}
