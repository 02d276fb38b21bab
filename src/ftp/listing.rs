//! FTP `LIST` output parsing.
//!
//! Servers answer `LIST` with free-form text. Two layouts cover nearly all
//! catalog hosts: Unix `ls -l` and the MS-DOS/IIS style. Lines in neither
//! layout (including `total N` headers) are skipped.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use log::debug;
use regex::Regex;
use url::Url;

use super::mime::guess_type;
use crate::config::FTP_DEFAULT_PORT;
use crate::locator::ParentKey;

static UNIX_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<type>[-dlbcps])[rwxsStT-]{9}[+@.]?\s+\d+\s+\S+\s+(?:\S+\s+)?(?P<size>\d+)\s+(?P<month>[A-Za-z]{3})\s+(?P<day>\d{1,2})\s+(?P<time>\d{1,2}:\d{2}|\d{4})\s(?P<name>.+)$",
    )
    .expect("valid unix listing regex")
});

static DOS_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<month>\d{2})-(?P<day>\d{2})-(?P<year>\d{2}|\d{4})\s+(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[AaPp][Mm])\s+(?P<size><DIR>|\d+)\s+(?P<name>.+)$",
    )
    .expect("valid dos listing regex")
});

/// Type flag of a listing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink { target: String },
    /// Devices, pipes, sockets
    Other,
}

/// One parsed line of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub modified: Option<NaiveDateTime>,
}

/// A downloadable file kept from a listing, with its inferred metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: Option<u64>,
    pub modified: Option<NaiveDateTime>,
    /// Absolute location when the entry is a link to another file
    pub redirect: Option<String>,
    pub mime_type: Option<String>,
    pub encoding: Option<String>,
}

impl FileEntry {
    /// Modification time rendered as an HTTP-date.
    pub fn last_modified(&self) -> Option<String> {
        self.modified
            .map(|m| m.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
    }
}

/// Downloadable files of one directory, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    files: HashMap<String, FileEntry>,
}

impl Listing {
    /// Parses raw `LIST` output for the directory identified by `key`.
    ///
    /// Directories and special files are dropped. Symlinks are kept only when
    /// their target does not denote a directory; the target, resolved against
    /// the directory, becomes the entry's redirect.
    pub fn parse(key: &ParentKey, raw: &str, now: NaiveDateTime) -> Self {
        let mut files = HashMap::new();

        for entry in raw.lines().filter_map(|line| parse_line(line, now)) {
            let redirect = match &entry.kind {
                EntryKind::File => None,
                EntryKind::Symlink { target } if !is_directory_target(target) => {
                    match resolve_target(key, target) {
                        Some(url) => Some(url),
                        None => {
                            debug!("Skipping link {} with unresolvable target {}", entry.name, target);
                            continue;
                        }
                    }
                }
                _ => continue,
            };

            let (mut mime_type, mut encoding) = guess_type(&entry.name);
            if let (None, None, EntryKind::Symlink { target }) = (&mime_type, &encoding, &entry.kind) {
                (mime_type, encoding) = guess_type(target);
            }

            files.insert(
                entry.name.clone(),
                FileEntry {
                    name: entry.name,
                    size: entry.size,
                    modified: entry.modified,
                    redirect,
                    mime_type,
                    encoding,
                },
            );
        }

        Listing { files }
    }

    pub fn get(&self, name: &str) -> Option<&FileEntry> {
        self.files.get(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_directory_target(target: &str) -> bool {
    target.ends_with('/') || target == "." || target == ".."
}

fn resolve_target(key: &ParentKey, target: &str) -> Option<String> {
    let port = match key.port {
        Some(port) if port != FTP_DEFAULT_PORT => format!(":{port}"),
        _ => String::new(),
    };
    let dir = if key.is_root() {
        "/".to_string()
    } else {
        format!("{}/", key.parent)
    };
    let base = Url::parse(&format!("{}://{}{}{}", key.scheme, key.host, port, dir)).ok()?;
    base.join(target).ok().map(String::from)
}

/// Parses one listing line in either supported layout.
pub fn parse_line(line: &str, now: NaiveDateTime) -> Option<RawEntry> {
    let line = line.trim_end_matches(['\r', '\n']);
    parse_unix_line(line, now).or_else(|| parse_dos_line(line))
}

fn parse_unix_line(line: &str, now: NaiveDateTime) -> Option<RawEntry> {
    let caps = UNIX_LINE.captures(line)?;
    let name_field = caps.name("name")?.as_str();

    let (name, kind) = match &caps["type"] {
        "-" => (name_field.to_string(), EntryKind::File),
        "d" => (name_field.to_string(), EntryKind::Directory),
        "l" => match name_field.split_once(" -> ") {
            Some((name, target)) => (
                name.to_string(),
                EntryKind::Symlink {
                    target: target.to_string(),
                },
            ),
            None => (name_field.to_string(), EntryKind::Other),
        },
        _ => (name_field.to_string(), EntryKind::Other),
    };

    if name == "." || name == ".." {
        return None;
    }

    Some(RawEntry {
        name,
        kind,
        size: caps["size"].parse().ok(),
        modified: unix_timestamp(&caps["month"], &caps["day"], &caps["time"], now),
    })
}

fn month_number(abbr: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(abbr))
        .map(|i| i as u32 + 1)
}

// `ls` shows "Mon DD HH:MM" for recent files (year omitted) and "Mon DD YYYY"
// otherwise. A year-less date takes the latest year in which it exists and is
// at most a day in the future (Feb 29 may go back to the last leap year).
fn unix_timestamp(month: &str, day: &str, time: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let month = month_number(month)?;
    let day: u32 = day.parse().ok()?;

    if let Some((hour, minute)) = time.split_once(':') {
        let hour: u32 = hour.parse().ok()?;
        let minute: u32 = minute.parse().ok()?;
        let latest = now + ChronoDuration::days(1);
        // Leap years are at most eight years apart
        (0..=8)
            .filter_map(|back| NaiveDate::from_ymd_opt(now.year() - back, month, day))
            .filter_map(|date| date.and_hms_opt(hour, minute, 0))
            .find(|candidate| *candidate <= latest)
    } else {
        let year: i32 = time.parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
    }
}

fn parse_dos_line(line: &str) -> Option<RawEntry> {
    let caps = DOS_LINE.captures(line)?;

    let month: u32 = caps["month"].parse().ok()?;
    let day: u32 = caps["day"].parse().ok()?;
    let mut year: i32 = caps["year"].parse().ok()?;
    if year < 100 {
        // Two-digit years: 70-99 are 19xx, the rest 20xx
        year += if year >= 70 { 1900 } else { 2000 };
    }
    let mut hour: u32 = caps["hour"].parse().ok()?;
    let minute: u32 = caps["minute"].parse().ok()?;
    let pm = caps["ampm"].eq_ignore_ascii_case("pm");
    if hour == 12 {
        hour = 0;
    }
    if pm {
        hour += 12;
    }
    let modified = NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(hour, minute, 0));

    let name = caps["name"].to_string();
    let (kind, size) = match &caps["size"] {
        "<DIR>" => (EntryKind::Directory, None),
        size => (EntryKind::File, size.parse().ok()),
    };

    Some(RawEntry {
        name,
        kind,
        size,
        modified,
    })
}
