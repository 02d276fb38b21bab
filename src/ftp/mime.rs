//! Mime type and encoding guessing from file names.
//!
//! FTP gives us no headers, so the type of a listed file is inferred from its
//! extension alone. A trailing compression suffix (`.gz`, `.bz2`, ...) becomes
//! the encoding and the extension before it decides the mime type, so
//! `dados.csv.gz` is `text/csv` encoded with `gzip`.

/// Shorthand suffixes expanded before lookup.
const SUFFIX_ALIASES: &[(&str, &str)] = &[
    ("tgz", ".tar.gz"),
    ("taz", ".tar.gz"),
    ("tz", ".tar.gz"),
    ("tbz2", ".tar.bz2"),
    ("txz", ".tar.xz"),
];

/// Compression suffixes and the encoding they denote.
const ENCODINGS: &[(&str, &str)] = &[
    ("gz", "gzip"),
    ("z", "compress"),
    ("bz2", "bzip2"),
    ("xz", "xz"),
    ("br", "br"),
];

/// Extension to mime type, covering formats common in open-data catalogs.
const TYPES: &[(&str, &str)] = &[
    ("csv", "text/csv"),
    ("tsv", "text/tab-separated-values"),
    ("txt", "text/plain"),
    ("dat", "text/plain"),
    ("json", "application/json"),
    ("geojson", "application/geo+json"),
    ("jsonld", "application/ld+json"),
    ("xml", "text/xml"),
    ("rdf", "application/rdf+xml"),
    ("ttl", "text/turtle"),
    ("nt", "application/n-triples"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("odt", "application/vnd.oasis.opendocument.text"),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ods", "application/vnd.oasis.opendocument.spreadsheet"),
    ("ppt", "application/vnd.ms-powerpoint"),
    ("zip", "application/zip"),
    ("tar", "application/x-tar"),
    ("7z", "application/x-7z-compressed"),
    ("rar", "application/vnd.rar"),
    ("kml", "application/vnd.google-earth.kml+xml"),
    ("kmz", "application/vnd.google-earth.kmz"),
    ("shp", "application/x-esri-shape"),
    ("dbf", "application/x-dbf"),
    ("parquet", "application/vnd.apache.parquet"),
    ("sql", "application/sql"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("mp4", "video/mp4"),
    ("mp3", "audio/mpeg"),
];

fn lookup(table: &[(&'static str, &'static str)], ext: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, v)| *v)
}

fn split_ext(name: &str) -> Option<(&str, &str)> {
    let idx = name.rfind('.')?;
    // Dotfiles like ".profile" have no extension
    if idx == 0 {
        return None;
    }
    Some((&name[..idx], &name[idx + 1..]))
}

/// Guesses `(mime_type, encoding)` from a file name.
pub fn guess_type(name: &str) -> (Option<String>, Option<String>) {
    let mut name = name.to_string();

    if let Some((stem, ext)) = split_ext(&name) {
        if let Some(expanded) = lookup(SUFFIX_ALIASES, ext) {
            name = format!("{stem}{expanded}");
        }
    }

    let mut encoding = None;
    if let Some((stem, ext)) = split_ext(&name) {
        if let Some(enc) = lookup(ENCODINGS, ext) {
            encoding = Some(enc.to_string());
            name = stem.to_string();
        }
    }

    let mime_type = split_ext(&name)
        .and_then(|(_, ext)| lookup(TYPES, ext))
        .map(str::to_string);

    (mime_type, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_guess(name: &str, mime: Option<&str>, encoding: Option<&str>) {
        let (m, e) = guess_type(name);
        assert_eq!((m.as_deref(), e.as_deref()), (mime, encoding), "{name}");
    }

    #[test]
    fn test_guess_plain_extensions() {
        assert_guess("dados.csv", Some("text/csv"), None);
        assert_guess("DADOS.CSV", Some("text/csv"), None);
        assert_guess("report.pdf", Some("application/pdf"), None);
        assert_guess("bundle.zip", Some("application/zip"), None);
    }

    #[test]
    fn test_guess_compressed() {
        assert_guess("dados.csv.gz", Some("text/csv"), Some("gzip"));
        assert_guess("dump.sql.bz2", Some("application/sql"), Some("bzip2"));
        assert_guess("archive.tgz", Some("application/x-tar"), Some("gzip"));
        assert_guess("raw.gz", None, Some("gzip"));
    }

    #[test]
    fn test_guess_unknown() {
        assert_guess("README", None, None);
        assert_guess(".profile", None, None);
        assert_guess("data.unknownext", None, None);
    }
}
