//! Crate access: local directories, zip archives, and remote crates.
//!
//! The loader resolves a crate URI to a [`RoCrate`] value exposing the
//! parsed metadata document, the RDF graph over it, and a file-existence
//! oracle for the crate's data entities. Three URI shapes are accepted:
//!
//! 1. A local filesystem path to a directory — the directory is the root.
//! 2. A local `.zip` path or a `file://` URI to a zip — read in place.
//! 3. An `http(s)://` URL to a zip — downloaded once into a
//!    content-addressed cache under the user cache directory, then handled
//!    as the zip case. Cache writes go through a temp file and an atomic
//!    rename, so concurrent validations of the same remote crate converge
//!    on a single copy.
//!
//! All loader errors are fatal and abort validation before any check runs.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use oxrdf::{Graph, NamedNode};
use serde_json::Value;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::ValidationSettings;
use crate::jsonld;

/// Well-known name of the crate metadata document.
pub const METADATA_FILE_NAME: &str = "ro-crate-metadata.json";

/// Subdirectory of the user cache directory holding downloaded crates.
const CACHE_SUBDIR: &str = "rocrate-validator";

/// Fatal errors raised while resolving and reading a crate.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// The crate URI does not point at anything readable.
    #[error("crate not found: {0}")]
    CrateNotFound(String),

    /// The crate has no `ro-crate-metadata.json` at its root.
    #[error("no {METADATA_FILE_NAME} found in {0}")]
    MetadataMissing(String),

    /// The metadata document is not parseable JSON-LD.
    #[error("malformed {METADATA_FILE_NAME}: {0}")]
    MetadataMalformed(String),

    /// The crate URI uses a scheme the loader does not handle.
    #[error("unsupported crate URI scheme: {0}")]
    UnsupportedScheme(String),

    /// A remote crate could not be downloaded.
    #[error("network error fetching {url}: {reason}")]
    NetworkError {
        /// The URL the download was attempted from.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// A zip archive could not be read.
    #[error("corrupt archive {path}: {source}")]
    ArchiveCorrupt {
        /// The archive location.
        path: String,
        /// The underlying zip error.
        source: zip::result::ZipError,
    },
}

/// How the crate's contents are reached for existence probes.
#[derive(Debug)]
enum CrateContents {
    /// Crate root is a plain directory.
    Directory(PathBuf),
    /// Crate is a zip archive; the entry name index answers probes.
    Archive(HashSet<String>),
}

/// A loaded crate: metadata document, RDF graph, and contents oracle.
///
/// Constructed once per validation call and immutable thereafter.
#[derive(Debug)]
pub struct RoCrate {
    uri: String,
    base: Url,
    metadata: Value,
    graph: Graph,
    contents: CrateContents,
}

impl RoCrate {
    /// The crate URI as supplied by the caller.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The crate base URL; relative entity `@id`s resolve against this.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The parsed metadata document.
    #[must_use]
    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    /// The RDF graph over the metadata document.
    #[must_use]
    pub fn metadata_graph(&self) -> &Graph {
        &self.graph
    }

    /// The relative `@id` of the root data entity: the `about` of the
    /// metadata descriptor, defaulting to `"./"`.
    #[must_use]
    pub fn root_relative_id(&self) -> &str {
        self.entities()
            .find(|e| {
                e.get("@id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| id == METADATA_FILE_NAME || id.ends_with(METADATA_FILE_NAME))
            })
            .and_then(|descriptor| descriptor.get("about"))
            .and_then(|about| about.get("@id"))
            .and_then(Value::as_str)
            .unwrap_or("./")
    }

    /// The IRI of the root data entity.
    #[must_use]
    pub fn root_id(&self) -> NamedNode {
        jsonld::resolve_reference(self.root_relative_id(), &self.base)
            .unwrap_or_else(|| NamedNode::new_unchecked(self.base.as_str()))
    }

    /// Iterate the entity objects of the `@graph` array.
    pub fn entities(&self) -> impl Iterator<Item = &serde_json::Map<String, Value>> {
        self.metadata
            .get("@graph")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }

    /// Look up an entity by its (relative or absolute) `@id`.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&serde_json::Map<String, Value>> {
        self.entities()
            .find(|e| e.get("@id").and_then(Value::as_str) == Some(id))
    }

    /// The root data entity, if the metadata declares one.
    #[must_use]
    pub fn root_entity(&self) -> Option<&serde_json::Map<String, Value>> {
        self.entity(self.root_relative_id())
    }

    /// The profile URIs the crate's root entity declares through
    /// `conformsTo`, in declaration order.
    #[must_use]
    pub fn conforms_to(&self) -> Vec<String> {
        let Some(root) = self.root_entity() else {
            return Vec::new();
        };
        let Some(value) = root.get("conformsTo") else {
            return Vec::new();
        };

        let items: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => map.get("@id").and_then(Value::as_str),
                Value::String(s) => Some(s.as_str()),
                _ => None,
            })
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Whether the named data entity is present in the crate contents.
    ///
    /// Absolute URLs are treated as present (they name web resources the
    /// oracle cannot probe). A directory referenced without its trailing
    /// slash still resolves.
    #[must_use]
    pub fn file_exists(&self, relative_id: &str) -> bool {
        if Url::parse(relative_id).is_ok() {
            return true;
        }

        let trimmed = relative_id
            .trim_start_matches("./")
            .trim_end_matches('/');
        if trimmed.is_empty() {
            // The crate root itself.
            return true;
        }

        match &self.contents {
            CrateContents::Directory(root) => root.join(trimmed).exists(),
            CrateContents::Archive(names) => {
                names.contains(trimmed)
                    || names.contains(&format!("{trimmed}/"))
                    || names.iter().any(|n| n.starts_with(&format!("{trimmed}/")))
            }
        }
    }
}

/// Resolve the crate URI in `settings` and load the crate.
///
/// # Errors
///
/// Any [`LoaderError`]; all are fatal to the validation run.
pub fn load(settings: &ValidationSettings) -> Result<RoCrate, LoaderError> {
    let uri = settings.rocrate_uri.as_str();

    if uri.starts_with("http://") || uri.starts_with("https://") {
        let archive = download_remote(uri, settings.cache_dir.as_deref())?;
        return load_archive(&archive, uri.to_owned(), remote_base(uri)?);
    }

    let path = if let Some(rest) = uri.strip_prefix("file://") {
        // Accept both file:///abs/path and a bare authority-less form.
        let url = Url::parse(uri)
            .map_err(|_| LoaderError::UnsupportedScheme(uri.to_owned()))?;
        url.to_file_path()
            .map_err(|()| LoaderError::CrateNotFound(rest.to_owned()))?
    } else if uri.contains("://") {
        return Err(LoaderError::UnsupportedScheme(uri.to_owned()));
    } else {
        PathBuf::from(uri)
    };

    if !path.exists() {
        return Err(LoaderError::CrateNotFound(uri.to_owned()));
    }

    if path.is_dir() {
        load_directory(&path, uri.to_owned())
    } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("zip")) {
        let base = zip_base(&path)?;
        load_archive(&path, uri.to_owned(), base)
    } else {
        Err(LoaderError::UnsupportedScheme(uri.to_owned()))
    }
}

/// Load a crate rooted at a local directory.
fn load_directory(root: &Path, uri: String) -> Result<RoCrate, LoaderError> {
    let abs = root
        .canonicalize()
        .map_err(|_| LoaderError::CrateNotFound(uri.clone()))?;
    let base = Url::from_directory_path(&abs)
        .map_err(|()| LoaderError::CrateNotFound(uri.clone()))?;

    let metadata_path = abs.join(METADATA_FILE_NAME);
    if !metadata_path.is_file() {
        return Err(LoaderError::MetadataMissing(uri));
    }
    let raw = std::fs::read_to_string(&metadata_path)
        .map_err(|e| LoaderError::MetadataMalformed(e.to_string()))?;

    let metadata = parse_metadata(&raw)?;
    let graph = jsonld::graph_from_metadata(&metadata, &base);

    Ok(RoCrate {
        uri,
        base,
        metadata,
        graph,
        contents: CrateContents::Directory(abs),
    })
}

/// Load a crate packaged as a zip archive.
fn load_archive(archive_path: &Path, uri: String, base: Url) -> Result<RoCrate, LoaderError> {
    let file = std::fs::File::open(archive_path)
        .map_err(|_| LoaderError::CrateNotFound(uri.clone()))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|source| LoaderError::ArchiveCorrupt {
            path: uri.clone(),
            source,
        })?;

    let names: HashSet<String> = archive.file_names().map(ToOwned::to_owned).collect();

    let raw = match archive.by_name(METADATA_FILE_NAME) {
        Ok(mut entry) => {
            let mut raw = String::new();
            entry
                .read_to_string(&mut raw)
                .map_err(|e| LoaderError::MetadataMalformed(e.to_string()))?;
            raw
        }
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(LoaderError::MetadataMissing(uri));
        }
        Err(source) => {
            return Err(LoaderError::ArchiveCorrupt { path: uri, source });
        }
    };

    let metadata = parse_metadata(&raw)?;
    let graph = jsonld::graph_from_metadata(&metadata, &base);

    Ok(RoCrate {
        uri,
        base,
        metadata,
        graph,
        contents: CrateContents::Archive(names),
    })
}

/// Parse and structurally sanity-check the metadata document.
fn parse_metadata(raw: &str) -> Result<Value, LoaderError> {
    let metadata: Value =
        serde_json::from_str(raw).map_err(|e| LoaderError::MetadataMalformed(e.to_string()))?;

    if !metadata.is_object() {
        return Err(LoaderError::MetadataMalformed(
            "document root is not a JSON object".to_owned(),
        ));
    }
    match metadata.get("@graph") {
        Some(Value::Array(_)) => Ok(metadata),
        Some(_) => Err(LoaderError::MetadataMalformed(
            "@graph is not an array".to_owned(),
        )),
        None => Err(LoaderError::MetadataMalformed(
            "document has no @graph".to_owned(),
        )),
    }
}

/// Base URL for entities of a local zip crate: the zip treated as a root
/// directory (`file:///path/crate.zip/`).
fn zip_base(archive_path: &Path) -> Result<Url, LoaderError> {
    let abs = archive_path
        .canonicalize()
        .map_err(|_| LoaderError::CrateNotFound(archive_path.display().to_string()))?;
    let url = Url::from_file_path(&abs)
        .map_err(|()| LoaderError::CrateNotFound(abs.display().to_string()))?;
    Url::parse(&format!("{url}/"))
        .map_err(|_| LoaderError::CrateNotFound(abs.display().to_string()))
}

/// Base URL for entities of a remote zip crate.
fn remote_base(uri: &str) -> Result<Url, LoaderError> {
    let with_slash = if uri.ends_with('/') {
        uri.to_owned()
    } else {
        format!("{uri}/")
    };
    Url::parse(&with_slash).map_err(|_| LoaderError::UnsupportedScheme(uri.to_owned()))
}

/// Download a remote crate into the content-addressed cache, returning the
/// local archive path. An existing cached copy is reused.
fn download_remote(url: &str, cache_dir: Option<&Path>) -> Result<PathBuf, LoaderError> {
    let cache_root = cache_dir.map_or_else(
        || {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(CACHE_SUBDIR)
        },
        Path::to_path_buf,
    );
    std::fs::create_dir_all(&cache_root).map_err(|e| LoaderError::NetworkError {
        url: url.to_owned(),
        reason: format!("cannot create cache directory: {e}"),
    })?;

    let key = hex::encode(Sha256::digest(url.as_bytes()));
    let target = cache_root.join(format!("{key}.zip"));
    if target.is_file() {
        log::debug!("remote crate cache hit: {url} -> {}", target.display());
        return Ok(target);
    }

    log::debug!("downloading remote crate: {url}");
    let response = reqwest::blocking::get(url).map_err(|e| LoaderError::NetworkError {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    if !response.status().is_success() {
        return Err(LoaderError::NetworkError {
            url: url.to_owned(),
            reason: format!("HTTP status {}", response.status()),
        });
    }
    let bytes = response.bytes().map_err(|e| LoaderError::NetworkError {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;

    // Write-then-rename: concurrent downloads of the same URL converge.
    let tmp = cache_root.join(format!("{key}.tmp.{}", std::process::id()));
    let write_result = std::fs::File::create(&tmp)
        .and_then(|mut f| f.write_all(&bytes).and_then(|()| f.flush()))
        .and_then(|()| std::fs::rename(&tmp, &target));
    write_result.map_err(|e| LoaderError::NetworkError {
        url: url.to_owned(),
        reason: format!("cannot store downloaded crate: {e}"),
    })?;

    Ok(target)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn minimal_metadata() -> Value {
        json!({
            "@context": "https://w3id.org/ro/crate/1.1/context",
            "@graph": [
                {
                    "@id": "ro-crate-metadata.json",
                    "@type": "CreativeWork",
                    "about": {"@id": "./"},
                    "conformsTo": {"@id": "https://w3id.org/ro/crate/1.1"}
                },
                {
                    "@id": "./",
                    "@type": "Dataset",
                    "name": "Test crate",
                    "conformsTo": [{"@id": "https://example.org/profiles/workflow-ro-crate/1.0"}],
                    "hasPart": [{"@id": "data/file.txt"}, {"@id": "foo"}]
                },
                {"@id": "data/file.txt", "@type": "File", "name": "data"},
                {"@id": "foo/", "@type": "Dataset", "name": "a directory"}
            ]
        })
    }

    fn write_crate(dir: &Path) {
        fs::write(
            dir.join(METADATA_FILE_NAME),
            serde_json::to_string_pretty(&minimal_metadata()).unwrap(),
        )
        .unwrap();
        let data = dir.join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("file.txt"), "payload").unwrap();
        fs::create_dir_all(dir.join("foo")).unwrap();
    }

    fn settings_for(uri: &str) -> ValidationSettings {
        ValidationSettings::new(uri)
    }

    #[test]
    fn test_load_directory_crate() {
        let dir = tempdir().unwrap();
        write_crate(dir.path());

        let rocrate = load(&settings_for(dir.path().to_str().unwrap())).unwrap();
        assert_eq!(rocrate.root_relative_id(), "./");
        assert!(rocrate.base().as_str().ends_with('/'));
        assert!(!rocrate.metadata_graph().is_empty());
        assert_eq!(
            rocrate.conforms_to(),
            vec!["https://example.org/profiles/workflow-ro-crate/1.0"]
        );
    }

    #[test]
    fn test_file_exists_directory_crate() {
        let dir = tempdir().unwrap();
        write_crate(dir.path());
        let rocrate = load(&settings_for(dir.path().to_str().unwrap())).unwrap();

        assert!(rocrate.file_exists("data/file.txt"));
        assert!(rocrate.file_exists("./data/file.txt"));
        // Directory referenced with and without its trailing slash.
        assert!(rocrate.file_exists("foo/"));
        assert!(rocrate.file_exists("foo"));
        assert!(!rocrate.file_exists("missing.txt"));
        // Web resources are not probed.
        assert!(rocrate.file_exists("https://example.org/remote.txt"));
    }

    #[test]
    fn test_load_missing_crate() {
        let err = load(&settings_for("/nonexistent/crate")).unwrap_err();
        assert!(matches!(err, LoaderError::CrateNotFound(_)));
    }

    #[test]
    fn test_load_missing_metadata() {
        let dir = tempdir().unwrap();
        let err = load(&settings_for(dir.path().to_str().unwrap())).unwrap_err();
        assert!(matches!(err, LoaderError::MetadataMissing(_)));
    }

    #[test]
    fn test_load_malformed_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE_NAME), "{not json").unwrap();
        let err = load(&settings_for(dir.path().to_str().unwrap())).unwrap_err();
        assert!(matches!(err, LoaderError::MetadataMalformed(_)));
    }

    #[test]
    fn test_load_metadata_without_graph() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(METADATA_FILE_NAME), "{\"@context\": {}}").unwrap();
        let err = load(&settings_for(dir.path().to_str().unwrap())).unwrap_err();
        assert!(matches!(err, LoaderError::MetadataMalformed(_)));
    }

    #[test]
    fn test_load_unsupported_scheme() {
        let err = load(&settings_for("ftp://example.org/crate.zip")).unwrap_err();
        assert!(matches!(err, LoaderError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_load_file_uri() {
        let dir = tempdir().unwrap();
        write_crate(dir.path());
        let uri = Url::from_directory_path(dir.path().canonicalize().unwrap())
            .unwrap()
            .to_string();
        let rocrate = load(&settings_for(&uri)).unwrap();
        assert!(rocrate.file_exists("data/file.txt"));
    }

    fn write_zip_crate(path: &Path) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer
            .start_file(METADATA_FILE_NAME, options)
            .unwrap();
        writer
            .write_all(serde_json::to_string(&minimal_metadata()).unwrap().as_bytes())
            .unwrap();
        writer.start_file("data/file.txt", options).unwrap();
        writer.write_all(b"payload").unwrap();
        writer.add_directory("foo", options).unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_load_zip_crate() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("crate.zip");
        write_zip_crate(&archive);

        let rocrate = load(&settings_for(archive.to_str().unwrap())).unwrap();
        assert!(rocrate.file_exists("data/file.txt"));
        assert!(rocrate.file_exists("foo"));
        assert!(!rocrate.file_exists("missing.txt"));
        assert!(rocrate.base().as_str().ends_with(".zip/"));
    }

    #[test]
    fn test_load_zip_without_metadata() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("crate.zip");
        let file = fs::File::create(&archive).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("other.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"x").unwrap();
        writer.finish().unwrap();

        let err = load(&settings_for(archive.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, LoaderError::MetadataMissing(_)));
    }

    #[test]
    fn test_load_corrupt_zip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("crate.zip");
        fs::write(&archive, b"this is not a zip archive").unwrap();
        let err = load(&settings_for(archive.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, LoaderError::ArchiveCorrupt { .. }));
    }

    #[test]
    fn test_root_id_resolution() {
        let dir = tempdir().unwrap();
        write_crate(dir.path());
        let rocrate = load(&settings_for(dir.path().to_str().unwrap())).unwrap();
        assert_eq!(rocrate.root_id().as_str(), rocrate.base().as_str());
    }

    #[test]
    fn test_entity_lookup() {
        let dir = tempdir().unwrap();
        write_crate(dir.path());
        let rocrate = load(&settings_for(dir.path().to_str().unwrap())).unwrap();

        let root = rocrate.root_entity().unwrap();
        assert_eq!(root.get("name").and_then(Value::as_str), Some("Test crate"));
        assert!(rocrate.entity("data/file.txt").is_some());
        assert!(rocrate.entity("nope").is_none());
    }
}
