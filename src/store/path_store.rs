use std::borrow::Cow;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml, YamlEmitter};
use snafu::Snafu;
use snafu::prelude::*;
use tracing::debug;

use crate::ext::AbsolutePathExt;
use crate::store::StoreLocation;

const PATHS_KEY: &str = "paths";

/// In-memory mirror of the registry file: every key mapped to an absolute
/// path, in no particular order. Ordering is applied when listing and when
/// serializing, not as a storage invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathStore {
    paths: HashMap<String, String>,
}

impl PathStore {
    /// Loads the registry from disk, creating the directory and an empty
    /// registry file first if either is missing.
    pub async fn load_or_init(location: &StoreLocation) -> Result<Self, StoreLoadError> {
        let dir_path = location.dir_path();
        if fs::metadata(dir_path).await.is_err() {
            debug!("Creating config directory: {}", dir_path.display());
            fs::create_dir_all(dir_path).await.context(CreateDirSnafu {
                dir_path: dir_path.display().to_string(),
            })?;
        }

        let file_path = location.file_path();
        if fs::metadata(file_path).await.is_err() {
            debug!("Creating empty config file: {}", file_path.display());
            let store = Self::default();
            store.write(location).await.context(InitSnafu)?;
            return Ok(store);
        }

        debug!("Reading config file: {}", file_path.display());
        let bytes = fs::read(file_path).await.context(ReadSnafu {
            file_path: file_path.display().to_string(),
        })?;
        let contents = String::from_utf8(bytes).context(InvalidUtf8Snafu {
            file_path: file_path.display().to_string(),
        })?;

        contents.as_str().try_into()
    }

    /// Serializes the full mapping and overwrites the registry file.
    pub async fn write(&self, location: &StoreLocation) -> Result<(), StorePersistError> {
        let contents = self.to_yaml_string()?;
        fs::write(location.file_path(), contents.into_bytes())
            .await
            .0
            .context(WriteSnafu {
                file_path: location.file_path().display().to_string(),
            })?;
        Ok(())
    }

    /// Maps `key` to the absolute form of `raw_path`, overwriting any
    /// previous entry, and returns that absolute path. The caller persists.
    pub fn add(&mut self, key: &str, raw_path: &str) -> Result<PathBuf, AddError> {
        let abs_path = Path::new(raw_path)
            .to_absolute()
            .context(InvalidPathSnafu { path: raw_path })?;
        self.paths
            .insert(key.to_string(), abs_path.display().to_string());
        Ok(abs_path)
    }

    /// Deletes the entry for `key`. The caller persists.
    pub fn remove(&mut self, key: &str) -> Result<(), RemoveError> {
        self.paths.remove(key).context(UnknownKeySnafu { key })?;
        Ok(())
    }

    /// Looks up `key` and returns the stored path, verbatim, after
    /// confirming the path still exists on disk.
    pub async fn resolve(&self, key: &str) -> Result<&str, ResolveError> {
        let path = self.paths.get(key).context(MissingKeySnafu { key })?;

        match fs::metadata(path).await {
            Err(error) if error.kind() == ErrorKind::NotFound => MissingPathSnafu { path }.fail(),
            // Only a confirmed missing path is fatal; other stat failures
            // leave the entry usable
            _ => Ok(path.as_str()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Entries ordered by key, ascending.
    pub fn sorted_entries(&self) -> Vec<(&str, &str)> {
        let mut entries = self
            .paths
            .iter()
            .map(|(key, path)| (key.as_str(), path.as_str()))
            .collect::<Vec<_>>();
        entries.sort_unstable_by_key(|&(key, _)| key);
        entries
    }

    fn to_yaml_string(&self) -> Result<String, StorePersistError> {
        let mut paths_mapping = LinkedHashMap::new();
        for (key, path) in self.sorted_entries() {
            paths_mapping.insert(
                Yaml::Value(Scalar::String(Cow::Owned(key.to_string()))),
                Yaml::Value(Scalar::String(Cow::Owned(path.to_string()))),
            );
        }

        let mut top_level = LinkedHashMap::new();
        top_level.insert(
            Yaml::Value(Scalar::String(Cow::Borrowed(PATHS_KEY))),
            Yaml::Mapping(paths_mapping),
        );
        let document = Yaml::Mapping(top_level);

        let mut contents = String::new();
        let mut emitter = YamlEmitter::new(&mut contents);
        emitter.dump(&document).context(EmitSnafu)?;
        contents.push('\n');

        Ok(contents)
    }

    fn parse_paths(section: &Yaml) -> Result<HashMap<String, String>, StoreLoadError> {
        section
            .as_mapping()
            .ok_or(StoreLoadError::PathsNotMap)?
            .iter()
            .map(|(key, path)| match (key.as_str(), path.as_str()) {
                (Some(key), Some(path)) => Ok((key.to_string(), path.to_string())),
                _ => EntryNotStringSnafu.fail(),
            })
            .collect()
    }
}

impl TryFrom<&str> for PathStore {
    type Error = StoreLoadError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let Some(document) = documents.first() else {
            // An empty file holds the empty mapping
            return Ok(Self::default());
        };

        let top_level = document
            .as_mapping()
            .ok_or(StoreLoadError::TopLevelNotMap)?;

        let paths_section = top_level.get(&Yaml::Value(Scalar::String(Cow::Borrowed(PATHS_KEY))));
        let paths = match paths_section {
            // A missing or null section is the original zero value
            None | Some(Yaml::Value(Scalar::Null)) => HashMap::new(),
            Some(section) => Self::parse_paths(section)?,
        };

        Ok(Self { paths })
    }
}

#[derive(Debug, Snafu)]
pub enum StoreLoadError {
    #[snafu(display("Failed to create the config directory: {}", dir_path))]
    CreateDirError {
        dir_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to create the initial config file"))]
    InitError { source: StorePersistError },
    #[snafu(display("Failed to read the config file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("The config file is not valid UTF-8: {}", file_path))]
    InvalidUtf8Error {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the config file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Top level of the config file should be a map"))]
    TopLevelNotMap,
    #[snafu(display("The '{}' section should be a map", PATHS_KEY))]
    PathsNotMap,
    #[snafu(display("Entries under '{}' should map string keys to string paths", PATHS_KEY))]
    EntryNotString,
}

#[derive(Debug, Snafu)]
pub enum StorePersistError {
    #[snafu(display("Failed to serialize the config"))]
    EmitError { source: saphyr::EmitError },
    #[snafu(display("Failed to write the config file: {}", file_path))]
    WriteError {
        file_path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Snafu)]
pub enum AddError {
    #[snafu(display("Invalid path: {}", path))]
    InvalidPathError {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Snafu)]
pub enum RemoveError {
    #[snafu(display("Key not found: {}", key))]
    UnknownKey { key: String },
}

#[derive(Debug, Snafu)]
pub enum ResolveError {
    #[snafu(display("Key not found in paths: {}", key))]
    MissingKey { key: String },
    #[snafu(display("Path does not exist: {}", path))]
    MissingPath { path: String },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn location_in(dir: &TempDir) -> StoreLocation {
        let base = dir.path().display().to_string();
        StoreLocation::resolve(move |name| (name == "XDG_CONFIG_HOME").then(|| base.clone()))
            .unwrap()
    }

    #[test]
    fn store_parses_entries() {
        let contents = "paths:\n  proj: /home/user/projects/app\n  docs: /home/user/docs\n";
        let store = PathStore::try_from(contents).unwrap();
        assert_eq!(
            store.sorted_entries(),
            vec![
                ("docs", "/home/user/docs"),
                ("proj", "/home/user/projects/app"),
            ]
        );
    }

    #[test]
    fn empty_content_loads_as_empty_store() {
        let store = PathStore::try_from("").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn missing_paths_section_loads_as_empty_store() {
        let store = PathStore::try_from("other_config: value").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn null_paths_section_loads_as_empty_store() {
        let store = PathStore::try_from("paths:").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn empty_paths_mapping_loads_as_empty_store() {
        let store = PathStore::try_from("paths: {}").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn invalid_yaml_fails_with_parse_error() {
        let result = PathStore::try_from("invalid: yaml: content: [unclosed");
        assert!(matches!(result, Err(StoreLoadError::ParseError { .. })));
    }

    #[rstest]
    #[case::scalar("just a string")]
    #[case::sequence("- item1\n- item2")]
    fn non_map_top_level_fails(#[case] contents: &str) {
        let result = PathStore::try_from(contents);
        assert!(matches!(result, Err(StoreLoadError::TopLevelNotMap)));
    }

    #[rstest]
    #[case::sequence("paths:\n  - /home/user/docs")]
    #[case::scalar("paths: /home/user/docs")]
    fn non_map_paths_section_fails(#[case] contents: &str) {
        let result = PathStore::try_from(contents);
        assert!(matches!(result, Err(StoreLoadError::PathsNotMap)));
    }

    #[rstest]
    #[case::numeric_value("paths:\n  proj: 42")]
    #[case::numeric_key("paths:\n  7: /home/user/docs")]
    #[case::nested_value("paths:\n  proj:\n    nested: /home/user/docs")]
    fn non_string_entries_fail(#[case] contents: &str) {
        let result = PathStore::try_from(contents);
        assert!(matches!(result, Err(StoreLoadError::EntryNotString)));
    }

    #[test]
    fn unicode_keys_are_preserved() {
        let store = PathStore::try_from("paths:\n  тест: /home/user/тест\n").unwrap();
        assert_eq!(store.sorted_entries(), vec![("тест", "/home/user/тест")]);
    }

    #[test]
    fn add_overwrites_an_existing_key() {
        let mut store = PathStore::default();
        store.add("proj", "/first").unwrap();
        store.add("proj", "/second").unwrap();
        assert_eq!(store.sorted_entries(), vec![("proj", "/second")]);
    }

    #[test]
    fn add_absolutizes_relative_paths_against_the_current_dir() {
        let mut store = PathStore::default();
        let abs_path = store.add("docs", "./my/docs").unwrap();
        assert_eq!(
            abs_path,
            std::env::current_dir().unwrap().join("my/docs")
        );
        assert_eq!(
            store.sorted_entries(),
            vec![("docs", abs_path.display().to_string().as_str())]
        );
    }

    #[test]
    fn remove_deletes_the_entry() {
        let mut store = PathStore::default();
        store.add("proj", "/somewhere").unwrap();
        store.remove("proj").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn remove_of_a_missing_key_fails() {
        let mut store = PathStore::default();
        let result = store.remove("ghost");
        assert!(matches!(result, Err(RemoveError::UnknownKey { .. })));
    }

    #[test]
    fn remove_twice_fails_the_second_time() {
        let mut store = PathStore::default();
        store.add("proj", "/somewhere").unwrap();
        store.remove("proj").unwrap();
        let result = store.remove("proj");
        assert!(matches!(result, Err(RemoveError::UnknownKey { .. })));
    }

    #[test]
    fn sorted_entries_are_ordered_by_key() {
        let mut store = PathStore::default();
        store.add("zebra", "/z").unwrap();
        store.add("alpha", "/a").unwrap();
        store.add("middle", "/m").unwrap();
        assert_eq!(
            store.sorted_entries(),
            vec![("alpha", "/a"), ("middle", "/m"), ("zebra", "/z")]
        );
    }

    #[test]
    fn serialized_form_keeps_keys_sorted_and_reparses() {
        let mut store = PathStore::default();
        store.add("zebra", "/z").unwrap();
        store.add("alpha", "/a").unwrap();

        let contents = store.to_yaml_string().unwrap();
        assert!(contents.find("alpha").unwrap() < contents.find("zebra").unwrap());

        let reparsed = PathStore::try_from(contents.as_str()).unwrap();
        assert_eq!(reparsed, store);
    }

    #[test]
    fn empty_store_serializes_to_an_empty_mapping() {
        let contents = PathStore::default().to_yaml_string().unwrap();
        let reparsed = PathStore::try_from(contents.as_str()).unwrap();
        assert!(reparsed.is_empty());
    }

    #[compio::test]
    async fn resolve_returns_the_stored_path_when_it_exists() {
        let dir = TempDir::new().unwrap();
        let mut store = PathStore::default();
        store.add("tmp", &dir.path().display().to_string()).unwrap();

        let resolved = store.resolve("tmp").await.unwrap();
        assert_eq!(resolved, dir.path().display().to_string());
    }

    #[compio::test]
    async fn resolve_of_a_missing_key_fails() {
        let store = PathStore::default();
        let result = store.resolve("ghost").await;
        assert!(matches!(result, Err(ResolveError::MissingKey { .. })));
    }

    #[compio::test]
    async fn resolve_fails_when_the_stored_path_is_gone() {
        let dir = TempDir::new().unwrap();
        let vanished = dir.path().join("vanished");
        let mut store = PathStore::default();
        store.add("gone", &vanished.display().to_string()).unwrap();

        let result = store.resolve("gone").await;
        assert!(matches!(result, Err(ResolveError::MissingPath { .. })));
    }

    #[compio::test]
    async fn load_or_init_creates_the_directory_and_an_empty_file() {
        let dir = TempDir::new().unwrap();
        let location = location_in(&dir);

        let store = PathStore::load_or_init(&location).await.unwrap();
        assert!(store.is_empty());
        assert!(location.file_path().exists());
    }

    #[compio::test]
    async fn load_or_init_rereads_what_was_written() {
        let dir = TempDir::new().unwrap();
        let location = location_in(&dir);

        let mut store = PathStore::load_or_init(&location).await.unwrap();
        let abs_path = store.add("tmp", &dir.path().display().to_string()).unwrap();
        store.write(&location).await.unwrap();

        let reloaded = PathStore::load_or_init(&location).await.unwrap();
        let resolved = reloaded.resolve("tmp").await.unwrap();
        assert_eq!(resolved, abs_path.display().to_string());
    }

    #[compio::test]
    async fn load_or_init_fails_on_a_malformed_file() {
        let dir = TempDir::new().unwrap();
        let location = location_in(&dir);

        std::fs::create_dir_all(location.dir_path()).unwrap();
        std::fs::write(location.file_path(), "- not\n- a\n- map\n").unwrap();

        let result = PathStore::load_or_init(&location).await;
        assert!(matches!(result, Err(StoreLoadError::TopLevelNotMap)));
    }
}
