use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::ClassifierError;

/// File name of the persisted vectorizer.
pub const VECTORIZER_FILE: &str = "tfidf_vectorizer.json";
/// File name of the persisted classifier.
pub const CLASSIFIER_FILE: &str = "bayesian_classifier.json";

/// Directory holding the vectorizer/classifier artifact pair.
///
/// Both artifacts are staged as `*.tmp` siblings and renamed only after both
/// were written, so a crash mid-save leaves the previous pair in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Artifact directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the vectorizer artifact.
    #[must_use]
    pub fn vectorizer_path(&self) -> PathBuf {
        self.dir.join(VECTORIZER_FILE)
    }

    /// Path of the classifier artifact.
    #[must_use]
    pub fn classifier_path(&self) -> PathBuf {
        self.dir.join(CLASSIFIER_FILE)
    }

    /// True when both artifacts exist.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.vectorizer_path().is_file() && self.classifier_path().is_file()
    }

    /// Writes both artifacts, creating the directory if needed.
    pub fn save<V, C>(&self, vectorizer: &V, classifier: &C) -> Result<(), ClassifierError>
    where
        V: Serialize,
        C: Serialize,
    {
        fs::create_dir_all(&self.dir).map_err(|source| ClassifierError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let vectorizer_path = self.vectorizer_path();
        let classifier_path = self.classifier_path();
        let vectorizer_tmp = staging_path(&vectorizer_path);
        let classifier_tmp = staging_path(&classifier_path);

        let staged = write_json(&vectorizer_tmp, vectorizer)
            .and_then(|()| write_json(&classifier_tmp, classifier));
        if let Err(err) = staged {
            let _ = fs::remove_file(&vectorizer_tmp);
            let _ = fs::remove_file(&classifier_tmp);
            return Err(err);
        }
        rename(&vectorizer_tmp, &vectorizer_path)?;
        rename(&classifier_tmp, &classifier_path)
    }

    /// Reads both artifacts; `Ok(None)` when either is absent.
    pub fn load<V, C>(&self) -> Result<Option<(V, C)>, ClassifierError>
    where
        V: DeserializeOwned,
        C: DeserializeOwned,
    {
        if !self.exists() {
            return Ok(None);
        }
        let vectorizer = read_json(&self.vectorizer_path())?;
        let classifier = read_json(&self.classifier_path())?;
        Ok(Some((vectorizer, classifier)))
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ClassifierError> {
    let bytes = serde_json::to_vec(value).map_err(|source| ClassifierError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| ClassifierError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ClassifierError> {
    let bytes = fs::read(path).map_err(|source| ClassifierError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ClassifierError::Serialization {
        path: path.to_path_buf(),
        source,
    })
}

fn rename(from: &Path, to: &Path) -> Result<(), ClassifierError> {
    fs::rename(from, to).map_err(|source| ClassifierError::Io {
        path: to.to_path_buf(),
        source,
    })
}
