use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ground-truth class of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Legitimate message.
    Ham,
    /// Unsolicited message.
    Spam,
}

impl Label {
    /// Both labels in class-index order.
    pub const ALL: [Self; 2] = [Self::Ham, Self::Spam];

    /// Class index used by the classifier (ham = 0, spam = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Ham => 0,
            Self::Spam => 1,
        }
    }

    /// Inverse of [`Label::index`].
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Ham),
            1 => Some(Self::Spam),
            _ => None,
        }
    }

    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ham => "ham",
            Self::Spam => "spam",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("ham") {
            Ok(Self::Ham)
        } else if raw.eq_ignore_ascii_case("spam") {
            Ok(Self::Spam)
        } else {
            Err(format!("unknown label `{raw}`"))
        }
    }
}

/// Raw message with its ground-truth label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Ground-truth class.
    pub label: Label,
    /// Original message text.
    pub text: String,
}

impl Message {
    /// Creates a labeled message.
    #[must_use]
    pub fn new(label: Label, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

/// Ordered, read-only collection of labeled messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    messages: Vec<Message>,
}

impl Dataset {
    /// Wraps already labeled messages.
    #[must_use]
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Loads a `<label>\t<message>` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        contents.parse()
    }

    /// Messages in file order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages carrying `label`, in file order.
    pub fn with_label(&self, label: Label) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().filter(move |msg| msg.label == label)
    }

    /// Number of messages carrying `label`.
    #[must_use]
    pub fn count(&self, label: Label) -> usize {
        self.with_label(label).count()
    }

    /// Total number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true when no message was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl FromStr for Dataset {
    type Err = DatasetError;

    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let mut messages = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let (label, text) = line.split_once('\t').ok_or(DatasetError::Malformed {
                line: idx + 1,
                reason: "missing tab separator".into(),
            })?;
            let label = label.parse().map_err(|reason| DatasetError::Malformed {
                line: idx + 1,
                reason,
            })?;
            messages.push(Message::new(label, text));
        }
        Ok(Self { messages })
    }
}

/// Errors raised while loading a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Dataset file does not exist.
    #[error("dataset not found at {}", .0.display())]
    NotFound(PathBuf),
    /// Dataset file could not be read.
    #[error("failed to read dataset {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A line is not `<label>\t<message>`.
    #[error("malformed dataset line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
}
