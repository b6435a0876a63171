//! Checksum-verified word categories.
//!
//! A vocabulary is identified by a version string of the form
//! `<positions>_<checksum>`, for example `012_2af9111`:
//!
//! - `<positions>` lists the character positions (one decimal digit each)
//!   that make up a word's prefix, so `012` abbreviates `badger` to `bad`;
//! - `<checksum>` is a leading fragment of the CRC-32 of the word lists,
//!   written in lowercase hex. It ties a data bundle to the code reading it.
//!
//! `0_NOVERIFY` is the conventional version for hand-built vocabularies that
//! skip verification.

use crate::error::*;
use crate::source::{BundledSource, WordSource, BUNDLED_VOCABULARY};
use crc32fast::Hasher as Crc32Hasher;
use std::collections::HashMap;
use std::path::Path;

/// One ordered word list with its lookup indexes.
#[derive(Debug, Clone)]
pub struct Category {
    name: String,
    words: Vec<String>,
    prefixes: Vec<String>,
    word_index: HashMap<String, usize>,
    prefix_index: HashMap<String, usize>,
}

impl Category {
    fn new(name: String, words: Vec<String>, positions: &[usize]) -> Result<Self, Error> {
        if words.is_empty() {
            return Err(Error::EmptyCategory(name));
        }

        let mut word_index = HashMap::with_capacity(words.len());
        let mut prefix_index = HashMap::with_capacity(words.len());
        let mut prefixes = Vec::with_capacity(words.len());

        for (index, word) in words.iter().enumerate() {
            if word.is_empty() {
                return Err(Error::EmptyWord { category: name });
            }
            if word_index.insert(word.clone(), index).is_some() {
                return Err(Error::DuplicateWord {
                    category: name,
                    word: word.clone(),
                });
            }

            let prefix = prefix_of(word, positions).map_err(|position| Error::WordTooShort {
                category: name.clone(),
                word: word.clone(),
                position,
            })?;
            if let Some(first) = prefix_index.insert(prefix.clone(), index) {
                return Err(Error::PrefixCollision {
                    category: name,
                    prefix,
                    first: words[first].clone(),
                    second: word.clone(),
                });
            }
            prefixes.push(prefix);
        }

        Ok(Self {
            name,
            words,
            prefixes,
            word_index,
            prefix_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn prefix(&self, index: usize) -> Option<&str> {
        self.prefixes.get(index).map(String::as_str)
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Position of an exact word in this category.
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.word_index.get(word).copied()
    }

    /// Position of the word abbreviated to `prefix`.
    pub fn index_of_prefix(&self, prefix: &str) -> Option<usize> {
        self.prefix_index.get(prefix).copied()
    }
}

/// An immutable, ordered set of word categories.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    version: String,
    prefix_positions: Vec<usize>,
    categories: Vec<Category>,
    checksum: u32,
}

impl Vocabulary {
    /// Build a vocabulary from `(category, words)` pairs.
    ///
    /// Words are trimmed. Fails when there are no categories, a category is
    /// empty or repeats a word, two words of a category share a prefix, the
    /// version is malformed, or, with `verify_checksum`, the checksum
    /// fragment in `version` does not match the content.
    pub fn new<I, N, W, S>(version: &str, categories: I, verify_checksum: bool) -> Result<Self>
    where
        I: IntoIterator<Item = (N, W)>,
        N: Into<String>,
        W: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (prefix_positions, fragment) = parse_version(version)?;
        let raw = collect(categories);
        if raw.is_empty() {
            return Err(Error::EmptyVocabulary);
        }

        let checksum = checksum_of(&raw);
        if verify_checksum {
            let actual = format!("{checksum:08x}");
            if fragment.is_empty() || !actual.starts_with(fragment) {
                return Err(Error::ChecksumMismatch {
                    expected: fragment.to_string(),
                    actual,
                });
            }
        }

        let categories = raw
            .into_iter()
            .map(|(name, words)| Category::new(name, words, &prefix_positions))
            .collect::<Result<Vec<_>>>()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            version,
            checksum,
            sizes = ?categories.iter().map(Category::len).collect::<Vec<_>>(),
            "vocabulary built"
        );

        Ok(Self {
            version: version.to_string(),
            prefix_positions,
            categories,
            checksum,
        })
    }

    /// Read the word lists at `path` from `source`.
    ///
    /// The version string is the last component of `path`.
    pub fn load<P: WordSource + ?Sized>(
        source: &P,
        path: &str,
        verify_checksum: bool,
    ) -> Result<Self> {
        let version = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidVersion(path.to_string()))?;
        let categories = source.load(path)?;
        Self::new(version, categories, verify_checksum)
    }

    /// The vocabulary bundled with this crate, checksum-verified.
    pub fn bundled() -> Result<Self> {
        Self::load(&BundledSource, BUNDLED_VOCABULARY, true)
    }

    /// The checksum, as embedded in version strings, of the given word lists.
    pub fn fingerprint<I, N, W, S>(categories: I) -> String
    where
        I: IntoIterator<Item = (N, W)>,
        N: Into<String>,
        W: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        format!("{:08x}", checksum_of(&collect(categories)))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn checksum_hex(&self) -> String {
        format!("{:08x}", self.checksum)
    }

    pub fn prefix_positions(&self) -> &[usize] {
        &self.prefix_positions
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// The prefix this vocabulary would abbreviate `word` to.
    pub fn prefix_of(&self, word: &str) -> Option<String> {
        prefix_of(word, &self.prefix_positions).ok()
    }
}

fn collect<I, N, W, S>(categories: I) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = (N, W)>,
    N: Into<String>,
    W: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    categories
        .into_iter()
        .map(|(name, words)| {
            let words = words
                .into_iter()
                .map(|word| word.as_ref().trim().to_string())
                .collect();
            (name.into(), words)
        })
        .collect()
}

fn checksum_of(categories: &[(String, Vec<String>)]) -> u32 {
    let mut hasher = Crc32Hasher::new();
    for word in categories.iter().flat_map(|(_, words)| words) {
        hasher.update(word.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}

fn parse_version(version: &str) -> Result<(Vec<usize>, &str)> {
    let invalid = || Error::InvalidVersion(version.to_string());
    let (positions, fragment) = version.split_once('_').ok_or_else(invalid)?;
    if positions.is_empty() {
        return Err(invalid());
    }
    let positions = positions
        .chars()
        .map(|c| c.to_digit(10).map(|d| d as usize))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;
    Ok((positions, fragment))
}

/// Concatenate the characters of `word` at `positions`; on failure, returns
/// the first position past the end of the word.
fn prefix_of(word: &str, positions: &[usize]) -> Result<String, usize> {
    let chars: Vec<char> = word.chars().collect();
    positions
        .iter()
        .map(|&position| chars.get(position).copied().ok_or(position))
        .collect()
}
