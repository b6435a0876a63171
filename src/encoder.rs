use crate::error::*;
use crate::vocabulary::{Category, Vocabulary};
use std::fmt;
use std::sync::Arc;

/// Default separator between the prefixes of an abbreviation.
pub const DEFAULT_SEPARATOR: &str = "-";

/// An encoded value: its words and their abbreviation.
///
/// `Display` joins the words with a single space (`bearded chubby dog`).
/// Use [`KeyPhrase::phrase`] for another rendering, such as the
/// hyphen-joined `bearded-chubby-dog`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPhrase {
    value: u128,
    words: Vec<String>,
    abbreviation: String,
}

impl KeyPhrase {
    /// The integer this phrase encodes.
    pub fn value(&self) -> u128 {
        self.value
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn abbreviation(&self) -> &str {
        &self.abbreviation
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The words joined by `separator`.
    pub fn phrase(&self, separator: &str) -> String {
        self.words.join(separator)
    }

    pub fn into_words(self) -> Vec<String> {
        self.words
    }
}

impl fmt::Display for KeyPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.phrase(" "))
    }
}

/// Maps integers to word sequences and back.
///
/// An integer is written in mixed radix over the trailing `k` categories of
/// the vocabulary, each category's word count being the radix of its digit.
/// `k` is the shortest length of at least `min_phrase_size` that can hold
/// the value, so small values get short phrases. Since short phrases only
/// ever use the *last* categories, prepending a category to a vocabulary
/// leaves every previously issued shorter phrase valid.
///
/// ```
/// use wordflake::{Vocabulary, WordEncoder};
///
/// let vocabulary = Vocabulary::new(
///     "0_NOVERIFY",
///     [
///         ("adverb", vec!["absurdly", "busily", "capably"]),
///         ("verb", vec!["abandoned", "bearded", "checked"]),
///         ("adjective", vec!["able", "blond", "chubby"]),
///         ("noun", vec!["apple", "bird", "cat", "dog"]),
///     ],
///     false,
/// )?;
/// let encoder = WordEncoder::new(vocabulary, 1)?;
///
/// let phrase = encoder.encode(23u64)?;
/// assert_eq!(phrase.to_string(), "bearded chubby dog");
/// assert_eq!(phrase.abbreviation(), "b-c-d");
/// assert_eq!(encoder.decode(&["bearded", "able", "apple"])?, 12);
/// # Ok::<(), wordflake::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct WordEncoder {
    vocabulary: Arc<Vocabulary>,
    min_phrase_size: usize,
    separator: String,
    /// `capacities[k]` is the number of values expressible with the last `k` categories.
    capacities: Vec<u128>,
}

impl WordEncoder {
    /// Create an encoder that abbreviates with [`DEFAULT_SEPARATOR`].
    pub fn new(vocabulary: impl Into<Arc<Vocabulary>>, min_phrase_size: usize) -> Result<Self> {
        Self::with_separator(vocabulary, min_phrase_size, DEFAULT_SEPARATOR)
    }

    /// Create an encoder with a custom abbreviation separator.
    ///
    /// `min_phrase_size` must lie in `1..=vocabulary.len()`. The separator
    /// must be non-empty and must not occur inside any prefix, or
    /// abbreviations could not be split back apart.
    pub fn with_separator(
        vocabulary: impl Into<Arc<Vocabulary>>,
        min_phrase_size: usize,
        separator: &str,
    ) -> Result<Self> {
        let vocabulary = vocabulary.into();
        let max_phrase_size = vocabulary.len();
        if !(1..=max_phrase_size).contains(&min_phrase_size) {
            return Err(Error::InvalidPhraseSize {
                min: min_phrase_size,
                max: max_phrase_size,
            });
        }

        if separator.is_empty() {
            return Err(Error::EmptySeparator);
        }
        let clash = vocabulary
            .categories()
            .iter()
            .flat_map(Category::prefixes)
            .find(|prefix| prefix.contains(separator));
        if let Some(prefix) = clash {
            return Err(Error::SeparatorInPrefix {
                separator: separator.to_string(),
                prefix: prefix.clone(),
            });
        }

        let mut capacities = vec![1u128; max_phrase_size + 1];
        for (k, category) in (1..=max_phrase_size).zip(vocabulary.categories().iter().rev()) {
            capacities[k] = capacities[k - 1]
                .checked_mul(category.len() as u128)
                .ok_or(Error::CapacityOverflow)?;
        }

        Ok(Self {
            vocabulary,
            min_phrase_size,
            separator: separator.to_string(),
            capacities,
        })
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn min_phrase_size(&self) -> usize {
        self.min_phrase_size
    }

    /// Longest phrase this encoder produces: one word per category.
    pub fn max_phrase_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Exclusive upper bound of encodable values.
    pub fn get_max(&self) -> u128 {
        self.capacities[self.max_phrase_size()]
    }

    /// The categories a phrase of `len` words is read against: the last `len`.
    ///
    /// Lengths above the number of categories yield every category.
    pub fn categories_for_length(&self, len: usize) -> &[Category] {
        let categories = self.vocabulary.categories();
        &categories[categories.len().saturating_sub(len)..]
    }

    /// Encode `value` as the shortest phrase of at least `min_phrase_size` words.
    pub fn encode(&self, value: impl Into<u128>) -> Result<KeyPhrase> {
        let value = value.into();
        let max = self.get_max();
        if value >= max {
            return Err(Error::ValueOutOfRange { value, max });
        }

        let len = self.phrase_len(value);
        let categories = self.categories_for_length(len);

        let mut indexes = vec![0usize; len];
        let mut rest = value;
        for (index, category) in indexes.iter_mut().zip(categories).rev() {
            let radix = category.len() as u128;
            *index = (rest % radix) as usize;
            rest /= radix;
        }
        debug_assert_eq!(rest, 0);

        let words = categories
            .iter()
            .zip(&indexes)
            .map(|(category, &index)| category.words()[index].clone())
            .collect();
        let abbreviation = categories
            .iter()
            .zip(&indexes)
            .map(|(category, &index)| category.prefixes()[index].as_str())
            .collect::<Vec<_>>()
            .join(&self.separator);

        Ok(KeyPhrase {
            value,
            words,
            abbreviation,
        })
    }

    /// Decode a sequence of words back to its value.
    ///
    /// A sequence of `k` words is read against the last `k` categories.
    pub fn decode<S: AsRef<str>>(&self, words: &[S]) -> Result<u128> {
        self.accumulate(words, |category, word| {
            category.index_of(word).ok_or_else(|| Error::UnknownWord {
                word: word.to_string(),
                category: category.name().to_string(),
            })
        })
    }

    /// Split a rendered phrase on `separator` and decode it.
    pub fn decode_phrase(&self, phrase: &str, separator: &str) -> Result<u128> {
        let words = split(phrase, separator)?;
        self.decode(&words)
    }

    /// Decode an abbreviation whose prefixes are joined by `separator`.
    pub fn decode_abbreviation(&self, abbreviation: &str, separator: &str) -> Result<u128> {
        let prefixes = split(abbreviation, separator)?;
        self.accumulate(&prefixes, |category, prefix| {
            category
                .index_of_prefix(prefix)
                .ok_or_else(|| Error::UnknownPrefix {
                    prefix: prefix.to_string(),
                    category: category.name().to_string(),
                })
        })
    }

    fn phrase_len(&self, value: u128) -> usize {
        let max_phrase_size = self.max_phrase_size();
        (self.min_phrase_size..=max_phrase_size)
            .find(|&len| self.capacities[len] > value)
            .unwrap_or(max_phrase_size)
    }

    fn accumulate<S, F>(&self, tokens: &[S], lookup: F) -> Result<u128>
    where
        S: AsRef<str>,
        F: Fn(&Category, &str) -> Result<usize>,
    {
        if tokens.is_empty() {
            return Err(Error::EmptyPhrase);
        }
        if tokens.len() > self.max_phrase_size() {
            return Err(Error::TooManyWords {
                len: tokens.len(),
                max: self.max_phrase_size(),
            });
        }

        self.categories_for_length(tokens.len())
            .iter()
            .zip(tokens)
            .try_fold(0u128, |acc, (category, token)| {
                let index = lookup(category, token.as_ref())?;
                Ok(acc * category.len() as u128 + index as u128)
            })
    }
}

fn split<'a>(input: &'a str, separator: &str) -> Result<Vec<&'a str>> {
    if separator.is_empty() {
        return Err(Error::EmptySeparator);
    }
    if input.is_empty() {
        return Err(Error::EmptyPhrase);
    }
    Ok(input.split(separator).collect())
}
