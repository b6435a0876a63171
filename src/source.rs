use crate::error::*;
use std::fs;
use std::path::Path;

/// Category order of the bundled vocabulary and the default for
/// [`DirectorySource`].
pub const DEFAULT_CATEGORIES: [&str; 4] = ["adverb", "verb", "adjective", "noun"];

/// Version string of the vocabulary shipped with this crate.
pub const BUNDLED_VOCABULARY: &str = "012_2af9111";

const BUNDLE: [(&str, &str); 4] = [
    ("adverb", include_str!("../resources/012_2af9111/adverb.txt")),
    ("verb", include_str!("../resources/012_2af9111/verb.txt")),
    ("adjective", include_str!("../resources/012_2af9111/adjective.txt")),
    ("noun", include_str!("../resources/012_2af9111/noun.txt")),
];

/// Supplies ordered `(category, words)` lists for an identifying path.
pub trait WordSource {
    fn load(&self, path: &str) -> Result<Vec<(String, Vec<String>)>>;
}

/// Reads `<path>/<category>.txt`, one word per line, for each category in order.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    categories: Vec<String>,
}

impl Default for DirectorySource {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}

impl DirectorySource {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

impl WordSource for DirectorySource {
    fn load(&self, path: &str) -> Result<Vec<(String, Vec<String>)>> {
        self.categories
            .iter()
            .map(|category| {
                let file = Path::new(path).join(format!("{category}.txt"));
                let content = fs::read_to_string(&file)
                    .map_err(|source| Error::Io { path: file, source })?;
                Ok::<_, Error>((category.clone(), parse_words(&content)))
            })
            .collect()
    }
}

/// The vocabulary compiled into this crate, served under [`BUNDLED_VOCABULARY`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSource;

impl WordSource for BundledSource {
    fn load(&self, path: &str) -> Result<Vec<(String, Vec<String>)>> {
        let name = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path);
        if name != BUNDLED_VOCABULARY {
            return Err(Error::UnknownBundle(path.to_string()));
        }
        Ok(BUNDLE
            .iter()
            .map(|(category, content)| (category.to_string(), parse_words(content)))
            .collect())
    }
}

fn parse_words(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
