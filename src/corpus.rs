use crate::error::{Error, Result};
use include_dir::{include_dir, Dir};
use serde::Deserialize;

static CORPUS_DIR: Dir = include_dir!("src/corpus");

/// Smallest corpus that can fill the longest typing sentence
pub const MIN_CORPUS_WORDS: usize = 12;

/// Word list the typing game draws sentences from
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Corpus {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl Corpus {
    pub fn builtin() -> Result<Self> {
        Self::named("english")
    }

    pub fn named(name: &str) -> Result<Self> {
        let file = CORPUS_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(|| Error::CorpusNotFound {
                name: name.to_string(),
            })?;
        let contents = file.contents_utf8().ok_or_else(|| Error::CorpusNotFound {
            name: name.to_string(),
        })?;
        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let corpus: Corpus = serde_json::from_str(json)?;
        corpus.validated()
    }

    pub fn from_words<I, S>(name: &str, words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        Self {
            name: name.to_string(),
            size: words.len() as u32,
            words,
        }
        .validated()
    }

    fn validated(mut self) -> Result<Self> {
        self.words.retain(|w| !w.trim().is_empty());
        if self.words.len() < MIN_CORPUS_WORDS {
            return Err(Error::CorpusTooSmall {
                name: self.name,
                size: self.words.len(),
                needed: MIN_CORPUS_WORDS,
            });
        }
        self.size = self.words.len() as u32;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_corpus_loads() {
        let corpus = Corpus::builtin().unwrap();

        assert_eq!(corpus.name, "english");
        assert!(corpus.words.len() >= MIN_CORPUS_WORDS);
        assert_eq!(corpus.size as usize, corpus.words.len());
        assert!(corpus.words.iter().all(|w| !w.contains(' ')));
    }

    #[test]
    fn missing_corpus_is_an_error() {
        assert!(matches!(
            Corpus::named("klingon"),
            Err(Error::CorpusNotFound { .. })
        ));
    }

    #[test]
    fn corpus_deserialization() {
        let json_data = r#"
        {
            "name": "test",
            "size": 12,
            "words": ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"]
        }
        "#;

        let corpus = Corpus::from_json(json_data).unwrap();
        assert_eq!(corpus.name, "test");
        assert_eq!(corpus.words.len(), 12);
    }

    #[test]
    fn tiny_corpus_is_rejected() {
        let err = Corpus::from_words("tiny", ["one", "two", "", "three"]).unwrap_err();
        assert!(matches!(
            err,
            Error::CorpusTooSmall { size: 3, needed: 12, .. }
        ));
    }
}
