// alphabet.rs — Character alphabet: char <-> id with id 0 reserved for unknown characters.
//
// Built once with `AlphabetBuilder` (append-only), then frozen into `CharAlphabet`.

use std::collections::HashMap;

use crate::config::vocab::UNK_CHAR_ID;

/// Append-only builder. Ids are handed out sequentially in insertion order.
#[derive(Debug, Clone)]
pub struct AlphabetBuilder {
    unk_label: String,
    stoi: HashMap<char, usize>,
    itos: Vec<char>,
}

impl AlphabetBuilder {
    pub fn new(unk_label: &str) -> Self {
        Self {
            unk_label: unk_label.to_string(),
            stoi: HashMap::new(),
            itos: Vec::new(),
        }
    }

    /// Register `ch` if it is new. Returns its id either way.
    pub fn insert(&mut self, ch: char) -> usize {
        if let Some(&id) = self.stoi.get(&ch) {
            return id;
        }
        // +1: id 0 belongs to the unknown entry
        let id = self.itos.len() + 1;
        self.stoi.insert(ch, id);
        self.itos.push(ch);
        id
    }

    /// Register every character of `word` followed by its uppercase form.
    ///
    /// Multi-char uppercase forms register each char separately ('ß' adds 'S', not "SS"),
    /// so ids differ from alphabets that store "SS" as a single entry.
    pub fn insert_word(&mut self, word: &str) {
        for ch in word.chars() {
            self.insert(ch);
            for upper in ch.to_uppercase() {
                self.insert(upper);
            }
        }
    }

    pub fn build(self) -> CharAlphabet {
        CharAlphabet {
            unk_label: self.unk_label,
            stoi: self.stoi,
            itos: self.itos,
        }
    }
}

/// Frozen character alphabet.
#[derive(Debug, Clone)]
pub struct CharAlphabet {
    unk_label: String,
    stoi: HashMap<char, usize>,
    itos: Vec<char>,
}

impl CharAlphabet {
    /// Build from an iterator of words, in order.
    pub fn from_words<'a, I>(words: I, unk_label: &str) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut builder = AlphabetBuilder::new(unk_label);
        for word in words {
            builder.insert_word(word);
        }
        builder.build()
    }

    /// Number of ids, including the unknown entry.
    pub fn len(&self) -> usize {
        self.itos.len() + 1
    }

    /// Never true: the unknown entry is always present.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Id for `ch`, or the unknown id.
    pub fn id(&self, ch: char) -> usize {
        self.get(ch).unwrap_or(UNK_CHAR_ID)
    }

    pub fn get(&self, ch: char) -> Option<usize> {
        self.stoi.get(&ch).copied()
    }

    /// Display symbol for an id; id 0 yields the unknown label.
    pub fn symbol(&self, id: usize) -> Option<String> {
        if id == UNK_CHAR_ID {
            return Some(self.unk_label.clone());
        }
        self.itos.get(id - 1).map(|c| c.to_string())
    }

    pub fn unk_label(&self) -> &str {
        &self.unk_label
    }

    /// Registered characters in id order (the unknown entry excluded).
    pub fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.itos.iter().copied()
    }

    /// One-hot rows for each character of `token`, flattened row-major.
    /// Output length is `token.chars().count() * self.len()`.
    pub fn one_hot_rows(&self, token: &str) -> Vec<f32> {
        let width = self.len();
        let rows = token.chars().count();
        let mut data = vec![0.0f32; rows * width];
        for (row, ch) in token.chars().enumerate() {
            data[row * width + self.id(ch)] = 1.0;
        }
        data
    }
}
