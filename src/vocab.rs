//! The vocabulary index: every token ever seen and the id it was given
//!
//! Ids are handed out in first-seen order and are never reused or renumbered, so a word bag
//! written years ago still means the same thing after millions more patents are parsed. The
//! index lives in memory for a run and is flushed with `save`, which keeps the previous file as
//! the prior generation.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::*;
use crate::farm::{new_farm, FarmMap};
use crate::layout;
use crate::rows;
use crate::WordId;

/// Tokens shorter than this are dropped when cleaning
pub const MIN_TOKEN_LEN: usize = 4;

#[derive(Debug)]
pub struct Vocabulary {
    ids: FarmMap<String, WordId>,
    /// Reverse lookup, indexed by id. Slot 0 is never used.
    tokens: Vec<Option<String>>,
    next_id: WordId,
}

impl Default for Vocabulary {
    fn default() -> Vocabulary {
        Vocabulary::new()
    }
}

impl Vocabulary {
    pub fn new() -> Vocabulary {
        Vocabulary {
            ids: new_farm(),
            tokens: vec![None],
            next_id: 1,
        }
    }

    /// Load a saved index. A missing file is an empty index; a damaged one is fatal.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vocabulary> {
        let path = path.as_ref();
        let mut vocab = Vocabulary::new();
        if !path.exists() {
            info!("No vocabulary at {}, starting a fresh one", path.display());
            return Ok(vocab);
        }
        rows::for_each_row(path, false, |line, fields| {
            let token = rows::text_at(fields, 0, path, line)?;
            let id: WordId = rows::bounded_at(fields, 1, 1, path, line)?;
            vocab.restore(token, id)
                .map_err(|info| Error::malformed(path, line, info))
        })?;
        info!("Loaded {} words from {}, next id is {}", vocab.len(), path.display(), vocab.next_id);
        Ok(vocab)
    }

    /// Put back a mapping read from disk, keeping the allocator ahead of every id
    fn restore(&mut self, token: &str, id: WordId) -> ::std::result::Result<(), String> {
        if let Some(&existing) = self.ids.get(token) {
            return Err(format!("{:?} appears twice (ids {} and {})", token, existing, id));
        }
        let slot = id as usize;
        if self.tokens.len() <= slot {
            self.tokens.resize(slot + 1, None);
        }
        if let Some(ref other) = self.tokens[slot] {
            return Err(format!("id {} is used by both {:?} and {:?}", id, other, token));
        }
        self.tokens[slot] = Some(token.to_string());
        self.ids.insert(token.to_string(), id);
        self.next_id = ::std::cmp::max(self.next_id, id + 1);
        Ok(())
    }

    /// The id for a token, allocating the next one if we've never seen it
    pub fn lookup_or_insert(&mut self, token: &str) -> WordId {
        if let Some(&id) = self.ids.get(token) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(token.to_string(), id);
        self.tokens.push(Some(token.to_string()));
        debug_assert_eq!(self.tokens.len(), self.next_id as usize);
        id
    }

    pub fn get(&self, token: &str) -> Option<WordId> {
        self.ids.get(token).cloned()
    }

    pub fn token(&self, id: WordId) -> Option<&str> {
        self.tokens.get(id as usize)
            .and_then(|t| t.as_ref())
            .map(|t| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The id the next new token would get
    pub fn next_id(&self) -> WordId {
        self.next_id
    }

    /// Ids of every token with fewer than `min_len` characters, ascending
    pub fn short_token_ids(&self, min_len: usize) -> Vec<WordId> {
        self.iter()
            .filter(|&(_, token)| token.chars().count() < min_len)
            .map(|(id, _)| id)
            .collect()
    }

    /// (id, token) in id order
    pub fn iter<'v>(&'v self) -> impl Iterator<Item=(WordId, &'v str)> + 'v {
        self.tokens.iter()
            .enumerate()
            .filter_map(|(id, token)| token.as_ref().map(|t| (id as WordId, t.as_str())))
    }

    /// Write the whole index, keeping the previous file as the prior generation
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        layout::ensure_parent(path)?;
        let partial = layout::partial_path(path);
        {
            let mut out = BufWriter::new(File::create(&partial)?);
            for (id, token) in self.iter() {
                writeln!(out, "{},{}", rows::quote(token), id)?;
            }
            out.flush()?;
        }
        layout::rotate_into(&partial, path)?;
        debug!("Saved {} words to {}", self.len(), path.display());
        Ok(())
    }
}
