//! Feature-token interning.
//!
//! Every feature token is stored once and referenced by a dense `u32`
//! id, so node feature sets become Roaring bitmaps and the quadratic
//! pairwise phase never touches string data.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Maps feature tokens to compact ids and back.
///
/// Ids are dense and allocated in first-seen order, which keeps
/// interning deterministic for a given entity input order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FeatureInterner {
    token_to_id: AHashMap<String, u32>,
    id_to_token: Vec<String>,
}

impl FeatureInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a token, returning its id.
    pub fn intern(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.token_to_id.get(token) {
            return id;
        }
        let id = self.id_to_token.len() as u32;
        self.token_to_id.insert(token.to_string(), id);
        self.id_to_token.push(token.to_string());
        id
    }

    /// Look up an existing id without inserting.
    pub fn id_of(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    /// Resolve an id back to its token.
    pub fn lookup(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    /// Number of distinct tokens interned.
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }
}
