use ahash::AHashMap;

/// Bidirectional mapping between string identifiers and dense zero-based indices.
#[derive(Debug, Clone, Default)]
pub struct Indexer {
    index: AHashMap<String, usize>,
    ids: Vec<String>,
}

impl Indexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` if unseen and return its index.
    pub fn add(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.ids.len();
        self.index.insert(id.to_owned(), idx);
        self.ids.push(id.to_owned());
        idx
    }

    pub fn to_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn to_id(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in index order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl<S: AsRef<str>> FromIterator<S> for Indexer {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut indexer = Indexer::new();
        for id in iter {
            indexer.add(id.as_ref());
        }
        indexer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut indexer = Indexer::new();
        assert_eq!(indexer.add("a"), 0);
        assert_eq!(indexer.add("b"), 1);
        assert_eq!(indexer.add("a"), 0);
        assert_eq!(indexer.len(), 2);
    }

    #[test]
    fn lookups_both_ways() {
        let indexer: Indexer = ["x", "y", "z"].into_iter().collect();
        assert_eq!(indexer.to_index("y"), Some(1));
        assert_eq!(indexer.to_index("missing"), None);
        assert_eq!(indexer.to_id(2), Some("z"));
        assert_eq!(indexer.to_id(3), None);
    }
}
