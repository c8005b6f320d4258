use crate::error::{check_len, Result};
use crate::indexer::Indexer;
use crate::model::ScoreMatrix;
use crate::subset::TargetSet;

/// Interactions stored as (user, item, rating) triples, with per-user target sets.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    users: Vec<usize>,
    items: Vec<usize>,
    ratings: Vec<f64>,
    user_indexer: Indexer,
    item_indexer: Indexer,
    by_user: Vec<TargetSet>,
}

impl DataSet {
    /// Build from parallel `users`, `items`, `ratings` slices.
    pub fn new<S: AsRef<str>>(users: &[S], items: &[S], ratings: &[f64]) -> Result<Self> {
        check_len(users.len(), items.len())?;
        check_len(users.len(), ratings.len())?;

        let mut data = DataSet {
            users: Vec::with_capacity(users.len()),
            items: Vec::with_capacity(users.len()),
            ratings: Vec::with_capacity(users.len()),
            ..Default::default()
        };
        for ((u, i), &r) in users.iter().zip(items.iter()).zip(ratings.iter()) {
            data.push(u.as_ref(), i.as_ref(), r);
        }
        Ok(data)
    }

    /// One interaction per nonzero cell, with the decimal row and column
    /// indices as user and item ids.
    pub fn from_score_matrix(matrix: &ScoreMatrix) -> Self {
        let mut data = DataSet::default();
        for u in 0..matrix.n_users() {
            for i in 0..matrix.n_items() {
                let rating = matrix.get(u, i);
                if rating != 0.0 {
                    data.push(&u.to_string(), &i.to_string(), rating);
                }
            }
        }
        data
    }

    fn push(&mut self, user: &str, item: &str, rating: f64) {
        let u = self.user_indexer.add(user);
        let i = self.item_indexer.add(item);
        if u == self.by_user.len() {
            self.by_user.push(TargetSet::default());
        }
        self.by_user[u].insert(item, rating);
        self.users.push(u);
        self.items.push(i);
        self.ratings.push(rating);
    }

    /// A new data set holding the triples at `positions`, re-indexed from zero.
    pub fn subset(&self, positions: &[usize]) -> DataSet {
        let mut data = DataSet::default();
        for &pos in positions {
            if let Some((u, i, r)) = self.get(pos) {
                data.push(u, i, r);
            }
        }
        data
    }

    /// The triple at position `pos`.
    pub fn get(&self, pos: usize) -> Option<(&str, &str, f64)> {
        if pos >= self.ratings.len() {
            return None;
        }
        let user = self.user_indexer.to_id(self.users[pos])?;
        let item = self.item_indexer.to_id(self.items[pos])?;
        Some((user, item, self.ratings[pos]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        (0..self.len()).filter_map(move |pos| self.get(pos))
    }

    /// User index of every triple, in insertion order.
    pub fn user_indices(&self) -> &[usize] {
        &self.users
    }

    pub fn user_indexer(&self) -> &Indexer {
        &self.user_indexer
    }

    pub fn item_indexer(&self) -> &Indexer {
        &self.item_indexer
    }

    pub fn user_count(&self) -> usize {
        self.user_indexer.len()
    }

    pub fn item_count(&self) -> usize {
        self.item_indexer.len()
    }

    /// Number of triples.
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn user_by_index(&self, user_index: usize) -> Option<&TargetSet> {
        self.by_user.get(user_index)
    }

    pub fn user(&self, user_id: &str) -> Option<&TargetSet> {
        self.user_indexer
            .to_index(user_id)
            .and_then(|u| self.by_user.get(u))
    }
}
