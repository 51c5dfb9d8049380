use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};

/// How a leaf term matches index terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafOp {
    Equal,
    StartsWith,
}

/// How a composite combines its subqueries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompositeOp {
    And,
    Or,
    Phrase,
}

/// Boolean/phrase query tree compiled by `Transaction::posting_iterator`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineQuery {
    Leaf {
        term: Vec<u8>,
        op: LeafOp,
    },
    Composite {
        op: CompositeOp,
        subqueries: Vec<EngineQuery>,
    },
}

impl EngineQuery {
    /// Exact term match.
    pub fn term(term: impl Into<Vec<u8>>) -> Self {
        EngineQuery::Leaf {
            term: term.into(),
            op: LeafOp::Equal,
        }
    }

    /// Any term starting with `prefix`.
    pub fn starts_with(prefix: impl Into<Vec<u8>>) -> Self {
        EngineQuery::Leaf {
            term: prefix.into(),
            op: LeafOp::StartsWith,
        }
    }

    pub fn and(subqueries: Vec<EngineQuery>) -> Result<Self> {
        Self::composite(CompositeOp::And, subqueries)
    }

    pub fn or(subqueries: Vec<EngineQuery>) -> Result<Self> {
        Self::composite(CompositeOp::Or, subqueries)
    }

    /// Consecutive exact terms, in order.
    pub fn phrase(subqueries: Vec<EngineQuery>) -> Result<Self> {
        Self::composite(CompositeOp::Phrase, subqueries)
    }

    /// Phrase built straight from terms.
    pub fn phrase_of<T: Into<Vec<u8>>>(terms: impl IntoIterator<Item = T>) -> Result<Self> {
        Self::phrase(terms.into_iter().map(EngineQuery::term).collect())
    }

    pub fn composite(op: CompositeOp, subqueries: Vec<EngineQuery>) -> Result<Self> {
        if subqueries.is_empty() {
            return Err(Error::invalid_argument("Composite query needs at least one subquery"));
        }
        if op == CompositeOp::Phrase && !subqueries.iter().all(EngineQuery::is_equal_leaf) {
            return Err(Error::new(
                ErrorKind::UnsupportedQuery,
                "Phrase queries only take exact term leaves".to_string(),
            ));
        }
        Ok(EngineQuery::Composite { op, subqueries })
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, EngineQuery::Leaf { .. })
    }

    pub fn is_equal_leaf(&self) -> bool {
        matches!(self, EngineQuery::Leaf { op: LeafOp::Equal, .. })
    }

    /// Term of a leaf query.
    pub fn leaf_term(&self) -> Option<&[u8]> {
        match self {
            EngineQuery::Leaf { term, .. } => Some(term),
            EngineQuery::Composite { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn composites_need_subqueries() {
        let err = EngineQuery::and(Vec::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert!(EngineQuery::or(vec![EngineQuery::term("a")]).is_ok());
    }

    #[test]
    fn phrase_takes_only_exact_leaves() {
        assert!(EngineQuery::phrase_of(["the", "crazy"]).is_ok());

        let err = EngineQuery::phrase(vec![EngineQuery::term("a"), EngineQuery::starts_with("b")]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedQuery);

        let nested = EngineQuery::and(vec![EngineQuery::term("a")]).unwrap();
        assert!(EngineQuery::phrase(vec![nested]).is_err());
    }

    #[test]
    fn queries_are_hashable() {
        let mut set = HashSet::new();
        set.insert(EngineQuery::term("fox"));
        set.insert(EngineQuery::term("fox"));
        set.insert(EngineQuery::starts_with("fox"));
        assert_eq!(set.len(), 2);
        assert_eq!(EngineQuery::term("fox").leaf_term(), Some(&b"fox"[..]));
    }
}
