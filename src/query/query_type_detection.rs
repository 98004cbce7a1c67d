/// Leading-keyword statement classification, avoiding to_lowercase() allocations
pub struct QueryTypeDetector;

impl QueryTypeDetector {
    /// Classify trimmed query text as mutating or row-producing.
    ///
    /// Only the leading keyword is inspected. Anything that is not an
    /// INSERT, UPDATE or DELETE is assumed to produce rows, and malformed
    /// statements fail later in the executor.
    #[inline]
    pub fn classify(query: &str) -> StatementKind {
        let bytes = query.trim().as_bytes();

        if bytes.len() >= 6 {
            match &bytes[0..6] {
                b"INSERT" | b"insert" | b"Insert" => return StatementKind::Mutating,
                b"UPDATE" | b"update" | b"Update" => return StatementKind::Mutating,
                b"DELETE" | b"delete" | b"Delete" => return StatementKind::Mutating,
                _ => {}
            }

            // Mixed case fallback
            let head = &bytes[0..6];
            if head.eq_ignore_ascii_case(b"INSERT")
                || head.eq_ignore_ascii_case(b"UPDATE")
                || head.eq_ignore_ascii_case(b"DELETE")
            {
                return StatementKind::Mutating;
            }
        }

        StatementKind::RowProducing
    }

    #[inline]
    pub fn is_mutating(query: &str) -> bool {
        Self::classify(query) == StatementKind::Mutating
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// INSERT, UPDATE or DELETE: executed for an outcome
    Mutating,
    /// Everything else: run as a query
    RowProducing,
}

impl StatementKind {
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::Mutating => "mutating",
            StatementKind::RowProducing => "row-producing",
        }
    }
}
