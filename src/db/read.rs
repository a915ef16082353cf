use super::{GraphDb, models::*};
use crate::error::StoreError;
use rusqlite::{OptionalExtension, Row, params};

fn count(db: &GraphDb, table: &str) -> rusqlite::Result<usize> {
    db.conn
        .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))
}

fn parse_column<T: std::str::FromStr<Err = String>>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

impl GraphDb {
    /// Returns node and edge totals.
    pub fn counts(&self) -> Result<GraphCounts, StoreError> {
        Ok(GraphCounts {
            lexemes: count(self, "lexeme")?,
            morphs: count(self, "morph")?,
            components: count(self, "component")?,
            derivations: count(self, "derivation")?,
        })
    }

    /// Retrieves a stored lexeme by id
    pub fn get_lexeme(&self, id: &str) -> Result<Option<StoredLexeme>, StoreError> {
        let lexeme = self
            .conn
            .query_row(
                r#"
                SELECT id, lemma, pos, lang, corpus_count, corpus_log_count, is_root
                FROM lexeme WHERE id = ?
                "#,
                params![id],
                |row| {
                    Ok(StoredLexeme {
                        id: row.get(0)?,
                        lemma: row.get(1)?,
                        pos: row.get(2)?,
                        lang: row.get(3)?,
                        corpus_count: row.get(4)?,
                        corpus_log_count: row.get(5)?,
                        is_root: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(lexeme)
    }

    /// Returns the COMPONENT edges into a lexeme, sorted by `order`.
    pub fn components_of(&self, lexeme_id: &str) -> Result<Vec<ComponentEdge>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT m.id, m.text, m.type, m.lang, m.corpus_count, m.corpus_log_count, c."order", c.type
            FROM component c
            JOIN morph m ON m.id = c.morph_id
            WHERE c.lexeme_id = ?
            ORDER BY c."order"
            "#,
        )?;
        let rows = stmt.query_map(params![lexeme_id], |row| {
            Ok(ComponentEdge {
                unit: ComponentUnit {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    kind: parse_column(row, 2)?,
                    lang: row.get(3)?,
                    corpus_count: row.get(4)?,
                    corpus_log_count: row.get(5)?,
                },
                order: row.get::<_, i64>(6)? as usize,
                edge_type: parse_column(row, 7)?,
            })
        })?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(edges)
    }

    /// Returns the DERIVATION edges pointing at `child_id`.
    pub fn parents_of(&self, child_id: &str) -> Result<Vec<DerivationEdge>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT child_id, parent_id, type FROM derivation WHERE child_id = ? ORDER BY parent_id, type",
        )?;
        let rows = stmt.query_map(params![child_id], |row| {
            Ok(DerivationEdge {
                child_id: row.get(0)?,
                parent_id: row.get(1)?,
                relation_type: row.get(2)?,
            })
        })?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(edges)
    }

    /// Returns the stored unit counts, for checking shared-unit aggregation.
    pub fn morph_count(&self, morph_id: &str) -> Result<Option<f64>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT corpus_count FROM morph WHERE id = ?",
                params![morph_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::GraphStore;
    use crate::db::queries::{DERIVATION_UPSERT, LEXEME_UPSERT};
    use serde_json::json;

    fn word(id: &str, count: f64, units: &[&str]) -> serde_json::Value {
        let components: Vec<_> = units
            .iter()
            .enumerate()
            .map(|(i, u)| {
                json!({"id": u, "text": u, "kind": "character", "lang": "zh",
                       "corpus_count": 1.0, "corpus_log_count": 2f64.ln(),
                       "order": i, "edge_type": "Compounding"})
            })
            .collect();
        json!({"id": id, "lemma": id, "pos": "NOUN", "lang": "zh",
               "corpus_count": count, "corpus_log_count": (count + 1.0).ln(),
               "is_root": true, "features": "{}", "misc": "{}",
               "morphology": null, "corpus_stats": null, "components": components})
    }

    #[test]
    fn test_upsert_and_read_back() {
        let mut db = GraphDb::open_in_memory().unwrap();
        db.execute_write(&LEXEME_UPSERT, &[word("ab", 5.0, &["a", "b"]), word("ba", 2.0, &["b", "a"])])
            .unwrap();

        let counts = db.counts().unwrap();
        assert_eq!(counts.lexemes, 2);
        assert_eq!(counts.morphs, 2);
        assert_eq!(counts.components, 4);

        let lex = db.get_lexeme("ab").unwrap().unwrap();
        assert_eq!(lex.corpus_count, 5.0);
        assert!(lex.is_root);

        let order: Vec<String> = db
            .components_of("ba")
            .unwrap()
            .into_iter()
            .map(|e| e.unit.text)
            .collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_repeated_unit_keeps_every_position() {
        let mut db = GraphDb::open_in_memory().unwrap();
        db.execute_write(&LEXEME_UPSERT, &[word("aba", 1.0, &["a", "b", "a"])])
            .unwrap();
        let edges = db.components_of("aba").unwrap();
        assert_eq!(edges.len(), 3);
        assert_eq!(db.counts().unwrap().morphs, 2);
    }

    #[test]
    fn test_parents_of() {
        let mut db = GraphDb::open_in_memory().unwrap();
        db.execute_write(&LEXEME_UPSERT, &[word("x", 1.0, &[]), word("y", 1.0, &[])])
            .unwrap();
        db.execute_write(
            &DERIVATION_UPSERT,
            &[json!({"child_id": "x", "parent_id": "y", "type": "Derivation"})],
        )
        .unwrap();
        let parents = db.parents_of("x").unwrap();
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].parent_id, "y");
        assert!(db.get_lexeme("missing").unwrap().is_none());
    }
}
