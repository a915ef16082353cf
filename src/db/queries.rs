//! Declarative write operations and the payload contract they expect.
//!
//! Every operation receives its whole chunk as one named list parameter,
//! bound as a JSON array and unwound with `json_each`. All statements of an
//! operation run inside the same transaction, in order.
use serde_json::Value;

use crate::error::PipelineError;

/// Semantic type of one payload field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Text,
    OptionalText,
    Number,
    Bool,
    /// A list of nested records, each checked against the given fields.
    List(&'static [Field]),
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> Field {
    Field { name, kind }
}

/// A parameterized upsert: statement templates plus the list parameter they unwind.
#[derive(Debug)]
pub struct WriteOperation {
    pub name: &'static str,
    pub param: &'static str,
    pub statements: &'static [&'static str],
    pub fields: &'static [Field],
}

impl WriteOperation {
    /// Check one serialized record against this operation's payload contract.
    pub fn check_record(&self, index: usize, record: &Value) -> Result<(), PipelineError> {
        check_fields(self.fields, record, "").map_err(|reason| PipelineError::Schema {
            operation: self.name,
            index,
            reason,
        })
    }
}

fn check_fields(fields: &[Field], record: &Value, prefix: &str) -> Result<(), String> {
    let object = record
        .as_object()
        .ok_or_else(|| format!("{prefix}expected an object"))?;

    for f in fields {
        let value = object.get(f.name).unwrap_or(&Value::Null);
        let ok = match f.kind {
            FieldKind::Text => value.is_string(),
            FieldKind::OptionalText => value.is_string() || value.is_null(),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::List(nested) => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        check_fields(nested, item, &format!("{prefix}{}[{i}].", f.name))?;
                    }
                    true
                }
                None => false,
            },
        };
        if !ok {
            return Err(format!("{prefix}{} has the wrong type or is missing", f.name));
        }
    }
    Ok(())
}

// ── Lexeme + Morph upsert ────────────────────────────────────────────

const COMPONENT_FIELDS: &[Field] = &[
    field("id", FieldKind::Text),
    field("text", FieldKind::Text),
    field("kind", FieldKind::Text),
    field("lang", FieldKind::Text),
    field("corpus_count", FieldKind::Number),
    field("corpus_log_count", FieldKind::Number),
    field("order", FieldKind::Number),
    field("edge_type", FieldKind::Text),
];

const LEXEME_FIELDS: &[Field] = &[
    field("id", FieldKind::Text),
    field("lemma", FieldKind::Text),
    field("pos", FieldKind::Text),
    field("lang", FieldKind::Text),
    field("corpus_count", FieldKind::Number),
    field("corpus_log_count", FieldKind::Number),
    field("is_root", FieldKind::Bool),
    field("features", FieldKind::Text),
    field("misc", FieldKind::Text),
    field("morphology", FieldKind::OptionalText),
    field("corpus_stats", FieldKind::OptionalText),
    field("components", FieldKind::List(COMPONENT_FIELDS)),
];

const MERGE_LEXEMES: &str = r#"
INSERT INTO lexeme (id, lemma, pos, lang, is_root, corpus_count, corpus_log_count,
                    features, misc, morphology, corpus_stats)
SELECT json_extract(w.value, '$.id'),
       json_extract(w.value, '$.lemma'),
       json_extract(w.value, '$.pos'),
       json_extract(w.value, '$.lang'),
       json_extract(w.value, '$.is_root'),
       json_extract(w.value, '$.corpus_count'),
       json_extract(w.value, '$.corpus_log_count'),
       json_extract(w.value, '$.features'),
       json_extract(w.value, '$.misc'),
       json_extract(w.value, '$.morphology'),
       json_extract(w.value, '$.corpus_stats')
FROM json_each(:batch) AS w
WHERE true
ON CONFLICT(id) DO UPDATE SET
    lemma = excluded.lemma,
    pos = excluded.pos,
    lang = excluded.lang,
    is_root = excluded.is_root,
    corpus_count = excluded.corpus_count,
    corpus_log_count = excluded.corpus_log_count,
    features = excluded.features,
    misc = excluded.misc,
    morphology = excluded.morphology,
    corpus_stats = excluded.corpus_stats
"#;

const MERGE_MORPHS: &str = r#"
INSERT INTO morph (id, text, type, lang, corpus_count, corpus_log_count)
SELECT json_extract(c.value, '$.id'),
       json_extract(c.value, '$.text'),
       json_extract(c.value, '$.kind'),
       json_extract(c.value, '$.lang'),
       json_extract(c.value, '$.corpus_count'),
       json_extract(c.value, '$.corpus_log_count')
FROM json_each(:batch) AS w, json_each(w.value, '$.components') AS c
WHERE true
ON CONFLICT(id) DO UPDATE SET
    text = excluded.text,
    type = excluded.type,
    lang = excluded.lang,
    corpus_count = excluded.corpus_count,
    corpus_log_count = excluded.corpus_log_count
"#;

const MERGE_COMPONENTS: &str = r#"
INSERT INTO component (morph_id, lexeme_id, "order", type)
SELECT json_extract(c.value, '$.id'),
       json_extract(w.value, '$.id'),
       json_extract(c.value, '$.order'),
       json_extract(c.value, '$.edge_type')
FROM json_each(:batch) AS w, json_each(w.value, '$.components') AS c
WHERE true
ON CONFLICT(lexeme_id, "order") DO UPDATE SET
    morph_id = excluded.morph_id,
    type = excluded.type
"#;

/// Merge `Lexeme` nodes, their `Morph` units and the COMPONENT edges between them.
pub const LEXEME_UPSERT: WriteOperation = WriteOperation {
    name: "lexeme_upsert",
    param: "batch",
    statements: &[MERGE_LEXEMES, MERGE_MORPHS, MERGE_COMPONENTS],
    fields: LEXEME_FIELDS,
};

// ── Derivation upsert ────────────────────────────────────────────────

const DERIVATION_FIELDS: &[Field] = &[
    field("child_id", FieldKind::Text),
    field("parent_id", FieldKind::Text),
    field("type", FieldKind::Text),
];

// Edges are only merged between lexemes that already exist.
const MERGE_DERIVATIONS: &str = r#"
INSERT INTO derivation (parent_id, child_id, type)
SELECT parent.id, child.id, json_extract(r.value, '$.type')
FROM json_each(:batch) AS r
JOIN lexeme AS parent ON parent.id = json_extract(r.value, '$.parent_id')
JOIN lexeme AS child ON child.id = json_extract(r.value, '$.child_id')
WHERE true
ON CONFLICT(parent_id, child_id, type) DO NOTHING
"#;

/// Merge typed DERIVATION edges between two present lexemes.
pub const DERIVATION_UPSERT: WriteOperation = WriteOperation {
    name: "derivation_upsert",
    param: "batch",
    statements: &[MERGE_DERIVATIONS],
    fields: DERIVATION_FIELDS,
};

// ── Constraints ──────────────────────────────────────────────────────

/// Uniqueness constraints on node identifiers. Re-running them fails with
/// "already exists", which callers treat as a warning.
pub const NODE_CONSTRAINTS: &[&str] = &[
    "CREATE UNIQUE INDEX lexeme_id_unique ON lexeme(id)",
    "CREATE UNIQUE INDEX morph_id_unique ON morph(id)",
];

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_derivation_record_contract() {
        let good = json!({"child_id": "a", "parent_id": "b", "type": "Derivation"});
        assert!(DERIVATION_UPSERT.check_record(0, &good).is_ok());

        let bad = json!({"child_id": "a", "type": "Derivation"});
        let err = DERIVATION_UPSERT.check_record(3, &bad).unwrap_err();
        match err {
            PipelineError::Schema { index, reason, .. } => {
                assert_eq!(index, 3);
                assert!(reason.contains("parent_id"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_component_contract() {
        let record = json!({
            "id": "ab", "lemma": "ab", "pos": "NOUN", "lang": "zh",
            "corpus_count": 5.0, "corpus_log_count": 1.79, "is_root": true,
            "features": "{}", "misc": "{}", "morphology": null, "corpus_stats": null,
            "components": [{"id": "a", "text": "a", "kind": "character", "lang": "zh",
                            "corpus_count": 8.0, "corpus_log_count": 2.19, "order": 0}]
        });
        let err = LEXEME_UPSERT.check_record(0, &record).unwrap_err();
        assert!(err.to_string().contains("components[0].edge_type"));
    }

    #[test]
    fn test_operations_reference_their_param() {
        for op in [&LEXEME_UPSERT, &DERIVATION_UPSERT] {
            let placeholder = format!(":{}", op.param);
            for stmt in op.statements {
                assert!(stmt.contains(&placeholder), "{} misses {placeholder}", op.name);
            }
        }
    }
}
