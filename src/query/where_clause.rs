//! # Where Compiler
//!
//! Compiles a [`FilterNode`] tree into a native predicate document.
//!
//! Per node:
//! - every `and` child and `or` child is compiled first
//! - each field's comparisons are OR-ed (a single comparison is used as is)
//! - the node's fields are AND-ed
//! - result = `$and` of (and-children ++ own fields), plus `$or` of the
//!   or-children when present; a lone conjunct is returned unwrapped
//!
//! The empty node compiles to `{}`.

use bson::{doc, Bson, Document};

use super::ast::{FieldFilter, FilterNode};
use super::comparison::ComparisonCompiler;
use super::errors::QueryResult;

/// Recursive filter compiler
#[derive(Debug, Clone, Copy)]
pub struct WhereCompiler<'a> {
    comparisons: ComparisonCompiler<'a>,
}

impl<'a> WhereCompiler<'a> {
    pub fn new(comparisons: ComparisonCompiler<'a>) -> Self {
        Self { comparisons }
    }

    /// Compile a filter tree. Fails on the first error.
    pub fn compile(&self, node: &FilterNode) -> QueryResult<Document> {
        if node.is_empty() {
            return Ok(Document::new());
        }

        let mut conjuncts = node
            .and_children()
            .map(|child| self.compile(child).map(Bson::Document))
            .collect::<QueryResult<Vec<_>>>()?;

        let alternatives = node
            .or_children()
            .map(|child| self.compile(child).map(Bson::Document))
            .collect::<QueryResult<Vec<_>>>()?;

        let own = self.compile_fields(node)?;
        if !own.is_empty() {
            conjuncts.push(Bson::Document(own));
        }

        if alternatives.is_empty() && conjuncts.len() == 1 {
            if let Some(Bson::Document(single)) = conjuncts.pop() {
                return Ok(single);
            }
        }

        let mut predicate = Document::new();
        if !conjuncts.is_empty() {
            predicate.insert("$and", conjuncts);
        }
        if !alternatives.is_empty() {
            predicate.insert("$or", alternatives);
        }
        Ok(predicate)
    }

    fn compile_fields(&self, node: &FilterNode) -> QueryResult<Document> {
        let mut compiled = node
            .fields()
            .map(|field| self.compile_field(field))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(match compiled.len() {
            0 => Document::new(),
            1 => compiled.remove(0),
            _ => doc! { "$and": compiled },
        })
    }

    fn compile_field(&self, filter: &FieldFilter) -> QueryResult<Document> {
        let mut compiled = filter
            .comparisons
            .iter()
            .map(|comparison| self.comparisons.compile(&filter.field, comparison))
            .collect::<QueryResult<Vec<_>>>()?;

        Ok(match compiled.len() {
            0 => Document::new(),
            1 => compiled.remove(0),
            _ => doc! { "$or": compiled },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::query::ast::Operator;
    use crate::query::comparison::OperatorTable;
    use crate::query::parser::parse_filter;
    use crate::schema::{FieldTypeCatalog, TypeKind};
    use serde_json::json;

    fn compile_json(filter: serde_json::Value) -> QueryResult<Document> {
        let catalog = FieldTypeCatalog::with_fields([("age", TypeKind::Int)]);
        let table = OperatorTable::default();
        let config = CompilerConfig::default();
        let compiler = WhereCompiler::new(ComparisonCompiler::new(&catalog, &table, &config));
        compiler.compile(&parse_filter(&filter)?)
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert_eq!(compile_json(json!({})).unwrap(), Document::new());
    }

    #[test]
    fn test_single_operator_not_wrapped() {
        assert_eq!(
            compile_json(json!({"age": {"gt": 18}})).unwrap(),
            doc! { "age": { "$gt": 18 } }
        );
    }

    #[test]
    fn test_multiple_operators_are_ored() {
        let compiled = compile_json(json!({"age": {"lt": 10, "gt": 60}})).unwrap();
        let alternatives = compiled.get_array("$or").unwrap();
        assert_eq!(alternatives.len(), 2);
        assert!(alternatives.contains(&Bson::Document(doc! { "age": { "$lt": 10 } })));
        assert!(alternatives.contains(&Bson::Document(doc! { "age": { "$gt": 60 } })));
    }

    #[test]
    fn test_multiple_fields_are_anded() {
        let compiled = compile_json(json!({"a": {"eq": 1}, "b": {"eq": 2}})).unwrap();
        assert_eq!(
            compiled,
            doc! { "$and": [ { "a": { "$eq": 1 } }, { "b": { "$eq": 2 } } ] }
        );
    }

    #[test]
    fn test_groups() {
        let compiled = compile_json(json!({
            "and": [{"a": {"eq": 1}}],
            "or": [{"b": {"eq": 2}}, {"c": {"eq": 3}}]
        }))
        .unwrap();

        assert_eq!(
            compiled,
            doc! {
                "$and": [ { "a": { "$eq": 1 } } ],
                "$or": [ { "b": { "$eq": 2 } }, { "c": { "$eq": 3 } } ],
            }
        );
    }

    #[test]
    fn test_fail_fast_in_nested_group() {
        let err = compile_json(json!({"or": [{"age": {"bogus": 1}}]})).unwrap_err();
        assert_eq!(err.code(), "QUERY_UNKNOWN_OPERATOR");
    }

    #[test]
    fn test_programmatic_tree() {
        let catalog = FieldTypeCatalog::new();
        let table = OperatorTable::default();
        let config = CompilerConfig::default();
        let compiler = WhereCompiler::new(ComparisonCompiler::new(&catalog, &table, &config));

        let node = FilterNode::new().with_field("name", Operator::Eq, "ann");
        assert_eq!(
            compiler.compile(&node).unwrap(),
            doc! { "name": { "$eq": "ann" } }
        );
    }
}
