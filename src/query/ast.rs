//! Filter AST
//!
//! Filter requests are parsed once into this typed tree; every compiler
//! downstream works on it rather than on raw request maps.

use std::fmt;

use bson::Bson;
use serde::{Deserialize, Serialize};

/// Comparison operators
///
/// Names are case-insensitive on input. Names outside the known set are
/// kept as [`Operator::Custom`] so a configured operator table can still
/// resolve them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Is,
    IsNot,
    Between,
    NotBetween,
    /// Lower-cased name not known to the compiler
    Custom(String),
}

impl Operator {
    /// Parses an operator name, ignoring case
    pub fn parse(name: &str) -> Self {
        let normalized = name.to_lowercase();
        match normalized.as_str() {
            "eq" => Operator::Eq,
            "neq" => Operator::Neq,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "in" => Operator::In,
            "notin" => Operator::NotIn,
            "is" => Operator::Is,
            "isnot" => Operator::IsNot,
            "between" => Operator::Between,
            "notbetween" => Operator::NotBetween,
            _ => Operator::Custom(normalized),
        }
    }

    /// Returns the lower-case operator name
    pub fn name(&self) -> &str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::NotIn => "notin",
            Operator::Is => "is",
            Operator::IsNot => "isnot",
            Operator::Between => "between",
            Operator::NotBetween => "notbetween",
            Operator::Custom(name) => name,
        }
    }

    /// Returns true for operators expanding into a lower/upper pair
    pub fn is_range(&self) -> bool {
        matches!(self, Operator::Between | Operator::NotBetween)
    }

    /// Returns true for operators whose value must be a list
    pub fn requires_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One `operator: value` pair applied to a field
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub operator: Operator,
    pub value: Bson,
}

impl Comparison {
    pub fn new(operator: Operator, value: impl Into<Bson>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}

/// All comparisons stated for one field.
///
/// More than one comparison means the field matches if ANY of them holds.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub comparisons: Vec<Comparison>,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, comparisons: Vec<Comparison>) -> Self {
        Self {
            field: field.into(),
            comparisons,
        }
    }
}

/// A clause of a filter node
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Direct per-field comparisons
    Field(FieldFilter),
    /// Sub-filters that must all match
    And(Vec<FilterNode>),
    /// Sub-filters of which at least one must match
    Or(Vec<FilterNode>),
}

/// A filter tree node. The empty node matches everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterNode {
    pub clauses: Vec<Clause>,
}

impl FilterNode {
    /// Creates the match-everything filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single comparison on a field
    pub fn with_field(
        mut self,
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<Bson>,
    ) -> Self {
        self.clauses.push(Clause::Field(FieldFilter::new(
            field,
            vec![Comparison::new(operator, value)],
        )));
        self
    }

    /// Adds a field with several comparisons (OR-combined)
    pub fn with_field_filter(mut self, filter: FieldFilter) -> Self {
        self.clauses.push(Clause::Field(filter));
        self
    }

    /// Adds an and-group
    pub fn with_and(mut self, nodes: Vec<FilterNode>) -> Self {
        self.clauses.push(Clause::And(nodes));
        self
    }

    /// Adds an or-group
    pub fn with_or(mut self, nodes: Vec<FilterNode>) -> Self {
        self.clauses.push(Clause::Or(nodes));
        self
    }

    /// Returns true if the node has no clauses
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Direct field filters of this node, in request order
    pub fn fields(&self) -> impl Iterator<Item = &FieldFilter> {
        self.clauses.iter().filter_map(|clause| match clause {
            Clause::Field(filter) => Some(filter),
            _ => None,
        })
    }

    /// Sub-filters of every and-group of this node
    pub fn and_children(&self) -> impl Iterator<Item = &FilterNode> {
        self.clauses
            .iter()
            .filter_map(|clause| match clause {
                Clause::And(nodes) => Some(nodes.iter()),
                _ => None,
            })
            .flatten()
    }

    /// Sub-filters of every or-group of this node
    pub fn or_children(&self) -> impl Iterator<Item = &FilterNode> {
        self.clauses
            .iter()
            .filter_map(|clause| match clause {
                Clause::Or(nodes) => Some(nodes.iter()),
                _ => None,
            })
            .flatten()
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Native sort value (`1` / `-1`)
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses the textual form: a leading `-` means descending, a leading
    /// `+` is an explicit ascending marker.
    pub fn parse(token: &str) -> Self {
        if let Some(field) = token.strip_prefix('-') {
            SortField::desc(field)
        } else if let Some(field) = token.strip_prefix('+') {
            SortField::asc(field)
        } else {
            SortField::asc(token)
        }
    }
}

/// Direction of a cursor page request relative to its boundary row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
    Before,
    #[default]
    After,
}

/// Pagination window handed to the executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PageWindow {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}
