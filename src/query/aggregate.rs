//! # Aggregate Compiler
//!
//! Compiles group-by and count/sum/avg/max/min requests into a native
//! `$group` stage, and decodes grouped result rows back into
//! [`AggregateResponse`]s.
//!
//! Result columns are named `<function>_<field>`; group keys live under
//! `_id` as `group_by_<field>`. Compilation records the structured
//! `(function, field)` pair for every column, so decoding a row compiled
//! here is a table lookup. Rows from elsewhere fall back to parsing the
//! alias.

use std::collections::BTreeMap;
use std::fmt;

use bson::{doc, Bson, Document};
use serde::Serialize;

use super::errors::{QueryError, QueryResult};
use super::request::AggregateQuery;

const GROUP_KEY: &str = "_id";
const GROUP_BY_PREFIX: &str = "group_by";

/// Accumulator functions, in column emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateFunction {
    pub const ALL: [AggregateFunction; 5] = [
        AggregateFunction::Count,
        AggregateFunction::Sum,
        AggregateFunction::Avg,
        AggregateFunction::Max,
        AggregateFunction::Min,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Max => "max",
            AggregateFunction::Min => "min",
        }
    }

    /// Field list requested for this function
    fn fields<'q>(&self, query: &'q AggregateQuery) -> &'q [String] {
        match self {
            AggregateFunction::Count => &query.count,
            AggregateFunction::Sum => &query.sum,
            AggregateFunction::Avg => &query.avg,
            AggregateFunction::Max => &query.max,
            AggregateFunction::Min => &query.min,
        }
    }

    /// Native accumulator over `field`.
    ///
    /// `count` is a conditional sum: missing and null values count 0,
    /// anything else counts 1.
    fn accumulator(&self, field: &str) -> Document {
        let path = format!("${}", field);
        match self {
            AggregateFunction::Count => doc! {
                "$sum": {
                    "$cond": {
                        "if": { "$in": [ { "$type": path }, ["missing", "null"] ] },
                        "then": 0,
                        "else": 1,
                    }
                }
            },
            AggregateFunction::Sum => doc! { "$sum": path },
            AggregateFunction::Avg => doc! { "$avg": path },
            AggregateFunction::Max => doc! { "$max": path },
            AggregateFunction::Min => doc! { "$min": path },
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a result column holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    GroupBy,
    Function(AggregateFunction),
}

/// One requested accumulator column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateColumn {
    pub function: AggregateFunction,
    pub field: String,
}

impl AggregateColumn {
    pub fn new(function: AggregateFunction, field: impl Into<String>) -> Self {
        Self {
            function,
            field: field.into(),
        }
    }

    /// Wire name of the column
    pub fn alias(&self) -> String {
        format!("{}_{}", self.function, self.field)
    }
}

/// Wire name of a group key
pub fn group_by_alias(field: &str) -> String {
    format!("{}_{}", GROUP_BY_PREFIX, field)
}

/// Splits `<function>_<field>` into its parts.
///
/// `function` is one of avg, sum, count, max, min or group_by, and the
/// field part must be non-empty.
pub fn parse_alias(alias: &str) -> QueryResult<(ColumnKind, String)> {
    let prefixes = AggregateFunction::ALL
        .iter()
        .map(|function| (function.as_str(), ColumnKind::Function(*function)))
        .chain(std::iter::once((GROUP_BY_PREFIX, ColumnKind::GroupBy)));

    for (prefix, kind) in prefixes {
        let field = alias
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|field| !field.is_empty());

        if let Some(field) = field {
            return Ok((kind, field.to_string()));
        }
    }

    Err(QueryError::UnknownAggregateColumn(alias.to_string()))
}

/// Compiled grouping expression
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateGrouping {
    /// Body of the `$group` stage, `_id` included
    pub group: Document,
    pub group_by: Vec<String>,
    pub columns: Vec<AggregateColumn>,
    lookup: BTreeMap<String, usize>,
}

impl AggregateGrouping {
    /// Ascending sort over the group keys, or `None` without group-by
    pub fn sort(&self) -> Option<Document> {
        if self.group_by.is_empty() {
            return None;
        }

        let mut sort = Document::new();
        for field in &self.group_by {
            sort.insert(format!("{}.{}", GROUP_KEY, group_by_alias(field)), 1);
        }
        Some(sort)
    }

    /// Structured column for an alias produced by this grouping
    pub fn column(&self, alias: &str) -> Option<&AggregateColumn> {
        self.lookup.get(alias).map(|&index| &self.columns[index])
    }

    fn resolve(&self, alias: &str) -> QueryResult<(ColumnKind, String)> {
        match self.column(alias) {
            Some(column) => Ok((ColumnKind::Function(column.function), column.field.clone())),
            None => parse_alias(alias),
        }
    }

    /// Decode grouped result rows, one response per row
    pub fn decode(&self, rows: &[Document]) -> QueryResult<Vec<AggregateResponse>> {
        rows.iter()
            .map(|row| decode_row(row, |alias| self.resolve(alias)))
            .collect()
    }
}

/// One decoded group
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResponse {
    pub group_by: BTreeMap<String, Bson>,
    pub count: BTreeMap<String, Bson>,
    pub sum: BTreeMap<String, Bson>,
    pub avg: BTreeMap<String, Bson>,
    pub max: BTreeMap<String, Bson>,
    pub min: BTreeMap<String, Bson>,
}

impl AggregateResponse {
    fn values_mut(&mut self, function: AggregateFunction) -> &mut BTreeMap<String, Bson> {
        match function {
            AggregateFunction::Count => &mut self.count,
            AggregateFunction::Sum => &mut self.sum,
            AggregateFunction::Avg => &mut self.avg,
            AggregateFunction::Max => &mut self.max,
            AggregateFunction::Min => &mut self.min,
        }
    }

    /// Value of one accumulator column
    pub fn get(&self, function: AggregateFunction, field: &str) -> Option<&Bson> {
        match function {
            AggregateFunction::Count => self.count.get(field),
            AggregateFunction::Sum => self.sum.get(field),
            AggregateFunction::Avg => self.avg.get(field),
            AggregateFunction::Max => self.max.get(field),
            AggregateFunction::Min => self.min.get(field),
        }
    }

    /// Merge another partial response into this one
    pub fn merge(&mut self, other: AggregateResponse) {
        self.group_by.extend(other.group_by);
        self.count.extend(other.count);
        self.sum.extend(other.sum);
        self.avg.extend(other.avg);
        self.max.extend(other.max);
        self.min.extend(other.min);
    }

    /// Flat record: group keys by field name, then `<function>_<field>`
    pub fn to_record(&self) -> Document {
        let mut record = Document::new();
        for (field, value) in &self.group_by {
            record.insert(field.clone(), value.clone());
        }
        for function in AggregateFunction::ALL {
            let values = match function {
                AggregateFunction::Count => &self.count,
                AggregateFunction::Sum => &self.sum,
                AggregateFunction::Avg => &self.avg,
                AggregateFunction::Max => &self.max,
                AggregateFunction::Min => &self.min,
            };
            for (field, value) in values {
                record.insert(AggregateColumn::new(function, field.as_str()).alias(), value.clone());
            }
        }
        record
    }
}

fn decode_columns<'d, F>(
    columns: impl Iterator<Item = (&'d String, &'d Bson)>,
    resolve: &F,
) -> QueryResult<AggregateResponse>
where
    F: Fn(&str) -> QueryResult<(ColumnKind, String)>,
{
    let mut response = AggregateResponse::default();
    for (alias, value) in columns {
        match resolve(alias)? {
            (ColumnKind::GroupBy, field) => {
                response.group_by.insert(field, value.clone());
            }
            (ColumnKind::Function(function), field) => {
                response.values_mut(function).insert(field, value.clone());
            }
        }
    }
    Ok(response)
}

fn decode_row<F>(row: &Document, resolve: F) -> QueryResult<AggregateResponse>
where
    F: Fn(&str) -> QueryResult<(ColumnKind, String)>,
{
    let mut response = match row.get(GROUP_KEY) {
        Some(Bson::Document(keys)) => decode_columns(keys.iter(), &resolve)?,
        _ => AggregateResponse::default(),
    };

    let accumulators = decode_columns(row.iter().filter(|(key, _)| *key != GROUP_KEY), &resolve)?;
    response.merge(accumulators);
    Ok(response)
}

/// Stateless compiler for aggregate requests
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateCompiler;

impl AggregateCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile an aggregate request into a `$group` body.
    ///
    /// Fails with `NoAggregateFieldsSpecified` when every function list is
    /// empty.
    pub fn compile(&self, query: &AggregateQuery) -> QueryResult<AggregateGrouping> {
        if query.has_no_functions() {
            return Err(QueryError::NoAggregateFieldsSpecified);
        }

        let group_key = if query.group_by.is_empty() {
            Bson::Null
        } else {
            let mut keys = Document::new();
            for field in &query.group_by {
                keys.insert(group_by_alias(field), format!("${}", field));
            }
            Bson::Document(keys)
        };

        let mut group = doc! { GROUP_KEY: group_key };
        let mut columns = Vec::new();
        let mut lookup = BTreeMap::new();

        for function in AggregateFunction::ALL {
            for field in function.fields(query) {
                let column = AggregateColumn::new(function, field.as_str());
                let alias = column.alias();
                group.insert(alias.clone(), function.accumulator(field));
                lookup.insert(alias, columns.len());
                columns.push(column);
            }
        }

        Ok(AggregateGrouping {
            group,
            group_by: query.group_by.clone(),
            columns,
            lookup,
        })
    }

    /// Decode rows by alias parsing alone
    pub fn decode(&self, rows: &[Document]) -> QueryResult<Vec<AggregateResponse>> {
        rows.iter().map(|row| decode_row(row, parse_alias)).collect()
    }
}
