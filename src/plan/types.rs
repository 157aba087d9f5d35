//! Types for the query plan intermediate representation.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::schema::SchemaDescriptor;

// ============================================================================
// Clause Types
// ============================================================================

/// Recognized aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// A requested output field: either a plain column reference or an
/// aggregate expression with an optional alias.
///
/// The model emits `{"column": "country"}` or
/// `{"aggregate": "sum", "column": "amount", "alias": "total_sales"}`.
/// Deserialization is manual: an `aggregate` key naming anything outside
/// the recognized functions is a parse error, never a reinterpretation as
/// a plain column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Aggregate {
        aggregate: AggregateFunction,
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    Column { column: String },
}

impl<'de> Deserialize<'de> for FieldSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawField {
            #[serde(default)]
            aggregate: Option<String>,
            column: String,
            #[serde(default)]
            alias: Option<String>,
        }

        let raw = RawField::deserialize(deserializer)?;
        match raw.aggregate {
            None => Ok(FieldSpec::Column { column: raw.column }),
            Some(name) => {
                let aggregate = match name.to_ascii_lowercase().as_str() {
                    "count" => AggregateFunction::Count,
                    "sum" => AggregateFunction::Sum,
                    "avg" => AggregateFunction::Avg,
                    "min" => AggregateFunction::Min,
                    "max" => AggregateFunction::Max,
                    other => {
                        return Err(serde::de::Error::custom(format!(
                            "unrecognized aggregate function '{}'",
                            other
                        )))
                    }
                };
                Ok(FieldSpec::Aggregate {
                    aggregate,
                    column: raw.column,
                    alias: raw.alias,
                })
            }
        }
    }
}

impl FieldSpec {
    /// The name this field carries in the result set.
    pub fn output_name(&self) -> String {
        match self {
            Self::Column { column } => column.clone(),
            Self::Aggregate {
                aggregate,
                column,
                alias,
            } => alias.clone().unwrap_or_else(|| {
                format!("{}_{}", aggregate.as_sql().to_lowercase(), column)
            }),
        }
    }
}

/// Recognized filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
}

/// One filter predicate: field, operator, comparison value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub field: String,
    pub op: FilterOp,
    pub value: serde_json::Value,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    Asc,
    Desc,
}

/// Ordering directive: field plus direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDirective {
    pub field: String,
    pub direction: OrderDirection,
}

// ============================================================================
// Query Plan
// ============================================================================

/// Structured intermediate representation of one question.
///
/// Created by the [`super::PlanCompiler`], consumed once by the query
/// synthesizer, discarded when the pipeline invocation completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Target tables; every name must exist in the schema.
    pub tables: Vec<String>,
    /// Requested output fields, in order.
    pub fields: Vec<FieldSpec>,
    /// Filter predicates, all conjoined.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterPredicate>,
    /// Group-by fields for aggregation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    /// Optional ordering directive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderDirective>,
    /// Row-limit hint; positive, capped downstream by the system maximum.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl QueryPlan {
    /// Validate every reference in the plan against the schema.
    ///
    /// Invariant: after this returns `Ok`, no clause of the plan mentions a
    /// table or field that does not resolve against `schema` (aggregate
    /// aliases count as resolvable for ordering).
    pub fn validate(&self, schema: &SchemaDescriptor) -> Result<(), PlanError> {
        if self.tables.is_empty() {
            return Err(PlanError::MalformedPlan("plan targets no tables".to_string()));
        }
        for table in &self.tables {
            if schema.table(table).is_none() {
                return Err(PlanError::NoMatchingTable(table.clone()));
            }
        }

        if self.fields.is_empty() {
            return Err(PlanError::MalformedPlan("plan requests no fields".to_string()));
        }
        for field in &self.fields {
            match field {
                FieldSpec::Column { column } => self.resolve(schema, column)?,
                FieldSpec::Aggregate {
                    aggregate, column, ..
                } => {
                    // COUNT(*) is the one star the IR admits.
                    if !(column == "*" && *aggregate == AggregateFunction::Count) {
                        self.resolve(schema, column)?;
                    }
                }
            }
        }

        for filter in &self.filters {
            self.resolve(schema, &filter.field)?;
        }
        for field in &self.group_by {
            self.resolve(schema, field)?;
        }
        if let Some(order) = &self.order_by {
            if !self.is_output_name(&order.field) {
                self.resolve(schema, &order.field)?;
            }
        }

        if let Some(0) = self.limit {
            return Err(PlanError::MalformedPlan("limit must be positive".to_string()));
        }

        Ok(())
    }

    fn resolve(&self, schema: &SchemaDescriptor, column: &str) -> Result<(), PlanError> {
        if schema.resolves_in(&self.tables, column) {
            Ok(())
        } else {
            Err(PlanError::UnknownFieldReference(column.to_string()))
        }
    }

    /// Whether `name` is the output name of one of the plan's fields.
    fn is_output_name(&self, name: &str) -> bool {
        self.fields
            .iter()
            .any(|f| f.output_name().eq_ignore_ascii_case(name))
    }
}
