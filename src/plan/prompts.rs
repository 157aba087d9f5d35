//! Prompt templates for plan compilation and SQL synthesis.

use crate::schema::SchemaDescriptor;

use super::QueryPlan;

/// Prompt asking the model to produce a structured query plan as JSON.
pub fn plan_prompt(question: &str, schema: &SchemaDescriptor) -> String {
    format!(
        r#"You are an expert database query planner. Analyze the natural language question and produce a structured query plan against the schema below.

**Database Schema:**
```
{schema}
```

**Natural Language Question:**
```
{question}
```

Return ONLY a JSON object with this exact structure, no prose and no markdown:
{{
  "tables": ["table_name", ...],
  "fields": [
    {{"column": "col"}},
    {{"aggregate": "count|sum|avg|min|max", "column": "col", "alias": "name"}}
  ],
  "filters": [{{"field": "col", "op": "eq|ne|gt|gte|lt|lte|like|in", "value": ...}}],
  "group_by": ["col", ...],
  "order_by": {{"field": "col_or_alias", "direction": "asc|desc"}},
  "limit": 10
}}

Rules:
- Reference only tables and columns that appear in the schema.
- "filters", "group_by", "order_by" and "limit" are optional; omit them when the question does not call for them.
- If the question has multiple intents, plan only the primary one.
"#,
        schema = schema.to_prompt_block(),
        question = question,
    )
}

/// Corrective instruction appended when the first plan attempt fails.
pub fn retry_suffix(failure: &str) -> String {
    format!(
        r#"

Your previous response was rejected: {failure}.
Return ONLY the corrected JSON object, with every table and column taken verbatim from the schema above."#,
    )
}

/// Prompt converting a validated plan into one executable SQL statement.
pub fn sql_prompt(plan: &QueryPlan, schema: &SchemaDescriptor, max_rows: usize) -> String {
    let plan_json = serde_json::to_string_pretty(plan).unwrap_or_default();
    format!(
        r#"You are a SQL expert. Convert this structured query plan into exactly one executable SQL statement.

**Database Schema:**
```
{schema}
```

**Query Plan:**
```json
{plan_json}
```

Instructions:
1. Produce a single read-only SELECT statement.
2. Use the plan's fields for the SELECT clause, filters for WHERE, group_by for GROUP BY and order_by for ORDER BY.
3. Include a LIMIT clause; never exceed {max_rows} rows.
4. Return only the SQL statement, no explanations.
"#,
        schema = schema.to_prompt_block(),
    )
}

/// Fallback prompt: direct question-to-SQL, skipping the structured plan.
pub fn direct_sql_prompt(question: &str, schema: &SchemaDescriptor, max_rows: usize) -> String {
    format!(
        r#"You are a SQL expert. Answer the question below with exactly one executable SQL statement against this schema.

**Database Schema:**
```
{schema}
```

**Question:**
```
{question}
```

Instructions:
1. Produce a single read-only SELECT statement using only tables and columns from the schema.
2. Include a LIMIT clause; never exceed {max_rows} rows.
3. Return only the SQL statement, no explanations.
"#,
        schema = schema.to_prompt_block(),
    )
}
