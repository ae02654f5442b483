use super::SqlValue;
use crate::error::AppError;

/// FilterValue
///
/// A criterion value after it has been coerced from its query-string form. Absence is
/// modelled by `Option<FilterValue>`, so `Int(0)` and `Flag(false)` are real values.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i32),
    Flag(bool),
}

/// Operator
///
/// How a descriptor's column is compared to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `column ILIKE $n`
    ContainsInsensitive,
    /// `column >= $n`
    AtLeast,
    /// `column <= $n`
    AtMost,
    /// `column > 0` when the flag is true; binds nothing and never narrows on false.
    PositiveWhenSet,
}

/// FilterDescriptor
///
/// One filterable field. A table of these is walked in declaration order, which fixes the
/// placeholder numbering of the compiled clause.
#[derive(Debug)]
pub struct FilterDescriptor {
    /// External (query-string) field name.
    pub field: &'static str,
    pub column: &'static str,
    pub operator: Operator,
    pub preprocess: fn(FilterValue) -> FilterValue,
    /// Injected for an absent field when compiling with [`FilterMode::InjectDefaults`].
    pub fallback: Option<FilterValue>,
}

/// RangeRule
///
/// Cross-field constraint `lower <= upper`, checked before any clause is emitted.
#[derive(Debug)]
pub struct RangeRule {
    pub lower: &'static str,
    pub upper: &'static str,
    pub message: &'static str,
}

#[derive(Debug)]
pub struct FilterTable {
    pub descriptors: &'static [FilterDescriptor],
    pub ranges: &'static [RangeRule],
    pub order_by: &'static str,
}

impl FilterTable {
    fn descriptor(&self, field: &str) -> Option<&FilterDescriptor> {
        self.descriptors.iter().find(|d| d.field == field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Absent criteria contribute nothing to the clause.
    ExplicitOnly,
    /// Absent criteria with a fallback are filled in before compiling.
    InjectDefaults,
}

/// Criteria
///
/// Lookup of a coerced criterion by its external field name.
pub trait Criteria {
    fn get(&self, field: &str) -> Option<FilterValue>;
}

/// CompiledFilter
///
/// A WHERE predicate with numbered placeholders, the values for those placeholders in
/// order, and the ordering key of the resource.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub clause: String,
    pub params: Vec<SqlValue>,
    pub order_by: &'static str,
}

impl CompiledFilter {
    /// Appends the predicate and ordering to a `SELECT ... FROM ...` prefix.
    pub fn select_from(&self, base: &str) -> String {
        format!("{} WHERE {} ORDER BY {}", base, self.clause, self.order_by)
    }
}

pub fn identity(value: FilterValue) -> FilterValue {
    value
}

/// Wraps text in `%` so that ILIKE matches it anywhere in the column.
pub fn contains_pattern(value: FilterValue) -> FilterValue {
    match value {
        FilterValue::Text(text) => FilterValue::Text(format!("%{}%", text)),
        other => other,
    }
}

/// compile
///
/// Compiles criteria against a descriptor table.
///
/// Range rules run first over the effective values (fallbacks included when injecting
/// defaults), and a violation fails before anything is emitted. The clause then starts at
/// `1=1` and each present field appends ` AND <fragment>` with the next placeholder.
pub fn compile<C>(criteria: &C, table: &FilterTable, mode: FilterMode) -> Result<CompiledFilter, AppError>
where
    C: Criteria + ?Sized,
{
    let effective = |descriptor: &FilterDescriptor| -> Option<FilterValue> {
        criteria.get(descriptor.field).or_else(|| match mode {
            FilterMode::InjectDefaults => descriptor.fallback.clone(),
            FilterMode::ExplicitOnly => None,
        })
    };

    for rule in table.ranges {
        let lower = table.descriptor(rule.lower).and_then(effective);
        let upper = table.descriptor(rule.upper).and_then(effective);
        if let (Some(FilterValue::Int(lower)), Some(FilterValue::Int(upper))) = (lower, upper) {
            if lower > upper {
                return Err(AppError::BadRequest(rule.message.to_string()));
            }
        }
    }

    let mut clause = String::from("1=1");
    let mut params = Vec::new();

    for descriptor in table.descriptors {
        let Some(value) = effective(descriptor) else {
            continue;
        };

        let comparison = match descriptor.operator {
            Operator::ContainsInsensitive => "ILIKE",
            Operator::AtLeast => ">=",
            Operator::AtMost => "<=",
            Operator::PositiveWhenSet => {
                if value == FilterValue::Flag(true) {
                    clause.push_str(&format!(" AND {} > 0", descriptor.column));
                }
                continue;
            }
        };

        let bound = match (descriptor.preprocess)(value) {
            FilterValue::Text(text) => SqlValue::Text(text),
            FilterValue::Int(number) => SqlValue::Int(number),
            FilterValue::Flag(_) => {
                return Err(AppError::BadRequest(format!(
                    "{} does not accept a boolean",
                    descriptor.field
                )));
            }
        };

        params.push(bound);
        clause.push_str(&format!(
            " AND {} {} ${}",
            descriptor.column,
            comparison,
            params.len()
        ));
    }

    let compiled = CompiledFilter {
        clause,
        params,
        order_by: table.order_by,
    };
    tracing::debug!(clause = %compiled.clause, params = ?compiled.params, ?mode, "compiled filter");
    Ok(compiled)
}
