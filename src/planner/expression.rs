use crate::types::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Concat,
}

/// Scalar expression over literals (placeholders are bound before planning
/// finishes) and the columns of the row being updated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Column(String),
    BinaryOp {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    Negate(Box<Expression>),
}

impl Expression {
    // Helper constructors
    pub fn column(name: &str) -> Self {
        Expression::Column(name.to_string())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Expression::BinaryOp {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    /// Names of the columns this expression reads, in order of appearance.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns<'a>(&'a self, columns: &mut Vec<&'a str>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Column(name) => columns.push(name),
            Expression::BinaryOp { left, right, .. } => {
                left.collect_columns(columns);
                right.collect_columns(columns);
            }
            Expression::Negate(inner) => inner.collect_columns(columns),
        }
    }

    /// Evaluate with `resolve` supplying column values.
    pub fn evaluate<E, F>(&self, resolve: &F) -> Result<Value, E>
    where
        F: Fn(&str) -> Result<Value, E>,
    {
        match self {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Column(name) => resolve(name),
            Expression::BinaryOp {
                left,
                operator,
                right,
            } => {
                let left = left.evaluate(resolve)?;
                let right = right.evaluate(resolve)?;
                Ok(apply_binary(&left, *operator, &right))
            }
            Expression::Negate(inner) => Ok(negate(&inner.evaluate(resolve)?)),
        }
    }

    /// Value of an expression without column references, `None` otherwise.
    pub fn fold_constant(&self) -> Option<Value> {
        self.evaluate(&|_: &str| Err(())).ok()
    }
}

/// Apply an operator with SQLite semantics: NULL propagates, division by
/// zero yields NULL and integer overflow falls back to REAL.
pub fn apply_binary(left: &Value, operator: BinaryOperator, right: &Value) -> Value {
    if left.is_null() || right.is_null() {
        return Value::Null;
    }
    if operator == BinaryOperator::Concat {
        return Value::Text(format!("{}{}", text_of(left), text_of(right)));
    }

    match (numeric(left), numeric(right)) {
        (Value::Integer(a), Value::Integer(b)) => integer_arithmetic(a, operator, b),
        (a, b) => {
            let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) else {
                return Value::Null;
            };
            real_arithmetic(a, operator, b)
        }
    }
}

pub fn negate(value: &Value) -> Value {
    match numeric(value) {
        Value::Null => Value::Null,
        Value::Integer(i) => match i.checked_neg() {
            Some(negated) => Value::Integer(negated),
            None => Value::Real(-(i as f64)),
        },
        Value::Real(r) => Value::Real(-r),
        _ => Value::Null,
    }
}

fn integer_arithmetic(a: i64, operator: BinaryOperator, b: i64) -> Value {
    let result = match operator {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Subtract => a.checked_sub(b),
        BinaryOperator::Multiply => a.checked_mul(b),
        BinaryOperator::Divide => {
            if b == 0 {
                return Value::Null;
            }
            a.checked_div(b)
        }
        BinaryOperator::Modulo => {
            if b == 0 {
                return Value::Null;
            }
            // i64::MIN % -1 only overflows in the intermediate quotient
            Some(a.checked_rem(b).unwrap_or(0))
        }
        BinaryOperator::Concat => None,
    };
    match result {
        Some(value) => Value::Integer(value),
        None => real_arithmetic(a as f64, operator, b as f64),
    }
}

fn real_arithmetic(a: f64, operator: BinaryOperator, b: f64) -> Value {
    match operator {
        BinaryOperator::Add => Value::Real(a + b),
        BinaryOperator::Subtract => Value::Real(a - b),
        BinaryOperator::Multiply => Value::Real(a * b),
        BinaryOperator::Divide if b == 0.0 => Value::Null,
        BinaryOperator::Divide => Value::Real(a / b),
        BinaryOperator::Modulo => {
            // Operands are truncated to integers, as SQLite does
            let (a, b) = (a.trunc(), b.trunc());
            if b == 0.0 {
                Value::Null
            } else {
                Value::Real(a % b)
            }
        }
        BinaryOperator::Concat => Value::Null,
    }
}

// Text and blobs take part in arithmetic through their numeric prefix
fn numeric(value: &Value) -> Value {
    match value {
        Value::Null | Value::Integer(_) | Value::Real(_) => value.clone(),
        Value::Text(text) => parse_numeric(text.trim()),
        Value::Blob(bytes) => parse_numeric(String::from_utf8_lossy(bytes).trim()),
    }
}

fn parse_numeric(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::Integer(i);
    }
    // Longest numeric-looking prefix that still parses ("inf" and "nan" do not count)
    let candidate_len = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(text.len());
    let candidate = &text[..candidate_len];
    let prefix_end = (1..=candidate.len())
        .filter(|end| candidate[..*end].parse::<f64>().is_ok())
        .last();
    match prefix_end {
        Some(end) => match candidate[..end].parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) => candidate[..end]
                .parse::<f64>()
                .map(Value::Real)
                .unwrap_or(Value::Integer(0)),
        },
        None => Value::Integer(0),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        other => other.to_string(),
    }
}
