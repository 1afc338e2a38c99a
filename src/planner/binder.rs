use std::collections::HashMap;

use crate::{planner::error::PlannerError, types::value::Value};

/// Highest parameter number accepted, as in SQLite.
pub const MAX_PARAMETER_INDEX: usize = 32766;

#[derive(Debug, Clone, PartialEq, Eq)]
struct BindParamState {
    next_index: usize,
    named_indices: HashMap<(char, String), usize>,
}

impl Default for BindParamState {
    fn default() -> Self {
        Self {
            next_index: 1,
            named_indices: HashMap::new(),
        }
    }
}

impl BindParamState {
    fn claim_anonymous(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    // An anonymous `?` after `?N` takes N + 1
    fn register_numbered(&mut self, index: usize) -> usize {
        self.next_index = self.next_index.max(index + 1);
        index
    }

    fn register_named(&mut self, prefix: char, name: &str) -> usize {
        let key = (prefix, name.to_string());
        if let Some(index) = self.named_indices.get(&key) {
            return *index;
        }
        let index = self.claim_anonymous();
        self.named_indices.insert(key, index);
        index
    }
}

/// Substitutes positional arguments for placeholders, visited in text order.
///
/// `?` takes the next index, `?NNN` takes index NNN (1-based) and named
/// placeholders (`:a`, `@a`, `$a`) take an index on first use. The statement
/// requires as many arguments as the highest index it used.
pub struct Binder<'a> {
    args: &'a [Value],
    state: BindParamState,
    highest_index: usize,
}

impl<'a> Binder<'a> {
    pub fn new(args: &'a [Value]) -> Self {
        Self {
            args,
            state: BindParamState::default(),
            highest_index: 0,
        }
    }

    /// Value for one placeholder token. An index past the end of the
    /// argument list yields NULL here and fails in [`Binder::finish`].
    pub fn bind(&mut self, placeholder: &str) -> Result<Value, PlannerError> {
        let mut chars = placeholder.chars();
        let index = match chars.next() {
            Some('?') if placeholder.len() == 1 => self.state.claim_anonymous(),
            Some('?') => {
                let number = chars
                    .as_str()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=MAX_PARAMETER_INDEX).contains(n))
                    .ok_or_else(|| PlannerError::InvalidPlaceholder(placeholder.to_string()))?;
                self.state.register_numbered(number)
            }
            Some(prefix @ (':' | '@' | '$')) if placeholder.len() > 1 => {
                self.state.register_named(prefix, chars.as_str())
            }
            _ => return Err(PlannerError::InvalidPlaceholder(placeholder.to_string())),
        };

        if index > MAX_PARAMETER_INDEX {
            return Err(PlannerError::InvalidPlaceholder(placeholder.to_string()));
        }
        self.highest_index = self.highest_index.max(index);
        Ok(self.args.get(index - 1).cloned().unwrap_or(Value::Null))
    }

    pub fn required_arguments(&self) -> usize {
        self.highest_index
    }

    /// Fail unless the statement used exactly as many arguments as supplied.
    pub fn finish(self) -> Result<(), PlannerError> {
        if self.highest_index != self.args.len() {
            return Err(PlannerError::ParameterCountMismatch {
                expected: self.highest_index,
                actual: self.args.len(),
            });
        }
        Ok(())
    }
}
