//! Compiled SQL text and its positional parameters.

use std::collections::HashMap;

use crate::value::Value;

/// One named, positional parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct DacParameter {
    pub name: String,
    pub value: Value,
}

/// SQL text plus the parameters it references, in allocation order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlCommandInfo {
    pub sql: String,
    pub parameters: Vec<DacParameter>,
}

impl SqlCommandInfo {
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// Mints parameters, reusing one per distinct kind+value.
#[derive(Debug, Default)]
pub(crate) struct ParameterSet {
    params: Vec<DacParameter>,
    by_key: HashMap<String, usize>,
}

impl ParameterSet {
    pub(crate) fn add(&mut self, value: Value) -> String {
        let key = value.identity_key();
        if let Some(&index) = self.by_key.get(&key) {
            return self.params[index].name.clone();
        }
        let name = format!("@p{}", self.params.len());
        self.by_key.insert(key, self.params.len());
        self.params.push(DacParameter {
            name: name.clone(),
            value,
        });
        name
    }

    pub(crate) fn into_parameters(self) -> Vec<DacParameter> {
        self.params
    }
}

/// Bracket-quotes an identifier, doubling any closing bracket.
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Escapes LIKE wildcards in a literal prefix.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '%' | '_' | '[' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}
