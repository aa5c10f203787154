//! Values exchanged with a connection.
//!
//! Statement parameters and catalog query results use the same small value
//! enum. Only the shapes catalog queries actually return are represented.

use serde::Serialize;

use crate::error::{DdlError, Result};

/// A single SQL value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    /// Integer arrays (PostgreSQL `int2vector` / `smallint[]` columns).
    IntArray(Vec<i64>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntArray(v)
    }
}

/// One result row with checked positional accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Row(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, idx: usize) -> Result<&Value> {
        self.0
            .get(idx)
            .ok_or_else(|| DdlError::Decode(format!("missing column {}", idx)))
    }

    /// Text cell; fails on NULL or any other type.
    pub fn text(&self, idx: usize) -> Result<String> {
        match self.get(idx)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(DdlError::Decode(format!(
                "column {}: expected text, got {:?}",
                idx, other
            ))),
        }
    }

    /// Text cell that may be NULL.
    pub fn opt_text(&self, idx: usize) -> Result<Option<String>> {
        match self.get(idx)? {
            Value::Null => Ok(None),
            _ => self.text(idx).map(Some),
        }
    }

    pub fn int(&self, idx: usize) -> Result<i64> {
        match self.get(idx)? {
            Value::Int(v) => Ok(*v),
            Value::Text(s) => s.trim().parse().map_err(|_| {
                DdlError::Decode(format!("column {}: {:?} is not an integer", idx, s))
            }),
            other => Err(DdlError::Decode(format!(
                "column {}: expected integer, got {:?}",
                idx, other
            ))),
        }
    }

    /// Integer cell that may be NULL.
    pub fn opt_int(&self, idx: usize) -> Result<Option<i64>> {
        match self.get(idx)? {
            Value::Null => Ok(None),
            _ => self.int(idx).map(Some),
        }
    }

    /// Boolean cell; integers are accepted as 0/1 flags.
    pub fn bool(&self, idx: usize) -> Result<bool> {
        match self.get(idx)? {
            Value::Bool(v) => Ok(*v),
            Value::Int(v) => Ok(*v != 0),
            other => Err(DdlError::Decode(format!(
                "column {}: expected boolean, got {:?}",
                idx, other
            ))),
        }
    }

    /// Integer array cell; a space-separated text vector is accepted too.
    pub fn int_array(&self, idx: usize) -> Result<Vec<i64>> {
        match self.get(idx)? {
            Value::IntArray(v) => Ok(v.clone()),
            Value::Int(v) => Ok(vec![*v]),
            Value::Text(s) => s
                .split_whitespace()
                .map(|part| {
                    part.parse().map_err(|_| {
                        DdlError::Decode(format!("column {}: {:?} is not an int vector", idx, s))
                    })
                })
                .collect(),
            other => Err(DdlError::Decode(format!(
                "column {}: expected integer array, got {:?}",
                idx, other
            ))),
        }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors() {
        let row = Row::new(vec![
            Value::from("id"),
            Value::Int(1),
            Value::Null,
            Value::from("1 2"),
        ]);
        assert_eq!(row.text(0).unwrap(), "id");
        assert_eq!(row.int(1).unwrap(), 1);
        assert!(row.bool(1).unwrap());
        assert_eq!(row.opt_text(2).unwrap(), None);
        assert_eq!(row.int_array(3).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_row_accessor_errors() {
        let row = Row::new(vec![Value::Null]);
        assert!(row.text(0).is_err());
        assert!(matches!(row.get(5), Err(DdlError::Decode(_))));
    }
}
