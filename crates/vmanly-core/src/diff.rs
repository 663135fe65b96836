// ── Structural diff ──
//
// Compares an existing body with a desired one, both in name form.
// Mapping keys are compared in sorted order, sequences index by index.
// Volatile attributes are excluded at the root only.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Add,
    Remove,
    Change,
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Change => "change",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a change, displayed as `policyDefinition.assembly[0].type`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One atomic difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub op: ChangeOp,
    pub path: FieldPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

/// Changes turning `existing` into `desired`, ignoring the root-level
/// attributes in `ignore`.
///
/// Both bodies must be the same JSON kind at the top level.
pub fn diff(existing: &Value, desired: &Value, ignore: &[&str]) -> Result<Vec<Change>, CoreError> {
    if json_kind(existing) != json_kind(desired) {
        return Err(CoreError::Shape {
            message: format!(
                "existing body is {} but desired body is {}",
                json_kind(existing),
                json_kind(desired)
            ),
        });
    }

    let mut changes = Vec::new();
    match (existing, desired) {
        (Value::Object(old), Value::Object(new)) => {
            diff_objects(old, new, &FieldPath::default(), ignore, &mut changes);
        }
        _ => diff_values(existing, desired, &FieldPath::default(), &mut changes),
    }
    Ok(changes)
}

fn diff_objects(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    path: &FieldPath,
    ignore: &[&str],
    changes: &mut Vec<Change>,
) {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    for key in keys {
        if ignore.contains(&key.as_str()) {
            continue;
        }
        let child = path.child(PathSegment::Key(key.clone()));
        match (old.get(key), new.get(key)) {
            (Some(o), Some(n)) => diff_values(o, n, &child, changes),
            (None, Some(n)) => changes.push(Change {
                op: ChangeOp::Add,
                path: child,
                old: None,
                new: Some(n.clone()),
            }),
            (Some(o), None) => changes.push(Change {
                op: ChangeOp::Remove,
                path: child,
                old: Some(o.clone()),
                new: None,
            }),
            (None, None) => {}
        }
    }
}

fn diff_values(old: &Value, new: &Value, path: &FieldPath, changes: &mut Vec<Change>) {
    match (old, new) {
        (Value::Object(o), Value::Object(n)) => diff_objects(o, n, path, &[], changes),
        (Value::Array(o), Value::Array(n)) => {
            for index in 0..o.len().max(n.len()) {
                let child = path.child(PathSegment::Index(index));
                match (o.get(index), n.get(index)) {
                    (Some(a), Some(b)) => diff_values(a, b, &child, changes),
                    (None, Some(b)) => changes.push(Change {
                        op: ChangeOp::Add,
                        path: child,
                        old: None,
                        new: Some(b.clone()),
                    }),
                    (Some(a), None) => changes.push(Change {
                        op: ChangeOp::Remove,
                        path: child,
                        old: Some(a.clone()),
                        new: None,
                    }),
                    (None, None) => {}
                }
            }
        }
        _ if old == new => {}
        _ => changes.push(Change {
            op: ChangeOp::Change,
            path: path.clone(),
            old: Some(old.clone()),
            new: Some(new.clone()),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
