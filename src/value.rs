use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::record::{Record, UnionDef};

/// A value captured while matching, flowing up the node tree until a capture
/// node attaches it to a field of the enclosing record.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The text of a matched token.
    String(String),
    /// The result of a record (struct) match.
    Record(Record),
    /// A record match converted to a member of a sum type.
    Union(UnionValue),
    /// An opaque value built by a custom or parseable production.
    Custom(CustomValue),
    /// Stands in for the enclosing record while its field assignment is
    /// pending; produced by capture nodes so that counting and emptiness
    /// checks upstream see exactly one value per capture.
    Bound,
}

impl Value {
    pub fn custom<T: Any + Send + Sync>(value: T) -> Value {
        Value::Custom(CustomValue::new(value))
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

/// A matched alternative of a union, tagged with the member it converted to.
#[derive(Debug, Clone)]
pub struct UnionValue {
    pub def: Arc<UnionDef>,
    pub member: usize,
    pub value: Box<Value>,
}

impl PartialEq for UnionValue {
    fn eq(&self, other: &Self) -> bool {
        self.def.name() == other.def.name()
            && self.member == other.member
            && self.value == other.value
    }
}

/// Type-erased payload of a custom production, compared by identity.
#[derive(Clone)]
pub struct CustomValue {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        CustomValue {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomValue<{}>", self.type_name)
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}
