use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::token::{Position, Token};
use crate::value::{CustomValue, UnionValue};

/// The declared type of a record field, driving coercion in the binder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bool,
    /// Signed integer with the given bit width (8, 16, 32 or 64).
    Int(u8),
    /// Unsigned integer with the given bit width.
    Uint(u8),
    /// Float with the given precision (32 or 64).
    Float(u8),
    /// A source position; only meaningful for the well-known provenance
    /// fields `pos` and `end_pos`.
    Position,
    /// A single source token.
    Token,
    /// The raw token slice spanned by a match, including elided tokens.
    Tokens,
    /// A nested record, by declared record name.
    Record(String),
    /// A sum-type member, by declared union name.
    Union(String),
    /// Zero or more values accumulated in parse order.
    List(Box<FieldType>),
    /// An optional (pointer-style) field, hydrated on first assignment.
    Option(Box<FieldType>),
    /// An opaque value from a custom production, matched by Rust type name.
    Custom(&'static str),
}

/// User-defined capture hook: receives the captured strings and fills the
/// field value in place.
#[derive(Clone)]
pub struct CaptureHook(pub Arc<dyn Fn(&mut FieldValue, &[String]) -> Result<(), Error> + Send + Sync>);

impl fmt::Debug for CaptureHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaptureHook")
    }
}

/// User-defined text-unmarshal hook: invoked once per captured value.
#[derive(Clone)]
pub struct UnmarshalHook(pub Arc<dyn Fn(&mut FieldValue, &str) -> Result<(), Error> + Send + Sync>);

impl fmt::Debug for UnmarshalHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnmarshalHook")
    }
}

/// One declared field of a record.
#[derive(Debug, Clone)]
pub struct FieldDef {
    name: String,
    ty: FieldType,
    capture_with: Option<CaptureHook>,
    unmarshal_with: Option<UnmarshalHook>,
    element_capture_with: Option<CaptureHook>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        FieldDef {
            name: name.into(),
            ty,
            capture_with: None,
            unmarshal_with: None,
            element_capture_with: None,
        }
    }

    /// Attach a capture hook; takes precedence over type-driven coercion.
    pub fn with_capture(
        mut self,
        hook: impl Fn(&mut FieldValue, &[String]) -> Result<(), Error> + Send + Sync + 'static,
    ) -> Self {
        self.capture_with = Some(CaptureHook(Arc::new(hook)));
        self
    }

    /// Attach a text-unmarshal hook, invoked once per captured value.
    pub fn with_unmarshal(
        mut self,
        hook: impl Fn(&mut FieldValue, &str) -> Result<(), Error> + Send + Sync + 'static,
    ) -> Self {
        self.unmarshal_with = Some(UnmarshalHook(Arc::new(hook)));
        self
    }

    /// Attach a capture hook applied to each element of a list field.
    pub fn with_element_capture(
        mut self,
        hook: impl Fn(&mut FieldValue, &[String]) -> Result<(), Error> + Send + Sync + 'static,
    ) -> Self {
        self.element_capture_with = Some(CaptureHook(Arc::new(hook)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub(crate) fn capture_hook(&self) -> Option<&CaptureHook> {
        self.capture_with.as_ref()
    }

    pub(crate) fn unmarshal_hook(&self) -> Option<&UnmarshalHook> {
        self.unmarshal_with.as_ref()
    }

    pub(crate) fn element_capture_hook(&self) -> Option<&CaptureHook> {
        self.element_capture_with.as_ref()
    }
}

/// The declared shape of a record type.
///
/// Three field declarations are recognized by name and exact type and opt the
/// record into provenance injection: `pos: Position` (start), `end_pos:
/// Position`, and `tokens: Tokens`.
#[derive(Debug)]
pub struct RecordDef {
    name: String,
    fields: Vec<FieldDef>,
    pos_field: Option<usize>,
    end_pos_field: Option<usize>,
    tokens_field: Option<usize>,
}

impl RecordDef {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        let mut def = RecordDef {
            name: name.into(),
            fields,
            pos_field: None,
            end_pos_field: None,
            tokens_field: None,
        };
        for (i, field) in def.fields.iter().enumerate() {
            match (field.name.as_str(), &field.ty) {
                ("pos", FieldType::Position) => def.pos_field = Some(i),
                ("end_pos", FieldType::Position) => def.end_pos_field = Some(i),
                ("tokens", FieldType::Tokens) => def.tokens_field = Some(i),
                _ => {}
            }
        }
        def
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub(crate) fn pos_field(&self) -> Option<usize> {
        self.pos_field
    }

    pub(crate) fn end_pos_field(&self) -> Option<usize> {
        self.end_pos_field
    }

    pub(crate) fn tokens_field(&self) -> Option<usize> {
        self.tokens_field
    }
}

/// One member of a union. `boxed` documents that the member is held through
/// indirection; it does not change engine behavior.
#[derive(Debug, Clone)]
pub struct UnionMember {
    pub record: String,
    pub boxed: bool,
}

impl UnionMember {
    pub fn new(record: impl Into<String>) -> Self {
        UnionMember {
            record: record.into(),
            boxed: false,
        }
    }

    pub fn boxed(record: impl Into<String>) -> Self {
        UnionMember {
            record: record.into(),
            boxed: true,
        }
    }
}

/// The declared shape of a sum type whose members are records.
#[derive(Debug)]
pub struct UnionDef {
    name: String,
    members: Vec<UnionMember>,
}

impl UnionDef {
    pub fn new(name: impl Into<String>, members: Vec<UnionMember>) -> Self {
        UnionDef {
            name: name.into(),
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[UnionMember] {
        &self.members
    }

    pub fn member_index(&self, record: &str) -> Option<usize> {
        self.members.iter().position(|m| m.record == record)
    }
}

/// A bound field value inside a populated [`Record`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Unset. Also the hydration seed for optional fields.
    #[default]
    None,
    String(String),
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Position(Position),
    Token(Token),
    Tokens(Vec<Token>),
    Record(Box<Record>),
    Union(UnionValue),
    List(Vec<FieldValue>),
    Custom(CustomValue),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, FieldValue::None)
    }
}

/// A populated record instance: its definition plus one value slot per
/// declared field. Produced by record nodes; fields are filled by the binder
/// when the record commits.
#[derive(Debug, Clone)]
pub struct Record {
    def: Arc<RecordDef>,
    fields: Vec<FieldValue>,
}

impl Record {
    pub(crate) fn new(def: Arc<RecordDef>) -> Self {
        let fields = vec![FieldValue::None; def.fields().len()];
        Record { def, fields }
    }

    pub fn def(&self) -> &Arc<RecordDef> {
        &self.def
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }

    /// Look up a field value by declared name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.def.field_index(name).map(|i| &self.fields[i])
    }

    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }

    pub(crate) fn field_mut(&mut self, index: usize) -> &mut FieldValue {
        &mut self.fields[index]
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.def.name() == other.def.name() && self.fields == other.fields
    }
}
