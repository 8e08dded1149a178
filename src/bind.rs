use crate::error::Error;
use crate::record::{FieldDef, FieldType, FieldValue, Record, RecordDef};
use crate::token::{Position, Token};
use crate::value::Value;

/// How a single field receives its captured values. Resolved once per field
/// at grammar-build time so binding never re-examines the field type.
#[derive(Debug, Clone)]
enum BindPlan {
    /// Assign the first source token.
    Token,
    /// Assign the full source token slice.
    Tokens,
    /// Invoke the field's capture hook with the captured strings.
    Capture,
    /// Invoke the field's unmarshal hook once per captured value.
    Unmarshal,
    /// Append each value, coerced to the element type.
    List { elem: FieldType, elem_capture: bool },
    /// Concatenate captured strings onto the existing contents.
    Concat,
    /// Join multiple captures into one string, then coerce.
    Single(FieldType),
}

/// Compiled binder for one record type: one plan per declared field.
#[derive(Debug)]
pub(crate) struct RecordBinder {
    plans: Vec<BindPlan>,
}

impl RecordBinder {
    pub(crate) fn compile(def: &RecordDef) -> Self {
        let plans = def.fields().iter().map(compile_field).collect();
        RecordBinder { plans }
    }

    /// Bind `values` to the field at `index` of `record`. `tokens` is the raw
    /// source slice the capture spanned; `pos` is the enclosing record's
    /// start position, used for error reporting.
    pub(crate) fn bind(
        &self,
        record: &mut Record,
        index: usize,
        values: Vec<Value>,
        tokens: &[Token],
        strict: bool,
        pos: &Position,
    ) -> Result<(), Error> {
        let def = record.def().clone();
        let field = &def.fields()[index];
        self.bind_field(record, field, index, values, tokens, strict)
            .map_err(|message| Error::FieldBind {
                record: def.name().to_string(),
                field: field.name().to_string(),
                message,
                pos: pos.clone(),
            })
    }

    fn bind_field(
        &self,
        record: &mut Record,
        field: &FieldDef,
        index: usize,
        values: Vec<Value>,
        tokens: &[Token],
        strict: bool,
    ) -> Result<(), String> {
        let slot = record.field_mut(index);
        match &self.plans[index] {
            BindPlan::Token => {
                let first = tokens.first().ok_or("no source tokens to capture")?;
                *slot = FieldValue::Token(first.clone());
                Ok(())
            }
            BindPlan::Tokens => {
                *slot = FieldValue::Tokens(tokens.to_vec());
                Ok(())
            }
            BindPlan::Capture => {
                let strings = captured_strings(&values)?;
                let hook = field.capture_hook().ok_or("missing capture hook")?;
                (hook.0)(slot, &strings).map_err(|e| e.to_string())
            }
            BindPlan::Unmarshal => {
                let strings = captured_strings(&values)?;
                let hook = field.unmarshal_hook().ok_or("missing unmarshal hook")?;
                for s in &strings {
                    (hook.0)(slot, s).map_err(|e| e.to_string())?;
                }
                Ok(())
            }
            BindPlan::List { elem, elem_capture } => {
                if slot.is_none() {
                    *slot = FieldValue::List(Vec::new());
                }
                let items = match slot {
                    FieldValue::List(items) => items,
                    _ => return Err("field already bound to a non-list value".to_string()),
                };
                for value in values {
                    if *elem_capture {
                        let hook = field
                            .element_capture_hook()
                            .ok_or("missing element capture hook")?;
                        let strings = captured_strings(std::slice::from_ref(&value))?;
                        let mut element = FieldValue::None;
                        (hook.0)(&mut element, &strings).map_err(|e| e.to_string())?;
                        items.push(element);
                    } else {
                        items.push(coerce(value, elem)?);
                    }
                }
                Ok(())
            }
            BindPlan::Concat => {
                let strings = captured_strings(&values)?;
                let existing = match slot {
                    FieldValue::String(s) => std::mem::take(s),
                    FieldValue::None => String::new(),
                    _ => return Err("field already bound to a non-string value".to_string()),
                };
                let mut accumulated = existing;
                for s in strings {
                    accumulated.push_str(&s);
                }
                *slot = FieldValue::String(accumulated);
                Ok(())
            }
            BindPlan::Single(ty) => bind_single(slot, ty, values, strict),
        }
    }
}

fn compile_field(field: &FieldDef) -> BindPlan {
    // Optional fields bind through their pointee; hydration is implicit in
    // the dynamic model because unset slots start at FieldValue::None.
    let mut ty = field.ty();
    while let FieldType::Option(inner) = ty {
        ty = inner.as_ref();
    }
    match ty {
        FieldType::Token => BindPlan::Token,
        FieldType::Tokens => BindPlan::Tokens,
        _ if field.capture_hook().is_some() => BindPlan::Capture,
        _ if field.unmarshal_hook().is_some() => BindPlan::Unmarshal,
        FieldType::List(elem) => {
            let mut elem = elem.as_ref();
            while let FieldType::Option(inner) = elem {
                elem = inner.as_ref();
            }
            BindPlan::List {
                elem: elem.clone(),
                elem_capture: field.element_capture_hook().is_some(),
            }
        }
        FieldType::String => BindPlan::Concat,
        other => BindPlan::Single(other.clone()),
    }
}

fn bind_single(
    slot: &mut FieldValue,
    ty: &FieldType,
    mut values: Vec<Value>,
    strict: bool,
) -> Result<(), String> {
    if values.is_empty() {
        // Nothing to capture; happens when assembling a partial tree.
        return Ok(());
    }
    // Coalesce multiple captures into one string so that e.g. ["-", "10"]
    // binds as "-10".
    let value = if values.len() > 1 {
        let strings = captured_strings(&values)?;
        Value::String(strings.concat())
    } else {
        match values.pop() {
            Some(v) => v,
            None => return Ok(()),
        }
    };

    match ty {
        FieldType::Bool => {
            *slot = FieldValue::Bool(true);
            Ok(())
        }
        FieldType::Int(bits) => match value {
            Value::String(s) => {
                let n = parse_i64_base0(&s)?;
                check_int_width(n, *bits)?;
                *slot = FieldValue::Int(n);
                Ok(())
            }
            _ => increment_numeric(slot, ty, strict),
        },
        FieldType::Uint(bits) => match value {
            Value::String(s) => {
                let n = parse_u64_base0(&s)?;
                check_uint_width(n, *bits)?;
                *slot = FieldValue::Uint(n);
                Ok(())
            }
            _ => increment_numeric(slot, ty, strict),
        },
        FieldType::Float(bits) => match value {
            Value::String(s) => {
                let n = parse_float(&s, *bits)?;
                *slot = FieldValue::Float(n);
                Ok(())
            }
            _ => increment_numeric(slot, ty, strict),
        },
        FieldType::String => {
            match value {
                Value::String(s) => {
                    *slot = FieldValue::String(s);
                    Ok(())
                }
                other => Err(format!("value {:?} is not a string", other)),
            }
        }
        FieldType::Record(name) => match value {
            Value::Record(r) if r.name() == name => {
                *slot = FieldValue::Record(Box::new(r));
                Ok(())
            }
            other => Err(format!("value {:?} is not correct type {}", other, name)),
        },
        FieldType::Union(name) => match value {
            Value::Union(u) if u.def.name() == name => {
                *slot = FieldValue::Union(u);
                Ok(())
            }
            other => Err(format!("value {:?} is not correct type {}", other, name)),
        },
        FieldType::Custom(type_name) => match value {
            Value::Custom(c) if c.type_name() == *type_name => {
                *slot = FieldValue::Custom(c);
                Ok(())
            }
            other => Err(format!("value {:?} is not correct type {}", other, type_name)),
        },
        FieldType::Position => Err("position fields are injected, not captured".to_string()),
        FieldType::Token | FieldType::Tokens | FieldType::List(_) | FieldType::Option(_) => {
            Err(format!("unsupported field type {:?}", ty))
        }
    }
}

/// Coerce one captured value to a list element type. Lists never apply the
/// numeric increment rule; a mismatch here is always an error.
fn coerce(value: Value, ty: &FieldType) -> Result<FieldValue, String> {
    match (ty, value) {
        (FieldType::String, Value::String(s)) => Ok(FieldValue::String(s)),
        (FieldType::Bool, _) => Ok(FieldValue::Bool(true)),
        (FieldType::Int(bits), Value::String(s)) => {
            let n = parse_i64_base0(&s)?;
            check_int_width(n, *bits)?;
            Ok(FieldValue::Int(n))
        }
        (FieldType::Uint(bits), Value::String(s)) => {
            let n = parse_u64_base0(&s)?;
            check_uint_width(n, *bits)?;
            Ok(FieldValue::Uint(n))
        }
        (FieldType::Float(bits), Value::String(s)) => {
            Ok(FieldValue::Float(parse_float(&s, *bits)?))
        }
        (FieldType::Record(name), Value::Record(r)) if r.name() == name => {
            Ok(FieldValue::Record(Box::new(r)))
        }
        (FieldType::Union(name), Value::Union(u)) if u.def.name() == name => {
            Ok(FieldValue::Union(u))
        }
        (FieldType::Custom(type_name), Value::Custom(c)) if c.type_name() == *type_name => {
            Ok(FieldValue::Custom(c))
        }
        (ty, other) => Err(format!("value {:?} is not correct type {:?}", other, ty)),
    }
}

fn increment_numeric(slot: &mut FieldValue, ty: &FieldType, strict: bool) -> Result<(), String> {
    if strict {
        return Err(format!("non-string capture for numeric field {:?}", ty));
    }
    *slot = match (ty, &*slot) {
        (FieldType::Uint(_), FieldValue::Uint(n)) => FieldValue::Uint(n + 1),
        (FieldType::Uint(_), _) => FieldValue::Uint(1),
        (FieldType::Float(_), FieldValue::Float(n)) => FieldValue::Float(n + 1.0),
        (FieldType::Float(_), _) => FieldValue::Float(1.0),
        (_, FieldValue::Int(n)) => FieldValue::Int(n + 1),
        (_, _) => FieldValue::Int(1),
    };
    Ok(())
}

fn captured_strings(values: &[Value]) -> Result<Vec<String>, String> {
    values
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.clone()),
            other => Err(format!("value {:?} is not a string", other)),
        })
        .collect()
}

/// Base-0 signed integer parsing: accepts 0x/0o/0b prefixes and a leading 0
/// for octal, with an optional sign.
fn parse_i64_base0(s: &str) -> Result<i64, String> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let magnitude = parse_u64_radix(rest)?;
    if negative {
        if magnitude > i64::MAX as u64 + 1 {
            return Err(format!("value {:?} out of range", s));
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).map_err(|_| format!("value {:?} out of range", s))
    }
}

fn parse_u64_base0(s: &str) -> Result<u64, String> {
    let rest = s.strip_prefix('+').unwrap_or(s);
    parse_u64_radix(rest)
}

fn parse_u64_radix(s: &str) -> Result<u64, String> {
    let (radix, digits) = if let Some(d) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, d)
    } else if let Some(d) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (8, d)
    } else if let Some(d) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (2, d)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        (10, s)
    };
    u64::from_str_radix(digits, radix).map_err(|e| format!("{}: {:?}", e, s))
}

fn check_int_width(n: i64, bits: u8) -> Result<(), String> {
    let (min, max) = match bits {
        8 => (i8::MIN as i64, i8::MAX as i64),
        16 => (i16::MIN as i64, i16::MAX as i64),
        32 => (i32::MIN as i64, i32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    };
    if n < min || n > max {
        return Err(format!("value {} out of range for {}-bit integer", n, bits));
    }
    Ok(())
}

fn check_uint_width(n: u64, bits: u8) -> Result<(), String> {
    let max = match bits {
        8 => u8::MAX as u64,
        16 => u16::MAX as u64,
        32 => u32::MAX as u64,
        _ => u64::MAX,
    };
    if n > max {
        return Err(format!("value {} out of range for {}-bit integer", n, bits));
    }
    Ok(())
}

fn parse_float(s: &str, bits: u8) -> Result<f64, String> {
    if bits == 32 {
        s.parse::<f32>()
            .map(f64::from)
            .map_err(|e| format!("{}: {:?}", e, s))
    } else {
        s.parse::<f64>().map_err(|e| format!("{}: {:?}", e, s))
    }
}
