use std::sync::Arc;

use crate::context::ParseContext;
use crate::grammar::{Grammar, NodeId, UnionId};
use crate::nodes::{NodeError, NodeResult};
use crate::record::UnionDef;
use crate::value::{UnionValue, Value};

/// A sum type: an ordered choice whose alternatives each produce a concrete
/// member record; the matched value is converted to the union, tagged with
/// the member it corresponds to.
pub(crate) fn parse(
    g: &Grammar,
    ctx: &mut ParseContext<'_>,
    def_id: UnionId,
    expr: NodeId,
) -> NodeResult {
    let def = g.union_def(def_id).clone();
    match g.parse_node(expr, ctx) {
        Err(failure) => Err(NodeError::new(failure.error)),
        Ok(None) => Ok(None),
        Ok(Some(values)) => Ok(Some(
            values
                .into_iter()
                .map(|value| convert(def.clone(), value))
                .collect(),
        )),
    }
}

fn convert(def: Arc<UnionDef>, value: Value) -> Value {
    let member = match &value {
        Value::Record(record) => def.member_index(record.name()).unwrap_or(0),
        _ => 0,
    };
    Value::Union(UnionValue {
        def,
        member,
        value: Box::new(value),
    })
}
