use crate::context::ParseContext;
use crate::error::Error;
use crate::grammar::{Grammar, NodeId, RecordId};
use crate::nodes::{NodeError, NodeResult};
use crate::record::{FieldValue, Record};
use crate::token::Position;
use crate::value::Value;

/// A record (struct) boundary. Allocates a fresh instance, injects the start
/// position if the record opts in, runs the inner expression, then injects
/// the end position and raw token range and commits the deferred field
/// assignments queued by captures underneath. On failure the assignments are
/// still applied best-effort and the partial record rides along with the
/// error.
pub(crate) fn parse(
    g: &Grammar,
    ctx: &mut ParseContext<'_>,
    def_id: RecordId,
    expr: NodeId,
) -> NodeResult {
    let def = g.record_def(def_id).clone();
    let mut record = Record::new(def.clone());

    let start_raw = ctx.lex.raw_cursor();
    let start_pos = ctx.lex.peek().pos.clone();
    if let Some(i) = def.pos_field() {
        *record.field_mut(i) = FieldValue::Position(start_pos.clone());
    }

    let mark = ctx.watermark();
    match g.parse_node(expr, ctx) {
        Err(failure) => {
            // Best effort so the caller can inspect a partial tree.
            let _ = commit(g, ctx, def_id, &mut record, mark, &start_pos);
            ctx.maybe_update_error(failure.error.clone());
            Err(NodeError::with_partial(
                failure.error,
                vec![Value::Record(record)],
            ))
        }
        Ok(None) => {
            ctx.discard_deferred(mark);
            Ok(None)
        }
        Ok(Some(_)) => {
            let end_raw = ctx.lex.raw_cursor();
            if let Some(i) = def.end_pos_field() {
                *record.field_mut(i) = FieldValue::Position(ctx.lex.raw_peek().pos.clone());
            }
            if let Some(i) = def.tokens_field() {
                *record.field_mut(i) = FieldValue::Tokens(ctx.lex.range(start_raw, end_raw).to_vec());
            }
            match commit(g, ctx, def_id, &mut record, mark, &start_pos) {
                Ok(()) => Ok(Some(vec![Value::Record(record)])),
                Err(error) => Err(NodeError::with_partial(error, vec![Value::Record(record)])),
            }
        }
    }
}

/// Drain this record's span of the deferred queue through the binder, in
/// parse order. Binding failures surface at the record's start position.
fn commit(
    g: &Grammar,
    ctx: &mut ParseContext<'_>,
    def_id: RecordId,
    record: &mut Record,
    mark: usize,
    start_pos: &Position,
) -> Result<(), Error> {
    let binder = g.binder(def_id);
    for deferred in ctx.drain_deferred(mark) {
        if deferred.field.record != def_id.0 {
            return Err(Error::parse(
                format!(
                    "capture for {} escaped its record boundary",
                    g.record_def(RecordId(deferred.field.record)).name(),
                ),
                start_pos.clone(),
            ));
        }
        binder.bind(
            record,
            deferred.field.index,
            deferred.values,
            &deferred.tokens,
            g.config.strict_coercion,
            start_pos,
        )?;
    }
    Ok(())
}
