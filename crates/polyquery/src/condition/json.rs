//! JSON form of the where mini-language.

use super::{CompareOp, Condition, InValues, LikeOp, Operand};
use crate::error::{QueryError, QueryResult};
use crate::value::Value;
use serde_json::Value as Json;

/// Objects become hash conditions with pairs in document order.
pub(super) fn parse(json: &Json) -> QueryResult<Condition> {
    match json {
        Json::Object(map) => {
            let mut pairs = Vec::with_capacity(map.len());
            for (column, value) in map {
                let operand = match value {
                    Json::Array(items) => Operand::List(scalars(items)?),
                    other => Operand::Value(Value::from_json(other)?),
                };
                pairs.push((column.clone(), operand));
            }
            Ok(Condition::Hash(pairs))
        }
        Json::String(sql) => Ok(Condition::raw(sql.clone())),
        Json::Array(items) => parse_operator(items),
        other => Err(QueryError::malformed(format!(
            "unrecognized condition shape: {other}"
        ))),
    }
}

fn parse_operator(items: &[Json]) -> QueryResult<Condition> {
    let Some((head, operands)) = items.split_first() else {
        return Ok(Condition::And(Vec::new()));
    };
    let Json::String(op) = head else {
        return Err(QueryError::malformed(format!(
            "unrecognized condition shape: operator must be a string, got {head}"
        )));
    };
    let op = op.trim().to_ascii_lowercase();

    match op.as_str() {
        "and" | "or" => {
            let children = operands.iter().map(parse).collect::<QueryResult<Vec<_>>>()?;
            Ok(if op == "and" {
                Condition::And(children)
            } else {
                Condition::Or(children)
            })
        }
        "not" => {
            arity(&op, operands, 1)?;
            Ok(Condition::not(parse(&operands[0])?))
        }
        "between" | "not between" => {
            arity(&op, operands, 3)?;
            Ok(Condition::Between {
                column: column(&op, &operands[0])?,
                low: Value::from_json(&operands[1])?,
                high: Value::from_json(&operands[2])?,
                negated: op == "not between",
            })
        }
        "in" | "not in" => {
            arity(&op, operands, 2)?;
            let negated = op == "not in";
            match &operands[0] {
                Json::Array(cols) => {
                    let columns = cols
                        .iter()
                        .map(|c| column(&op, c))
                        .collect::<QueryResult<Vec<_>>>()?;
                    let Json::Array(rows) = &operands[1] else {
                        return Err(QueryError::malformed(format!(
                            "operator '{op}' with multiple columns requires a list of rows"
                        )));
                    };
                    let rows = rows
                        .iter()
                        .map(|row| match row {
                            Json::Array(values) => scalars(values),
                            other => Err(QueryError::malformed(format!(
                                "operator '{op}' expects each row to be a list, got {other}"
                            ))),
                        })
                        .collect::<QueryResult<Vec<_>>>()?;
                    Ok(Condition::In {
                        columns,
                        values: InValues::Rows(rows),
                        negated,
                    })
                }
                col => {
                    let values = match &operands[1] {
                        Json::Array(values) => scalars(values)?,
                        scalar => vec![Value::from_json(scalar)?],
                    };
                    Ok(Condition::In {
                        columns: vec![column(&op, col)?],
                        values: InValues::List(values),
                        negated,
                    })
                }
            }
        }
        "exists" | "not exists" => Err(QueryError::malformed(format!(
            "operator '{op}' requires a sub-query operand"
        ))),
        _ => {
            if let Some(like) = LikeOp::parse(&op) {
                if operands.len() != 2 && operands.len() != 3 {
                    return Err(QueryError::malformed(format!(
                        "operator '{op}' requires 2 or 3 operands, got {}",
                        operands.len()
                    )));
                }
                let values = match &operands[1] {
                    Json::Array(values) => scalars(values)?,
                    scalar => vec![Value::from_json(scalar)?],
                };
                let negate = match operands.get(2) {
                    None => false,
                    Some(Json::Bool(b)) => *b,
                    Some(other) => {
                        return Err(QueryError::malformed(format!(
                            "operator '{op}' negation flag must be a boolean, got {other}"
                        )));
                    }
                };
                let like = if negate { like.negate() } else { like };
                return Ok(Condition::like_op(like, column(&op, &operands[0])?, values));
            }
            if let Some(cmp) = CompareOp::parse(&op) {
                arity(&op, operands, 2)?;
                return Ok(Condition::Compare {
                    column: column(&op, &operands[0])?,
                    op: cmp,
                    value: Operand::Value(Value::from_json(&operands[1])?),
                });
            }
            Err(QueryError::malformed(format!("unknown operator '{op}'")))
        }
    }
}

fn arity(op: &str, operands: &[Json], expected: usize) -> QueryResult<()> {
    if operands.len() == expected {
        Ok(())
    } else {
        Err(QueryError::malformed(format!(
            "operator '{op}' requires {expected} operand(s), got {}",
            operands.len()
        )))
    }
}

fn column(op: &str, json: &Json) -> QueryResult<String> {
    match json {
        Json::String(s) if !s.is_empty() => Ok(s.clone()),
        other => Err(QueryError::malformed(format!(
            "operator '{op}' expects a column name, got {other}"
        ))),
    }
}

fn scalars(items: &[Json]) -> QueryResult<Vec<Value>> {
    items.iter().map(Value::from_json).collect()
}
