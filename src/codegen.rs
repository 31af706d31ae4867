//! Output build plans for rule nodes.

use std::collections::BTreeMap;

use tracing::warn;

use crate::{Assignment, Literal, OutputPlan, Scope, Value};

/// Key of the reserved child-rule slot, which also doubles as an attribute group
/// when it holds a single map.
pub(crate) const ITEMS_KEY: &str = "_items";

/// Output key holding the condition source when condition debugging is enabled.
pub(crate) const CONDITION_DEBUG_KEY: &str = "_condition_debug";

const CONDITION_KEY: &str = "_condition";

/// Describe how to build the output map of a node.
///
/// Keys are visited in sorted order. Keys starting with `_` are skipped, except
/// `_items` when it holds a single map. Every nested map gets its own scope variable
/// named `<parent var>_<depth>_<index>`, where `index` is the key's position among all
/// keys of the parent map.
///
/// With `debug_source` set, the root scope records it under `_condition_debug`, and
/// every nested scope carrying its own `_condition` string records that one.
pub(crate) fn build_output_plan(
    node: &BTreeMap<String, Value>,
    debug_source: Option<&str>,
) -> OutputPlan {
    let mut plan = OutputPlan::empty();
    fill_scope(&mut plan.root, node, debug_source.is_some());
    if let Some(source) = debug_source {
        plan.root.assignments.push(Assignment::Literal {
            key: CONDITION_DEBUG_KEY.to_owned(),
            value: Literal::String(source.to_owned()),
        });
    }
    plan
}

fn fill_scope(scope: &mut Scope, map: &BTreeMap<String, Value>, debug: bool) {
    for (index, (key, value)) in map.iter().enumerate() {
        match value {
            Value::Map(nested) if is_output_key(key) || key == ITEMS_KEY => {
                let var = format!("{}_{}_{index}", scope.var, scope.depth + 1);
                let mut child = Scope::new(var, scope.depth + 1);
                fill_scope(&mut child, nested, debug);
                scope.assignments.push(Assignment::Scope {
                    key: key.clone(),
                    scope: child,
                });
            }
            Value::Map(_) => {}
            Value::String(source) if debug && scope.depth > 0 && key == CONDITION_KEY => {
                scope.assignments.push(Assignment::Literal {
                    key: CONDITION_DEBUG_KEY.to_owned(),
                    value: Literal::String(source.clone()),
                });
            }
            _ if !is_output_key(key) => {}
            other => {
                if let Some(literal) = literal(key, other) {
                    scope.assignments.push(Assignment::Literal {
                        key: key.clone(),
                        value: literal,
                    });
                }
            }
        }
    }
}

fn is_output_key(key: &str) -> bool {
    !key.starts_with('_')
}

fn literal(key: &str, value: &Value) -> Option<Literal> {
    Some(match value {
        Value::Null => Literal::Null,
        Value::Bool(b) => Literal::Bool(*b),
        Value::Int(i) => Literal::Int(*i),
        Value::Float(f) => Literal::Float(*f),
        Value::String(s) => Literal::String(s.clone()),
        Value::List(items) => Literal::List(
            items
                .iter()
                .filter_map(|item| {
                    if item.is_scalar() {
                        literal(key, item)
                    } else {
                        warn!(key, kind = %item.kind(), "skipping non-scalar list element");
                        None
                    }
                })
                .collect(),
        ),
        Value::Map(_) => return None,
    })
}
