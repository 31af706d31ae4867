use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::codegen::{build_output_plan, ITEMS_KEY};
use crate::condition::{compile_condition, compile_condition_str, declare, CompiledCondition};
use crate::resolve::{required_inputs, resolve_config, resolve_groups};
use crate::{
    CompileError, CompileOptions, Program, RuleGroupConfig, RuleGroupSpec, RuleNode,
    TypeRegistry, Value,
};

const CONDITION_KEY: &str = "_condition";

/// State shared by every rule group of one compilation run.
pub(crate) struct CompilationContext {
    next_id: u32,
    /// Input types across all rule groups.
    types: TypeRegistry,
    options: CompileOptions,
}

impl CompilationContext {
    pub(crate) fn new(options: CompileOptions) -> Self {
        Self {
            next_id: 1,
            types: TypeRegistry::new(),
            options,
        }
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Per-rule-group state for the tree walk.
struct GroupWalk<'a> {
    name: &'a str,
    config: &'a RuleGroupConfig,
    registry: TypeRegistry,
    nodes: Vec<RuleNode>,
}

pub(crate) fn compile(
    mut sources: Vec<(String, Value)>,
    options: CompileOptions,
) -> Result<Program, CompileError> {
    check_duplicates(&sources)?;
    sources.sort_by(|a, b| a.0.cmp(&b.0));

    let mut ctx = CompilationContext::new(options);
    let rule_groups = sources
        .iter()
        .map(|(name, document)| compile_rule_group(&mut ctx, name, document))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Program {
        rule_groups,
        types: ctx.types,
    })
}

fn check_duplicates(sources: &[(String, Value)]) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    for (name, _) in sources {
        if !seen.insert(name) {
            return Err(CompileError::DuplicateRuleGroup { name: name.clone() });
        }
    }
    Ok(())
}

fn compile_rule_group(
    ctx: &mut CompilationContext,
    name: &str,
    document: &Value,
) -> Result<RuleGroupSpec, CompileError> {
    let Value::Map(root) = document else {
        return Err(CompileError::InvalidDocument {
            rule_group: name.to_owned(),
            actual: document.kind(),
        });
    };

    let config = resolve_config(name, root)?;
    let groups = resolve_groups(name, root)?;

    let mut walk = GroupWalk {
        name,
        config: &config,
        registry: TypeRegistry::new(),
        nodes: Vec::new(),
    };
    walk_node(ctx, &mut walk, root, None)?;
    let GroupWalk {
        registry, nodes, ..
    } = walk;

    let required_inputs = required_inputs(name, &config, &registry);
    info!(
        rule_group = name,
        nodes = nodes.len(),
        inputs = registry.len(),
        groups = groups.len(),
        "rule group compiled"
    );

    Ok(RuleGroupSpec {
        name: name.to_owned(),
        config,
        groups,
        type_registry: registry,
        required_inputs,
        nodes,
    })
}

/// Pre-order walk: the node is numbered and pushed before any of its children.
fn walk_node(
    ctx: &mut CompilationContext,
    walk: &mut GroupWalk<'_>,
    node: &BTreeMap<String, Value>,
    parent: Option<u32>,
) -> Result<(), CompileError> {
    let id = ctx.allocate_id();

    let (condition_source, explicit_condition, compiled) = match node.get(CONDITION_KEY) {
        Some(condition) => {
            let compiled = compile_condition(
                condition,
                &mut walk.registry,
                walk.name,
                walk.config.seed,
                ctx.options.dialect,
            )?;
            let source = condition.as_str().unwrap_or_default().to_owned();
            (source, true, compiled)
        }
        None => {
            let compiled = compile_condition_str(
                &walk.config.default_condition,
                &mut walk.registry,
                walk.name,
                walk.config.seed,
                ctx.options.dialect,
            )?;
            (walk.config.default_condition.clone(), false, compiled)
        }
    };
    merge_types(&mut ctx.types, walk.name, &compiled)?;

    let static_attributes = node
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let debug_source = ctx
        .options
        .condition_debug
        .then_some(condition_source.as_str());
    let output = build_output_plan(node, debug_source);

    debug!(rule_group = walk.name, id, ?parent, "node compiled");
    walk.nodes.push(RuleNode {
        id,
        parent,
        rule_group: walk.name.to_owned(),
        condition_source,
        explicit_condition,
        compiled_condition: compiled.expression,
        static_attributes,
        output,
    });

    match node.get(ITEMS_KEY) {
        Some(Value::List(items)) => {
            for (index, item) in items.iter().enumerate() {
                match item {
                    Value::Map(child) => walk_node(ctx, walk, child, Some(id))?,
                    other => warn!(
                        rule_group = walk.name,
                        parent = id,
                        index,
                        kind = %other.kind(),
                        "skipping non-map entry in _items"
                    ),
                }
            }
        }
        Some(Value::Map(child)) => walk_node(ctx, walk, child, Some(id))?,
        Some(other) => warn!(
            rule_group = walk.name,
            parent = id,
            kind = %other.kind(),
            "ignoring _items that is neither an array nor a map"
        ),
        None => {}
    }
    Ok(())
}

fn merge_types(
    global: &mut TypeRegistry,
    rule_group: &str,
    compiled: &CompiledCondition,
) -> Result<(), CompileError> {
    for (input, &ty) in &compiled.inputs {
        declare(global, rule_group, input, ty)?;
    }
    Ok(())
}
