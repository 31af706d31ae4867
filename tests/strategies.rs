#![allow(dead_code)]

use std::collections::BTreeSet;

use proptest::prelude::*;

// --- Fixed input schema ---
// Numeric inputs are only ever compared against number literals and string inputs
// only against strings, so generated conditions never conflict with themselves.

const NUMERIC_INPUTS: &[&str] = &["age", "score", "visits"];
const STRING_INPUTS: &[&str] = &["name", "country", "customerid", "app_version", "remote-ip"];
const WORDS: &[&str] = &["stutz", "BR", "a b", "x-1", ""];
const NUMERIC_OPS: &[&str] = &[">", "<", "==", "!=", ">=", "<="];

/// A generated condition with the input classification it must produce.
#[derive(Debug, Clone)]
pub struct GenCondition {
    pub text: String,
    pub numeric: BTreeSet<String>,
    pub strings: BTreeSet<String>,
}

impl GenCondition {
    fn leaf(text: String, numeric: Option<&str>, string: Option<&str>) -> Self {
        Self {
            text,
            numeric: numeric.into_iter().map(str::to_owned).collect(),
            strings: string.into_iter().map(str::to_owned).collect(),
        }
    }

    fn join(self, other: Self, op: &str) -> Self {
        Self {
            text: format!("{} {op} {}", self.text, other.text),
            numeric: self.numeric.union(&other.numeric).cloned().collect(),
            strings: self.strings.union(&other.strings).cloned().collect(),
        }
    }

    /// Number of `input:` references in the text.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.text.matches("input:").count()
    }
}

fn arb_numeric_leaf() -> impl Strategy<Value = GenCondition> {
    (
        prop::sample::select(NUMERIC_INPUTS),
        prop::sample::select(NUMERIC_OPS),
        0_u32..1000,
        any::<bool>(),
    )
        .prop_map(|(name, op, n, literal_first)| {
            let text = if literal_first {
                format!("{n} {op} input:{name}")
            } else {
                format!("input:{name} {op} {n}")
            };
            GenCondition::leaf(text, Some(name), None)
        })
}

fn arb_string_leaf() -> impl Strategy<Value = GenCondition> {
    (
        prop::sample::select(STRING_INPUTS),
        prop::sample::select(WORDS),
        0_u8..6,
    )
        .prop_map(|(name, word, shape)| {
            let text = match shape {
                0 => format!("input:{name} == '{word}'"),
                1 => format!("input:{name} != '{word}'"),
                2 => format!("input:{name} ~= '^{word}$'"),
                3 => format!("contains(group:members, input:{name})"),
                4 => format!("randomPerc(25, input:{name})"),
                _ => format!("concat(input:{name}, '-') == '{word}-'"),
            };
            GenCondition::leaf(text, None, Some(name))
        })
}

fn arb_constant_leaf() -> impl Strategy<Value = GenCondition> {
    prop_oneof![
        Just(GenCondition::leaf("true".into(), None, None)),
        Just(GenCondition::leaf("after('2018-11-30')".into(), None, None)),
    ]
}

fn arb_condition_from(
    leaf: BoxedStrategy<GenCondition>,
) -> impl Strategy<Value = GenCondition> {
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.join(b, "and")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.join(b, "||")),
            inner.clone().prop_map(|c| GenCondition {
                text: format!("not ({})", c.text),
                ..c
            }),
        ]
    })
}

/// Conditions with no numeric comparison at all.
pub fn arb_string_condition() -> impl Strategy<Value = GenCondition> {
    arb_condition_from(prop_oneof![arb_string_leaf(), arb_constant_leaf()].boxed())
}

/// Conditions mixing numeric comparisons, string comparisons, and constants.
pub fn arb_condition() -> impl Strategy<Value = GenCondition> {
    arb_condition_from(
        prop_oneof![arb_numeric_leaf(), arb_string_leaf(), arb_constant_leaf()].boxed(),
    )
}

/// A generated rule node and its children.
#[derive(Debug, Clone)]
pub struct GenNode {
    pub label: u32,
    /// A single child is written as a map under `_items` instead of an array.
    pub single_as_map: bool,
    pub children: Vec<GenNode>,
}

impl GenNode {
    /// Total number of nodes in this subtree.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(GenNode::size).sum::<usize>()
    }

    /// Render as a rule-group JSON document.
    #[must_use]
    pub fn to_json(&self) -> String {
        let items = match self.children.as_slice() {
            [] => String::new(),
            [only] if self.single_as_map => format!(r#", "_items": {}"#, only.to_json()),
            children => {
                let rendered: Vec<String> = children.iter().map(GenNode::to_json).collect();
                format!(r#", "_items": [{}]"#, rendered.join(", "))
            }
        };
        format!(r#"{{"label": {}{items}}}"#, self.label)
    }
}

pub fn arb_tree() -> impl Strategy<Value = GenNode> {
    let leaf = (0_u32..1000, any::<bool>()).prop_map(|(label, single_as_map)| GenNode {
        label,
        single_as_map,
        children: Vec::new(),
    });
    leaf.prop_recursive(4, 40, 4, |inner| {
        (0_u32..1000, any::<bool>(), prop::collection::vec(inner, 0..4)).prop_map(
            |(label, single_as_map, children)| GenNode {
                label,
                single_as_map,
                children,
            },
        )
    })
}

/// 1..=4 rule groups with distinct names.
pub fn arb_forest() -> impl Strategy<Value = Vec<(String, GenNode)>> {
    prop::collection::btree_map("[a-z]{1,6}", arb_tree(), 1..=4)
        .prop_map(|groups| groups.into_iter().collect())
}
