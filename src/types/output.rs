use std::fmt;

/// Name of the variable holding a node's top-level output map.
pub const ROOT_OUTPUT_VAR: &str = "output";

/// A literal written into an output map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Literal>),
}

/// One key of an output scope: either a literal or a nested scope.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Assignment {
    Literal { key: String, value: Literal },
    Scope { key: String, scope: Scope },
}

/// An output map under construction, bound to its own variable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Scope {
    pub var: String,
    pub depth: usize,
    pub assignments: Vec<Assignment>,
}

/// Build plan for the output map a node returns when its condition holds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "binary-cache", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputPlan {
    pub root: Scope,
}

/// Right-hand side of an output assignment statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementValue<'a> {
    Literal(&'a Literal),
    Var(&'a str),
}

/// A flat statement of the output build sequence, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'a> {
    /// Create an empty map bound to `var`.
    Declare { var: &'a str },
    /// `target[key] = value`.
    Assign {
        target: &'a str,
        key: &'a str,
        value: StatementValue<'a>,
    },
}

impl Scope {
    #[must_use]
    pub fn new(var: String, depth: usize) -> Self {
        Self {
            var,
            depth,
            assignments: Vec::new(),
        }
    }
}

impl OutputPlan {
    /// An empty plan that builds a bare root map.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            root: Scope::new(ROOT_OUTPUT_VAR.to_owned(), 0),
        }
    }

    /// Flatten the plan into declare/assign statements.
    ///
    /// A nested scope is declared and attached to its parent before its own keys are
    /// assigned.
    #[must_use]
    pub fn statements(&self) -> Vec<Statement<'_>> {
        let mut out = vec![Statement::Declare {
            var: &self.root.var,
        }];
        push_scope_statements(&self.root, &mut out);
        out
    }

    /// Every scope variable declared by the plan, root first, in declaration order.
    #[must_use]
    pub fn scope_vars(&self) -> Vec<&str> {
        self.statements()
            .into_iter()
            .filter_map(|s| match s {
                Statement::Declare { var } => Some(var),
                Statement::Assign { .. } => None,
            })
            .collect()
    }

    /// Whether the plan assigns nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.assignments.is_empty()
    }
}

fn push_scope_statements<'a>(scope: &'a Scope, out: &mut Vec<Statement<'a>>) {
    for assignment in &scope.assignments {
        match assignment {
            Assignment::Literal { key, value } => out.push(Statement::Assign {
                target: &scope.var,
                key,
                value: StatementValue::Literal(value),
            }),
            Assignment::Scope { key, scope: nested } => {
                out.push(Statement::Declare { var: &nested.var });
                out.push(Statement::Assign {
                    target: &scope.var,
                    key,
                    value: StatementValue::Var(&nested.var),
                });
                push_scope_statements(nested, out);
            }
        }
    }
}

/// Formats the literal as a double-quoted, escaped target-language literal.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::String(s) => write!(f, "\"{}\"", escape(s)),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl fmt::Display for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Declare { var } => write!(f, "{var} = {{}}"),
            Statement::Assign { target, key, value } => match value {
                StatementValue::Literal(lit) => {
                    write!(f, "{target}[\"{}\"] = {lit}", escape(key))
                }
                StatementValue::Var(var) => write!(f, "{target}[\"{}\"] = {var}", escape(key)),
            },
        }
    }
}

/// Escape backslashes and double quotes for a double-quoted literal.
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> OutputPlan {
        let mut advanced = Scope::new("output_2_0".into(), 2);
        advanced.assignments.push(Assignment::Literal {
            key: "tip1".into(),
            value: Literal::String("abc".into()),
        });
        let mut options = Scope::new("output_1_1".into(), 1);
        options.assignments.push(Assignment::Scope {
            key: "advanced".into(),
            scope: advanced,
        });
        options.assignments.push(Assignment::Literal {
            key: "qtty".into(),
            value: Literal::Int(123),
        });
        let mut plan = OutputPlan::empty();
        plan.root.assignments.push(Assignment::Literal {
            key: "label".into(),
            value: Literal::String("menu1.1".into()),
        });
        plan.root.assignments.push(Assignment::Scope {
            key: "options".into(),
            scope: options,
        });
        plan
    }

    #[test]
    fn statements_declare_before_use() {
        let rendered: Vec<String> = sample_plan()
            .statements()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            rendered,
            vec![
                "output = {}",
                "output[\"label\"] = \"menu1.1\"",
                "output_1_1 = {}",
                "output[\"options\"] = output_1_1",
                "output_2_0 = {}",
                "output_1_1[\"advanced\"] = output_2_0",
                "output_2_0[\"tip1\"] = \"abc\"",
                "output_1_1[\"qtty\"] = 123",
            ]
        );
    }

    #[test]
    fn scope_vars_in_declaration_order() {
        assert_eq!(
            sample_plan().scope_vars(),
            vec!["output", "output_1_1", "output_2_0"]
        );
    }

    #[test]
    fn empty_plan() {
        let plan = OutputPlan::empty();
        assert!(plan.is_empty());
        assert_eq!(plan.statements().len(), 1);
    }

    #[test]
    fn literal_display() {
        assert_eq!(Literal::Float(30.0).to_string(), "30.0");
        assert_eq!(Literal::String("a\"b".into()).to_string(), "\"a\\\"b\"");
        assert_eq!(
            Literal::List(vec![Literal::Int(1), Literal::Null]).to_string(),
            "[1, null]"
        );
    }
}
