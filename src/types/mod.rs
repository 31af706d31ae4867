mod config;
mod error;
mod expr;
mod group;
mod input_type;
mod node;
mod output;
mod program;
mod type_registry;
mod value;

pub use config::{DEFAULT_CONDITION, DEFAULT_SEED, RuleGroupConfig};
pub use error::CompileError;
pub use expr::{CompareOp, Expr, LogicalOp};
pub use group::{GroupLoader, GroupSpec};
pub use input_type::InputType;
pub use node::RuleNode;
pub use output::{
    Assignment, Literal, OutputPlan, ROOT_OUTPUT_VAR, Scope, Statement, StatementValue,
};
pub(crate) use output::escape;
pub use program::{
    CompileOptions, Dialect, Program, ProgramBuilder, Registration, RequiredInput, RuleGroupSpec,
};
pub use type_registry::TypeRegistry;
pub use value::{Value, ValueKind};
