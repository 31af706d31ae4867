mod codegen;
mod compile;
mod condition;
mod error;
pub mod parse;
mod resolve;
#[cfg(feature = "binary-cache")]
pub mod serial;
pub mod source;
mod types;

pub use condition::{compile_condition, compile_condition_str, CompiledCondition};
pub use error::RullerError;
pub use types::{
    Assignment, CompareOp, CompileError, CompileOptions, DEFAULT_CONDITION, DEFAULT_SEED,
    Dialect, Expr, GroupLoader, GroupSpec, InputType, Literal, LogicalOp, OutputPlan, Program,
    ProgramBuilder, ROOT_OUTPUT_VAR, Registration, RequiredInput, RuleGroupConfig,
    RuleGroupSpec, RuleNode, Scope, Statement, StatementValue, TypeRegistry, Value, ValueKind,
};

#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
