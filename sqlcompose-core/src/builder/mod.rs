//! Statement builder module

mod clause;
mod render;
mod statement;
mod validate;

pub use clause::{Clause, ClauseKind, IntoArgs, IntoColumns, JoinKind};
pub use statement::{delete, insert, select, select_distinct, update, Statement};
