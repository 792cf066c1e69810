//! Statement rendering
//!
//! Rendering happens in two passes. `plan` validates the clause sequence and
//! lowers it into [`Node`]s: COALESCE extends the SELECT column list and VALUES
//! fixes the INSERT column list and row count in place. `emit` then writes SQL text in
//! one left-to-right walk, threading the bind position so positional
//! dialects number their placeholders correctly across nested JOINs.

use tracing::debug;

use super::validate::OrderingValidator;
use super::{Clause, ClauseKind, JoinKind, Statement};
use crate::{Dialect, Error, Result, Value};

#[derive(Debug)]
enum Node<'a> {
    Select {
        table: &'a str,
        columns: Vec<String>,
        distinct: bool,
    },
    /// `rows` counts the VALUES tuples applied so far
    Insert {
        table: &'a str,
        columns: Vec<String>,
        rows: usize,
    },
    Update {
        table: &'a str,
        columns: Vec<String>,
    },
    Delete {
        table: &'a str,
    },
    /// WHERE and HAVING
    Template {
        keyword: &'static str,
        expr: &'a str,
    },
    /// ORDER BY, GROUP BY and RETURNING
    List {
        keyword: &'static str,
        columns: &'a [String],
    },
    /// LIMIT and OFFSET
    Bind {
        keyword: &'static str,
    },
    Keyword(&'static str),
    Join {
        kind: JoinKind,
        nested: Vec<Node<'a>>,
        alias: &'a str,
        on: &'a str,
    },
}

/// Render a statement to SQL, with the dialect terminator appended
pub(crate) fn render(statement: &Statement) -> Result<String> {
    let dialect = statement.dialect();
    let nodes = plan(statement, dialect)?;

    let mut sql = String::new();
    emit(&nodes, dialect, 1, &mut sql);
    sql.push_str(dialect.terminator());
    Ok(sql)
}

fn plan<'a>(statement: &'a Statement, dialect: &Dialect) -> Result<Vec<Node<'a>>> {
    if statement.clauses().is_empty() {
        return Err(Error::EmptyStatement);
    }

    let mut validator = OrderingValidator::new();
    let mut nodes = Vec::with_capacity(statement.clauses().len());

    for clause in statement.clauses() {
        if let Err(e) = check(&mut validator, clause, dialect) {
            debug!(clause = %clause.kind, error = %e, "clause rejected");
            return Err(e);
        }
        lower(clause, dialect, &mut nodes)?;
    }

    if let Some(err) = empty_write(&nodes) {
        return Err(err);
    }
    Ok(nodes)
}

fn empty_write(nodes: &[Node<'_>]) -> Option<Error> {
    match nodes.first() {
        Some(Node::Insert { columns, .. }) if columns.is_empty() => Some(Error::NoValuesToInsert),
        Some(Node::Update { table, columns }) if columns.is_empty() => {
            Some(Error::NoInsertableColumns {
                table: table.to_string(),
            })
        }
        _ => None,
    }
}

fn check(validator: &mut OrderingValidator, clause: &Clause, dialect: &Dialect) -> Result<()> {
    validator.accept(clause)?;

    // IN and NOT IN conditions expand their lists; any list left over cannot be bound
    if clause.args.iter().any(|arg| matches!(arg, Value::Array(_))) {
        return Err(Error::ListArgument {
            clause: clause.kind.name().to_string(),
        });
    }

    match clause.kind {
        ClauseKind::Coalesce if clause.column_names.len() < 2 => Err(Error::InvalidCoalesceArgs {
            count: clause.column_names.len(),
        }),
        ClauseKind::Returning if !dialect.supports_returning() => {
            Err(Error::UnsupportedReturning {
                dialect: dialect.to_string(),
            })
        }
        ClauseKind::OrderBy | ClauseKind::GroupBy if clause.column_names.is_empty() => {
            Err(Error::EmptyColumnList {
                clause: clause.kind.name().to_string(),
            })
        }
        ClauseKind::Where | ClauseKind::Having | ClauseKind::Join => {
            let markers = count_markers(&clause.expr);
            if markers != clause.args.len() {
                return Err(Error::ArgumentCountMismatch {
                    clause: clause.kind.name().to_string(),
                    expected: markers,
                    found: clause.args.len(),
                });
            }
            Ok(())
        }
        ClauseKind::Limit | ClauseKind::Offset if clause.args.len() != 1 => {
            Err(Error::ArgumentCountMismatch {
                clause: clause.kind.name().to_string(),
                expected: 1,
                found: clause.args.len(),
            })
        }
        _ => Ok(()),
    }
}

fn lower<'a>(clause: &'a Clause, dialect: &Dialect, nodes: &mut Vec<Node<'a>>) -> Result<()> {
    let table = clause.table_name.as_str();
    let node = match clause.kind {
        ClauseKind::Select => Node::Select {
            table,
            columns: clause.column_names.clone(),
            distinct: clause.distinct,
        },
        ClauseKind::Insert => Node::Insert {
            table,
            columns: clause.column_names.clone(),
            rows: 0,
        },
        ClauseKind::Update => Node::Update {
            table,
            columns: clause.column_names.clone(),
        },
        ClauseKind::Delete => Node::Delete { table },
        ClauseKind::Where | ClauseKind::Having => Node::Template {
            keyword: clause.kind.name(),
            expr: &clause.expr,
        },
        ClauseKind::OrderBy | ClauseKind::GroupBy | ClauseKind::Returning => Node::List {
            keyword: clause.kind.name(),
            columns: &clause.column_names,
        },
        ClauseKind::Limit | ClauseKind::Offset => Node::Bind {
            keyword: clause.kind.name(),
        },
        ClauseKind::Desc | ClauseKind::Asc => Node::Keyword(clause.kind.name()),
        ClauseKind::Coalesce => {
            if let Some(Node::Select { columns, .. }) = nodes.first_mut() {
                columns.push(format!("COALESCE({})", clause.column_names.join(", ")));
            }
            return Ok(());
        }
        ClauseKind::Values => return apply_values(clause, nodes),
        ClauseKind::Join => {
            let nested = clause
                .nested
                .as_deref()
                .ok_or_else(|| Error::misplaced_clause(ClauseKind::Join.name()))?;
            Node::Join {
                kind: clause.join_kind,
                nested: plan(nested, dialect)?,
                alias: &clause.alias,
                on: &clause.expr,
            }
        }
    };
    nodes.push(node);
    Ok(())
}

// VALUES never renders on its own. The first VALUES after INSERT may replace the
// column list, later ones add rows; after UPDATE the SET list stays as captured.
fn apply_values(clause: &Clause, nodes: &mut [Node<'_>]) -> Result<()> {
    if clause.args.is_empty() {
        return Err(Error::NoValuesToInsert);
    }

    let given = &clause.column_names;
    match nodes.first_mut() {
        Some(Node::Insert { columns, rows, .. }) => {
            if !given.is_empty() {
                if *rows == 0 {
                    *columns = given.clone();
                } else {
                    same_columns(columns, given)?;
                }
            }
            same_arity(columns.len(), clause.args.len())?;
            *rows += 1;
        }
        Some(Node::Update { columns, .. }) => {
            if !given.is_empty() {
                same_columns(columns, given)?;
            }
            same_arity(columns.len(), clause.args.len())?;
        }
        _ => {}
    }
    Ok(())
}

fn same_columns(expected: &[String], given: &[String]) -> Result<()> {
    same_arity(expected.len(), given.len())?;
    match expected.iter().zip(given).find(|(want, got)| want != got) {
        Some((_, got)) => Err(Error::column_not_found(got.as_str())),
        None => Ok(()),
    }
}

fn same_arity(expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::ValuesCountMismatch { expected, found });
    }
    Ok(())
}

/// Write `nodes` into `sql` starting at bind `position`; returns the placeholders consumed
///
/// Nodes are space separated. The first node gets no separator, so a nested
/// statement starts right after `JOIN (`.
fn emit(nodes: &[Node<'_>], dialect: &Dialect, position: usize, sql: &mut String) -> usize {
    let mut consumed = 0;

    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            sql.push(' ');
        }
        let at = position + consumed;

        match node {
            Node::Select {
                table,
                columns,
                distinct,
            } => {
                let keyword = if *distinct { "SELECT DISTINCT" } else { "SELECT" };
                sql.push_str(&format!("{} {} FROM {}", keyword, columns.join(", "), table));
            }
            Node::Insert {
                table,
                columns,
                rows,
            } => {
                let tuples: Vec<String> = (0..(*rows).max(1))
                    .map(|row| {
                        let first = at + row * columns.len();
                        let placeholders: Vec<String> = (0..columns.len())
                            .map(|k| dialect.placeholder(first + k))
                            .collect();
                        format!("({})", placeholders.join(", "))
                    })
                    .collect();
                sql.push_str(&format!(
                    "INSERT INTO {} ({}) VALUES {}",
                    table,
                    columns.join(", "),
                    tuples.join(", ")
                ));
                consumed += columns.len() * tuples.len();
            }
            Node::Update { table, columns } => {
                let assignments: Vec<String> = columns
                    .iter()
                    .enumerate()
                    .map(|(k, column)| format!("{}={}", column, dialect.placeholder(at + k)))
                    .collect();
                sql.push_str(&format!("UPDATE {} SET {}", table, assignments.join(", ")));
                consumed += columns.len();
            }
            Node::Delete { table } => {
                sql.push_str(&format!("DELETE FROM {}", table));
            }
            Node::Template { keyword, expr } => {
                let (text, used) = substitute(expr, dialect, at);
                sql.push_str(&format!("{} {}", keyword, text));
                consumed += used;
            }
            Node::List { keyword, columns } if columns.is_empty() => {
                // only RETURNING reaches here empty
                sql.push_str(&format!("{} *", keyword));
            }
            Node::List { keyword, columns } => {
                sql.push_str(&format!("{} {}", keyword, columns.join(", ")));
            }
            Node::Bind { keyword } => {
                sql.push_str(&format!("{} {}", keyword, dialect.placeholder(at)));
                consumed += 1;
            }
            Node::Keyword(keyword) => sql.push_str(keyword),
            Node::Join {
                kind,
                nested,
                alias,
                on,
            } => {
                sql.push_str(&format!("{} (", kind.keyword()));
                let inner = emit(nested, dialect, at, sql);
                let (text, used) = substitute(on, dialect, at + inner);
                sql.push_str(&format!(") {} ON {}", alias, text));
                consumed += inner + used;
            }
        }
    }
    consumed
}

/// Replace each `?` marker in `template` with the dialect placeholder for its position
fn substitute(template: &str, dialect: &Dialect, position: usize) -> (String, usize) {
    let mut out = String::with_capacity(template.len());
    let mut k = 0;
    for ch in template.chars() {
        if ch == '?' {
            out.push_str(&dialect.placeholder(position + k));
            k += 1;
        } else {
            out.push(ch);
        }
    }
    (out, k)
}

fn count_markers(template: &str) -> usize {
    template.chars().filter(|&c| c == '?').count()
}
