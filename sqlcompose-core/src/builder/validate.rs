//! Clause ordering rules

use super::{Clause, ClauseKind};
use crate::{Error, Result};

/// Walks a clause sequence left to right, checking each clause against its
/// predecessor and the statement's leading clause
#[derive(Debug, Default)]
pub(crate) struct OrderingValidator {
    leading: Option<ClauseKind>,
    previous: Option<ClauseKind>,
}

impl OrderingValidator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Accept the next clause or reject it as misplaced
    pub(crate) fn accept(&mut self, clause: &Clause) -> Result<()> {
        let kind = clause.kind;
        if !self.is_legal(clause) {
            return Err(Error::misplaced_clause(kind.name()));
        }

        if self.leading.is_none() {
            self.leading = Some(kind);
        }
        self.previous = Some(kind);
        Ok(())
    }

    fn is_legal(&self, clause: &Clause) -> bool {
        let kind = clause.kind;
        let Some(leading) = self.leading else {
            return kind.is_leading();
        };
        let previous = self.previous;

        match kind {
            ClauseKind::Insert | ClauseKind::Select | ClauseKind::Update | ClauseKind::Delete => {
                false
            }
            ClauseKind::Desc | ClauseKind::Asc => previous == Some(ClauseKind::OrderBy),
            ClauseKind::Coalesce => previous == Some(ClauseKind::Select),
            ClauseKind::Returning => leading.is_dml(),
            ClauseKind::Values => match previous {
                Some(ClauseKind::Insert) | Some(ClauseKind::Update) => true,
                // one more row of a multi-row INSERT
                Some(ClauseKind::Values) => leading == ClauseKind::Insert,
                _ => false,
            },
            ClauseKind::Join => {
                leading == ClauseKind::Select
                    && matches!(previous, Some(ClauseKind::Select) | Some(ClauseKind::Join))
                    && nested_produces_rows(clause)
            }
            ClauseKind::GroupBy => leading == ClauseKind::Select,
            ClauseKind::Having => previous == Some(ClauseKind::GroupBy),
            ClauseKind::Where
            | ClauseKind::OrderBy
            | ClauseKind::Limit
            | ClauseKind::Offset => true,
        }
    }
}

// A JOIN target must yield rows: a SELECT, or DML carrying RETURNING
fn nested_produces_rows(clause: &Clause) -> bool {
    let Some(nested) = clause.nested.as_deref() else {
        return false;
    };
    match nested.kind() {
        Some(ClauseKind::Select) => true,
        Some(kind) if kind.is_dml() => nested
            .clauses()
            .iter()
            .any(|c| c.kind == ClauseKind::Returning),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tests::User;
    use crate::{Dialect, Model, Statement};

    fn run(clauses: &[Clause]) -> Result<()> {
        let mut validator = OrderingValidator::new();
        for clause in clauses {
            validator.accept(clause)?;
        }
        Ok(())
    }

    fn misplaced(result: Result<()>) -> String {
        match result {
            Err(Error::MisplacedClause { clause }) => clause,
            other => panic!("expected misplaced clause, got {:?}", other),
        }
    }

    #[test]
    fn test_first_clause_must_lead() {
        assert_eq!(misplaced(run(&[Clause::where_("id=?", [1])])), "WHERE");
        assert!(run(&[Clause::select(&User::table())]).is_ok());
    }

    #[test]
    fn test_second_leading_clause_rejected() {
        let table = User::table();
        let result = run(&[Clause::select(&table), Clause::delete(&table)]);
        assert_eq!(misplaced(result), "DELETE");
    }

    #[test]
    fn test_desc_requires_order_by() {
        let table = User::table();
        assert_eq!(misplaced(run(&[Clause::select(&table), Clause::desc()])), "DESC");
        assert!(run(&[
            Clause::select(&table),
            Clause::order_by("id"),
            Clause::asc()
        ])
        .is_ok());
    }

    #[test]
    fn test_coalesce_follows_select() {
        let table = User::table();
        assert!(run(&[Clause::select(&table), Clause::coalesce(("a", "b"))]).is_ok());
        let twice = run(&[
            Clause::select(&table),
            Clause::coalesce(("a", "b")),
            Clause::coalesce(("c", "d")),
        ]);
        assert_eq!(misplaced(twice), "COALESCE");
        let result = run(&[
            Clause::select(&table),
            Clause::where_("id=?", [1]),
            Clause::coalesce(("a", "b")),
        ]);
        assert_eq!(misplaced(result), "COALESCE");
    }

    #[test]
    fn test_returning_requires_dml() {
        let table = User::table();
        let result = run(&[Clause::select(&table), Clause::returning("id")]);
        assert_eq!(misplaced(result), "RETURNING");
        assert!(run(&[
            Clause::delete(&table),
            Clause::where_("id=?", [1]),
            Clause::returning("id")
        ])
        .is_ok());
    }

    #[test]
    fn test_values_follows_insert_or_update() {
        let table = User::table();
        assert!(run(&[Clause::insert(&table), Clause::values([1, 2, 3])]).is_ok());
        let result = run(&[
            Clause::update(&table),
            Clause::where_("id=?", [1]),
            Clause::values([1, 2, 3]),
        ]);
        assert_eq!(misplaced(result), "VALUES");
    }

    #[test]
    fn test_repeated_values_only_on_insert() {
        let table = User::table();
        assert!(run(&[
            Clause::insert(&table),
            Clause::values([1, 2, 3]),
            Clause::values([4, 5, 6])
        ])
        .is_ok());
        let result = run(&[
            Clause::update(&table),
            Clause::values([1, 2, 3]),
            Clause::values([4, 5, 6]),
        ]);
        assert_eq!(misplaced(result), "VALUES");
    }

    #[test]
    fn test_join_placement() {
        let dialect = Dialect::sqlite();
        let table = User::table();
        let nested = Statement::new(&dialect, Clause::select(&table));
        assert!(run(&[
            Clause::select(&table),
            Clause::join(nested.clone(), "u", "u.id = id", ())
        ])
        .is_ok());

        let after_where = run(&[
            Clause::select(&table),
            Clause::where_("id=?", [1]),
            Clause::join(nested.clone(), "u", "u.id = id", ()),
        ]);
        assert_eq!(misplaced(after_where), "JOIN");

        let after_coalesce = run(&[
            Clause::select(&table),
            Clause::coalesce(("a", "b")),
            Clause::join(nested.clone(), "u", "u.id = id", ()),
        ]);
        assert_eq!(misplaced(after_coalesce), "JOIN");

        assert!(run(&[
            Clause::select(&table),
            Clause::join(nested.clone(), "u", "u.id = id", ()),
            Clause::left_join(nested.clone(), "v", "v.id = id", ())
        ])
        .is_ok());

        let in_delete = run(&[
            Clause::delete(&table),
            Clause::join(nested, "u", "u.id = id", ()),
        ]);
        assert_eq!(misplaced(in_delete), "JOIN");
    }

    #[test]
    fn test_join_nested_dml_needs_returning() {
        let dialect = Dialect::sqlite();
        let table = User::table();
        let bare = Statement::new(&dialect, Clause::delete(&table));
        let result = run(&[Clause::select(&table), Clause::join(bare.clone(), "d", "d.id = id", ())]);
        assert_eq!(misplaced(result), "JOIN");

        let returning = bare.returning("id");
        assert!(run(&[Clause::select(&table), Clause::join(returning, "d", "d.id = id", ())]).is_ok());
    }

    #[test]
    fn test_having_follows_group_by() {
        let table = User::table();
        assert!(run(&[
            Clause::select(&table),
            Clause::group_by("last_name"),
            Clause::having("count(*) > ?", [1])
        ])
        .is_ok());
        let result = run(&[Clause::select(&table), Clause::having("count(*) > ?", [1])]);
        assert_eq!(misplaced(result), "HAVING");
    }
}
