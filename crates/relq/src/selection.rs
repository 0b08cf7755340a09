//! Binary comparison predicates over columns.

use crate::column::{Column, TableRef};
use crate::value::Value;
use std::fmt;

/// The six comparison operators a [`Selection`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// SQL spelling of the operator.
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a comparison: another column or a scalar literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(Column),
    Literal(Value),
}

impl From<Column> for Operand {
    fn from(column: Column) -> Self {
        Operand::Column(column)
    }
}

impl From<&Column> for Operand {
    fn from(column: &Column) -> Self {
        Operand::Column(column.clone())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Literal(value)
    }
}

macro_rules! literal_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Operand::Literal(Value::from(value))
                }
            }
        )*
    };
}

literal_operand!(i64, i32, u32, bool, f64, &str, String, Vec<u8>);

/// An immutable `column <op> argument` predicate.
///
/// Literal arguments are embedded into the rendered fragment rather than bound as
/// parameters; use `select_where` for bound equality filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    left: Column,
    op: CompareOp,
    right: Operand,
}

impl Selection {
    pub fn new(left: Column, op: CompareOp, right: Operand) -> Self {
        Self { left, op, right }
    }

    pub fn left(&self) -> &Column {
        &self.left
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn right(&self) -> &Operand {
        &self.right
    }

    /// Distinct tables referenced by this predicate (one or two), left side first.
    pub fn tables(&self) -> Vec<TableRef> {
        let mut tables = vec![self.left.table_ref().clone()];
        if let Operand::Column(col) = &self.right
            && col.table_ref() != self.left.table_ref()
        {
            tables.push(col.table_ref().clone());
        }
        tables
    }

    /// `<table>.<column> <op> <table>.<column>` or `<table>.<column> <op> <literal>`.
    pub fn to_sql_fragment(&self) -> String {
        let rhs = match &self.right {
            Operand::Column(col) => col.qualified_name(),
            Operand::Literal(value) => value.to_sql_literal(),
        };
        format!("{} {} {}", self.left.qualified_name(), self.op, rhs)
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_fragment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use crate::testing::SchemaDriver;
    use std::sync::Arc;

    fn tables() -> (Table, Table) {
        let driver = Arc::new(
            SchemaDriver::new()
                .with_table("episodes", &["id", "name", "production_id"])
                .with_table("productions", &["id", "name"]),
        );
        (
            Table::new(driver.clone(), "episodes"),
            Table::new(driver, "productions"),
        )
    }

    #[test]
    fn renders_every_operator() {
        let (episodes, productions) = tables();
        let lhs = episodes.column("production_id").unwrap();
        let rhs = productions.column("id").unwrap();

        let cases = [
            (lhs.equals(&rhs), "="),
            (lhs.not_equals(&rhs), "<>"),
            (lhs.less_than(&rhs), "<"),
            (lhs.greater_than(&rhs), ">"),
            (lhs.less_or_equal(&rhs), "<="),
            (lhs.greater_or_equal(&rhs), ">="),
        ];
        for (selection, op) in cases {
            assert_eq!(
                selection.to_sql_fragment(),
                format!("episodes.production_id {op} productions.id")
            );
            assert_eq!(selection.op().as_str(), op);
        }
    }

    #[test]
    fn literal_arguments_are_embedded() {
        let (episodes, _productions) = tables();
        let id = episodes.column("id").unwrap();
        let name = episodes.column("name").unwrap();

        assert_eq!(id.greater_than(3).to_string(), "episodes.id > 3");
        assert_eq!(
            name.equals("O'Brien").to_string(),
            "episodes.name = 'O''Brien'"
        );
        assert_eq!(
            name.not_equals(Value::Null).to_string(),
            "episodes.name <> NULL"
        );
    }

    #[test]
    fn alias_does_not_change_the_fragment() {
        let (episodes, _productions) = tables();
        let name = episodes.column("name").unwrap().alias("episode_name");
        assert_eq!(name.equals("x").to_sql_fragment(), "episodes.name = 'x'");
    }

    #[test]
    fn tables_are_distinct_left_first() {
        let (episodes, productions) = tables();
        let lhs = episodes.column("production_id").unwrap();
        let rhs = productions.column("id").unwrap();

        let both = lhs.equals(&rhs).tables();
        assert_eq!(both.len(), 2);
        assert!(both[0].refers_to(&episodes));
        assert!(both[1].refers_to(&productions));

        let same = lhs.equals(episodes.column("id").unwrap()).tables();
        assert_eq!(same.len(), 1);

        let literal = lhs.equals(1).tables();
        assert_eq!(literal.len(), 1);
        assert_eq!(literal[0].name(), "episodes");
    }

    #[test]
    fn selections_compare_structurally() {
        let (episodes, _productions) = tables();
        let id = episodes.column("id").unwrap();
        assert_eq!(id.equals(1), id.equals(1));
        assert_ne!(id.equals(1), id.equals(2));
        assert_ne!(id.equals(1), id.less_than(1));
    }
}
