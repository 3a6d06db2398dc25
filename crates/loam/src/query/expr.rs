use super::Path;

use loam_core::stmt::{BinaryOp, Value};

/// A predicate tree over query roots, composed with `and`/`or`.
#[derive(Debug, Clone)]
pub struct Expr {
    pub(crate) kind: ExprKind,
}

#[derive(Debug, Clone)]
pub(crate) enum ExprKind {
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Binary {
        path: Path,
        op: BinaryOp,
        value: Value,
    },
    IsNull {
        path: Path,
    },
}

impl Expr {
    pub(crate) fn binary(path: Path, op: BinaryOp, value: Value) -> Self {
        Self {
            kind: ExprKind::Binary { path, op, value },
        }
    }

    pub(crate) fn null_check(path: Path) -> Self {
        Self {
            kind: ExprKind::IsNull { path },
        }
    }

    pub fn and(self, other: Expr) -> Expr {
        match self.kind {
            ExprKind::And(mut operands) => {
                operands.push(other);
                Expr {
                    kind: ExprKind::And(operands),
                }
            }
            kind => Expr {
                kind: ExprKind::And(vec![Expr { kind }, other]),
            },
        }
    }

    pub fn or(self, other: Expr) -> Expr {
        match self.kind {
            ExprKind::Or(mut operands) => {
                operands.push(other);
                Expr {
                    kind: ExprKind::Or(operands),
                }
            }
            kind => Expr {
                kind: ExprKind::Or(vec![Expr { kind }, other]),
            },
        }
    }

    /// Paths that can force implicit joins: every comparison, plus null
    /// checks that reach through a relationship into an attribute. A bare
    /// null check on a relationship tests the local join columns and needs
    /// no join.
    pub(crate) fn join_paths(&self) -> Vec<&Path> {
        let mut paths = vec![];
        self.collect_join_paths(&mut paths);
        paths
    }

    fn collect_join_paths<'a>(&'a self, paths: &mut Vec<&'a Path>) {
        match &self.kind {
            ExprKind::And(operands) | ExprKind::Or(operands) => {
                for operand in operands {
                    operand.collect_join_paths(paths);
                }
            }
            ExprKind::Binary { path, .. } => paths.push(path),
            ExprKind::IsNull { path } => {
                if path.attribute.is_some() {
                    paths.push(path);
                }
            }
        }
    }
}
