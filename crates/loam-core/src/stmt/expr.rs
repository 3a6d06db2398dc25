use super::{BinaryOp, ExprAnd, ExprBinaryOp, ExprColumn, ExprIsNull, ExprOr, Value};

/// A compiled predicate or operand. Column references are already
/// alias-qualified; compilation resolved fields to columns before building
/// the expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(ExprAnd),
    Or(ExprOr),
    BinaryOp(ExprBinaryOp),
    IsNull(ExprIsNull),
    Column(ExprColumn),
    Value(Value),
}

impl Expr {
    pub fn column(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Column(ExprColumn {
            alias: alias.into(),
            column: column.into(),
        })
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn binary_op(lhs: Self, op: BinaryOp, rhs: Self) -> Self {
        Self::BinaryOp(ExprBinaryOp {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
        })
    }

    pub fn eq(lhs: Self, rhs: Self) -> Self {
        Self::binary_op(lhs, BinaryOp::Eq, rhs)
    }

    pub fn is_null(expr: Self) -> Self {
        Self::IsNull(ExprIsNull {
            expr: Box::new(expr),
        })
    }

    pub fn and_from_vec(operands: Vec<Self>) -> Self {
        match operands.len() {
            1 => operands.into_iter().next().unwrap(),
            _ => Self::And(ExprAnd { operands }),
        }
    }

    pub fn or_from_vec(operands: Vec<Self>) -> Self {
        match operands.len() {
            1 => operands.into_iter().next().unwrap(),
            _ => Self::Or(ExprOr { operands }),
        }
    }
}
