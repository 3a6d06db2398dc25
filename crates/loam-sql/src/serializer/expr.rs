use super::{Delimited, Formatter, Ident, ToSql};

use loam_core::stmt::{BinaryOp, Expr};

impl ToSql for &Expr {
    fn to_sql(self, f: &mut Formatter<'_>) {
        match self {
            Expr::And(expr) => {
                fmt!(f, "(", Delimited(&expr.operands, " AND "), ")");
            }
            Expr::Or(expr) => {
                fmt!(f, "(", Delimited(&expr.operands, " OR "), ")");
            }
            Expr::BinaryOp(expr) => {
                fmt!(f, &*expr.lhs, " ", expr.op, " ", &*expr.rhs);
            }
            Expr::IsNull(expr) => {
                fmt!(f, &*expr.expr, " IS NULL");
            }
            Expr::Column(column) => {
                fmt!(f, Ident(&column.alias), ".", Ident(&column.column));
            }
            Expr::Value(value) => value.to_sql(f),
        }
    }
}

impl ToSql for BinaryOp {
    fn to_sql(self, f: &mut Formatter<'_>) {
        f.dst.push_str(match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Ge => ">=",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Lt => "<",
        })
    }
}
