mod expr;
pub use expr::Expr;

mod expr_and;
pub use expr_and::ExprAnd;

mod expr_binary_op;
pub use expr_binary_op::ExprBinaryOp;

mod expr_column;
pub use expr_column::ExprColumn;

mod expr_is_null;
pub use expr_is_null::ExprIsNull;

mod expr_or;
pub use expr_or::ExprOr;

mod join;
pub use join::{Join, JoinKind};

mod op_binary;
pub use op_binary::BinaryOp;

mod select;
pub use select::{Select, SelectColumn};

mod source;
pub use source::Source;

mod storage_class;
pub use storage_class::StorageClass;

mod ty;
pub use ty::{EnumType, Type};

mod value;
pub use value::Value;
