/// An alias-qualified column reference: `"a0"."first_name"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprColumn {
    pub alias: String,
    pub column: String,
}
