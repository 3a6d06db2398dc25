use super::{Expr, Root};

use loam_core::schema::EntityId;
use loam_core::stmt::{BinaryOp, Value};

/// A property reference rooted at a query root: a plain field, a
/// relationship field, or an attribute reached through one.
#[derive(Debug, Clone)]
pub struct Path {
    pub(crate) alias: String,
    pub(crate) entity: EntityId,
    pub(crate) field: String,
    pub(crate) attribute: Option<String>,
}

impl Path {
    pub(crate) fn new(root: &Root, field: &str) -> Self {
        Self {
            alias: root.alias.clone(),
            entity: root.entity,
            field: field.to_string(),
            attribute: None,
        }
    }

    /// Narrow a relationship field down to an attribute of the entity it
    /// points at.
    pub fn attr(mut self, attribute: &str) -> Self {
        self.attribute = Some(attribute.to_string());
        self
    }

    pub fn eq(self, value: impl Into<Value>) -> Expr {
        Expr::binary(self, BinaryOp::Eq, value.into())
    }

    pub fn ne(self, value: impl Into<Value>) -> Expr {
        Expr::binary(self, BinaryOp::Ne, value.into())
    }

    pub fn gt(self, value: impl Into<Value>) -> Expr {
        Expr::binary(self, BinaryOp::Gt, value.into())
    }

    pub fn ge(self, value: impl Into<Value>) -> Expr {
        Expr::binary(self, BinaryOp::Ge, value.into())
    }

    pub fn lt(self, value: impl Into<Value>) -> Expr {
        Expr::binary(self, BinaryOp::Lt, value.into())
    }

    pub fn le(self, value: impl Into<Value>) -> Expr {
        Expr::binary(self, BinaryOp::Le, value.into())
    }

    pub fn is_null(self) -> Expr {
        Expr::null_check(self)
    }
}
