use super::{Column, ForeignKey};

/// The middle table realizing a many-to-many relationship. Owns no entity:
/// all of its columns are primary-key foreign keys into the two sides.
#[derive(Debug, Clone)]
pub struct JoinTable {
    pub name: String,

    /// Direct-side columns first, then inverse-side columns.
    pub columns: Vec<Column>,

    pub foreign_keys: Vec<ForeignKey>,
}
