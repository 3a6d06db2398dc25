#[macro_use]
mod fmt;
use fmt::ToSql;

mod delim;
use delim::{Comma, Delimited};

mod ident;
use ident::Ident;

// Fragment serializers
mod ddl;
mod expr;
mod statement;
mod value;

use loam_core::schema::{Entity, JoinTable, Schema};
use loam_core::stmt::Select;

/// Serialize resolved schema objects and compiled statements to SQL text.
#[derive(Debug)]
pub struct Serializer<'a> {
    /// Schema against which statements are serialized. Table creation needs
    /// it to resolve parent and foreign-key target tables.
    schema: &'a Schema,
}

struct Formatter<'a> {
    /// Handle to the serializer
    serializer: &'a Serializer<'a>,

    /// Where to write the serialized SQL
    dst: &'a mut String,
}

impl<'a> Serializer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// The DDL creating one entity's backing table. Pure: resolution has
    /// already settled every column property.
    pub fn create_table(&self, entity: &Entity) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
        };

        ddl::CreateTable(entity).to_sql(&mut fmt);

        ret.push(';');
        ret
    }

    /// The DDL creating a many-to-many middle table.
    pub fn create_join_table(&self, table: &JoinTable) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
        };

        ddl::CreateJoinTable(table).to_sql(&mut fmt);

        ret.push(';');
        ret
    }

    /// A compiled SELECT statement as query text.
    pub fn select(&self, stmt: &Select) -> String {
        let mut ret = String::new();

        let mut fmt = Formatter {
            serializer: self,
            dst: &mut ret,
        };

        stmt.to_sql(&mut fmt);

        ret
    }
}
