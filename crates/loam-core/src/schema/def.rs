//! Declarative mapping metadata.
//!
//! This is the product of the host's annotation/configuration layer,
//! expressed as plain values: one [`Entity`] per mapped class, carrying its
//! superclass chain, table declaration, discriminator annotations and
//! fields. [`crate::schema::Builder::build`] resolves a [`Schema`] from it.

use crate::stmt::Type;

/// The full declarative input for one logical database.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub version: i64,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    /// Class name. Doubles as the entity's identity.
    pub name: String,

    /// Superclass chain, nearest first. May contain classes that are not
    /// mapped; parent resolution skips those.
    pub extends: Vec<String>,

    /// The table declaration. Every mapped class must carry one; a missing
    /// declaration is a fatal configuration error at resolution time.
    pub table: Option<Table>,

    /// Declared on an entity whose subtypes share its table rows.
    pub discriminator_column: Option<String>,

    /// Declared on a subtype: the literal identifying its rows.
    pub discriminator_value: Option<String>,

    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Explicit table name. Derived from the class name when absent.
    pub name: Option<String>,

    /// Multi-column uniqueness constraints, by column name.
    pub unique_constraints: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Column(Column),
    Relation(Relation),
}

/// A plain column declaration.
#[derive(Debug, Clone)]
pub struct Column {
    /// Explicit column name. Derived from the field name when absent.
    pub name: Option<String>,

    pub ty: Type,

    pub nullable: bool,

    pub primary_key: bool,

    pub unique: bool,

    pub default_value: Option<String>,

    /// Raw DDL text overriding the generated column definition.
    pub definition: Option<String>,
}

/// A relationship declaration.
#[derive(Debug, Clone)]
pub struct Relation {
    /// Name of the referenced entity class.
    pub target: String,

    pub kind: RelationKind,

    pub optional: bool,

    pub join: Join,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelationKind {
    OneToOne { mapped_by: Option<String> },
    ManyToOne,
    OneToMany { mapped_by: String },
    ManyToMany { mapped_by: Option<String> },
}

#[derive(Debug, Clone)]
pub enum Join {
    /// Foreign-key columns on the owning table; one entry is a plain join
    /// column, several form a composite group.
    Columns(Vec<JoinColumn>),

    /// A middle join table (many-to-many owning side).
    Table(JoinTableDef),

    /// Inverse side: no columns on this table.
    None,
}

#[derive(Debug, Clone)]
pub struct JoinColumn {
    /// Explicit column name. Derived from the field name when absent.
    pub name: Option<String>,

    /// Referenced column on the target entity (or one of its ancestors).
    pub referenced: String,

    pub nullable: bool,

    pub primary_key: bool,

    pub unique: bool,

    pub default_value: Option<String>,

    pub definition: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JoinTableDef {
    pub name: String,

    /// Columns referencing the owning side.
    pub joins: Vec<JoinColumn>,

    /// Columns referencing the target side.
    pub inverse_joins: Vec<JoinColumn>,
}

impl Entity {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            extends: vec![],
            table: None,
            discriminator_column: None,
            discriminator_value: None,
            fields: vec![],
        }
    }

    /// Declare the table with a derived name.
    pub fn with_table(mut self) -> Self {
        self.table.get_or_insert_with(Table::default);
        self
    }

    /// Declare the table with an explicit name.
    pub fn table_name(mut self, name: &str) -> Self {
        self.table.get_or_insert_with(Table::default).name = Some(name.to_string());
        self
    }

    pub fn unique_constraint(mut self, columns: &[&str]) -> Self {
        self.table
            .get_or_insert_with(Table::default)
            .unique_constraints
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.extends.push(superclass.to_string());
        self
    }

    pub fn discriminator_column(mut self, column: &str) -> Self {
        self.discriminator_column = Some(column.to_string());
        self
    }

    pub fn discriminator_value(mut self, value: &str) -> Self {
        self.discriminator_value = Some(value.to_string());
        self
    }

    pub fn column(mut self, field: &str, column: Column) -> Self {
        self.fields.push(Field {
            name: field.to_string(),
            kind: FieldKind::Column(column),
        });
        self
    }

    pub fn relation(mut self, field: &str, relation: Relation) -> Self {
        self.fields.push(Field {
            name: field.to_string(),
            kind: FieldKind::Relation(relation),
        });
        self
    }
}

impl Column {
    pub fn new(ty: Type) -> Self {
        Self {
            name: None,
            ty,
            nullable: true,
            primary_key: false,
            unique: false,
            default_value: None,
            definition: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn definition(mut self, definition: &str) -> Self {
        self.definition = Some(definition.to_string());
        self
    }
}

impl Relation {
    pub fn one_to_one(target: &str) -> Self {
        Self {
            target: target.to_string(),
            kind: RelationKind::OneToOne { mapped_by: None },
            optional: true,
            join: Join::None,
        }
    }

    pub fn many_to_one(target: &str) -> Self {
        Self {
            target: target.to_string(),
            kind: RelationKind::ManyToOne,
            optional: true,
            join: Join::None,
        }
    }

    pub fn one_to_many(target: &str, mapped_by: &str) -> Self {
        Self {
            target: target.to_string(),
            kind: RelationKind::OneToMany {
                mapped_by: mapped_by.to_string(),
            },
            optional: true,
            join: Join::None,
        }
    }

    pub fn many_to_many(target: &str) -> Self {
        Self {
            target: target.to_string(),
            kind: RelationKind::ManyToMany { mapped_by: None },
            optional: true,
            join: Join::None,
        }
    }

    /// Mark this as the inverse side of a one-to-one or many-to-many.
    pub fn mapped_by(mut self, field: &str) -> Self {
        match &mut self.kind {
            RelationKind::OneToOne { mapped_by } | RelationKind::ManyToMany { mapped_by } => {
                *mapped_by = Some(field.to_string());
            }
            kind => panic!("mapped_by is not applicable to {kind:?}"),
        }
        self
    }

    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    pub fn join(mut self, column: JoinColumn) -> Self {
        match &mut self.join {
            Join::Columns(columns) => columns.push(column),
            Join::None => self.join = Join::Columns(vec![column]),
            Join::Table(_) => panic!("relation already joins through a table"),
        }
        self
    }

    pub fn join_table(mut self, table: JoinTableDef) -> Self {
        self.join = Join::Table(table);
        self
    }
}

impl JoinColumn {
    pub fn new(referenced: &str) -> Self {
        Self {
            name: None,
            referenced: referenced.to_string(),
            nullable: true,
            primary_key: false,
            unique: false,
            default_value: None,
            definition: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }
}

impl JoinTableDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            joins: vec![],
            inverse_joins: vec![],
        }
    }

    pub fn join(mut self, column: JoinColumn) -> Self {
        self.joins.push(column);
        self
    }

    pub fn inverse_join(mut self, column: JoinColumn) -> Self {
        self.inverse_joins.push(column);
        self
    }
}
