use super::{Comma, Formatter, Ident, ToSql};

use loam_core::schema::{Action, Column, Entity, ForeignKey, JoinTable, Propagation};

use std::fmt::Write;

pub(super) struct CreateTable<'a>(pub(super) &'a Entity);

pub(super) struct CreateJoinTable<'a>(pub(super) &'a JoinTable);

struct ColumnDef<'a>(&'a Column);

struct ForeignKeyClause<'a>(&'a ForeignKey);

impl ToSql for CreateTable<'_> {
    fn to_sql(self, f: &mut Formatter<'_>) {
        let entity = self.0;

        fmt!(
            f,
            "CREATE TABLE IF NOT EXISTS ",
            Ident(&entity.table),
            " (",
            Comma(entity.columns.iter().map(ColumnDef)),
        );

        let primary_keys: Vec<_> = entity.primary_keys().collect();
        if !primary_keys.is_empty() {
            fmt!(
                f,
                ", PRIMARY KEY (",
                Comma(primary_keys.iter().map(|column| Ident(&column.name))),
                ")",
            );
        }

        for constraint in &entity.unique_constraints {
            fmt!(
                f,
                ", UNIQUE (",
                Comma(
                    constraint
                        .iter()
                        .map(|index| Ident(&entity.columns[*index].name))
                ),
                ")",
            );
        }

        // The inheritance constraint comes first, then one constraint per
        // relationship join-column group.
        if let Some(parent) = entity.parent {
            let parent = f.serializer.schema.entity(parent);
            let columns: Vec<_> = parent.primary_keys().map(|pk| &pk.name).collect();

            fmt!(
                f,
                ", FOREIGN KEY (",
                Comma(columns.iter().map(Ident)),
                ") REFERENCES ",
                Ident(&parent.table),
                " (",
                Comma(columns.iter().map(Ident)),
                ") ",
                Propagation::new(Action::Cascade, Action::Cascade),
            );
        }

        for foreign_key in &entity.foreign_keys {
            fmt!(f, ", ", ForeignKeyClause(foreign_key));
        }

        fmt!(f, ")");
    }
}

impl ToSql for CreateJoinTable<'_> {
    fn to_sql(self, f: &mut Formatter<'_>) {
        let table = self.0;

        fmt!(
            f,
            "CREATE TABLE IF NOT EXISTS ",
            Ident(&table.name),
            " (",
            Comma(table.columns.iter().map(ColumnDef)),
            ", PRIMARY KEY (",
            Comma(
                table
                    .columns
                    .iter()
                    .filter(|column| column.primary_key)
                    .map(|column| Ident(&column.name))
            ),
            ")",
        );

        for foreign_key in &table.foreign_keys {
            fmt!(f, ", ", ForeignKeyClause(foreign_key));
        }

        fmt!(f, ")");
    }
}

impl ToSql for ColumnDef<'_> {
    fn to_sql(self, f: &mut Formatter<'_>) {
        let column = self.0;

        fmt!(f, Ident(&column.name));

        // A custom definition replaces everything after the name.
        if let Some(definition) = &column.custom_definition {
            fmt!(f, " ", definition);
            return;
        }

        let ty = column.ty.storage_class().to_string();
        fmt!(f, " ", ty.as_str());

        if !column.nullable {
            fmt!(f, " NOT NULL");
        }

        if column.unique {
            fmt!(f, " UNIQUE");
        }

        if let Some(default) = &column.default_value {
            f.dst.push_str(" DEFAULT '");
            for ch in default.chars() {
                if ch == '\'' {
                    f.dst.push('\'');
                }
                f.dst.push(ch);
            }
            f.dst.push('\'');
        }
    }
}

impl ToSql for ForeignKeyClause<'_> {
    fn to_sql(self, f: &mut Formatter<'_>) {
        let fk = self.0;
        let target = f.serializer.schema.entity(fk.target);

        fmt!(
            f,
            "FOREIGN KEY (",
            Comma(fk.columns.iter().map(Ident)),
            ") REFERENCES ",
            Ident(&target.table),
            " (",
            Comma(fk.target_columns.iter().map(Ident)),
            ") ",
            fk.propagation,
        );
    }
}

impl ToSql for Propagation {
    fn to_sql(self, f: &mut Formatter<'_>) {
        write!(f.dst, "{self}").unwrap();
    }
}
