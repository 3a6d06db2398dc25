use super::{Comma, Formatter, Ident, ToSql};

use loam_core::stmt::{Join, Select, SelectColumn, Source};

impl ToSql for &Select {
    fn to_sql(self, f: &mut Formatter<'_>) {
        let filter = self.filter.as_ref().map(|filter| (" WHERE ", filter));

        fmt!(
            f,
            "SELECT ",
            Comma(&self.columns),
            " FROM ",
            &self.source,
            filter,
        );
    }
}

impl ToSql for &SelectColumn {
    fn to_sql(self, f: &mut Formatter<'_>) {
        fmt!(
            f,
            Ident(&self.column.alias),
            ".",
            Ident(&self.column.column),
            " AS ",
            Ident(&self.output),
        );
    }
}

impl ToSql for &Source {
    fn to_sql(self, f: &mut Formatter<'_>) {
        fmt!(f, Ident(&self.table), " AS ", Ident(&self.alias));

        for join in &self.joins {
            fmt!(f, " ", join);
        }
    }
}

impl ToSql for &Join {
    fn to_sql(self, f: &mut Formatter<'_>) {
        let kind = self.kind.to_string();

        fmt!(
            f,
            kind.as_str(),
            " ",
            Ident(&self.table),
            " AS ",
            Ident(&self.alias),
            " ON ",
            &self.on,
        );
    }
}
