use super::Formatter;

macro_rules! fmt {
    ($f:expr, $( $fragment:expr ),* $(,)?) => {{
        $(
            $fragment.to_sql($f);
        )*
    }};
}

pub(super) trait ToSql {
    fn to_sql(self, f: &mut Formatter<'_>);
}

impl ToSql for &str {
    fn to_sql(self, f: &mut Formatter<'_>) {
        f.dst.push_str(self);
    }
}

impl ToSql for &String {
    fn to_sql(self, f: &mut Formatter<'_>) {
        f.dst.push_str(self);
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(self, f: &mut Formatter<'_>) {
        if let Some(inner) = self {
            inner.to_sql(f);
        }
    }
}

impl<A: ToSql, B: ToSql> ToSql for (A, B) {
    fn to_sql(self, f: &mut Formatter<'_>) {
        self.0.to_sql(f);
        self.1.to_sql(f);
    }
}

impl<A: ToSql, B: ToSql, C: ToSql> ToSql for (A, B, C) {
    fn to_sql(self, f: &mut Formatter<'_>) {
        self.0.to_sql(f);
        self.1.to_sql(f);
        self.2.to_sql(f);
    }
}
