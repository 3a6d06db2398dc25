use super::{Comma, Formatter, ToSql};

use loam_core::stmt::Value;

use std::fmt::Write;

/// Values render as SQL literals: the executor contract consumes query text
/// only, so there is no parameter binding.
impl ToSql for &Value {
    fn to_sql(self, f: &mut Formatter<'_>) {
        match self {
            Value::Null => f.dst.push_str("NULL"),
            Value::Bool(true) => f.dst.push('1'),
            Value::Bool(false) => f.dst.push('0'),
            Value::I64(value) => write!(f.dst, "{value}").unwrap(),
            Value::F64(value) => write!(f.dst, "{value}").unwrap(),
            Value::Timestamp(millis) => write!(f.dst, "{millis}").unwrap(),
            Value::Text(text) => quote(text, f),
            Value::Enum(constant) => quote(constant, f),
            Value::Blob(bytes) => {
                f.dst.push_str("X'");
                for byte in bytes {
                    write!(f.dst, "{byte:02X}").unwrap();
                }
                f.dst.push('\'');
            }
            Value::Record(fields) => fmt!(f, "(", Comma(fields), ")"),
        }
    }
}

/// Single-quote wrapping with internal quote doubling.
fn quote(text: &str, f: &mut Formatter<'_>) {
    f.dst.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            f.dst.push('\'');
        }
        f.dst.push(ch);
    }
    f.dst.push('\'');
}
