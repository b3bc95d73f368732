use super::Value;

pub type Row = Vec<Value>;

/// Builds a row from anything convertible into cell values.
pub fn row<I, V>(values: I) -> Row
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    values.into_iter().map(Into::into).collect()
}
