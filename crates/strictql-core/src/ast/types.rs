//! Type names as written in casts and typed literals.

use core::fmt;

/// A Postgres type reference, e.g. `varchar(20)`, `int4[]` or
/// `timestamp with time zone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    /// Type name, lower case, multi-word names joined by single spaces.
    pub name: String,
    /// Type modifiers such as length or precision/scale.
    pub modifiers: Vec<i64>,
    /// Number of `[]` suffixes.
    pub array_dims: u32,
}

impl DataType {
    /// Creates a scalar type reference without modifiers.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: vec![],
            array_dims: 0,
        }
    }

    /// Returns true if the type is an array type.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.array_dims > 0
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.modifiers.is_empty() {
            let modifiers: Vec<String> = self.modifiers.iter().map(ToString::to_string).collect();
            write!(f, "({})", modifiers.join(", "))?;
        }
        for _ in 0..self.array_dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(DataType::named("int4").to_string(), "int4");
        let numeric = DataType {
            name: "numeric".into(),
            modifiers: vec![10, 2],
            array_dims: 1,
        };
        assert_eq!(numeric.to_string(), "numeric(10, 2)[]");
        assert!(numeric.is_array());
    }
}
