//! Static mapping from Postgres type names to [`ResolvedType`].

use crate::types::{ImportedKind, ResolvedType, SimpleKind};

const SIMPLE_TYPES: &[(&str, SimpleKind)] = &[
    ("bool", SimpleKind::Bool),
    ("boolean", SimpleKind::Bool),
    ("int2", SimpleKind::Int),
    ("smallint", SimpleKind::Int),
    ("int4", SimpleKind::Int),
    ("int", SimpleKind::Int),
    ("integer", SimpleKind::Int),
    ("int8", SimpleKind::Int),
    ("bigint", SimpleKind::Int),
    ("float4", SimpleKind::Float),
    ("real", SimpleKind::Float),
    ("float8", SimpleKind::Float),
    ("double precision", SimpleKind::Float),
    ("varchar", SimpleKind::Str),
    ("character varying", SimpleKind::Str),
    ("char", SimpleKind::Str),
    ("character", SimpleKind::Str),
    ("bpchar", SimpleKind::Str),
    ("text", SimpleKind::Str),
    ("name", SimpleKind::Str),
    ("bytea", SimpleKind::Bytes),
];

const IMPORTED_TYPES: &[(&str, ImportedKind)] = &[
    ("numeric", ImportedKind::Decimal),
    ("decimal", ImportedKind::Decimal),
    ("date", ImportedKind::Date),
    ("timestamp", ImportedKind::DateTime),
    ("timestamp without time zone", ImportedKind::DateTime),
    ("timestamptz", ImportedKind::DateTime),
    ("timestamp with time zone", ImportedKind::DateTime),
    ("time", ImportedKind::Time),
    ("time without time zone", ImportedKind::Time),
    ("timetz", ImportedKind::Time),
    ("time with time zone", ImportedKind::Time),
    ("interval", ImportedKind::TimeDelta),
];

/// Normalizes a type name as reported by a driver or the catalog:
/// lower case, quotes stripped, `pg_catalog.` dropped and the internal
/// `_elem` array spelling rewritten to `elem[]`.
#[must_use]
pub fn normalize_type_name(name: &str) -> String {
    let mut name = name.trim().replace('"', "").to_ascii_lowercase();
    if let Some(stripped) = name.strip_prefix("pg_catalog.") {
        name = stripped.to_string();
    }
    match name.strip_prefix('_') {
        Some(element) if !element.is_empty() && !name.ends_with("[]") => format!("{element}[]"),
        _ => name,
    }
}

/// Looks up the semantic type of a Postgres type. The result is optional;
/// callers narrow it when nullability is known.
///
/// Array types map to a list of optional elements when the element type is
/// mapped.
#[must_use]
pub fn lookup(postgres_type: &str) -> Option<ResolvedType> {
    let name = normalize_type_name(postgres_type);
    lookup_normalized(&name)
}

fn lookup_normalized(name: &str) -> Option<ResolvedType> {
    if let Some(element) = name.strip_suffix("[]") {
        // int4[][] is still a flat list as far as the driver is concerned
        let element = element.trim_end_matches("[]");
        return lookup_normalized(element).map(|element| ResolvedType::list(element, true));
    }

    if let Some((_, kind)) = SIMPLE_TYPES.iter().find(|(pg, _)| *pg == name) {
        return Some(ResolvedType::simple(*kind, true));
    }
    IMPORTED_TYPES
        .iter()
        .find(|(pg, _)| *pg == name)
        .map(|(_, kind)| ResolvedType::imported(*kind, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_type_name() {
        assert_eq!(normalize_type_name("INT4"), "int4");
        assert_eq!(normalize_type_name("_int4"), "int4[]");
        assert_eq!(normalize_type_name("\"VARCHAR\"[]"), "varchar[]");
        assert_eq!(normalize_type_name("pg_catalog.text"), "text");
    }

    #[test]
    fn test_simple_types() {
        for (pg, kind) in [
            ("BOOL", SimpleKind::Bool),
            ("int8", SimpleKind::Int),
            ("FLOAT8", SimpleKind::Float),
            ("bpchar", SimpleKind::Str),
            ("BYTEA", SimpleKind::Bytes),
        ] {
            assert_eq!(lookup(pg), Some(ResolvedType::simple(kind, true)), "{pg}");
        }
    }

    #[test]
    fn test_imported_types() {
        assert_eq!(
            lookup("NUMERIC"),
            Some(ResolvedType::imported(ImportedKind::Decimal, true))
        );
        assert_eq!(
            lookup("TIMESTAMPTZ"),
            Some(ResolvedType::imported(ImportedKind::DateTime, true))
        );
        assert_eq!(
            lookup("interval"),
            Some(ResolvedType::imported(ImportedKind::TimeDelta, true))
        );
    }

    #[test]
    fn test_array_types() {
        let expected = ResolvedType::list(ResolvedType::simple(SimpleKind::Int, true), true);
        assert_eq!(lookup("INT4[]"), Some(expected.clone()));
        assert_eq!(lookup("_int4"), Some(expected));
        assert_eq!(lookup("jsonb[]"), None);
    }

    #[test]
    fn test_unmapped_types() {
        assert_eq!(lookup("jsonb"), None);
        assert_eq!(lookup("unknown"), None);
        assert_eq!(lookup("uuid"), None);
    }
}
