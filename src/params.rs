//! Parameter binding.
//!
//! Names are normalized to the dialect's marker before storage, duplicate
//! names are suffixed instead of rejected, and the whole set can be
//! reordered by first textual occurrence for drivers that bind positionally.

use crate::dialect::{Dialect, Family};
use crate::value::{SqlType, SqlValue};

/// One bound parameter. The stored name always carries its marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: SqlValue,
    declared_type: Option<SqlType>,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its marker prefix.
    pub fn bare_name(&self) -> &str {
        self.name.trim_start_matches(['@', ':'])
    }

    pub fn value(&self) -> &SqlValue {
        &self.value
    }

    pub fn declared_type(&self) -> Option<SqlType> {
        self.declared_type
    }

    /// Declared type when given, otherwise inferred from the value kind.
    pub fn effective_type(&self) -> SqlType {
        self.declared_type.unwrap_or_else(|| self.value.infer_type())
    }
}

/// Force a parameter name into the marker convention of `dialect`.
///
/// The SQL Server family uses `@`, HANA uses `:`; a name already carrying
/// the other family's marker is converted, a bare name gets the marker
/// prefixed. Other dialects leave the name untouched. Idempotent.
pub fn normalize_name(name: &str, dialect: Dialect) -> String {
    let marker = match dialect.family() {
        Family::SqlServer => '@',
        Family::Hana => ':',
        _ => return name.to_string(),
    };
    let other = if marker == '@' { ':' } else { '@' };
    if name.starts_with(marker) {
        name.to_string()
    } else if let Some(rest) = name.strip_prefix(other) {
        format!("{marker}{rest}")
    } else {
        format!("{marker}{name}")
    }
}

/// The ordered set of parameters bound to one command.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    dialect: Dialect,
    explicit_typing: bool,
    params: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            explicit_typing: false,
            params: Vec::new(),
        }
    }

    /// Positional-style drivers need every parameter explicitly typed;
    /// when set, binding without a type stores the inferred one.
    pub fn with_explicit_typing(mut self, explicit: bool) -> Self {
        self.explicit_typing = explicit;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Bind a value under `name`.
    ///
    /// The name is normalized first. When the normalized name is already
    /// taken, the smallest free positive suffix is appended (`name`,
    /// `name1`, `name2`, ...) and the returned descriptor carries the final
    /// name; callers that need the binding later must use it.
    pub fn bind(&mut self, name: &str, value: impl Into<SqlValue>) -> &Parameter {
        self.bind_typed(name, value, None)
    }

    /// Bind with an explicit declaration type.
    pub fn bind_typed(
        &mut self,
        name: &str,
        value: impl Into<SqlValue>,
        declared_type: Option<SqlType>,
    ) -> &Parameter {
        let value = value.into();
        let mut name = normalize_name(name, self.dialect);
        if self.contains(&name) {
            let mut counter = 1;
            while self.contains(&format!("{name}{counter}")) {
                counter += 1;
            }
            name = format!("{name}{counter}");
        }
        let declared_type =
            declared_type.or_else(|| self.explicit_typing.then(|| value.infer_type()));
        let index = self.params.len();
        self.params.push(Parameter {
            name,
            value,
            declared_type,
        });
        &self.params[index]
    }

    /// Look up a parameter; the name is normalized before comparison.
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        let name = normalize_name(name, self.dialect);
        self.params.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    pub fn clear(&mut self) {
        self.params.clear();
    }

    /// Reorder the set by the first textual occurrence of each name in
    /// `text`, ascending; parameters that never occur are dropped.
    ///
    /// The scan is a plain substring search, so a name that is a prefix of
    /// another (`:p1` inside `:p10`) matches at the longer name's position
    /// too. Callers binding more than nine auto-suffixed duplicates should
    /// pick distinct names instead.
    pub fn reorder_by_occurrence(&mut self, text: &str) {
        let mut indexed: Vec<(usize, Parameter)> = Vec::new();
        for param in self.params.drain(..) {
            if let Some(position) = text.find(&param.name) {
                indexed.push((position, param));
            }
        }
        indexed.sort_by_key(|(position, _)| *position);
        self.params = indexed.into_iter().map(|(_, param)| param).collect();
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_per_family() {
        assert_eq!(normalize_name("Id", Dialect::SqlServer2012), "@Id");
        assert_eq!(normalize_name(":Id", Dialect::SqlServer2012), "@Id");
        assert_eq!(normalize_name("@Id", Dialect::SqlServer2012), "@Id");
        assert_eq!(normalize_name("Id", Dialect::Hana), ":Id");
        assert_eq!(normalize_name("@Id", Dialect::Hana), ":Id");
        assert_eq!(normalize_name(":Id", Dialect::Hana), ":Id");
    }

    #[test]
    fn test_normalize_name_is_idempotent_and_passes_through() {
        let once = normalize_name(":Id", Dialect::SqlServer);
        assert_eq!(normalize_name(&once, Dialect::SqlServer), once);
        assert_eq!(normalize_name("Id", Dialect::MySql), "Id");
        assert_eq!(normalize_name(":Id", Dialect::Oracle), ":Id");
    }

    #[test]
    fn test_duplicate_names_get_suffixes() {
        let mut params = ParameterSet::new(Dialect::SqlServer);
        assert_eq!(params.bind("Id", 1).name(), "@Id");
        assert_eq!(params.bind("Id", 2).name(), "@Id1");
        assert_eq!(params.bind("Id", 3).name(), "@Id2");
        assert_eq!(params.get("@Id").map(|p| p.value().clone()), Some(SqlValue::Int(1)));
    }

    #[test]
    fn test_suffix_skips_taken_names() {
        let mut params = ParameterSet::new(Dialect::SqlServer);
        params.bind("x", 0);
        params.bind("x1", 0);
        assert_eq!(params.bind("x", 0).name(), "@x2");
    }

    #[test]
    fn test_inference_only_with_explicit_typing() {
        let mut untyped = ParameterSet::new(Dialect::SqlServer);
        assert_eq!(untyped.bind("a", 5).declared_type(), None);
        assert_eq!(untyped.get("a").map(|p| p.effective_type()), Some(SqlType::Int));

        let mut typed = ParameterSet::new(Dialect::SqlServer).with_explicit_typing(true);
        assert_eq!(typed.bind("a", 5).declared_type(), Some(SqlType::Int));
    }

    #[test]
    fn test_reorder_by_first_occurrence() {
        let mut params = ParameterSet::new(Dialect::Hana);
        params.bind("a", 1);
        params.bind("b", 2);
        params.bind("c", 3);
        params.bind("unused", 4);
        params.reorder_by_occurrence("UPDATE t SET x = :b, y = :a WHERE z = :c");
        let names: Vec<&str> = params.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec![":b", ":a", ":c"]);
    }
}
