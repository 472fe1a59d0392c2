use super::{child_path, decode_bytes, truncate_to_i64, DetectSource};
use crate::error::{AppError, Result};
use std::collections::BTreeMap;

/// Values of one in-memory variable
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
    Bytes(Vec<Vec<u8>>),
}

#[derive(Debug, Clone, Default)]
struct MemoryGroup {
    children: Vec<String>,
    variables: Vec<(String, Column)>,
}

/// In-memory DETECT container, handy for fixtures.
///
/// ```
/// use detect_ingest::source::{Column, DetectSource, MemorySource};
///
/// let source = MemorySource::new("fixture")
///     .with_variable("Info", "node_id", Column::Int(vec![10, 11]))
///     .with_variable("SWOTDB/10", "time", Column::Float(vec![58000.0]));
///
/// assert!(source.has_group("SWOTDB").unwrap());
/// assert_eq!(source.subgroups("SWOTDB").unwrap(), vec!["10"]);
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    groups: BTreeMap<String, MemoryGroup>,
}

impl MemorySource {
    pub fn new(name: &str) -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(String::new(), MemoryGroup::default());
        Self {
            name: name.to_string(),
            groups,
        }
    }

    /// Add an empty group, creating missing parents along the way
    pub fn with_group(mut self, path: &str) -> Self {
        self.ensure_group(path);
        self
    }

    /// Add a variable to a group, creating the group if needed
    pub fn with_variable(mut self, path: &str, variable: &str, column: Column) -> Self {
        self.ensure_group(path);
        if let Some(group) = self.groups.get_mut(path) {
            group.variables.retain(|(name, _)| name != variable);
            group.variables.push((variable.to_string(), column));
        }
        self
    }

    fn ensure_group(&mut self, path: &str) {
        let mut parent = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            let current = child_path(&parent, part);
            if !self.groups.contains_key(&current) {
                self.groups.insert(current.clone(), MemoryGroup::default());
                if let Some(p) = self.groups.get_mut(&parent) {
                    p.children.push(part.to_string());
                }
            }
            parent = current;
        }
    }

    fn group(&self, path: &str) -> Result<&MemoryGroup> {
        self.groups
            .get(path)
            .ok_or_else(|| AppError::InvalidData(format!("Group '{}' does not exist", path)))
    }

    fn column(&self, path: &str, variable: &str) -> Result<&Column> {
        self.group(path)?
            .variables
            .iter()
            .find(|(name, _)| name == variable)
            .map(|(_, column)| column)
            .ok_or_else(|| AppError::MissingVariable {
                group: path.to_string(),
                candidates: variable.to_string(),
            })
    }
}

impl DetectSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn has_group(&self, path: &str) -> Result<bool> {
        Ok(self.groups.contains_key(path))
    }

    fn subgroups(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.group(path)?.children.clone())
    }

    fn variables(&self, path: &str) -> Result<Vec<String>> {
        Ok(self
            .group(path)?
            .variables
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn read_f64(&self, path: &str, variable: &str) -> Result<Vec<f64>> {
        match self.column(path, variable)? {
            Column::Float(values) => Ok(values.clone()),
            Column::Int(values) => Ok(values.iter().map(|&v| v as f64).collect()),
            Column::Text(_) | Column::Bytes(_) => Err(AppError::InvalidData(format!(
                "Variable '{}/{}' is textual, expected numbers",
                path, variable
            ))),
        }
    }

    fn read_i64(&self, path: &str, variable: &str) -> Result<Vec<Result<i64>>> {
        match self.column(path, variable)? {
            Column::Int(values) => Ok(values.iter().map(|&v| Ok(v)).collect()),
            Column::Float(values) => Ok(values
                .iter()
                .map(|&v| truncate_to_i64(v, variable))
                .collect()),
            Column::Text(_) | Column::Bytes(_) => Err(AppError::InvalidData(format!(
                "Variable '{}/{}' is textual, expected integers",
                path, variable
            ))),
        }
    }

    fn read_text(&self, path: &str, variable: &str) -> Result<Vec<Option<String>>> {
        let texts = match self.column(path, variable)? {
            Column::Text(values) => values.iter().map(|v| Some(v.clone())).collect(),
            Column::Bytes(values) => values.iter().map(|v| Some(decode_bytes(v))).collect(),
            Column::Int(values) => values.iter().map(|v| Some(v.to_string())).collect(),
            Column::Float(values) => values.iter().map(|v| Some(v.to_string())).collect(),
        };
        Ok(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_created_along_path() {
        let source = MemorySource::new("t")
            .with_variable("SWOTDB/10", "time", Column::Float(vec![1.0]))
            .with_variable("SWOTDB/11", "time", Column::Float(vec![2.0]));

        assert!(source.has_group("SWOTDB").unwrap());
        assert!(!source.has_group("LakeDB").unwrap());
        assert_eq!(source.subgroups("").unwrap(), vec!["SWOTDB"]);
        assert_eq!(source.subgroups("SWOTDB").unwrap(), vec!["10", "11"]);
    }

    #[test]
    fn test_variables_keep_declaration_order() {
        let source = MemorySource::new("t")
            .with_variable("SWOTDB/10", "time", Column::Float(vec![1.0]))
            .with_variable("SWOTDB/10", "wse", Column::Float(vec![2.0]))
            .with_variable("SWOTDB/10", "quality", Column::Int(vec![0]));

        assert_eq!(
            source.variables("SWOTDB/10").unwrap(),
            vec!["time", "wse", "quality"]
        );
    }

    #[test]
    fn test_byte_names_are_decoded() {
        let source = MemorySource::new("t").with_variable(
            "Info",
            "river_name",
            Column::Bytes(vec![b"Rhine\0".to_vec(), b"Elbe".to_vec()]),
        );

        assert_eq!(
            source.read_text("Info", "river_name").unwrap(),
            vec![Some("Rhine".to_string()), Some("Elbe".to_string())]
        );
    }

    #[test]
    fn test_float_ids_truncate() {
        let source = MemorySource::new("t").with_variable(
            "Info",
            "reach_id",
            Column::Float(vec![21602600011.0, f64::NAN, 7.9]),
        );

        let ids = source.read_i64("Info", "reach_id").unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0].as_ref().unwrap(), &21602600011);
        assert!(matches!(ids[1], Err(AppError::InvalidData(_))));
        assert_eq!(ids[2].as_ref().unwrap(), &7);
    }

    #[test]
    fn test_missing_variable() {
        let source = MemorySource::new("t").with_group("Info");
        let err = source.read_f64("Info", "x").unwrap_err();
        assert!(matches!(err, AppError::MissingVariable { .. }));
    }
}
