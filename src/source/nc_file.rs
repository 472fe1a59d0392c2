use super::{decode_bytes, truncate_to_i64, DetectSource};
use crate::error::{AppError, Result};
use netcdf::types::NcVariableType;
use std::path::{Path, PathBuf};
use tracing::debug;

/// DETECT container backed by a NetCDF-4 (HDF5) file
pub struct NcSource {
    path: PathBuf,
    file: netcdf::File,
}

impl NcSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening NetCDF file {}", path.display());
        let file = netcdf::open(&path)?;
        Ok(Self { path, file })
    }

    /// Run `f` against the group at `path`, or return `None` if it does not exist
    fn visit_group<T, F>(&self, path: &str, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&netcdf::Group<'_>) -> Result<T>,
    {
        let root = self.file.root().ok_or_else(|| {
            AppError::InvalidData(format!(
                "{} is not a NetCDF-4 file with groups",
                self.path.display()
            ))
        })?;
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        descend(&root, &parts, f)
    }

    fn with_group<T, F>(&self, path: &str, f: F) -> Result<T>
    where
        F: FnOnce(&netcdf::Group<'_>) -> Result<T>,
    {
        self.visit_group(path, f)?.ok_or_else(|| {
            AppError::InvalidData(format!(
                "Group '{}' does not exist in {}",
                path,
                self.path.display()
            ))
        })
    }

    fn with_variable<T, F>(&self, path: &str, variable: &str, f: F) -> Result<T>
    where
        F: FnOnce(&netcdf::Variable<'_>) -> Result<T>,
    {
        self.with_group(path, |group| {
            let var = group
                .variable(variable)
                .ok_or_else(|| AppError::MissingVariable {
                    group: path.to_string(),
                    candidates: variable.to_string(),
                })?;
            f(&var)
        })
    }
}

fn descend<T, F>(group: &netcdf::Group<'_>, parts: &[&str], f: F) -> Result<Option<T>>
where
    F: FnOnce(&netcdf::Group<'_>) -> Result<T>,
{
    match parts.split_first() {
        None => f(group).map(Some),
        Some((head, rest)) => match group.group(head) {
            Some(child) => descend(&child, rest, f),
            None => Ok(None),
        },
    }
}

fn is_float(var: &netcdf::Variable<'_>) -> bool {
    matches!(var.vartype(), NcVariableType::Float(_))
}

/// Fixed-width character arrays: the last dimension is the string length
fn read_char_rows(var: &netcdf::Variable<'_>) -> Result<Vec<Option<String>>> {
    let width = var
        .dimensions()
        .last()
        .map(|d| d.len())
        .filter(|&w| w > 0)
        .unwrap_or(var.len().max(1));

    let raw = var.get_raw_values(..)?;

    Ok(raw
        .chunks(width)
        .map(|row| Some(decode_bytes(row)))
        .collect())
}

impl DetectSource for NcSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn has_group(&self, path: &str) -> Result<bool> {
        Ok(self.visit_group(path, |_| Ok(()))?.is_some())
    }

    fn subgroups(&self, path: &str) -> Result<Vec<String>> {
        self.with_group(path, |group| Ok(group.groups().map(|g| g.name()).collect()))
    }

    fn variables(&self, path: &str) -> Result<Vec<String>> {
        self.with_group(path, |group| {
            Ok(group.variables().map(|v| v.name()).collect())
        })
    }

    fn read_f64(&self, path: &str, variable: &str) -> Result<Vec<f64>> {
        self.with_variable(path, variable, |var| Ok(var.get_values::<f64, _>(..)?))
    }

    fn read_i64(&self, path: &str, variable: &str) -> Result<Vec<Result<i64>>> {
        self.with_variable(path, variable, |var| {
            if is_float(var) {
                Ok(var
                    .get_values::<f64, _>(..)?
                    .into_iter()
                    .map(|v| truncate_to_i64(v, variable))
                    .collect())
            } else {
                Ok(var.get_values::<i64, _>(..)?.into_iter().map(Ok).collect())
            }
        })
    }

    fn read_text(&self, path: &str, variable: &str) -> Result<Vec<Option<String>>> {
        self.with_variable(path, variable, |var| match var.vartype() {
            NcVariableType::String => (0..var.len())
                .map(|i| {
                    let s = var.get_string([i])?;
                    Ok(Some(s.trim_end_matches('\0').to_string()))
                })
                .collect(),
            NcVariableType::Char => read_char_rows(var),
            NcVariableType::Float(_) => Ok(var
                .get_values::<f64, _>(..)?
                .into_iter()
                .map(|v| Some(v.to_string()))
                .collect()),
            NcVariableType::Int(_) => Ok(var
                .get_values::<i64, _>(..)?
                .into_iter()
                .map(|v| Some(v.to_string()))
                .collect()),
            _ => Err(AppError::InvalidData(format!(
                "Variable '{}/{}' has a compound or opaque type, expected text",
                path, variable
            ))),
        })
    }
}
