//! Owned, serializable view of a [`SymbolDiff`].
//!
//! A [`SymbolDiff`] borrows from both containers; the report copies out the
//! names, slots and type summaries so it can outlive them and be written as
//! JSON.

use serde::Serialize;

use crate::config::CompareOptions;
use crate::container::Container;
use crate::diff::{DiffEntry, DiffReason, DiffSummary, SectionDiff, SymbolDiff};
use crate::format::{TypeKind, Version};
use crate::types::{TypeId, TypeRef};

/// Summary of one resolved type in a report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportType {
    pub id: TypeId,
    pub kind: TypeKind,
    pub name: String,
}

impl From<TypeRef<'_>> for ReportType {
    fn from(ty: TypeRef<'_>) -> Self {
        Self { id: ty.id(), kind: ty.kind(), name: ty.name().to_string() }
    }
}

/// One reported symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub name: String,
    pub slot: u32,
    pub reason: DiffReason,
    /// For functions: return type then parameters.
    pub types: Vec<ReportType>,
}

/// Entries found on one side of the comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSide {
    pub functions: Vec<ReportEntry>,
    pub variables: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub functions: DiffSummary,
    pub variables: DiffSummary,
}

/// Facts about one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputInfo {
    pub path: String,
    pub version: Version,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub types: usize,
    pub functions: usize,
    pub variables: usize,
}

impl InputInfo {
    pub fn new(path: impl Into<String>, container: &Container) -> Self {
        Self {
            path: path.into(),
            version: container.version(),
            sha256: None,
            types: container.len(),
            functions: container.functions().len(),
            variables: container.variables().len(),
        }
    }

    pub fn with_sha256(mut self, digest: Option<String>) -> Self {
        self.sha256 = digest;
        self
    }
}

/// A complete diff report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_input: Option<InputInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_input: Option<InputInfo>,
    pub options: CompareOptions,
    pub left: ReportSide,
    pub right: ReportSide,
    pub summary: ReportSummary,
}

impl DiffReport {
    pub fn from_diff(diff: &SymbolDiff<'_>, options: &CompareOptions) -> Self {
        let (left_functions, right_functions) = split(&diff.functions, |types| {
            types.iter().copied().map(ReportType::from).collect()
        });
        let (left_variables, right_variables) =
            split(&diff.variables, |ty| vec![ReportType::from(*ty)]);

        Self {
            left_input: None,
            right_input: None,
            options: options.clone(),
            left: ReportSide { functions: left_functions, variables: left_variables },
            right: ReportSide { functions: right_functions, variables: right_variables },
            summary: ReportSummary {
                functions: diff.functions.summary,
                variables: diff.variables.summary,
            },
        }
    }

    pub fn with_inputs(mut self, left: InputInfo, right: InputInfo) -> Self {
        self.left_input = Some(left);
        self.right_input = Some(right);
        self
    }

    /// `true` when neither side reported anything.
    pub fn is_clean(&self) -> bool {
        self.left == ReportSide::default() && self.right == ReportSide::default()
    }
}

fn split<T>(
    section: &SectionDiff<'_, T>,
    types: impl Fn(&T) -> Vec<ReportType>,
) -> (Vec<ReportEntry>, Vec<ReportEntry>) {
    let convert = |entry: &DiffEntry<'_, T>| ReportEntry {
        name: entry.name.to_string(),
        slot: entry.slot,
        reason: entry.reason,
        types: types(&entry.types),
    };
    (section.left.iter().map(convert).collect(), section.right.iter().map(convert).collect())
}
