use serde::{Deserialize, Serialize};

/// Logical, independently-present-or-absent segment of the flattened list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Loading,
    Header,
    Body,
    Divider,
    Toggle,
    Footer,
}

/// One declarative layout element: `(kind, is_present, length)` evaluated in
/// declaration order. An absent or zero-length spec contributes no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub kind: SectionKind,
    pub present: bool,
    pub length: usize,
}

impl SectionSpec {
    /// A single-row section whose presence is the given condition.
    pub fn row(kind: SectionKind, present: bool) -> Self {
        Self {
            kind,
            present,
            length: 1,
        }
    }

    /// A multi-row section; zero length means absent.
    pub fn rows(kind: SectionKind, length: usize) -> Self {
        Self {
            kind,
            present: length > 0,
            length,
        }
    }

    pub fn is_present(&self) -> bool {
        self.present && self.length > 0
    }
}
