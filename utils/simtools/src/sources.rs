use std::path::{Path, PathBuf};

use crate::Language;

/// HDL files handed to a backend's build step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    pub verilog: Vec<PathBuf>,
    pub vhdl: Vec<PathBuf>,
}

impl SourceSet {
    /// Join each relative Verilog path onto `project_dir`.
    ///
    /// Any language other than Verilog yields the single VHDL placeholder
    /// (`project_dir` joined with an empty path). Existence is not checked.
    pub fn resolve<P: AsRef<Path>>(
        lang: &Language,
        project_dir: &Path,
        verilog_sources: &[P],
    ) -> Self {
        match lang {
            Language::Verilog => Self {
                verilog: verilog_sources
                    .iter()
                    .map(|rel| project_dir.join(rel))
                    .collect(),
                vhdl: Vec::new(),
            },
            Language::Vhdl(raw) => {
                log::warn!(
                    "Toplevel language '{}' is not '{}', falling back to the VHDL placeholder",
                    raw,
                    crate::config::VERILOG
                );
                Self {
                    verilog: Vec::new(),
                    vhdl: vec![project_dir.join("")],
                }
            }
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &PathBuf> {
        self.verilog.iter().chain(self.vhdl.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.verilog.is_empty() && self.vhdl.is_empty()
    }
}
