use std::fmt;

/// Value of `HDL_TOPLEVEL_LANG` that selects Verilog sources
pub const VERILOG: &str = "verilog";
/// Backend used when `SIM` is unset
pub const DEFAULT_SIMULATOR: &str = "icarus";

pub const TOPLEVEL_LANG_VAR: &str = "HDL_TOPLEVEL_LANG";
pub const SIMULATOR_VAR: &str = "SIM";

/// HDL language of the toplevel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Language {
    Verilog,
    /// Anything but the exact Verilog marker, kept verbatim
    Vhdl(String),
}

impl Language {
    pub fn from_value(value: Option<&str>) -> Self {
        match value {
            None | Some(VERILOG) => Language::Verilog,
            Some(other) => Language::Vhdl(other.to_owned()),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Verilog => f.write_str(VERILOG),
            Language::Vhdl(raw) => f.write_str(raw),
        }
    }
}

/// Harness configuration taken from the process environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub toplevel_lang: Language,
    pub simulator: String,
}

impl Environment {
    pub fn from_env() -> Self {
        let lang = std::env::var(TOPLEVEL_LANG_VAR).ok();
        let sim = std::env::var(SIMULATOR_VAR).ok();
        Self::from_values(lang.as_deref(), sim.as_deref())
    }

    pub fn from_values(toplevel_lang: Option<&str>, simulator: Option<&str>) -> Self {
        Self {
            toplevel_lang: Language::from_value(toplevel_lang),
            simulator: simulator.unwrap_or(DEFAULT_SIMULATOR).to_owned(),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::from_values(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let env = Environment::default();
        assert_eq!(env.toplevel_lang, Language::Verilog);
        assert_eq!(env.simulator, "icarus");
    }

    #[test]
    fn test_only_exact_marker_selects_verilog() {
        assert_eq!(Language::from_value(Some("verilog")), Language::Verilog);
        assert_eq!(
            Language::from_value(Some("Verilog")),
            Language::Vhdl("Verilog".into())
        );
        assert_eq!(Language::from_value(Some("")), Language::Vhdl(String::new()));
        assert_eq!(
            Language::from_value(Some("vhdl")).to_string(),
            "vhdl".to_string()
        );
    }

    #[test]
    fn test_simulator_passthrough() {
        let env = Environment::from_values(None, Some("verilator"));
        assert_eq!(env.simulator, "verilator");
    }
}
