//! Resolution modes and guard emission styles.
//!
//! Both are fixed for a compiled artifact. The build reads
//! `SHADOW_SWITCH_RESOLVE` and `SHADOW_SWITCH_GUARDS` at compile time and an
//! unknown code aborts const evaluation, so a misconfigured build never
//! produces a binary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SwitchError;

/// Compile-time variable selecting the resolution mode.
pub const RESOLVE_ENV: &str = "SHADOW_SWITCH_RESOLVE";
/// Compile-time variable selecting the guard emission style.
pub const GUARDS_ENV: &str = "SHADOW_SWITCH_GUARDS";
/// Legacy mode code: NEW with constant guards, for artifacts headed to mutant generation.
pub const LEGACY_NEW_CONSTANT_CODE: &str = "11";

/// Strategy a variant site uses to pick between its old and new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Always the old value.
    Old,
    /// Always the new value.
    New,
    /// Interceptable oracle, falling back to the old-version environment flag.
    #[default]
    Dual,
    /// Old value only at the site whose id equals the active mutant id.
    MutationSelect,
}

impl ResolutionMode {
    /// Every mode, in declaration order.
    pub const ALL: [ResolutionMode; 4] = [
        ResolutionMode::Old,
        ResolutionMode::New,
        ResolutionMode::Dual,
        ResolutionMode::MutationSelect,
    ];

    /// Parse a mode code. Accepts names and the numeric codes of the C header lineage.
    pub const fn from_code(code: &str) -> Option<Self> {
        if str_eq(code, "old") || str_eq(code, "-1") {
            Some(Self::Old)
        } else if str_eq(code, "new") || str_eq(code, "1") || str_eq(code, LEGACY_NEW_CONSTANT_CODE)
        {
            Some(Self::New)
        } else if str_eq(code, "dual") || str_eq(code, "0") {
            Some(Self::Dual)
        } else if str_eq(code, "mutation")
            || str_eq(code, "mutation-select")
            || str_eq(code, "mutation_select")
            || str_eq(code, "2")
        {
            Some(Self::MutationSelect)
        } else {
            None
        }
    }

    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Old => "old",
            Self::New => "new",
            Self::Dual => "dual",
            Self::MutationSelect => "mutation",
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionMode {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Self::from_code(&code).ok_or_else(|| SwitchError::UnknownMode(s.to_string()))
    }
}

/// How guard predicates are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardStyle {
    /// Out-of-line calls the optimizer cannot fold.
    #[default]
    Opaque,
    /// Plain constants.
    Constant,
}

impl GuardStyle {
    /// Parse a guard style code.
    pub const fn from_code(code: &str) -> Option<Self> {
        if str_eq(code, "opaque") {
            Some(Self::Opaque)
        } else if str_eq(code, "constant") {
            Some(Self::Constant)
        } else {
            None
        }
    }

    /// Style used when the build does not choose one.
    ///
    /// Mutation-select artifacts carry no analysis residue, so their guards
    /// fold to constants.
    pub const fn default_for(mode: ResolutionMode) -> Self {
        match mode {
            ResolutionMode::MutationSelect => Self::Constant,
            _ => Self::Opaque,
        }
    }

    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::Constant => "constant",
        }
    }
}

impl fmt::Display for GuardStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuardStyle {
    type Err = SwitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Self::from_code(&code).ok_or_else(|| SwitchError::UnknownGuardStyle(s.to_string()))
    }
}

/// Which build-time code failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildCodeError {
    /// `SHADOW_SWITCH_RESOLVE` was not a known mode.
    Mode,
    /// `SHADOW_SWITCH_GUARDS` was not a known style.
    Guards,
}

/// Mode and guard style of one compiled artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProfile {
    /// Resolution mode.
    pub mode: ResolutionMode,
    /// Guard emission style.
    pub guards: GuardStyle,
}

impl BuildProfile {
    /// Combine raw build codes. Absent mode means DUAL.
    pub const fn from_codes(
        resolve: Option<&str>,
        guards: Option<&str>,
    ) -> Result<Self, BuildCodeError> {
        let (mode, legacy_constant) = match resolve {
            None => (ResolutionMode::Dual, false),
            Some(code) => match ResolutionMode::from_code(code) {
                Some(mode) => (mode, str_eq(code, LEGACY_NEW_CONSTANT_CODE)),
                None => return Err(BuildCodeError::Mode),
            },
        };
        let guards = match guards {
            Some(code) => match GuardStyle::from_code(code) {
                Some(style) => style,
                None => return Err(BuildCodeError::Guards),
            },
            None if legacy_constant => GuardStyle::Constant,
            None => GuardStyle::default_for(mode),
        };
        Ok(Self { mode, guards })
    }

    /// Run-time variant of [`BuildProfile::from_codes`] that tolerates case and whitespace.
    pub fn parse(resolve: Option<&str>, guards: Option<&str>) -> Result<Self, SwitchError> {
        let resolve = resolve.map(|raw| raw.trim().to_ascii_lowercase());
        let guards_code = guards.map(|raw| raw.trim().to_ascii_lowercase());
        match Self::from_codes(resolve.as_deref(), guards_code.as_deref()) {
            Ok(profile) => Ok(profile),
            Err(BuildCodeError::Mode) => Err(SwitchError::UnknownMode(
                resolve.unwrap_or_default(),
            )),
            Err(BuildCodeError::Guards) => Err(SwitchError::UnknownGuardStyle(
                guards_code.unwrap_or_default(),
            )),
        }
    }
}

/// Profile this crate was compiled with.
pub const BUILD: BuildProfile = match BuildProfile::from_codes(
    option_env!("SHADOW_SWITCH_RESOLVE"),
    option_env!("SHADOW_SWITCH_GUARDS"),
) {
    Ok(profile) => profile,
    Err(BuildCodeError::Mode) => {
        panic!("SHADOW_SWITCH_RESOLVE must be one of old, new, dual, mutation, -1, 1, 0, 2, 11")
    }
    Err(BuildCodeError::Guards) => panic!("SHADOW_SWITCH_GUARDS must be opaque or constant"),
};

const fn str_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_codes_default_to_dual_with_opaque_guards() {
        let profile = BuildProfile::from_codes(None, None).expect("defaults should parse");
        assert_eq!(profile.mode, ResolutionMode::Dual);
        assert_eq!(profile.guards, GuardStyle::Opaque);
        assert_eq!(ResolutionMode::default(), ResolutionMode::Dual);
    }

    #[test]
    fn numeric_and_named_codes_agree() {
        for (named, numeric) in [("old", "-1"), ("new", "1"), ("dual", "0"), ("mutation", "2")] {
            assert_eq!(
                ResolutionMode::from_code(named),
                ResolutionMode::from_code(numeric)
            );
        }
        for mode in ResolutionMode::ALL {
            assert_eq!(ResolutionMode::from_code(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn legacy_code_selects_new_with_constant_guards() {
        let profile = BuildProfile::from_codes(Some("11"), None).expect("legacy code should parse");
        assert_eq!(profile.mode, ResolutionMode::New);
        assert_eq!(profile.guards, GuardStyle::Constant);

        let overridden = BuildProfile::from_codes(Some("11"), Some("opaque"))
            .expect("explicit guard style should win");
        assert_eq!(overridden.guards, GuardStyle::Opaque);
    }

    #[test]
    fn mutation_select_defaults_to_constant_guards() {
        let profile =
            BuildProfile::from_codes(Some("mutation"), None).expect("mutation should parse");
        assert_eq!(profile.guards, GuardStyle::Constant);
        for mode in [ResolutionMode::Old, ResolutionMode::New, ResolutionMode::Dual] {
            assert_eq!(GuardStyle::default_for(mode), GuardStyle::Opaque);
        }
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(
            BuildProfile::from_codes(Some("sideways"), None),
            Err(BuildCodeError::Mode)
        );
        assert_eq!(
            BuildProfile::from_codes(Some("old"), Some("folded")),
            Err(BuildCodeError::Guards)
        );
        assert!(matches!(
            "sideways".parse::<ResolutionMode>(),
            Err(SwitchError::UnknownMode(code)) if code == "sideways"
        ));
        assert!(matches!(
            "folded".parse::<GuardStyle>(),
            Err(SwitchError::UnknownGuardStyle(_))
        ));
    }

    #[test]
    fn runtime_parse_tolerates_case_and_whitespace() {
        assert_eq!(
            " OLD ".parse::<ResolutionMode>().expect("should parse"),
            ResolutionMode::Old
        );
        let profile = BuildProfile::parse(Some("Mutation-Select"), Some(" Opaque"))
            .expect("profile should parse");
        assert_eq!(profile.mode, ResolutionMode::MutationSelect);
        assert_eq!(profile.guards, GuardStyle::Opaque);
    }

    #[test]
    fn build_profile_matches_compile_time_codes() {
        let expected = BuildProfile::from_codes(
            option_env!("SHADOW_SWITCH_RESOLVE"),
            option_env!("SHADOW_SWITCH_GUARDS"),
        )
        .expect("crate compiled, so codes are valid");
        assert_eq!(BUILD, expected);
    }
}
