//! Name and path normalization for variant linking.
//!
//! Token normalization, base-identity keys (variant tokens stripped) and
//! path families. Every function here is total: degenerate input yields an
//! empty result, never an error.
//!
//! CRITICAL: base keys are the join key between donors, linked configs and
//! unresolved configs. Any change here shifts every match. Run tests after changes.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Trailing file extension: "tent.p3d" -> "tent"
pub static FILE_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[a-z0-9]+$").unwrap());

/// Structural class prefixes, stripped once at the start of the name
pub static STRUCTURAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:land_|staticobj_|wreck_|misc_|house_)").unwrap());

/// Any run of characters that cannot be part of a token
pub static NON_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

// ============================================================================
// VARIANT TOKENS
// ============================================================================

/// Built-in cosmetic variant words: colors, camo patterns, seasons, factions
/// and map regions.
pub const BUILTIN_VARIANT_TOKENS: &[&str] = &[
    // Colors
    "black", "white", "blue", "green", "red", "yellow", "orange", "brown", "grey", "gray", "tan",
    "beige", "pink", "purple", "violet", "olive", "khaki", "navy", "maroon", "gold", "silver",
    "dark", "light", "lightblue", "darkblue", "darkgreen", "darkgrey", "lightgrey",
    // Camouflage
    "camo", "camo1", "camouflaged", "woodland", "desert", "ttsko",
    // Seasons
    "winter", "summer", "autumn", "fall",
    // Factions
    "police", "medic", "mil", "military",
    // Map regions
    "de", "chernarus", "livonia", "sakhal",
];

/// Set of tokens treated as cosmetic variants when deriving base keys.
///
/// Defaults to [`BUILTIN_VARIANT_TOKENS`]; can be replaced or extended from
/// configuration without touching the matching logic.
#[derive(Clone, Debug)]
pub struct VariantTokens {
    tokens: FxHashSet<String>,
}

impl VariantTokens {
    pub fn builtin() -> Self {
        Self::from_tokens(BUILTIN_VARIANT_TOKENS.iter().copied())
    }

    /// Build a set from arbitrary words. Words are trimmed and lowercased;
    /// empty words are dropped.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self {
            tokens: FxHashSet::default(),
        };
        set.extend(tokens);
        set
    }

    pub fn extend<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for token in tokens {
            let token = token.as_ref().trim().to_lowercase();
            if !token.is_empty() {
                self.tokens.insert(token);
            }
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Base-identity key of a record name: normalized tokens minus variant
    /// tokens, space-joined.
    ///
    /// A name made only of variant tokens keeps all of them, so "Green_Camo"
    /// keys as "green camo" rather than the empty (non-indexable) key.
    pub fn base_key(&self, name: &str) -> String {
        let tokens = normalize_tokens(name);
        let kept: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|t| !self.contains(t))
            .collect();
        if kept.is_empty() {
            tokens.join(" ")
        } else {
            kept.join(" ")
        }
    }
}

impl Default for VariantTokens {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize a record name into lowercase word tokens.
///
/// Strips one trailing file extension and one structural prefix
/// (`land_`, `staticobj_`, ...), then splits on anything outside `[a-z0-9]`.
pub fn normalize_tokens(name: &str) -> Vec<String> {
    let lowered = name.trim().to_lowercase();
    let without_ext = FILE_EXTENSION.replace(&lowered, "");
    let without_prefix = STRUCTURAL_PREFIX.replace(&without_ext, "");
    NON_TOKEN
        .replace_all(&without_prefix, " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Normalized tokens joined with single spaces.
pub fn normalize_name(name: &str) -> String {
    normalize_tokens(name).join(" ")
}

/// Number of leading path segments that make up a path family.
pub const PATH_FAMILY_DEPTH: usize = 3;

/// Coarse content family of a storage path: first three non-empty
/// `/`-separated segments, lowercased.
/// e.g. "DZ/Structures/Military/Tents/tent.p3d" -> "dz/structures/military"
pub fn path_family(path: &str) -> String {
    let lowered = path.to_lowercase();
    lowered
        .split('/')
        .filter(|segment| !segment.is_empty())
        .take(PATH_FAMILY_DEPTH)
        .collect::<Vec<_>>()
        .join("/")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(name: &str) -> Vec<String> {
        normalize_tokens(name)
    }

    #[test]
    fn test_normalize_tokens_basic() {
        assert_eq!(toks("land_tent_green.p3d"), vec!["tent", "green"]);
        assert_eq!(toks("  Land_Tent_Green.P3D  "), vec!["tent", "green"]);
        assert_eq!(toks("Tent  --  Blue!!"), vec!["tent", "blue"]);
        assert_eq!(toks("StaticObj_Wall_Indoor_2"), vec!["wall", "indoor", "2"]);
    }

    #[test]
    fn test_normalize_tokens_degenerate() {
        assert!(toks("").is_empty());
        assert!(toks("   ").is_empty());
        assert!(toks("house_").is_empty());
        assert!(toks("___").is_empty());
        assert!(toks(".p3d").is_empty());
    }

    #[test]
    fn test_extension_stripped_once() {
        assert_eq!(toks("wall.v2.p3d"), vec!["wall", "v2"]);
        // Trailing dot with nothing after is not an extension
        assert_eq!(toks("tent."), vec!["tent"]);
    }

    #[test]
    fn test_prefix_stripped_once_at_start() {
        assert_eq!(toks("land_land_wall"), vec!["land", "wall"]);
        assert_eq!(toks("misc_land_x"), vec!["land", "x"]);
        assert_eq!(toks("xland_tent"), vec!["xland", "tent"]);
        assert_eq!(toks("Wreck_BMP1"), vec!["bmp1"]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in [
            "land_tent_green.p3d",
            "Misc_Barrel_Blue",
            "StaticObj_Wall_Indoor_2.p3d",
            "wall.v2.p3d",
            "Ünïcödé Crate",
            "",
        ] {
            let once = normalize_name(name);
            assert_eq!(normalize_name(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn test_base_key_strips_variants() {
        let variants = VariantTokens::default();
        assert_eq!(variants.base_key("land_tent_green.p3d"), "tent");
        assert_eq!(variants.base_key("Tent_Blue"), "tent");
        assert_eq!(variants.base_key("Police_Car_Sedan_Blue"), "car sedan");
        assert_eq!(variants.base_key("Barrel_Chernarus_Winter"), "barrel");
    }

    #[test]
    fn test_base_key_fallback_when_all_variant() {
        let variants = VariantTokens::default();
        assert_eq!(variants.base_key("Green_Camo"), "green camo");
        assert_eq!(variants.base_key("black"), "black");
        assert_eq!(variants.base_key(""), "");
    }

    #[test]
    fn test_base_key_never_keeps_variant_tokens() {
        let variants = VariantTokens::default();
        for name in [
            "Tent_Blue_Winter",
            "land_container_1bo_red",
            "Mil_Truck_Olive_Camo",
            "Jacket_TTsKO_Dark",
        ] {
            let key = variants.base_key(name);
            assert!(!key.is_empty());
            assert!(
                key.split(' ').all(|t| !variants.contains(t)),
                "variant token left in {key:?}"
            );
        }
    }

    #[test]
    fn test_variant_tokens_configurable() {
        let mut variants = VariantTokens::from_tokens(["  RUSTY ", ""]);
        assert_eq!(variants.len(), 1);
        assert!(variants.contains("rusty"));
        assert_eq!(variants.base_key("Barrel_Rusty_Blue"), "barrel blue");

        variants.extend(["blue"]);
        assert_eq!(variants.base_key("Barrel_Rusty_Blue"), "barrel");

        let none = VariantTokens::from_tokens(Vec::<String>::new());
        assert!(none.is_empty());
        assert_eq!(none.base_key("Tent_Blue"), "tent blue");
    }

    #[test]
    fn test_path_family() {
        assert_eq!(path_family("structures/camp/tent"), "structures/camp/tent");
        assert_eq!(
            path_family("DZ/Structures/Military/Tents/tent.p3d"),
            "dz/structures/military"
        );
        assert_eq!(path_family("/Structures//Camp/"), "structures/camp");
        assert_eq!(path_family("a"), "a");
        assert_eq!(path_family(""), "");
        assert_eq!(path_family("///"), "");
    }

    #[test]
    fn test_path_family_truncates_to_three_segments() {
        for path in ["a/b/c/d", "/a/b/c/d/e/f/", "a//b//c//d"] {
            let fam = path_family(path);
            assert_eq!(fam.split('/').count(), 3);
            assert_eq!(fam, "a/b/c");
        }
    }
}
