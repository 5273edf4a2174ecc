use serde::Deserialize;

/// Options shared by the OBJ and MTL extraction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Name of the group that receives faces before any `g` line.
    pub default_group: String,

    /// Material name active before the first `usemtl`.
    pub default_material: String,

    /// Whether an unopenable `mtllib` is skipped instead of failing the parse.
    pub skip_missing_libraries: bool,
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions {
            default_group: "default".into(),
            default_material: "default".into(),
            skip_missing_libraries: false,
        }
    }
}
