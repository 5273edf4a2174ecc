//! Event contracts the OBJ/MTL dispatchers report against.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use log::debug;

/// Receives the commands of an OBJ stream, one call per recognized line.
///
/// Every argument is borrowed from the reader's window and only valid for
/// the duration of the call.
pub trait ObjBuilder {
    /// `# ...`
    fn comment(&mut self, _text: &str) {}

    /// `o [name]`
    fn object(&mut self, _name: Option<&str>) {}

    /// `g [name]*`; `names` is empty when no name was given.
    fn group(&mut self, names: &[&str]);

    /// `v x y z [w]`
    fn vertex(&mut self, numbers: &[&str]);

    /// `vt u v`
    fn texture_uv(&mut self, numbers: &[&str]);

    /// `vn x y z`
    fn normal(&mut self, numbers: &[&str]);

    /// `f v[/t][/n] ...`; each vertex reference holds one to three raw
    /// sub-tokens, an empty sub-token meaning "not provided".
    fn face(&mut self, vertices: &[Vec<&str>]);

    /// `usemtl [name]`
    fn use_material(&mut self, name: Option<&str>);

    /// `mtllib [name]`
    fn material_library(&mut self, name: Option<&str>);
}

/// Receives the commands of an MTL stream, one call per recognized line.
pub trait MtlBuilder {
    /// `# ...`
    fn comment(&mut self, _text: &str) {}

    /// `newmtl [name]`
    fn new_material(&mut self, name: Option<&str>);

    /// `Ka`, `Kd`, `Ks`, `Ke`
    fn color(&mut self, channel: ColorChannel, numbers: &[&str]);

    /// `map_*`, `bump`, `disp`, `decal`, `refl`
    fn texture(&mut self, slot: TextureSlot, path: Option<&str>);

    /// `illum`
    fn integer_parameter(&mut self, parameter: IntegerParameter, value: &str);

    /// `d`, `Ns`, `Ni`, `Tr`
    fn float_parameter(&mut self, parameter: FloatParameter, value: &str);
}

/// Color channel of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorChannel {
    /// `Ka`
    Ambient,

    /// `Kd`
    Diffuse,

    /// `Ks`
    Specular,

    /// `Ke`
    Emissive,
}

impl ColorChannel {
    pub fn name(self) -> &'static str {
        match self {
            ColorChannel::Ambient => "ambient",
            ColorChannel::Diffuse => "diffuse",
            ColorChannel::Specular => "specular",
            ColorChannel::Emissive => "emissive",
        }
    }
}

/// Texture slot of a material. Several keywords share one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextureSlot {
    /// Recognized but not given any meaning (`map_d`, `decal`, `refl`).
    Untracked,

    /// `map_Ka`
    Ambient,

    /// `map_Kd`
    Diffuse,

    /// `map_Ks`
    Specular,

    /// `map_Ns`
    SpecularHighlight,

    /// `map_bump`, `map_Bump`, `bump`
    Bump,

    /// `map_disp`, `disp`
    Displacement,
}

impl TextureSlot {
    pub fn name(self) -> &'static str {
        match self {
            TextureSlot::Untracked => "untracked",
            TextureSlot::Ambient => "ambient",
            TextureSlot::Diffuse => "diffuse",
            TextureSlot::Specular => "specular",
            TextureSlot::SpecularHighlight => "specular-highlight",
            TextureSlot::Bump => "bump",
            TextureSlot::Displacement => "displacement",
        }
    }
}

/// Integer-valued material parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntegerParameter {
    /// `illum`
    IlluminationModel,
}

impl IntegerParameter {
    pub fn name(self) -> &'static str {
        match self {
            IntegerParameter::IlluminationModel => "illumination-model",
        }
    }
}

/// Float-valued material parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FloatParameter {
    /// `d`
    Opaqueness,

    /// `Ns`
    SpecularExponent,

    /// `Ni`
    OpticalDensity,

    /// `Tr`
    Transparency,
}

impl FloatParameter {
    pub fn name(self) -> &'static str {
        match self {
            FloatParameter::Opaqueness => "opaqueness",
            FloatParameter::SpecularExponent => "specular-exponent",
            FloatParameter::OpticalDensity => "optical-density",
            FloatParameter::Transparency => "transparency",
        }
    }
}

macro_rules! display_by_name {
    ($($t:ty),* $(,)?) => { $(
        impl Display for $t {
            fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
                f.write_str(self.name())
            }
        }
    )* }
}

display_by_name!(ColorChannel, TextureSlot, IntegerParameter, FloatParameter);

/// Converts a raw numeric token, falling back to zero when it is malformed.
pub(crate) fn lenient<T: FromStr + Default>(token: &str) -> T {
    match token.parse() {
        Ok(value) => value,
        Err(_) => {
            debug!("Malformed numeric token {:?}, using zero", token);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_conversion() {
        assert_eq!(lenient::<f32>("1.5"), 1.5);
        assert_eq!(lenient::<f32>("2e1"), 20.0);
        assert_eq!(lenient::<f32>(""), 0.0);
        assert_eq!(lenient::<f32>("-"), 0.0);
        assert_eq!(lenient::<i64>("-3"), -3);
        assert_eq!(lenient::<i32>("x"), 0);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(TextureSlot::SpecularHighlight.to_string(), "specular-highlight");
        assert_eq!(ColorChannel::Emissive.to_string(), "emissive");
        assert_eq!(FloatParameter::OpticalDensity.to_string(), "optical-density");
        assert_eq!(IntegerParameter::IlluminationModel.to_string(), "illumination-model");
    }
}
