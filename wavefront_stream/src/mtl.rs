//! MTL ファイルのディスパッチャーと、マテリアル情報。

use crate::{
    builder::{
        lenient, ColorChannel, FloatParameter, IntegerParameter, MtlBuilder, TextureSlot,
    },
    obj::{numbers, optional_name, BLANK, LINE_END},
    window::WindowReader,
};

use std::{
    collections::{BTreeMap, BTreeSet},
    io::{prelude::*, Result as IoResult},
};

use log::warn;
use ultraviolet::Vec3;

/// Texture keywords, each including its trailing space.
const TEXTURE_KEYWORDS: &[(&str, TextureSlot)] = &[
    ("map_Ka ", TextureSlot::Ambient),
    ("map_Kd ", TextureSlot::Diffuse),
    ("map_Ks ", TextureSlot::Specular),
    ("map_Ns ", TextureSlot::SpecularHighlight),
    ("map_d ", TextureSlot::Untracked),
    ("map_bump ", TextureSlot::Bump),
    ("map_Bump ", TextureSlot::Bump),
    ("bump ", TextureSlot::Bump),
    ("map_disp ", TextureSlot::Displacement),
    ("disp ", TextureSlot::Displacement),
    ("decal ", TextureSlot::Untracked),
    ("refl ", TextureSlot::Untracked),
];

const COLOR_KEYWORDS: &[(&str, ColorChannel)] = &[
    ("Ka ", ColorChannel::Ambient),
    ("Kd ", ColorChannel::Diffuse),
    ("Ks ", ColorChannel::Specular),
    ("Ke ", ColorChannel::Emissive),
];

const FLOAT_KEYWORDS: &[(&str, FloatParameter)] = &[
    ("d ", FloatParameter::Opaqueness),
    ("Ns ", FloatParameter::SpecularExponent),
    ("Ni ", FloatParameter::OpticalDensity),
    ("Tr ", FloatParameter::Transparency),
];

/// Reads the whole MTL stream, reporting every recognized line to `builder`.
///
/// Texture keywords are tested before the color and float keywords they
/// share a prefix with.
pub fn read_mtl<R: Read, const W: usize, B: MtlBuilder + ?Sized>(
    reader: &mut WindowReader<R, W>,
    builder: &mut B,
) -> IoResult<()> {
    while !reader.is_finished() {
        dispatch_line(reader, builder);
        reader.next_line()?;
    }
    Ok(())
}

fn dispatch_line<R, const W: usize, B: MtlBuilder + ?Sized>(
    reader: &mut WindowReader<R, W>,
    builder: &mut B,
) {
    reader.peek(BLANK);

    if reader.check("#") {
        reader.step(1);
        reader.peek(BLANK);
        let comment = reader.seek(LINE_END);
        builder.comment(reader.text(comment));
    } else if reader.check("newmtl ") {
        reader.step(6);
        let name = optional_name(reader);
        builder.new_material(name.map(|s| reader.text(s)));
    } else if let Some((length, slot)) = match_keyword(reader, TEXTURE_KEYWORDS) {
        reader.step(length);
        let path = optional_name(reader);
        builder.texture(slot, path.map(|s| reader.text(s)));
    } else if let Some((length, channel)) = match_keyword(reader, COLOR_KEYWORDS) {
        reader.step(length);
        let numbers = numbers(reader);
        builder.color(channel, &numbers);
    } else if reader.check("illum ") {
        reader.step(5);
        reader.peek(BLANK);
        let value = reader.peek_integer();
        builder.integer_parameter(IntegerParameter::IlluminationModel, reader.text(value));
    } else if let Some((length, parameter)) = match_keyword(reader, FLOAT_KEYWORDS) {
        reader.step(length);
        reader.peek(BLANK);
        let value = reader.peek_float();
        builder.float_parameter(parameter, reader.text(value));
    }
}

/// Finds the keyword at the cursor. The returned length stops at the
/// trailing space.
fn match_keyword<R, const W: usize, T: Copy>(
    reader: &WindowReader<R, W>,
    table: &[(&str, T)],
) -> Option<(usize, T)> {
    table
        .iter()
        .find(|(keyword, _)| reader.check(keyword))
        .map(|&(keyword, kind)| (keyword.len() - 1, kind))
}

/// .mtl ファイルで定義されるマテリアル情報を表す。
///
/// A repeated property keeps its first value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Material {
    name: String,
    colors: BTreeMap<ColorChannel, Vec3>,
    textures: BTreeMap<TextureSlot, String>,
    integers: BTreeMap<IntegerParameter, i32>,
    floats: BTreeMap<FloatParameter, f32>,
}

impl Material {
    /// マテリアル名を返す。無名の `newmtl` では空文字列になる。
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self, channel: ColorChannel) -> Option<Vec3> {
        self.colors.get(&channel).copied()
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&str> {
        self.textures.get(&slot).map(String::as_str)
    }

    pub fn integer(&self, parameter: IntegerParameter) -> Option<i32> {
        self.integers.get(&parameter).copied()
    }

    pub fn float(&self, parameter: FloatParameter) -> Option<f32> {
        self.floats.get(&parameter).copied()
    }

    pub fn colors(&self) -> impl Iterator<Item = (ColorChannel, Vec3)> + '_ {
        self.colors.iter().map(|(&k, &v)| (k, v))
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureSlot, &str)> + '_ {
        self.textures.iter().map(|(&k, v)| (k, v.as_str()))
    }

    pub fn integers(&self) -> impl Iterator<Item = (IntegerParameter, i32)> + '_ {
        self.integers.iter().map(|(&k, &v)| (k, v))
    }

    pub fn floats(&self) -> impl Iterator<Item = (FloatParameter, f32)> + '_ {
        self.floats.iter().map(|(&k, &v)| (k, v))
    }

    /// `Ka` の値を返す。
    pub fn ambient_color(&self) -> Option<Vec3> {
        self.color(ColorChannel::Ambient)
    }

    /// `Kd` の値を返す。
    pub fn diffuse_color(&self) -> Option<Vec3> {
        self.color(ColorChannel::Diffuse)
    }

    /// `Ns` の値を返す。
    pub fn specular_exponent(&self) -> Option<f32> {
        self.float(FloatParameter::SpecularExponent)
    }

    /// `illum` の値を返す。
    pub fn illumination(&self) -> Option<i32> {
        self.integer(IntegerParameter::IlluminationModel)
    }

    /// `map_Kd` の値を返す。
    pub fn diffuse_map(&self) -> Option<&str> {
        self.texture(TextureSlot::Diffuse)
    }
}

/// Folds MTL events into a list of `Material`s and the set of every texture
/// path they reference.
#[derive(Debug, Clone, Default)]
pub struct MtlContext {
    materials: Vec<Material>,
    textures: BTreeSet<String>,
}

impl MtlContext {
    pub fn new() -> MtlContext {
        Default::default()
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Returns the first material named `name`.
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn textures(&self) -> &BTreeSet<String> {
        &self.textures
    }

    pub fn finish(self) -> (Box<[Material]>, BTreeSet<String>) {
        (self.materials.into_boxed_slice(), self.textures)
    }
}

/// Returns the material receiving properties, if any was started.
fn current<'a>(materials: &'a mut [Material], keyword: &str) -> Option<&'a mut Material> {
    let current = materials.last_mut();
    if current.is_none() {
        warn!("Dropping {} defined before any newmtl", keyword);
    }
    current
}

impl MtlBuilder for MtlContext {
    fn new_material(&mut self, name: Option<&str>) {
        self.materials.push(Material {
            name: name.unwrap_or_default().to_owned(),
            ..Default::default()
        });
    }

    fn color(&mut self, channel: ColorChannel, numbers: &[&str]) {
        let mut values = [0.0f32; 3];
        match numbers {
            [single] => values = [lenient(single); 3],
            _ => {
                for (value, number) in values.iter_mut().zip(numbers) {
                    *value = lenient(number);
                }
            }
        }

        if let Some(material) = current(&mut self.materials, channel.name()) {
            material
                .colors
                .entry(channel)
                .or_insert_with(|| Vec3::new(values[0], values[1], values[2]));
        }
    }

    fn texture(&mut self, slot: TextureSlot, path: Option<&str>) {
        let path = match path {
            Some(path) => path,
            None => return,
        };
        if let Some(material) = current(&mut self.materials, slot.name()) {
            material
                .textures
                .entry(slot)
                .or_insert_with(|| path.to_owned());
            self.textures.insert(path.to_owned());
        }
    }

    fn integer_parameter(&mut self, parameter: IntegerParameter, value: &str) {
        if let Some(material) = current(&mut self.materials, parameter.name()) {
            material
                .integers
                .entry(parameter)
                .or_insert_with(|| lenient(value));
        }
    }

    fn float_parameter(&mut self, parameter: FloatParameter, value: &str) {
        if let Some(material) = current(&mut self.materials, parameter.name()) {
            material
                .floats
                .entry(parameter)
                .or_insert_with(|| lenient(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;

    fn extract(text: &str) -> MtlContext {
        let mut reader = WindowReader::new(Cursor::new(text)).unwrap();
        let mut context = MtlContext::new();
        read_mtl(&mut reader, &mut context).unwrap();
        context
    }

    #[test]
    fn test_texture_keywords_before_colors() {
        let context = extract("newmtl m\nmap_Ka foo.png\nmap_Kd bar.png\n");
        let material = context.material("m").unwrap();
        assert_eq!(material.texture(TextureSlot::Ambient), Some("foo.png"));
        assert_eq!(material.diffuse_map(), Some("bar.png"));
        assert_eq!(material.color(ColorChannel::Ambient), None);
    }

    #[test]
    fn test_disp_is_not_opaqueness() {
        let context = extract("newmtl m\ndisp foo.png\ndecal bar.png\nd 0.5\n");
        let material = context.material("m").unwrap();
        assert_eq!(
            material.texture(TextureSlot::Displacement),
            Some("foo.png")
        );
        assert_eq!(material.texture(TextureSlot::Untracked), Some("bar.png"));
        assert_eq!(material.float(FloatParameter::Opaqueness), Some(0.5));
    }

    #[test]
    fn test_bump_spellings() {
        for line in ["map_bump n.png", "map_Bump n.png", "bump n.png"] {
            let context = extract(&format!("newmtl m\n{}\n", line));
            let material = &context.materials()[0];
            assert_eq!(material.texture(TextureSlot::Bump), Some("n.png"), "{}", line);
        }
    }

    #[test]
    fn test_colors() {
        let context = extract("newmtl m\nKa 0.1 0.2 0.3\nKd 0.5\nKs 1\nKe 0.25 0.5\n");
        let material = &context.materials()[0];
        let ambient = material.ambient_color().unwrap();
        assert_abs_diff_eq!(ambient.z, 0.3);
        assert_eq!(material.diffuse_color(), Some(Vec3::new(0.5, 0.5, 0.5)));
        assert_eq!(
            material.color(ColorChannel::Emissive),
            Some(Vec3::new(0.25, 0.5, 0.0))
        );
        assert_eq!(material.colors().count(), 4);
    }

    #[test]
    fn test_parameters() {
        let context = extract("newmtl m\nillum 2\nNs 96.078431\nNi 1.45\nTr 0.25\nd 1\n");
        let material = &context.materials()[0];
        assert_eq!(material.illumination(), Some(2));
        assert_abs_diff_eq!(material.specular_exponent().unwrap(), 96.078431);
        assert_abs_diff_eq!(material.float(FloatParameter::OpticalDensity).unwrap(), 1.45);
        assert_abs_diff_eq!(material.float(FloatParameter::Transparency).unwrap(), 0.25);
        assert_abs_diff_eq!(material.float(FloatParameter::Opaqueness).unwrap(), 1.0);
    }

    #[test]
    fn test_first_value_wins() {
        let context = extract("newmtl m\nKd 1 0 0\nKd 0 1 0\nmap_Kd a.png\nmap_Kd b.png\n");
        let material = &context.materials()[0];
        assert_eq!(material.diffuse_color(), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(material.diffuse_map(), Some("a.png"));
        assert_eq!(context.textures().len(), 2);
    }

    #[test]
    fn test_properties_target_latest_material() {
        let context = extract("newmtl a\nKd 1 0 0\nnewmtl b\nillum 1\n");
        assert_eq!(context.materials().len(), 2);
        assert_eq!(context.material("a").unwrap().illumination(), None);
        assert_eq!(context.material("b").unwrap().diffuse_color(), None);
        assert_eq!(context.material("b").unwrap().illumination(), Some(1));
    }

    #[test]
    fn test_events_before_newmtl_are_dropped() {
        let context = extract("Kd 1 1 1\nmap_Kd x.png\nnewmtl m\n");
        assert_eq!(context.materials().len(), 1);
        assert_eq!(context.materials()[0].diffuse_color(), None);
        assert!(context.textures().is_empty());
    }

    #[test]
    fn test_unnamed_newmtl_is_anonymous() {
        let context = extract("newmtl a\nnewmtl \nKd 1 1 1\n");
        assert_eq!(context.materials().len(), 2);
        assert_eq!(context.materials()[1].name(), "");
        assert_eq!(context.material("a").unwrap().diffuse_color(), None);
    }

    #[test]
    fn test_texture_set_is_deduplicated() {
        let context = extract(
            "newmtl a\nmap_Kd shared.png\nbump n.png\nnewmtl b\nmap_Kd shared.png\nmap_Ka\n",
        );
        let textures: Vec<_> = context.textures().iter().map(String::as_str).collect();
        assert_eq!(textures, ["n.png", "shared.png"]);
    }

    #[test]
    fn test_malformed_values_default_to_zero() {
        let context = extract("newmtl m\nillum x\nNs .\n");
        let material = &context.materials()[0];
        assert_eq!(material.illumination(), Some(0));
        assert_eq!(material.specular_exponent(), Some(0.0));
    }
}
