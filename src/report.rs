//! Prints an extracted model as an indented outline.

use std::{
    collections::BTreeSet,
    io::{prelude::*, Result as IoResult},
};

use itertools::Itertools;
use ultraviolet::Vec3;
use wavefront_stream::{FaceIndexTriple, GeometryRecord, Group, Material};

/// Borrowed view of everything `extract` prints.
pub struct Report<'a> {
    pub geometry: &'a GeometryRecord,
    pub groups: &'a [Group],
    pub materials: &'a [Material],
    pub textures: &'a BTreeSet<String>,
}

impl Report<'_> {
    pub fn write(&self, out: &mut impl Write, combine: bool) -> IoResult<()> {
        self.write_geometry(out)?;
        self.write_groups(out, combine)?;
        self.write_materials(out)?;
        self.write_textures(out)
    }

    fn write_geometry(&self, out: &mut impl Write) -> IoResult<()> {
        writeln!(out, "data:")?;
        writeln!(out, "\tvertices:")?;
        for position in self.geometry.positions().chunks_exact(3) {
            writeln!(out, "\t\t{}", numbers(position))?;
        }
        writeln!(out, "\tuv coordinates:")?;
        for uv in self.geometry.texture_uvs().chunks_exact(2) {
            writeln!(out, "\t\t{}", numbers(uv))?;
        }
        writeln!(out, "\tnormals:")?;
        for normal in self.geometry.normals().chunks_exact(3) {
            writeln!(out, "\t\t{}", numbers(normal))?;
        }
        writeln!(out, "\tlibraries:")?;
        for library in self.geometry.libraries() {
            writeln!(out, "\t\t{}", library)?;
        }
        Ok(())
    }

    fn write_groups(&self, out: &mut impl Write, combine: bool) -> IoResult<()> {
        writeln!(out, "groups:")?;
        for group in self.groups {
            writeln!(out, "\t{}:", group.name())?;
            if combine {
                writeln!(out, "\t\tmaterial indices:")?;
                for run in group.material_runs() {
                    for face in &group.faces()[run.faces] {
                        writeln!(out, "\t\t\t{}: {}", run.material, indices(face))?;
                    }
                }
            } else {
                writeln!(out, "\t\tindices:")?;
                for face in group.faces() {
                    writeln!(out, "\t\t\t{}", indices(face))?;
                }
                writeln!(out, "\t\tmaterials:")?;
                for (threshold, material) in group.material_thresholds() {
                    writeln!(out, "\t\t\t{} until index {}", material, threshold)?;
                }
            }
        }
        Ok(())
    }

    fn write_materials(&self, out: &mut impl Write) -> IoResult<()> {
        writeln!(out, "materials:")?;
        for material in self.materials {
            writeln!(out, "\t{}:", material.name())?;
            for (channel, value) in material.colors() {
                writeln!(out, "\t\tcolor|{}: {}", channel, color(value))?;
            }
            for (slot, path) in material.textures() {
                writeln!(out, "\t\ttexture|{}: {}", slot, path)?;
            }
            for (parameter, value) in material.integers() {
                writeln!(out, "\t\tiparam|{}: {}", parameter, value)?;
            }
            for (parameter, value) in material.floats() {
                writeln!(out, "\t\tfparam|{}: {:.6}", parameter, value)?;
            }
        }
        Ok(())
    }

    fn write_textures(&self, out: &mut impl Write) -> IoResult<()> {
        writeln!(out, "textures:")?;
        for texture in self.textures {
            writeln!(out, "\t{}", texture)?;
        }
        Ok(())
    }
}

fn numbers(values: &[f32]) -> String {
    values.iter().map(|v| format!("{:.6}", v)).join(" ")
}

fn color(value: Vec3) -> String {
    numbers(&[value.x, value.y, value.z])
}

fn indices(face: &[FaceIndexTriple]) -> String {
    face.iter()
        .map(|t| format!("{}|{}|{}", t.0, t.1, t.2))
        .join(" ")
}
