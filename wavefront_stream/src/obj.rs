//! OBJ ファイルのディスパッチャーと、抽出されるデータモデル。

use crate::{
    builder::{lenient, ObjBuilder},
    options::ParseOptions,
    scan::Span,
    window::WindowReader,
};

use std::{
    collections::{BTreeMap, HashMap},
    io::{prelude::*, Result as IoResult},
    num::NonZeroU32,
    ops::Range,
};

use log::debug;
use ultraviolet::{Vec2, Vec3};

pub(crate) const BLANK: &[u8] = b" \t";
pub(crate) const LINE_END: &[u8] = b"\r\n";
pub(crate) const NAME_END: &[u8] = b" \t\r\n";

/// Reads the whole OBJ stream, reporting every recognized line to `builder`.
///
/// Unrecognized lines are skipped. Only I/O errors of the underlying stream
/// are returned.
pub fn read_obj<R: Read, const W: usize, B: ObjBuilder + ?Sized>(
    reader: &mut WindowReader<R, W>,
    builder: &mut B,
) -> IoResult<()> {
    while !reader.is_finished() {
        dispatch_line(reader, builder);
        reader.next_line()?;
    }
    Ok(())
}

fn dispatch_line<R, const W: usize, B: ObjBuilder + ?Sized>(
    reader: &mut WindowReader<R, W>,
    builder: &mut B,
) {
    reader.peek(BLANK);

    if reader.check("#") {
        reader.step(1);
        reader.peek(BLANK);
        let comment = reader.seek(LINE_END);
        builder.comment(reader.text(comment));
    } else if reader.check("o ") {
        reader.step(1);
        let name = optional_name(reader);
        builder.object(name.map(|s| reader.text(s)));
    } else if reader.check("g ") {
        reader.step(1);
        let mut names = vec![];
        while reader.race(BLANK, LINE_END) {
            names.push(reader.seek(NAME_END));
        }
        let names: Vec<_> = names.into_iter().map(|s| reader.text(s)).collect();
        builder.group(&names);
    } else if reader.check("v ") {
        reader.step(1);
        let numbers = numbers(reader);
        builder.vertex(&numbers);
    } else if reader.check("vt ") {
        reader.step(2);
        let numbers = numbers(reader);
        builder.texture_uv(&numbers);
    } else if reader.check("vn ") {
        reader.step(2);
        let numbers = numbers(reader);
        builder.normal(&numbers);
    } else if reader.check("f ") {
        reader.step(1);
        reader.peek(BLANK);
        let mut vertices = vec![];
        loop {
            let mut indices = vec![];
            loop {
                indices.push(reader.peek_integer());
                if indices.len() == 3 || !reader.check("/") {
                    break;
                }
                reader.step(1);
            }
            vertices.push(indices);
            if !reader.race(BLANK, LINE_END) {
                break;
            }
        }
        let vertices: Vec<Vec<_>> = vertices
            .into_iter()
            .map(|indices| indices.into_iter().map(|s| reader.text(s)).collect())
            .collect();
        builder.face(&vertices);
    } else if reader.check("usemtl ") {
        reader.step(6);
        let name = optional_name(reader);
        builder.use_material(name.map(|s| reader.text(s)));
    } else if reader.check("mtllib ") {
        reader.step(6);
        let name = optional_name(reader);
        builder.material_library(name.map(|s| reader.text(s)));
    }
}

/// Collects a single name token if one follows before the end of the line.
pub(crate) fn optional_name<R, const W: usize>(reader: &mut WindowReader<R, W>) -> Option<Span> {
    if reader.race(BLANK, LINE_END) {
        Some(reader.seek(NAME_END))
    } else {
        None
    }
}

/// Collects the numeric tokens following a keyword.
pub(crate) fn numbers<R, const W: usize>(reader: &mut WindowReader<R, W>) -> Vec<&str> {
    reader.peek(BLANK);
    let spans = reader.peek_floats(BLANK, LINE_END);
    let reader = &*reader;
    spans.into_iter().map(|s| reader.text(s)).collect()
}

/// Wavefront OBJ の面の頂点インデックスの組を表す。
///
/// Indices are 1-based; 0 means the reference was not given or could not be
/// resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaceIndexTriple(pub u32, pub u32, pub u32);

impl FaceIndexTriple {
    pub fn position(&self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.0)
    }

    pub fn texture_uv(&self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.1)
    }

    pub fn normal(&self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.2)
    }
}

/// OBJ ストリーム全体で共有される頂点データを表す。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeometryRecord {
    /// 頂点座標 (x, y, z の並び)
    positions: Vec<f32>,

    /// テクスチャ座標 (u, v の並び)
    texture_uvs: Vec<f32>,

    /// 法線 (x, y, z の並び)
    normals: Vec<f32>,

    /// 参照されたマテリアルライブラリ
    libraries: Vec<String>,
}

impl GeometryRecord {
    /// 頂点座標の平坦な列を返す。
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// テクスチャ座標の平坦な列を返す。
    pub fn texture_uvs(&self) -> &[f32] {
        &self.texture_uvs
    }

    /// 法線の平坦な列を返す。
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    /// 参照されたマテリアルライブラリ名を出現順に返す。
    pub fn libraries(&self) -> &[String] {
        &self.libraries
    }

    pub fn position_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn texture_uv_count(&self) -> usize {
        self.texture_uvs.len() / 2
    }

    pub fn normal_count(&self) -> usize {
        self.normals.len() / 3
    }

    /// Returns the position at a 1-based index.
    pub fn position(&self, index: u32) -> Option<Vec3> {
        element(&self.positions, index, 3).map(|v| Vec3::new(v[0], v[1], v[2]))
    }

    /// Returns the texture coordinate at a 1-based index.
    pub fn texture_uv(&self, index: u32) -> Option<Vec2> {
        element(&self.texture_uvs, index, 2).map(|v| Vec2::new(v[0], v[1]))
    }

    /// Returns the normal at a 1-based index.
    pub fn normal(&self, index: u32) -> Option<Vec3> {
        element(&self.normals, index, 3).map(|v| Vec3::new(v[0], v[1], v[2]))
    }
}

fn element(flat: &[f32], index: u32, stride: usize) -> Option<&[f32]> {
    let start = (index as usize).checked_sub(1)? * stride;
    flat.get(start..start + stride)
}

/// A contiguous range of faces drawn with one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialRun<'a> {
    pub material: &'a str,
    pub faces: Range<usize>,
}

/// A vertex of a face with its indices resolved against a `GeometryRecord`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedVertex {
    pub position: Vec3,
    pub texture_uv: Option<Vec2>,
    pub normal: Option<Vec3>,
}

/// Wavefront OBJ 内のグループを表す。
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// 名前
    name: String,

    /// 面の頂点インデックスのリスト
    faces: Vec<Box<[FaceIndexTriple]>>,

    /// 面数の閾値から、その閾値より前の面に使われるマテリアル名への対応
    material_runs: BTreeMap<usize, String>,
}

impl Group {
    fn new(name: &str) -> Group {
        Group {
            name: name.to_owned(),
            faces: vec![],
            material_runs: BTreeMap::new(),
        }
    }

    /// このグループの名前を返す。
    pub fn name(&self) -> &str {
        &self.name
    }

    /// このグループの面のインデックス情報を返す。
    pub fn faces(&self) -> &[Box<[FaceIndexTriple]>] {
        &self.faces
    }

    /// Returns the raw run table, keyed by the face count each run ends at.
    pub fn material_thresholds(&self) -> &BTreeMap<usize, String> {
        &self.material_runs
    }

    /// Iterates the material runs in face order.
    pub fn material_runs(&self) -> impl Iterator<Item = MaterialRun<'_>> + '_ {
        let mut start = 0;
        self.material_runs.iter().map(move |(&end, material)| {
            let run = MaterialRun {
                material,
                faces: start..end,
            };
            start = end;
            run
        })
    }

    /// Returns the material the face at `face` is drawn with.
    pub fn material_of(&self, face: usize) -> Option<&str> {
        self.material_runs
            .range(face + 1..)
            .next()
            .map(|(_, material)| material.as_str())
    }

    /// Iterates the faces with their vertices resolved against `geometry`.
    pub fn faces_in<'a>(&'a self, geometry: &'a GeometryRecord) -> GroupFaces<'a> {
        GroupFaces(self, geometry, 0)
    }

    /// Closes the run of `material` at the current face count.
    fn close_run(&mut self, material: &str) {
        let count = self.faces.len();
        let (threshold, same_material) = match self.material_runs.iter().next_back() {
            Some((&threshold, last)) => (threshold, last == material),
            None => (0, false),
        };
        if count <= threshold {
            return;
        }
        if same_material {
            self.material_runs.remove(&threshold);
        }
        self.material_runs.insert(count, material.to_owned());
    }
}

#[derive(Debug)]
pub struct GroupFaces<'a>(&'a Group, &'a GeometryRecord, usize);

impl<'a> Iterator for GroupFaces<'a> {
    type Item = FaceVertices<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let face = self.0.faces.get(self.2)?;
        self.2 += 1;
        Some(FaceVertices(self.1, face, 0))
    }
}

#[derive(Debug)]
pub struct FaceVertices<'a>(&'a GeometryRecord, &'a [FaceIndexTriple], usize);

impl<'a> Iterator for FaceVertices<'a> {
    type Item = ResolvedVertex;

    fn next(&mut self) -> Option<Self::Item> {
        let triple = self.1.get(self.2)?;
        self.2 += 1;
        Some(ResolvedVertex {
            position: self.0.position(triple.0).unwrap_or_else(Vec3::zero),
            texture_uv: self.0.texture_uv(triple.1),
            normal: self.0.normal(triple.2),
        })
    }
}

/// Folds OBJ events into a `GeometryRecord` and a list of `Group`s.
#[derive(Debug, Clone)]
pub struct ObjContext {
    geometry: GeometryRecord,
    groups: Vec<Group>,
    group_indices: HashMap<String, usize>,
    active_groups: Vec<usize>,
    active_material: String,
}

impl ObjContext {
    /// The default group is created immediately and is always the first group.
    pub fn new(options: &ParseOptions) -> ObjContext {
        let mut group_indices = HashMap::new();
        group_indices.insert(options.default_group.clone(), 0);

        ObjContext {
            geometry: GeometryRecord::default(),
            groups: vec![Group::new(&options.default_group)],
            group_indices,
            active_groups: vec![0],
            active_material: options.default_material.clone(),
        }
    }

    pub fn geometry(&self) -> &GeometryRecord {
        &self.geometry
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.group_indices.get(name).map(|&i| &self.groups[i])
    }

    /// Closes the run of the active material in every active group.
    /// Must be called once the stream is drained; calling it again is harmless.
    pub fn finalise(&mut self) {
        self.close_material_run();
    }

    /// Finalises and returns the extracted data.
    pub fn finish(mut self) -> (GeometryRecord, Box<[Group]>) {
        self.finalise();
        (self.geometry, self.groups.into_boxed_slice())
    }

    fn close_material_run(&mut self) {
        for &index in &self.active_groups {
            self.groups[index].close_run(&self.active_material);
        }
    }

    fn group_index(&mut self, name: &str) -> usize {
        if let Some(&index) = self.group_indices.get(name) {
            return index;
        }
        let index = self.groups.len();
        self.groups.push(Group::new(name));
        self.group_indices.insert(name.to_owned(), index);
        index
    }
}

impl Default for ObjContext {
    fn default() -> ObjContext {
        ObjContext::new(&ParseOptions::default())
    }
}

impl ObjBuilder for ObjContext {
    fn group(&mut self, names: &[&str]) {
        self.close_material_run();
        self.active_groups.clear();
        for name in names {
            let index = self.group_index(name);
            if !self.active_groups.contains(&index) {
                self.active_groups.push(index);
            }
        }
        if self.active_groups.is_empty() {
            self.active_groups.push(0);
        }
    }

    fn vertex(&mut self, numbers: &[&str]) {
        push_padded(&mut self.geometry.positions, numbers, 3);
    }

    fn texture_uv(&mut self, numbers: &[&str]) {
        push_padded(&mut self.geometry.texture_uvs, numbers, 2);
    }

    fn normal(&mut self, numbers: &[&str]) {
        push_padded(&mut self.geometry.normals, numbers, 3);
    }

    fn face(&mut self, vertices: &[Vec<&str>]) {
        let counts = [
            self.geometry.position_count(),
            self.geometry.texture_uv_count(),
            self.geometry.normal_count(),
        ];
        let face: Box<[FaceIndexTriple]> = vertices
            .iter()
            .map(|tokens| {
                let mut indices = [0; 3];
                for (slot, token) in tokens.iter().take(3).enumerate() {
                    indices[slot] = resolve_index(token, counts[slot]);
                }
                FaceIndexTriple(indices[0], indices[1], indices[2])
            })
            .collect();

        for &index in &self.active_groups {
            self.groups[index].faces.push(face.clone());
        }
    }

    fn use_material(&mut self, name: Option<&str>) {
        match name {
            Some(name) => {
                self.close_material_run();
                self.active_material = name.to_owned();
            }
            None => debug!("Ignoring usemtl without a material name"),
        }
    }

    fn material_library(&mut self, name: Option<&str>) {
        match name {
            Some(name) if !self.geometry.libraries.iter().any(|l| l == name) => {
                self.geometry.libraries.push(name.to_owned());
            }
            Some(_) => (),
            None => debug!("Ignoring mtllib without a library name"),
        }
    }
}

/// Appends exactly `arity` values, padding with zero and dropping extras.
fn push_padded(target: &mut Vec<f32>, numbers: &[&str], arity: usize) {
    if numbers.len() > arity {
        debug!("Dropping {} extra component(s)", numbers.len() - arity);
    }
    target.extend((0..arity).map(|i| numbers.get(i).map_or(0.0, |n| lenient(n))));
}

/// Resolves a raw face index token against the number of declared elements.
fn resolve_index(token: &str, count: usize) -> u32 {
    if token.is_empty() {
        return 0;
    }
    let value: i64 = lenient(token);
    let resolved = if value < 0 {
        count as i64 + value + 1
    } else {
        value
    };
    match u32::try_from(resolved) {
        Ok(index) => index,
        Err(_) => {
            debug!("Index {} is out of range, clamping to 0", token);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Cursor;

    fn extract(text: &str) -> ObjContext {
        let mut reader = WindowReader::new(Cursor::new(text)).unwrap();
        let mut context = ObjContext::default();
        read_obj(&mut reader, &mut context).unwrap();
        context.finalise();
        context
    }

    fn triples(group: &Group) -> Vec<Vec<(u32, u32, u32)>> {
        group
            .faces()
            .iter()
            .map(|face| face.iter().map(|t| (t.0, t.1, t.2)).collect())
            .collect()
    }

    #[test]
    fn test_relative_index_law() {
        let context = extract("v 0 0 0\nv 0 0 0\nv 0 0 0\nf 1 2 -1\n");
        let group = &context.groups()[0];
        assert_eq!(triples(group), [[(1, 0, 0), (2, 0, 0), (3, 0, 0)]]);
    }

    #[test]
    fn test_face_sub_tokens() {
        let context = extract(
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2//1 3/-1\n",
        );
        assert_eq!(
            triples(&context.groups()[0]),
            [[(1, 1, 1), (2, 0, 1), (3, 1, 0)]]
        );
    }

    #[test]
    fn test_relative_index_clamps_to_zero() {
        let context = extract("v 0 0 0\nf -5 1 99999999999\n");
        assert_eq!(
            triples(&context.groups()[0]),
            [[(0, 0, 0), (1, 0, 0), (0, 0, 0)]]
        );
    }

    #[test]
    fn test_polygon_faces_are_kept_whole() {
        let context = extract("f 1 2 3 4 5\n");
        assert_eq!(context.groups()[0].faces()[0].len(), 5);
    }

    #[test]
    fn test_material_run_law() {
        let context = extract("usemtl A\nf 1 1 1\nf 1 1 1\nusemtl B\nf 1 1 1\n");
        let group = &context.groups()[0];
        let runs: Vec<_> = group.material_runs().collect();
        assert_eq!(
            runs,
            [
                MaterialRun {
                    material: "A",
                    faces: 0..2
                },
                MaterialRun {
                    material: "B",
                    faces: 2..3
                },
            ]
        );
        assert_eq!(group.material_thresholds().len(), 2);
        assert_eq!(group.material_of(1), Some("A"));
        assert_eq!(group.material_of(2), Some("B"));
        assert_eq!(group.material_of(3), None);
    }

    #[test]
    fn test_faces_before_usemtl_use_default_material() {
        let context = extract("f 1 1 1\nusemtl A\nf 1 1 1\n");
        let runs: Vec<_> = context.groups()[0]
            .material_runs()
            .map(|run| (run.material, run.faces))
            .collect();
        assert_eq!(runs, [("default", 0..1), ("A", 1..2)]);
    }

    #[test]
    fn test_default_group_law() {
        let context = extract("v 0 0 0\nf 1 1 1\nf 1 1 1\n");
        assert_eq!(context.groups().len(), 1);
        assert_eq!(context.groups()[0].name(), "default");
        assert_eq!(context.groups()[0].faces().len(), 2);
    }

    #[test]
    fn test_group_switching_scopes_material_runs() {
        let context = extract("g a b\nf 1\ng b\nusemtl M\nf 1\ng \nf 1\n");
        let names: Vec<_> = context.groups().iter().map(Group::name).collect();
        assert_eq!(names, ["default", "a", "b"]);

        let runs = |name| -> Vec<_> {
            context
                .group(name)
                .unwrap()
                .material_runs()
                .map(|run| (run.material.to_owned(), run.faces))
                .collect()
        };
        assert_eq!(runs("a"), [("default".to_owned(), 0..1)]);
        assert_eq!(
            runs("b"),
            [("default".to_owned(), 0..1), ("M".to_owned(), 1..2)]
        );
        assert_eq!(runs("default"), [("M".to_owned(), 0..1)]);
    }

    #[test]
    fn test_reactivated_group_merges_runs() {
        let context = extract("g a\nf 1\ng b\nf 1\ng a\nf 1\n");
        let group = context.group("a").unwrap();
        assert_eq!(group.faces().len(), 2);
        assert_eq!(group.material_thresholds().len(), 1);
        assert_eq!(group.material_of(1), Some("default"));
    }

    #[test]
    fn test_duplicate_group_names_activate_once() {
        let context = extract("g a a\nf 1\n");
        assert_eq!(context.group("a").unwrap().faces().len(), 1);
    }

    #[test]
    fn test_unnamed_usemtl_is_ignored() {
        let context = extract("usemtl A\nf 1\nusemtl\nf 1\n");
        let group = &context.groups()[0];
        assert_eq!(group.material_thresholds().len(), 1);
        assert_eq!(group.material_of(1), Some("A"));
    }

    #[test]
    fn test_geometry_padding() {
        let context = extract("v 1 2\nv 1 2 3 4\nvt 0.5\nvn 0 1 0\n");
        let geometry = context.geometry();
        assert_eq!(geometry.positions(), [1.0, 2.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(geometry.texture_uvs(), [0.5, 0.0]);
        assert_eq!(geometry.position_count(), 2);
        assert_eq!(geometry.position(2), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(geometry.normal(1), Some(Vec3::new(0.0, 1.0, 0.0)));
        assert_eq!(geometry.position(0), None);
        assert_eq!(geometry.position(3), None);
    }

    #[test]
    fn test_malformed_numbers_default_to_zero() {
        let context = extract("v 1 abc 2\nvn x\n");
        assert_eq!(context.geometry().positions(), [1.0, 0.0, 0.0]);
        assert_eq!(context.geometry().normals(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_faces_in_resolves_vertices() {
        let context = extract("v 1 2 3\nvt 0.25 0.75\nf 1/1 1/1/1 2\n");
        let group = &context.groups()[0];
        let faces: Vec<Vec<_>> = group
            .faces_in(context.geometry())
            .map(|face| face.collect())
            .collect();
        assert_eq!(faces.len(), 1);

        let vertices = &faces[0];
        assert_abs_diff_eq!(vertices[0].position.y, 2.0);
        assert_abs_diff_eq!(vertices[0].texture_uv.unwrap().x, 0.25);
        assert_eq!(vertices[1].normal, None);
        assert_eq!(vertices[2].position, Vec3::zero());
        assert_eq!(vertices[2].texture_uv, None);
    }

    #[test]
    fn test_libraries_are_deduplicated() {
        let context = extract("mtllib a.mtl\nmtllib a.mtl\nmtllib b.mtl\nmtllib\n");
        assert_eq!(context.geometry().libraries(), ["a.mtl", "b.mtl"]);
    }

    #[test]
    fn test_crlf_and_indentation() {
        let context = extract("  g left\r\n\tv 1 2 3\r\nf 1\r\n");
        let group = context.group("left").unwrap();
        assert_eq!(triples(group), [[(1, 0, 0)]]);
        assert_eq!(context.geometry().positions(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_finish_closes_last_run() {
        let mut reader = WindowReader::new(Cursor::new("usemtl A\nf 1\n")).unwrap();
        let mut context = ObjContext::default();
        read_obj(&mut reader, &mut context).unwrap();
        let (_, groups) = context.finish();
        assert_eq!(groups[0].material_of(0), Some("A"));
    }

    #[test]
    fn test_custom_default_names() {
        let options = ParseOptions {
            default_group: "(root)".into(),
            default_material: "none".into(),
            ..Default::default()
        };
        let mut reader = WindowReader::new(Cursor::new("f 1\n")).unwrap();
        let mut context = ObjContext::new(&options);
        read_obj(&mut reader, &mut context).unwrap();
        let (_, groups) = context.finish();
        assert_eq!(groups[0].name(), "(root)");
        assert_eq!(groups[0].material_of(0), Some("none"));
    }
}
