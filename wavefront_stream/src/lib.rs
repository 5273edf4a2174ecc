//! Parses the Wavefront OBJ/MTL format through a bounded lookahead window.
//!
//! The dispatchers `read_obj` and `read_mtl` report each recognized line to an
//! `ObjBuilder`/`MtlBuilder`. `ObjContext` and `MtlContext` fold those events
//! into the data model; `Tracer` prints them.

mod builder;
mod mtl;
mod obj;
mod options;
mod parser;
mod scan;
mod trace;
mod window;

pub use builder::{
    ColorChannel, FloatParameter, IntegerParameter, MtlBuilder, ObjBuilder, TextureSlot,
};
pub use mtl::{read_mtl, Material, MtlContext};
pub use obj::{
    read_obj, FaceIndexTriple, FaceVertices, GeometryRecord, Group, GroupFaces, MaterialRun,
    ObjContext, ResolvedVertex,
};
pub use options::ParseOptions;
pub use parser::{load, Parser};
pub use scan::Span;
pub use trace::Tracer;
pub use window::{WindowReader, DEFAULT_WINDOW};

use std::{collections::BTreeSet, io::Error as IoError, path::PathBuf};

use thiserror::Error as ThisError;

/// Represents an error in reading OBJ/MTL.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The OBJ stream could not be opened.
    #[error("Cannot open {}: {source}", .path.display())]
    Open { path: PathBuf, source: IoError },

    /// A material library referenced by `mtllib` could not be opened.
    #[error("Cannot include material library {}: {source}", .path.display())]
    Include { path: PathBuf, source: IoError },

    /// Reading from an opened stream failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Wavefront OBJ の内容を表す。
#[derive(Debug, Clone)]
pub struct WavefrontObj {
    geometry: GeometryRecord,
    groups: Box<[Group]>,
    materials: Box<[Material]>,
    textures: BTreeSet<String>,
}

impl WavefrontObj {
    /// 頂点データを返す。
    pub fn geometry(&self) -> &GeometryRecord {
        &self.geometry
    }

    /// このオブジェクトに含まれる全てのグループを返す。
    /// 最初のグループは常に既定グループである。
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name() == name)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name() == name)
    }

    /// 全マテリアルが参照するテクスチャのパスを返す。
    pub fn textures(&self) -> &BTreeSet<String> {
        &self.textures
    }
}
