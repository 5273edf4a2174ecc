//! A builder that prints every event as one line of text.

use crate::builder::{
    ColorChannel, FloatParameter, IntegerParameter, MtlBuilder, ObjBuilder, TextureSlot,
};

use std::{
    fmt::Arguments,
    io::{prelude::*, Result as IoResult},
};

use itertools::Itertools;

/// Writes every OBJ/MTL event to `W`.
///
/// The first write error is kept and reported by `finish`; later events are
/// dropped.
#[derive(Debug)]
pub struct Tracer<W> {
    output: W,
    error: Option<std::io::Error>,
}

impl<W: Write> Tracer<W> {
    pub fn new(output: W) -> Tracer<W> {
        Tracer {
            output,
            error: None,
        }
    }

    /// Returns the output, or the first error that occurred while writing.
    pub fn finish(mut self) -> IoResult<W> {
        match self.error.take() {
            Some(e) => Err(e),
            None => {
                self.output.flush()?;
                Ok(self.output)
            }
        }
    }

    fn emit(&mut self, args: Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.output, "{}", args) {
            self.error = Some(e);
        }
    }

    fn named(&mut self, kind: &str, name: Option<&str>) {
        match name {
            Some(name) => self.emit(format_args!("{}: {}", kind, name)),
            None => self.emit(format_args!("{} (empty name)", kind)),
        }
    }
}

impl<W: Write> ObjBuilder for Tracer<W> {
    fn comment(&mut self, text: &str) {
        self.emit(format_args!("comment: {}", text));
    }

    fn object(&mut self, name: Option<&str>) {
        self.named("object", name);
    }

    fn group(&mut self, names: &[&str]) {
        if names.is_empty() {
            self.emit(format_args!("group (empty name)"));
        } else {
            self.emit(format_args!("groups: {}", names.iter().join(" ")));
        }
    }

    fn vertex(&mut self, numbers: &[&str]) {
        self.emit(format_args!("vertex: {}", numbers.iter().join(" ")));
    }

    fn texture_uv(&mut self, numbers: &[&str]) {
        self.emit(format_args!("texture: {}", numbers.iter().join(" ")));
    }

    fn normal(&mut self, numbers: &[&str]) {
        self.emit(format_args!("normal: {}", numbers.iter().join(" ")));
    }

    fn face(&mut self, vertices: &[Vec<&str>]) {
        let vertices = vertices.iter().map(|indices| indices.join("|")).join(" ");
        self.emit(format_args!("face: {}", vertices));
    }

    fn use_material(&mut self, name: Option<&str>) {
        self.named("material", name);
    }

    fn material_library(&mut self, name: Option<&str>) {
        self.named("library", name);
    }
}

impl<W: Write> MtlBuilder for Tracer<W> {
    fn comment(&mut self, text: &str) {
        self.emit(format_args!("comment: {}", text));
    }

    fn new_material(&mut self, name: Option<&str>) {
        self.named("material", name);
    }

    fn color(&mut self, channel: ColorChannel, numbers: &[&str]) {
        self.emit(format_args!("color|{}: {}", channel, numbers.iter().join(" ")));
    }

    fn texture(&mut self, slot: TextureSlot, path: Option<&str>) {
        match path {
            Some(path) => self.emit(format_args!("map|{}: {}", slot, path)),
            None => self.emit(format_args!("map|{} (empty map)", slot)),
        }
    }

    fn integer_parameter(&mut self, parameter: IntegerParameter, value: &str) {
        self.emit(format_args!("iparam|{}: {}", parameter, value));
    }

    fn float_parameter(&mut self, parameter: FloatParameter, value: &str) {
        self.emit(format_args!("fparam|{}: {}", parameter, value));
    }
}
