use crate::{
    mtl::{read_mtl, MtlContext},
    obj::{read_obj, ObjContext},
    options::ParseOptions,
    window::WindowReader,
    Error, Result, WavefrontObj,
};

use std::{
    fs::File,
    io::{prelude::*, Result as IoResult},
    path::{Path, PathBuf},
};

use log::{info, warn};

/// Represents the parser of OBJ/MTL.
pub struct Parser<C, R> {
    include_function: Box<dyn FnMut(&Path, &C) -> IoResult<R>>,
    options: ParseOptions,
}

impl<C, R: Read> Parser<C, R> {
    /// Creates an instance of `Parser`.
    /// # Parameters
    /// * `include_function`
    ///     - An resolver closure/function for MTL file
    ///     - When detects `mtllib` command, it tries to resolve the path of
    ///       MTL file. The parser calls this resolver with detected path and context object,
    ///       so you can return any `Read` instance or error.
    pub fn new(include_function: impl FnMut(&Path, &C) -> IoResult<R> + 'static) -> Parser<C, R> {
        Parser::with_options(ParseOptions::default(), include_function)
    }

    /// Creates an instance of `Parser` with explicit options.
    pub fn with_options(
        options: ParseOptions,
        include_function: impl FnMut(&Path, &C) -> IoResult<R> + 'static,
    ) -> Parser<C, R> {
        Parser {
            include_function: Box::new(include_function),
            options,
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses the OBJ stream, then every material library it references in
    /// order of first appearance.
    pub fn parse(&mut self, reader: impl Read, context: C) -> Result<WavefrontObj> {
        let mut obj_context = ObjContext::new(&self.options);
        let mut reader = WindowReader::new(reader)?;
        read_obj(&mut reader, &mut obj_context)?;
        let (geometry, groups) = obj_context.finish();

        let mut mtl_context = MtlContext::new();
        for library in geometry.libraries() {
            let path = Path::new(library);
            let source = match (self.include_function)(path, &context) {
                Ok(source) => source,
                Err(e) if self.options.skip_missing_libraries => {
                    warn!("Skipping material library {}: {}", library, e);
                    continue;
                }
                Err(source) => {
                    return Err(Error::Include {
                        path: path.to_owned(),
                        source,
                    })
                }
            };

            info!("Reading material library {}", library);
            let mut reader = WindowReader::new(source)?;
            read_mtl(&mut reader, &mut mtl_context)?;
        }
        let (materials, textures) = mtl_context.finish();

        Ok(WavefrontObj {
            geometry,
            groups,
            materials,
            textures,
        })
    }
}

/// Loads an OBJ file, resolving its material libraries relative to its
/// directory.
pub fn load(path: impl AsRef<Path>, options: ParseOptions) -> Result<WavefrontObj> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Open {
        path: path.to_owned(),
        source,
    })?;
    let parent_directory = path.parent().map(Path::to_owned).unwrap_or_default();

    let mut parser = Parser::with_options(options, |library: &Path, base: &PathBuf| {
        File::open(base.join(library))
    });
    parser.parse(file, parent_directory)
}
