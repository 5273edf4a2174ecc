use crate::{
    cli::ExtractArguments, config::Config, report::Report, subcommand::trace::open_window,
};

use std::{
    fs::File,
    io::{stdout, BufReader, Error as IoError, ErrorKind, Result as IoResult},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info};
use wavefront_stream::{
    load, read_mtl, read_obj, MtlContext, ObjContext, Parser, WavefrontObj,
};

pub fn run_extract(args: ExtractArguments, config: &Config) -> Result<()> {
    let stdout = stdout();
    let mut out = stdout.lock();

    if args.mtl.is_some() || !config.libraries.follow {
        let mut obj_context = ObjContext::new(&config.parse);
        read_obj(&mut open_window(&args.obj)?, &mut obj_context)
            .context("Failed to read OBJ file")?;
        obj_context.finalise();

        let mut mtl_context = MtlContext::new();
        if let Some(mtl) = &args.mtl {
            read_mtl(&mut open_window(mtl)?, &mut mtl_context)
                .context("Failed to read MTL file")?;
        }

        let report = Report {
            geometry: obj_context.geometry(),
            groups: obj_context.groups(),
            materials: mtl_context.materials(),
            textures: mtl_context.textures(),
        };
        report.write(&mut out, args.combine)?;
    } else {
        let obj = parse_following_libraries(Path::new(&args.obj), config)?;
        let report = Report {
            geometry: obj.geometry(),
            groups: obj.groups(),
            materials: obj.materials(),
            textures: obj.textures(),
        };
        report.write(&mut out, args.combine)?;
    }

    Ok(())
}

fn parse_following_libraries(path: &Path, config: &Config) -> Result<WavefrontObj> {
    if config.libraries.search_paths.is_empty() {
        return load(path, config.parse.clone())
            .context(format!("Failed to load \"{}\"", path.display()));
    }

    let mut search_paths = vec![path.parent().map(Path::to_owned).unwrap_or_default()];
    search_paths.extend(config.libraries.search_paths.iter().cloned());

    let file = File::open(path).context(format!("Failed to open \"{}\"", path.display()))?;
    let mut parser = Parser::with_options(
        config.parse.clone(),
        |library: &Path, search_paths: &Vec<PathBuf>| search_library(library, search_paths),
    );
    let obj = parser
        .parse(BufReader::new(file), search_paths)
        .context(format!("Failed to parse \"{}\"", path.display()))?;
    info!("Extracted {} group(s)", obj.groups().len());
    Ok(obj)
}

/// Opens the first `library` found in `search_paths`.
fn search_library(library: &Path, search_paths: &[PathBuf]) -> IoResult<BufReader<File>> {
    for directory in search_paths {
        let candidate = directory.join(library);
        if candidate.is_file() {
            debug!("Found {} at {}", library.display(), candidate.display());
            return File::open(candidate).map(BufReader::new);
        }
    }

    Err(IoError::new(
        ErrorKind::NotFound,
        format!("{} is not in any search path", library.display()),
    ))
}
