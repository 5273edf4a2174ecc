use crate::cli::TraceArguments;

use std::{
    fs::File,
    io::{stdout, BufReader},
};

use anyhow::{Context, Result};
use log::info;
use wavefront_stream::{read_mtl, read_obj, Tracer, WindowReader};

pub fn run_trace(args: TraceArguments) -> Result<()> {
    let stdout = stdout();
    let mut tracer = Tracer::new(stdout.lock());

    info!("Tracing {}", args.obj);
    let mut reader = open_window(&args.obj)?;
    read_obj(&mut reader, &mut tracer).context("Failed to read OBJ file")?;

    if let Some(mtl) = &args.mtl {
        info!("Tracing {}", mtl);
        let mut reader = open_window(mtl)?;
        read_mtl(&mut reader, &mut tracer).context("Failed to read MTL file")?;
    }

    tracer.finish().context("Failed to write trace")?;
    Ok(())
}

/// Opens a file and fills the initial window.
pub fn open_window(path: &str) -> Result<WindowReader<BufReader<File>>> {
    let file = File::open(path).context(format!("Failed to open \"{}\"", path))?;
    let reader = WindowReader::new(BufReader::new(file))
        .context(format!("Failed to read \"{}\"", path))?;
    Ok(reader)
}
