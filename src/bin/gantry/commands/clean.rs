//! `gantry clean` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::CleanArgs;
use gantry::ops::clean;
use gantry::util::GlobalContext;

pub fn execute(args: CleanArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;

    let obj_dir = args
        .obj_dir
        .or(ctx.load_config().build.obj_dir)
        .unwrap_or_else(|| PathBuf::from("obj"));

    for removed in clean(ctx.cwd(), &obj_dir)? {
        eprintln!("     Removed {}", removed.display());
    }

    Ok(())
}
