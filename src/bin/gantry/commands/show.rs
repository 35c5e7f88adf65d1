//! `gantry show` command
//!
//! Equivalent to `gantry build --dry-run --show REPORTS`.

use anyhow::Result;

use crate::cli::ShowArgs;
use gantry::ops::{build, BuildOptions};
use gantry::util::GlobalContext;

pub fn execute(args: ShowArgs, verbose: bool, color: bool) -> Result<()> {
    let ctx = GlobalContext::new()?.verbose(verbose);

    let config = ctx.load_config();
    let mut opts = BuildOptions::from_config(&config);
    args.source.apply(&mut opts, &config);
    args.plan.apply(&mut opts, &config);
    opts.show = args.reports.0;
    opts.dry_run = true;
    opts.color = color;

    build(&ctx, &opts)?;
    Ok(())
}
