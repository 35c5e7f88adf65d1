//! `gantry build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use gantry::ops::{build, BuildOptions};
use gantry::util::GlobalContext;

pub fn execute(args: BuildArgs, verbose: bool, color: bool) -> Result<()> {
    let ctx = GlobalContext::new()?.verbose(verbose);

    // Load configuration (global + project); CLI flags override it
    let config = ctx.load_config();
    let mut opts = BuildOptions::from_config(&config);
    args.source.apply(&mut opts, &config);
    args.plan.apply(&mut opts, &config);
    opts.show = args.show;
    opts.dry_run = args.dry_run;
    opts.emit_compile_commands = args.emit_compile_commands;
    opts.verbose = verbose;
    opts.color = color;

    let result = build(&ctx, &opts)?;

    if let Some(summary) = result.summary {
        if summary.commands == 0 {
            eprintln!("    Finished nothing to do");
        }
        for artifact in &summary.artifacts {
            eprintln!("    Finished {}", artifact.display());
        }
    }

    Ok(())
}
