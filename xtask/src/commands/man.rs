use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

#[derive(Args, Debug)]
pub struct ManArgs {
    /// Output directory, relative to the workspace root
    #[arg(long = "out-dir", default_value = "dist/share/man/man1")]
    pub out_dir: PathBuf,
}

pub fn cmd_man(args: ManArgs) -> Result<(), String> {
    let out_dir = super::prepare_out_dir(&args.out_dir)?;
    let cmd = autover::command();

    write_page(&cmd, &out_dir.join(format!("{}.1", crate::BIN_NAME)))?;

    // One page per subcommand: autover-run.1, autover-plan.1, ...
    for subcommand in cmd.get_subcommands() {
        let page = format!("{}-{}.1", crate::BIN_NAME, subcommand.get_name());
        write_page(subcommand, &out_dir.join(page))?;
    }

    Ok(())
}

fn write_page(cmd: &clap::Command, path: &Path) -> Result<(), String> {
    let mut buffer: Vec<u8> = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut buffer)
        .map_err(|e| format!("render {}: {e}", path.display()))?;
    fs::write(path, buffer).map_err(|e| format!("{}: {e}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}
