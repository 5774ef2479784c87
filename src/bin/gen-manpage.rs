//! Man page generator for ftflash
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
#[allow(dead_code)]
mod cli;

/// Render one page for `cmd` into `dir` as `<name>.1`
fn render(cmd: clap::Command, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    let man = clap_mangen::Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;

    let path = dir.join(format!("{}.1", name));
    fs::write(&path, buffer)?;
    Ok(path)
}

fn main() -> std::io::Result<()> {
    // Default to ./man directory
    let output_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));

    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    let mut pages = vec![render(cmd.clone(), &output_dir, "ftflash")?];

    // One page per subcommand, e.g. ftflash-write.1
    for sub in cmd.get_subcommands() {
        let name = format!("ftflash-{}", sub.get_name());
        pages.push(render(sub.clone(), &output_dir, &name)?);
    }

    for page in &pages {
        println!("Man page generated at: {}", page.display());
    }
    println!("\nTo view the man page:");
    println!("  man -l {}", pages[0].display());
    println!("\nTo install system-wide (requires sudo):");
    println!("  sudo cp {}/*.1 /usr/local/share/man/man1/", output_dir.display());
    println!("  sudo mandb");

    Ok(())
}
