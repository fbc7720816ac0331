// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: tool configuration file
fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_name("PATH")
        .global(true)
        .help("Tool configuration file (default: ~/.config/depsolve/config.toml)")
}

fn build_cli() -> Command {
    Command::new("depsolve")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Depsolve Contributors")
        .about("Find the extra dependencies and flags a Haskell project needs")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging (RUST_LOG takes precedence)"),
        )
        .arg(config_arg())
        .subcommand(
            Command::new("solve")
                .about("Solve for extra dependencies missing from the project configuration")
                .arg(
                    Arg::new("stack_yaml")
                        .long("stack-yaml")
                        .value_name("PATH")
                        .help("Project configuration file (default: nearest stack.yaml)"),
                )
                .arg(
                    Arg::new("update_config")
                        .long("update-config")
                        .action(ArgAction::SetTrue)
                        .help("Write the new dependencies and flags into the project configuration"),
                )
                .arg(
                    Arg::new("solver_arg")
                        .long("solver-arg")
                        .value_name("ARG")
                        .action(ArgAction::Append)
                        .allow_hyphen_values(true)
                        .help("Extra argument passed to the solver (repeatable)"),
                )
                .arg(
                    Arg::new("solver")
                        .long("solver")
                        .value_name("PROGRAM")
                        .help("Solver executable to run instead of the configured one"),
                )
                .arg(
                    Arg::new("system_ghc")
                        .long("system-ghc")
                        .action(ArgAction::SetTrue)
                        .help("Use a compiler already on PATH when it matches the resolver"),
                )
                .arg(
                    Arg::new("no_install_ghc")
                        .long("no-install-ghc")
                        .action(ArgAction::SetTrue)
                        .help("Never install a missing compiler"),
                )
                .arg(
                    Arg::new("compiler_check")
                        .long("compiler-check")
                        .value_name("CHECK")
                        .value_parser(["match-minor", "match-exact", "newer-minor"])
                        .help("How closely a compiler must match"),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("depsolve.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
