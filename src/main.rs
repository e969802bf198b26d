//! Command-line driver: compile one source file to an assembly file, and
//! optionally hand the result to gcc for assembly and linking.

use clap::Parser;
use std::path::PathBuf;
use std::process::{Command, exit};

// Distinct exit codes so scripts can tell stages apart.
const EXIT_FILE: i32 = 2;
const EXIT_COMPILE: i32 = 3;
const EXIT_LINK: i32 = 4;

#[derive(Parser, Debug)]
#[command(version, about = "Compile a source file to x86-32 assembly")]
struct Args {
  /// Source file to compile
  file: PathBuf,

  /// Output path for the generated assembly (defaults to the input path
  /// with an `.s` extension)
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Assemble and link the output with `gcc -m32`
  #[arg(long)]
  gcc: bool,
}

fn main() {
  let args = Args::parse();

  let source = match std::fs::read_to_string(&args.file) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("cannot read {}: {err}", args.file.display());
      exit(EXIT_FILE);
    }
  };

  let asm = match emberc::compile(&source) {
    Ok(asm) => asm,
    Err(err) => {
      eprintln!("{err}");
      exit(EXIT_COMPILE);
    }
  };

  let asm_path = args
    .output
    .unwrap_or_else(|| args.file.with_extension("s"));
  if let Err(err) = std::fs::write(&asm_path, asm) {
    eprintln!("cannot write {}: {err}", asm_path.display());
    exit(EXIT_FILE);
  }
  println!("{}", asm_path.display());

  if args.gcc {
    let exe_path = asm_path.with_extension("");
    let status = Command::new("gcc")
      .arg("-m32")
      .arg(&asm_path)
      .arg("-o")
      .arg(&exe_path)
      .status();
    match status {
      Ok(status) if status.success() => {}
      Ok(status) => {
        eprintln!("gcc exited with {status}");
        exit(EXIT_LINK);
      }
      Err(err) => {
        eprintln!("cannot run gcc: {err}");
        exit(EXIT_LINK);
      }
    }
  }
}
