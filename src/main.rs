use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;

use structopt::StructOpt;

use emberc::common::source::SourceFile;
use emberc::compiler::{gen, lex::Lexer, parse::parse, typecheck::typecheck};

mod host_error;
mod status;

use host_error::HostError;
use status::Status;

#[derive(StructOpt, Debug)]
#[structopt(name = "emberc", about = "A single-file source-to-C translator.")]
struct Opt {
    /// Source file to compile.
    #[structopt(name = "FILE")]
    file: PathBuf,

    /// Output path. Defaults to `a.out`, or `a.c` when `-S` is given.
    #[structopt(short = "o", long = "output")]
    output: Option<PathBuf>,

    /// Dump lexed tokens to stderr.
    #[structopt(short = "t", long = "dump-tokens")]
    dump_tokens: bool,

    /// Dump the parsed expression tree to stderr.
    #[structopt(short = "e", long = "dump-expressions")]
    dump_expressions: bool,

    /// Write generated C to the output path instead of invoking the C
    /// compiler.
    #[structopt(short = "S", long = "export-generated-source")]
    export_generated_source: bool,
}

fn default_output(opt: &Opt) -> PathBuf {
    if let Some(output) = &opt.output {
        return output.clone();
    }
    if opt.export_generated_source {
        PathBuf::from("a.c")
    } else {
        PathBuf::from("a.out")
    }
}

fn run(opt: Opt) -> Result<(), String> {
    let source = SourceFile::from_path(&opt.file).map_err(|source| {
        HostError::ReadSource { path: opt.file.clone(), source }.to_string()
    })?;

    let tokens = Lexer::lex(source.clone()).map_err(|e| e.to_string())?;
    if opt.dump_tokens {
        eprintln!("{:#?}", tokens);
    }

    let parsed = parse(source.clone(), tokens).map_err(|e| e.to_string())?;
    if opt.dump_expressions {
        eprintln!("{:#?}", parsed);
    }

    let typechecked = typecheck(parsed).map_err(|e| e.to_string())?;
    let generated = gen::generate(&typechecked).map_err(|e| HostError::WriteGenerated(e).to_string())?;

    let output = default_output(&opt);

    if opt.export_generated_source {
        std::fs::write(&output, &generated)
            .map_err(|source| HostError::WriteOutput { path: output.clone(), source }.to_string())?;
        Status::info().log(&format!("wrote generated C source to {}", output.display()));
        return Ok(());
    }

    let mut tmp = tempfile::Builder::new()
        .suffix(".c")
        .tempfile()
        .map_err(|e| HostError::TempFile(e).to_string())?;
    tmp.write_all(&generated).map_err(|e| HostError::WriteGenerated(e).to_string())?;

    let cc = std::env::var("CC").unwrap_or_else(|_| "clang".to_string());
    let status = Command::new(&cc)
        .arg("-Wno-duplicate-decl-specifier")
        .arg("-o")
        .arg(&output)
        .arg(tmp.path())
        .status()
        .map_err(|source| HostError::Invoke { command: cc.clone(), source }.to_string())?;

    if !status.success() {
        return Err(HostError::CompilerFailed { command: cc, status }.to_string());
    }

    Status::info().log(&format!("wrote {}", output.display()));
    Ok(())
}

fn main() {
    env_logger::init();
    let opt = Opt::from_args();

    if let Err(message) = run(opt) {
        Status::fatal().log(&message);
        std::process::exit(1);
    }
}
