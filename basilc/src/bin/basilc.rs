//! The `basilc` command-line driver: the only place in this workspace
//! allowed to print. Reads a source file (or `-` for a REPL over stdin),
//! runs it through the pipeline, and writes the resulting assembly to
//! `-o PATH` or stdout.

use basilc::pipeline;
use basilc::CompileSession;
use basilc_syntax::parse;
use rustyline::DefaultEditor;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

struct Args {
    path: Option<String>,
    output: Option<String>,
    silent: bool,
    stop_lex: bool,
    stop_parse: bool,
    stop_ast: bool,
    stop_ir: bool,
}

impl Args {
    fn parse(argv: &[String]) -> Result<Self, String> {
        let mut args = Args {
            path: None,
            output: None,
            silent: false,
            stop_lex: false,
            stop_parse: false,
            stop_ast: false,
            stop_ir: false,
        };
        let mut iter = argv.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-o" => {
                    args.output = Some(iter.next().ok_or("-o requires a path")?.clone());
                }
                "-silent" => args.silent = true,
                "-lex" => args.stop_lex = true,
                "-parse" => args.stop_parse = true,
                "-ast" => args.stop_ast = true,
                "-ir" => args.stop_ir = true,
                other => {
                    if args.path.is_some() {
                        return Err(format!("unexpected extra argument {other:?}"));
                    }
                    args.path = Some(other.to_string());
                }
            }
        }
        Ok(args)
    }
}

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match Args::parse(&argv) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("basilc: {e}");
            return ExitCode::from(1);
        }
    };

    match args.path.as_deref() {
        Some("-") | None => run_repl(&args),
        Some(path) => run_file(path, &args),
    }
}

fn run_file(path: &str, args: &Args) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("basilc: cannot read {path}: {e}");
            return ExitCode::from(1);
        }
    };
    let code = compile_one(&source, args);
    ExitCode::from(code.min(255) as u8)
}

fn run_repl(args: &Args) -> ExitCode {
    let mut editor = match DefaultEditor::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("basilc: failed to start REPL: {e}");
            return ExitCode::from(1);
        }
    };
    let mut total = 0u32;
    loop {
        match editor.readline("basilc> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "exit" || trimmed == "quit" {
                    break;
                }
                let _ = editor.add_history_entry(trimmed);
                total += compile_one(trimmed, args);
            }
            Err(_) => break,
        }
    }
    ExitCode::from(total.min(255) as u8)
}

fn compile_one(source: &str, args: &Args) -> u32 {
    let term = match parse(source) {
        Ok(t) => t,
        Err(e) => {
            if !args.silent {
                eprintln!("basilc: parse error: {e}");
            }
            return 1;
        }
    };
    if args.stop_lex || args.stop_parse || args.stop_ast {
        if !args.silent {
            println!("{term:#?}");
        }
        return 0;
    }

    let mut session = CompileSession::new();
    let output = pipeline::run(&term, &mut session);

    if !args.silent {
        for error in session.errors.errors() {
            eprintln!("{error}");
        }
    }

    if args.stop_ir {
        if !args.silent {
            println!("{:#?}", output.root);
        }
        return output.error_count as u32;
    }

    match &args.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &output.assembly) {
                eprintln!("basilc: cannot write {path}: {e}");
                return output.error_count as u32 + 1;
            }
        }
        None => {
            if !args.silent {
                let _ = io::stdout().write_all(output.assembly.as_bytes());
            }
        }
    }

    output.error_count as u32
}
