//! Simple command that prints one or '-n count' identifiers, or versions with '-v'

use std::{env, io, io::Write, process::ExitCode};

#[derive(Default)]
struct Options {
    count: Option<usize>,
    versions: bool,
}

fn main() -> io::Result<ExitCode> {
    let opts = {
        let mut args = env::args();
        let program = args.next();
        match parse_args(args) {
            Ok(opts) => opts,
            Err(message) => {
                eprintln!("Error: {message}");
                eprintln!(
                    "Usage: {} [-v] [-n count]",
                    program.as_deref().unwrap_or("sortid")
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    let mut buf = io::BufWriter::new(io::stdout());
    for _ in 0..opts.count.unwrap_or(1) {
        if opts.versions {
            writeln!(buf, "{}", sortid::new_version())?;
        } else {
            writeln!(buf, "{}", sortid::new_id())?;
        }
    }
    buf.flush()?;

    Ok(ExitCode::SUCCESS)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut opts = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" => opts.versions = true,
            "-n" => {
                if opts.count.is_some() {
                    return Err("option 'n' given more than once".to_owned());
                }
                let Some(n_arg) = args.next() else {
                    return Err("argument to option 'n' missing".to_owned());
                };
                let Ok(c) = n_arg.parse() else {
                    return Err(format!("invalid argument to option 'n': '{n_arg}'"));
                };
                opts.count = Some(c);
            }
            _ => return Err(format!("unrecognized argument '{arg}'")),
        }
    }
    Ok(opts)
}
