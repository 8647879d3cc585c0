use std::process::exit;

use clap::Parser;

use spendtrack::fibonacci;

/// Calculate the n'th number of the fibonacci sequence.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Position in the sequence, starting at 1.
    #[arg(allow_negative_numbers = true)]
    number: i64,
}

fn main() {
    let args = Args::parse();

    match fibonacci::nth(args.number) {
        Ok(value) => println!(
            "Successfully calculated {}'th number of fibonacci sequence:\n{value}",
            args.number
        ),
        Err(e) => {
            eprintln!("{e}");
            exit(-1);
        }
    }
}
