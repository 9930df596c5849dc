//! Example page boot CLI.
//!
//! Boots the example site with the given entry and prints every module its
//! markup declared.
//!
//! # Usage
//!
//! ```bash
//! boot [entry] [--json]
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=lodestar_loader=debug boot admin
//! ```

use lodestar_core::{TracingFormat, TracingSetup};

#[expect(clippy::print_stdout, clippy::print_stderr, reason = "CLI output")]
fn main() {
    let mut entry = String::from("main");
    let mut format = TracingFormat::Compact;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => format = TracingFormat::Json,
            _ => entry = arg,
        }
    }

    TracingSetup::new().with_format(format).install();

    let report = match example::boot(&entry) {
        Ok(report) => report,
        Err(error) => {
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
    };

    for (id, location) in &report.discovered {
        println!("declared  {id} -> {location}");
    }
    for (id, value) in &report.modules {
        match value {
            Some(value) => println!("resolved  {id} = {value}"),
            None => println!("pending   {id}"),
        }
    }
    if report.pending > 0 {
        println!("{} definition(s) still waiting", report.pending);
    }
}
