//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - OpenQASM 2.0 tooling",
        style("qcirc").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qcirc-ir     Circuit intermediate representation");
    println!("  qcirc-qasm2  OpenQASM 2.0 loader and emitter");
    println!("  qcirc-cli    Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
