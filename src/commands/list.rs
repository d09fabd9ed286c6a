//! List commands

use crate::backends::available_backends;

/// List the backends compiled into this binary
pub fn list_backends() {
    let backends = available_backends();
    if backends.is_empty() {
        println!("No backends enabled (rebuild with --features dummy or linux-gpio)");
        return;
    }

    println!("Available backends:");
    println!();
    for backend in &backends {
        println!("  {:<12} {}", backend.name, backend.description);
        if !backend.aliases.is_empty() {
            println!("  {:<12} aliases: {}", "", backend.aliases.join(", "));
        }
    }
}
