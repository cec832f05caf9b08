use leadboard::cli::{is_internal_error, run};

fn main() {
    // Best effort; only matters on legacy Windows consoles
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        if is_internal_error(&e) {
            eprintln!("Internal error: {}", e);
            let mut causes = e.chain().skip(1).peekable();
            if causes.peek().is_some() {
                eprintln!("\nCaused by:");
                for (indent, cause) in causes.enumerate() {
                    eprintln!("{:indent$}  {}", "", cause, indent = indent + 1);
                }
            }
            std::process::exit(2);
        } else {
            // User error
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
