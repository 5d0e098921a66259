use crate::compile::CompiledTree;
use crate::deploy::{OutputSink, Target};
use crossterm::style::Stylize;
use std::io::Write;

/// Relays remote output to the local terminal: stdout lines green, stderr
/// lines red, both on the local stdout so ordering follows arrival.
pub struct TerminalSink;

impl OutputSink for TerminalSink {
    fn stdout_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line.green());
    }

    fn stderr_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line.red());
    }
}

pub fn print_deploy_banner(target: &Target, role: Option<&str>) {
    println!("{}", "doing deploy".green().bold());
    println!(" {}  {}", "user".green().bold(), target.user);
    println!(" {}  {}", "host".green().bold(), target.host);
    println!(" {}  {}", "port".green().bold(), target.port);
    println!(" {}  {}", "role".green().bold(), role.unwrap_or("-"));
}

pub fn print_compiled(tree: &CompiledTree) {
    println!(
        "{} {} ({} files, {:?} mode)",
        "compiled".green().bold(),
        tree.root.display(),
        tree.files_written,
        tree.mode
    );
}

pub fn print_created(path: &std::path::Path, created: bool) {
    if created {
        println!("      {}  {}", "create".green().bold(), path.display());
    } else {
        println!("      {}  {}", "exist".yellow().bold(), path.display());
    }
}

/// Single-line error report for the top level.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}
