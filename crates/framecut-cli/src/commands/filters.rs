// crates/framecut-cli/src/commands/filters.rs

use console::style;

use framecut_core::filters;

use super::Outcome;

pub fn run() -> Outcome {
    println!("{}", style("Available filters").cyan().bold());
    println!("  {:<12} {}", style("none").dim(), style("No filter").dim());
    for f in filters::registered() {
        println!("  {:<12} {}", f.id().as_str(), f.label());
    }
    Outcome::Success
}
