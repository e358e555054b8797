//! List rules command implementation.

use sift_rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!(
        "{:<8} {:<24} {:<9} {:<14} Description",
        "Code", "Name", "Severity", "Maturity"
    );
    println!("{}", "-".repeat(96));

    for rule in all_rules() {
        println!(
            "{:<8} {:<24} {:<9} {:<14} {}",
            rule.code(),
            rule.name(),
            rule.default_severity(),
            format!("{}/{}", rule.maturity(), rule.category()),
            rule.description()
        );
        if !rule.alt_names().is_empty() {
            println!("{:<8} also: {}", "", rule.alt_names().join(", "));
        }
    }

    println!("\nPresets:");
    println!("  recommended  - SF001 on String, BigInteger, BigDecimal (default)");
    println!("  strict       - SF001 also on java.time value types");
    println!("  minimal      - SF001 reported as warnings (for gradual adoption)");

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  sift check --rules return-value-ignored");
    println!("  sift check --rules SF001");
}
