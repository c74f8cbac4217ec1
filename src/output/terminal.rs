// Colored terminal output for the frequency report and cluster table.
//
// main.rs display calls delegate here.

use colored::Colorize;

use crate::clustering::ClusterReport;
use crate::names::collector::CollectStats;
use crate::names::frequency::NameFrequencyTable;

/// Display the most frequent names.
pub fn display_top_names(table: &NameFrequencyTable, top_n: usize) {
    if table.is_empty() {
        println!("No person names found.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Top {} names ({} distinct, {} total) ===",
            top_n.min(table.len()),
            table.len(),
            table.total()
        )
        .bold()
    );
    println!();
    println!("  {:>4}  {:<40} {:>6}", "Rank".dimmed(), "Name".dimmed(), "Count".dimmed());
    println!("  {}", "-".repeat(54).dimmed());

    for (i, (name, count)) in table.top_n(top_n).iter().enumerate() {
        println!(
            "  {:>4}. {:<40} {:>6}",
            i + 1,
            super::truncate_chars(name, 40),
            count
        );
    }
}

/// Display the TF-IDF vocabulary and matrix shape.
pub fn display_vocabulary(report: &ClusterReport) {
    println!(
        "\n{}",
        format!(
            "=== Features ({} names x {} terms) ===",
            report.shape.0, report.shape.1
        )
        .bold()
    );
    println!("  {}", report.vocabulary.join(", ").dimmed());
}

/// Display every distinct name with its cluster id, grouped by cluster.
pub fn display_clusters(report: &ClusterReport) {
    let assignment = &report.assignment;
    println!(
        "\n{}",
        format!(
            "=== Name clusters (k = {}, inertia {:.3}) ===",
            assignment.k, report.inertia
        )
        .bold()
    );

    for id in 0..assignment.k {
        let members = assignment.members(id);
        println!();
        println!(
            "  {} {}",
            format!("Cluster {id}").cyan().bold(),
            format!("({} names)", members.len()).dimmed()
        );
        for name in members {
            println!("    {name}");
        }
    }
}

/// One-line summary of what happened to the URLs.
pub fn display_stats(urls: usize, stats: &CollectStats) {
    let failed = if stats.failed > 0 {
        stats.failed.to_string().yellow().to_string()
    } else {
        stats.failed.to_string()
    };
    println!(
        "\nPages: {} total, {} processed, {} excluded, {} failed",
        urls, stats.processed, stats.excluded, failed
    );
}
