//! Plain-text dashboard view of a generated artifact.
//!
//! Mirrors what the static dashboard shows: headline total and the top
//! entries of each dataset.

use crate::models::{AggregatedDataset, OutputDocument};

/// Default number of entries shown per dataset.
pub const DEFAULT_TOP: usize = 10;

/// Render the dashboard view.
pub fn render_dashboard(document: &OutputDocument, top: usize) -> String {
    let mut output = String::new();

    output.push_str("Dashboard\n");
    output.push_str(&format!(
        "Updated: {}\n",
        document.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Total contacts: {}\n", document.totals.contacts));

    let datasets = &document.datasets;
    output.push_str(&render_section(
        "Per list",
        &datasets.per_lista_ids,
        top,
        |label| format!("Lista {}", label),
    ));
    output.push_str(&render_section(
        "Institutions",
        &datasets.distribuzione_atenei,
        top,
        str::to_string,
    ));
    output.push_str(&render_section(
        "Courses",
        &datasets.distribuzione_corsi,
        top,
        str::to_string,
    ));
    output.push_str(&render_section(
        "Birth years",
        &datasets.distribuzione_anno_nascita,
        top,
        str::to_string,
    ));

    output
}

fn render_section<F>(title: &str, dataset: &AggregatedDataset, top: usize, label: F) -> String
where
    F: Fn(&str) -> String,
{
    let mut section = format!("\n{} (top {})\n", title, top);

    if dataset.is_empty() {
        section.push_str("  (no data)\n");
        return section;
    }

    for (rank, item) in dataset.items().iter().take(top).enumerate() {
        section.push_str(&format!(
            "  {:>2}. {}: {}\n",
            rank + 1,
            label(item.label.as_str()),
            item.count
        ));
    }

    section
}
