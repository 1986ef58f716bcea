//! Terminal rendering for DynaRAG records
//!
//! Every function returns a `String` so callers decide where it goes.

use colored::*;
use dynarag_core::{Chunk, DeletionStats, SimilarChunk, UsageStats};

const PREVIEW_CHARS: usize = 72;

pub const NO_CHUNKS: &str = "No chunks stored";

pub fn render_added(filepath: &str, bytes: usize) -> String {
    format!(
        "{} Added {} from {}",
        "✓".green(),
        format_bytes(bytes as u64),
        filepath.bold()
    )
}

pub fn render_similar(results: Option<&[SimilarChunk]>) -> String {
    let Some(results) = results else {
        return NO_CHUNKS.dimmed().to_string();
    };

    let mut out = format!("{}\n", plural(results.len(), "similar chunk").bold());
    for (rank, chunk) in results.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. [{}] {} (chunk {}, doc {})\n",
            rank + 1,
            format!("{:.3}", chunk.similarity).cyan(),
            chunk.file_path.bold(),
            chunk.id,
            chunk.document_id
        ));
        out.push_str(&format!("     {}\n", preview(&chunk.chunk_text, PREVIEW_CHARS)));
    }
    out.trim_end().to_string()
}

pub fn render_chunks(chunks: Option<&[Chunk]>) -> String {
    let Some(chunks) = chunks else {
        return NO_CHUNKS.dimmed().to_string();
    };

    let mut out = format!("{}\n", plural(chunks.len(), "chunk").bold());
    for chunk in chunks {
        out.push_str(&format!(
            "  #{} {}  size {}  {}  {}\n",
            chunk.id,
            chunk.file_path.bold(),
            chunk.chunk_size,
            chunk.model_name.dimmed(),
            chunk.created_at.dimmed()
        ));
        out.push_str(&format!("     {}\n", preview(&chunk.chunk_text, PREVIEW_CHARS)));
    }
    out.trim_end().to_string()
}

pub fn render_deletion(stats: &DeletionStats, dry_run: bool) -> String {
    if stats.is_empty() {
        return "Nothing to delete".dimmed().to_string();
    }

    let verb = if dry_run { "Would delete" } else { "Deleted" };
    let mut out = format!(
        "{} {} from {}",
        if dry_run { verb.yellow() } else { verb.red() },
        plural(stats.embedding_count as usize, "embedding"),
        plural(stats.document_count as usize, "document")
    );
    for path in &stats.file_paths {
        out.push_str(&format!("\n  - {}", path));
    }
    out
}

pub fn render_stats(stats: &UsageStats) -> String {
    let rows = [
        ("Documents", stats.document_count.to_string()),
        ("Chunks", stats.chunk_count.to_string()),
        ("Stored", format_bytes(stats.total_bytes)),
        ("API requests", stats.api_requests.to_string()),
    ];

    let mut out = "Usage".bold().to_string();
    for (label, value) in rows {
        out.push_str(&format!("\n  {:<14}{}", format!("{}:", label), value));
    }
    out
}

pub fn render_answer(answer: &str) -> String {
    answer.trim().to_string()
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// First `max` characters of `text` on one line.
pub fn preview(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
