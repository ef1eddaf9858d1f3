use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;

use crate::schedule::{
    ContentKind, NotFittedAdvert, NotFittedReason, PlaylistGeneratorResult,
    PlaylistGeneratorStatus, ScheduledItem,
};

/// Formats one playlist line as: HH:MM:SS kind id (length s, volume %)
pub fn format_item(item: &ScheduledItem) -> String {
    let kind = match item.kind {
        ContentKind::Music => "music ",
        ContentKind::Advert => "advert",
    };
    format!(
        "{} {} {:>6} ({} s, volume {})",
        item.start.format("%H:%M:%S"),
        kind,
        item.content_id,
        item.length_secs,
        item.volume
    )
}

fn format_not_fitted(entry: &NotFittedAdvert) -> String {
    let reason = match entry.reason {
        NotFittedReason::Capacity => "over capacity",
        NotFittedReason::Spacing => "repeat gap too long",
        NotFittedReason::Placement => "no legal slot",
    };
    format!(
        "advert {} ({} s) x{}: {}",
        entry.advert_id, entry.length_secs, entry.count, reason
    )
}

/// Writes a result as text: header, one item per line, then not-fitted adverts
pub fn write_result<W: Write>(
    out: &mut W,
    object_id: i64,
    date: NaiveDate,
    result: &PlaylistGeneratorResult,
) -> std::io::Result<()> {
    writeln!(out, "** Object {} - {} **", object_id, date)?;

    match (&result.status, &result.playlist) {
        (PlaylistGeneratorStatus::Delete, _) => writeln!(out, "[NOT OPEN]")?,
        (_, None) => writeln!(out, "[EMPTY]")?,
        (_, Some(playlist)) => {
            for item in &playlist.items {
                writeln!(out, "{}", format_item(item))?;
            }
            if playlist.overloaded {
                writeln!(out, "[OVERLOADED]")?;
            }
        }
    }

    for entry in &result.not_fitted {
        writeln!(out, "NOT FITTED {}", format_not_fitted(entry))?;
    }
    Ok(())
}

/// Writes results of consecutive days to a text file
pub fn write_results_to_file(
    object_id: i64,
    results: &[(NaiveDate, PlaylistGeneratorResult)],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut file = BufWriter::new(File::create(path)?);
    for (date, result) in results {
        write_result(&mut file, object_id, *date, result)?;
        writeln!(file)?;
    }
    file.flush()?;
    Ok(())
}

/// Writes results as pretty-printed JSON
pub fn write_results_json(
    results: &[(NaiveDate, PlaylistGeneratorResult)],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, results)?;
    Ok(())
}

/// Prints a result in a readable format
pub fn print_playlist_result(
    object_id: i64,
    date: NaiveDate,
    result: &PlaylistGeneratorResult,
    verbose: bool,
) {
    println!("\n=== Object {} on {} ({}) ===", object_id, date, date.format("%A"));

    match result.status {
        PlaylistGeneratorStatus::Delete => println!("Not an operating day, playlist retracted"),
        PlaylistGeneratorStatus::NotGenerated => println!("Nothing could be scheduled"),
        PlaylistGeneratorStatus::Generated => {}
    }

    if let Some(playlist) = &result.playlist {
        println!(
            "Items: {} ({} music, {} adverts), {} s of content{}",
            playlist.items.len(),
            playlist.count_of(ContentKind::Music),
            playlist.count_of(ContentKind::Advert),
            playlist.total_secs(),
            if playlist.overloaded { ", OVERLOADED" } else { "" }
        );
        for item in &playlist.items {
            println!("  {}", format_item(item));
        }
    }

    if !result.not_fitted.is_empty() {
        println!("⚠️  Advert repeats not fitted ({}):", result.not_fitted_count());
        for entry in &result.not_fitted {
            println!("  - {}", format_not_fitted(entry));
        }
    }

    if verbose {
        println!("\nGenerator log:");
        for line in &result.debug_info {
            println!("  {}", line);
        }
    }
}
