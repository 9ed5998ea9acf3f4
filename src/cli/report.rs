use crate::analysis::{format_bytes, format_duration, format_timestamp, Metrics};
use crate::render::{render_piece_map, render_root, RenderConfig};
use crate::resume::{Limit, Priority, Resume};
use std::io::{self, Write};

const RULE: &str = "================================================================================";

fn section<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    writeln!(out, "\n{}", RULE)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", RULE)
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn rate(limit: Limit) -> String {
    match limit {
        Limit::Unlimited => "unlimited".to_string(),
        Limit::Limited(n) => format!("{}/s", format_bytes(n as i64)),
    }
}

fn cap(limit: Limit) -> String {
    match limit {
        Limit::Unlimited => "unlimited".to_string(),
        Limit::Limited(n) => n.to_string(),
    }
}

/// Numbered entries, at most `limit` of them followed by a count of the rest
fn write_text_list<W: Write>(
    out: &mut W,
    title: &str,
    items: &[String],
    limit: Option<usize>,
) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let shown = limit.unwrap_or(items.len());

    writeln!(out, "\n{} ({}):", title, items.len())?;
    for (i, item) in items.iter().take(shown).enumerate() {
        writeln!(out, "  {}: {}", i, item)?;
    }
    if items.len() > shown {
        writeln!(out, "  ... {} more", items.len() - shown)?;
    }
    Ok(())
}

fn write_progress<W: Write>(
    out: &mut W,
    metrics: &Metrics,
    config: &RenderConfig,
) -> io::Result<()> {
    if metrics.pieces.total > 0 {
        writeln!(
            out,
            "Completed pieces: {}/{} ({:.2}%)",
            metrics.pieces.completed, metrics.pieces.total, metrics.pieces.percentage
        )?;
        if metrics.pieces_raw.total != metrics.pieces.total {
            writeln!(
                out,
                "Bitfield bits set: {}/{} (padding included)",
                metrics.pieces_raw.completed, metrics.pieces_raw.total
            )?;
        }
        if let Some(map) = render_piece_map(&metrics.piece_bits, config) {
            writeln!(out, "Piece map: {}", map)?;
        }
    }

    if !metrics.piece_priorities.is_empty() {
        writeln!(out, "\nPiece priorities:")?;
        for (value, priority, count) in metrics.piece_priorities.iter() {
            writeln!(out, "  priority {} ({}): {} pieces", value, priority, count)?;
        }
    }

    if metrics.verified.total > 0 {
        writeln!(
            out,
            "\nVerified pieces: {}/{} ({:.2}%)",
            metrics.verified.completed, metrics.verified.total, metrics.verified.percentage
        )?;
    }

    if !metrics.unfinished.is_empty() {
        writeln!(out, "\nUnfinished pieces: {}", metrics.unfinished.len())?;
        for progress in &metrics.unfinished {
            if progress.has_bitmask() {
                writeln!(
                    out,
                    "\n  Piece {}: ({:.1}% done, {:.1}% remaining)",
                    progress.piece,
                    progress.blocks.percentage,
                    progress.blocks.remaining_percentage()
                )?;
                writeln!(
                    out,
                    "    Blocks: {}/{}",
                    progress.blocks.completed, progress.blocks.total
                )?;
                writeln!(out, "    Bitmask: {}", progress.bitmap())?;
            } else {
                writeln!(out, "\n  Piece {}:", progress.piece)?;
            }
            if let Some(adler32) = progress.adler32 {
                writeln!(out, "    Adler32: {}", adler32)?;
            }
        }
    }

    Ok(())
}

/// Write the human-readable analysis of one resume file
pub fn write_report<W: Write>(
    out: &mut W,
    resume: &Resume,
    metrics: &Metrics,
    config: &RenderConfig,
    all_fields: bool,
) -> io::Result<()> {
    let record = &resume.record;

    section(out, "Basic information")?;
    writeln!(out, "File format: {}", record.file_format)?;
    writeln!(out, "File version: {}", record.file_version)?;
    if let Some(hash) = record.info_hash_hex() {
        writeln!(out, "Info hash (v1): {}", hash)?;
    }
    if let Some(hash) = record.info_hash_v2_hex() {
        writeln!(out, "Info hash (v2): {}", hash)?;
    }
    if !record.name.is_empty() {
        writeln!(out, "Name: {}", record.name)?;
    }
    if !record.save_path.is_empty() {
        writeln!(out, "Save path: {}", record.save_path)?;
    }

    section(out, "Download progress")?;
    write_progress(out, metrics, config)?;

    section(out, "Trackers")?;
    writeln!(out, "Tiers: {}", record.trackers.len())?;
    for (tier, urls) in record.trackers.iter().enumerate() {
        writeln!(out, "\nTier {}:", tier)?;
        for url in urls {
            writeln!(out, "  - {}", url)?;
        }
    }
    // Printed in full; the field listing only counts them
    for (title, key) in [
        ("Web seeds", "url-list"),
        ("HTTP seeds", "httpseeds"),
        ("Tags", "qBt-tags"),
    ] {
        let items: Vec<String> = resume
            .root
            .dict_get(key.as_bytes())
            .and_then(|v| v.as_list())
            .map(|l| l.iter().map(|v| v.to_text_lossy()).collect())
            .unwrap_or_default();
        write_text_list(out, title, &items, None)?;
    }

    section(out, "Files")?;
    if !metrics.file_priorities.is_empty() {
        writeln!(out, "File count: {}", metrics.file_priorities.len())?;
        for (i, (priority, raw)) in metrics
            .file_priorities
            .iter()
            .zip(&record.file_priority)
            .take(config.file_list_max)
            .enumerate()
        {
            writeln!(out, "  file {}: priority {} ({})", i, priority, raw)?;
        }
        if metrics.file_priorities.len() > config.file_list_max {
            writeln!(
                out,
                "  ... {} more files",
                metrics.file_priorities.len() - config.file_list_max
            )?;
        }
        let skipped = metrics
            .file_priorities
            .iter()
            .filter(|&&p| p == Priority::Skip)
            .count();
        if skipped > 0 {
            writeln!(out, "  {} files not downloaded", skipped)?;
        }
    }
    write_text_list(
        out,
        "Renamed files",
        &record.mapped_files,
        Some(config.file_list_max),
    )?;

    section(out, "Statistics")?;
    let counters = &record.counters;
    writeln!(out, "Uploaded: {}", format_bytes(counters.total_uploaded))?;
    writeln!(out, "Downloaded: {}", format_bytes(counters.total_downloaded))?;
    if let Some(ratio) = metrics.share_ratio {
        writeln!(out, "Share ratio: {:.3}", ratio)?;
    }
    writeln!(out, "Active time: {}", format_duration(counters.active_time))?;
    writeln!(out, "Seeding time: {}", format_duration(counters.seeding_time))?;
    writeln!(out, "Finished time: {}", format_duration(counters.finished_time))?;
    writeln!(out, "Added: {}", format_timestamp(counters.added_time))?;
    writeln!(out, "Completed: {}", format_timestamp(counters.completed_time))?;
    writeln!(
        out,
        "Last seen complete: {}",
        format_timestamp(counters.last_seen_complete)
    )?;

    section(out, "Flags")?;
    let flags = &record.flags;
    writeln!(out, "Auto managed: {}", yes_no(flags.auto_managed))?;
    writeln!(out, "Paused: {}", yes_no(flags.paused))?;
    writeln!(out, "Sequential download: {}", yes_no(flags.sequential_download))?;
    writeln!(out, "Seed mode: {}", yes_no(flags.seed_mode))?;
    writeln!(out, "Super seeding: {}", yes_no(flags.super_seeding))?;
    writeln!(out, "\nUpload limit: {}", rate(record.limits.upload_rate))?;
    writeln!(out, "Download limit: {}", rate(record.limits.download_rate))?;
    writeln!(out, "Max connections: {}", cap(record.limits.max_connections))?;
    writeln!(out, "Max uploads: {}", cap(record.limits.max_uploads))?;

    section(out, "Peers")?;
    for (title, list) in [
        ("Known IPv4 peers", &record.peers),
        ("Known IPv6 peers", &record.peers6),
        ("Banned peers", &record.banned_peers),
    ] {
        if list.is_empty() {
            continue;
        }
        writeln!(out, "{}: {}", title, list.len())?;
        for addr in list.endpoints.iter().take(config.list_expand_max) {
            writeln!(out, "  - {}", addr)?;
        }
    }
    if let Some(n) = record.swarm.num_complete {
        writeln!(out, "Seeds: {}", n)?;
    }
    if let Some(n) = record.swarm.num_incomplete {
        writeln!(out, "Leechers: {}", n)?;
    }
    if let Some(n) = record.swarm.num_downloaded {
        writeln!(out, "Times downloaded: {}", n)?;
    }

    if !record.anomalies.is_empty() {
        section(out, "Warnings")?;
        for anomaly in &record.anomalies {
            writeln!(out, "!! {}", anomaly)?;
        }
    }

    if all_fields {
        section(out, "All fields")?;
        writeln!(out, "{}", render_root(&resume.root, config))?;
    }

    writeln!(out, "\n{}", RULE)
}
