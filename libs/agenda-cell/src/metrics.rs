//! Pure aggregation over a status-count table. No I/O, deterministic, and
//! every division is guarded: a zero denominator yields "0.00%", never an
//! error.

use std::cmp::Ordering;

use crate::models::{ConversionSummary, RankingEntry, StatusCountTable, SummaryMetrics};
use crate::taxonomy::{StatusBucket, StatusTaxonomy};

/// Two-decimal percentage string; "0.00%" when the denominator is zero.
pub fn percentage(numerator: u32, denominator: u32) -> String {
    if denominator == 0 {
        "0.00%".to_string()
    } else {
        format!("{:.2}%", numerator as f64 / denominator as f64 * 100.0)
    }
}

fn rate_value(entry: &RankingEntry) -> f64 {
    if entry.denominator == 0 {
        0.0
    } else {
        entry.numerator as f64 / entry.denominator as f64
    }
}

/// Descending by rate; `sort_by` is stable, so ties keep encounter order.
fn sort_descending(entries: &mut [RankingEntry]) {
    entries.sort_by(|a, b| {
        rate_value(b)
            .partial_cmp(&rate_value(a))
            .unwrap_or(Ordering::Equal)
    });
}

/// Headline metrics for the summary cards.
///
/// Confirmation is measured against occupied slots, not all slots: free
/// and blocked slots can never be confirmed. Blocked slots are not
/// bookable capacity either, so they count toward neither availability
/// nor the occupancy denominator.
pub fn compute_summary(table: &StatusCountTable, taxonomy: &StatusTaxonomy) -> SummaryMetrics {
    let mut occupied = 0u32;
    let mut confirmed = 0u32;
    let mut available = 0u32;

    for row in &table.rows {
        for (status_key, count) in &row.counts {
            match taxonomy.bucket(status_key) {
                StatusBucket::Blocked => {}
                StatusBucket::Free => available += count,
                bucket => {
                    available += count;
                    occupied += count;
                    if bucket == StatusBucket::Confirmed {
                        confirmed += count;
                    }
                }
            }
        }
    }

    SummaryMetrics {
        total_scheduled: occupied,
        total_confirmed: confirmed,
        confirmation_rate: percentage(confirmed, occupied),
        total_occupied: occupied,
        total_slots_available: available,
        occupancy_rate: percentage(occupied, available),
    }
}

/// Confirmation ranking: confirmed / occupied per professional.
pub fn rank_confirmation(table: &StatusCountTable, taxonomy: &StatusTaxonomy) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = table
        .rows
        .iter()
        .map(|row| {
            let mut confirmed = 0u32;
            let mut occupied = 0u32;
            for (status_key, count) in &row.counts {
                if taxonomy.is_occupied(status_key) {
                    occupied += count;
                }
                if taxonomy.is_confirmed(status_key) {
                    confirmed += count;
                }
            }
            RankingEntry {
                professional: row.professional.clone(),
                numerator: confirmed,
                denominator: occupied,
                rate: percentage(confirmed, occupied),
            }
        })
        .collect();

    sort_descending(&mut entries);
    entries
}

/// Occupancy ranking: occupied / total slots per professional.
pub fn rank_occupation(table: &StatusCountTable, taxonomy: &StatusTaxonomy) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = table
        .rows
        .iter()
        .map(|row| {
            let total = row.total();
            let occupied = row
                .counts
                .iter()
                .filter(|(status_key, _)| taxonomy.is_occupied(status_key))
                .map(|(_, count)| count)
                .sum();
            RankingEntry {
                professional: row.professional.clone(),
                numerator: occupied,
                denominator: total,
                rate: percentage(occupied, total),
            }
        })
        .collect();

    sort_descending(&mut entries);
    entries
}

/// Conversion ranking: attended visits over all bookings that existed.
///
/// The denominator is every occupied slot (attended + no-show + confirmed
/// + other occupied); free and blocked slots were never bookings and are
/// excluded entirely.
pub fn rank_conversion(table: &StatusCountTable, taxonomy: &StatusTaxonomy) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = table
        .rows
        .iter()
        .map(|row| {
            let (attended, valid) = conversion_counts_for_row(row.counts.iter(), taxonomy);
            RankingEntry {
                professional: row.professional.clone(),
                numerator: attended,
                denominator: valid,
                rate: percentage(attended, valid),
            }
        })
        .collect();

    sort_descending(&mut entries);
    entries
}

/// Global conversion rate as a ratio of sums, not an average of
/// per-professional rates: low-volume professionals must not skew the
/// clinic-wide number.
pub fn global_conversion_rate(
    table: &StatusCountTable,
    taxonomy: &StatusTaxonomy,
) -> ConversionSummary {
    let mut total_attended = 0u32;
    let mut total_valid = 0u32;

    for row in &table.rows {
        let (attended, valid) = conversion_counts_for_row(row.counts.iter(), taxonomy);
        total_attended += attended;
        total_valid += valid;
    }

    ConversionSummary {
        conversion_rate: percentage(total_attended, total_valid),
        total_attended,
        total_valid_bookings: total_valid,
    }
}

fn conversion_counts_for_row<'a>(
    counts: impl Iterator<Item = (&'a String, &'a u32)>,
    taxonomy: &StatusTaxonomy,
) -> (u32, u32) {
    let mut attended = 0u32;
    let mut valid = 0u32;

    for (status_key, count) in counts {
        match taxonomy.bucket(status_key) {
            StatusBucket::Attended => {
                attended += count;
                valid += count;
            }
            StatusBucket::NoShow | StatusBucket::Confirmed | StatusBucket::OtherOccupied => {
                valid += count;
            }
            StatusBucket::Free | StatusBucket::Blocked => {}
        }
    }

    (attended, valid)
}
