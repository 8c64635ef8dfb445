use agenda_cell::metrics::{
    compute_summary, global_conversion_rate, rank_confirmation, rank_conversion, rank_occupation,
};
use agenda_cell::models::{EffectiveStatus, Slot, StatusCountTable};
use agenda_cell::taxonomy::{StatusBucket, StatusTaxonomy};

fn table_from(rows: &[(&str, &[(&str, u32)])]) -> StatusCountTable {
    let mut table = StatusCountTable::default();
    for (professional, counts) in rows {
        for (status, count) in *counts {
            for _ in 0..*count {
                table.increment(professional, status.to_string());
            }
        }
    }
    table
}

fn slot(status: &str, appointment_status: Option<&str>, is_fit_in: bool) -> Slot {
    Slot {
        hour: "08:00".to_string(),
        numeric_hour: 8.0,
        status: status.to_string(),
        appointment_status: appointment_status.map(|s| s.to_string()),
        is_fit_in,
        patient_id: None,
        appointment_id: None,
    }
}

#[test]
fn summary_for_mixed_day() {
    let table = table_from(&[(
        "Dr. A",
        &[
            ("Livre", 5),
            ("Bloqueado", 1),
            ("Agendado", 2),
            ("Marcado - confirmado", 1),
            ("Atendido", 1),
        ],
    )]);

    let summary = compute_summary(&table, &StatusTaxonomy::default());

    assert_eq!(summary.total_occupied, 4);
    assert_eq!(summary.total_slots_available, 9);
    assert_eq!(summary.total_confirmed, 1);
    assert_eq!(summary.total_scheduled, 4);
    assert_eq!(summary.confirmation_rate, "25.00%");
    assert_eq!(summary.occupancy_rate, "44.44%");
}

#[test]
fn blocked_slots_do_not_count_as_available() {
    let table = table_from(&[(
        "Dr. A",
        &[("Livre", 4), ("Bloqueado", 3), ("Agendado", 3)],
    )]);

    let summary = compute_summary(&table, &StatusTaxonomy::default());

    // Blocked slots were never bookable; only 7 of the 10 slots count.
    assert_eq!(summary.total_slots_available, 7);
    assert_eq!(summary.total_occupied, 3);
    assert_eq!(summary.occupancy_rate, "42.86%");
}

#[test]
fn summary_for_all_free_professional() {
    let table = table_from(&[("Dr. B", &[("Livre", 10)])]);
    let taxonomy = StatusTaxonomy::default();

    let summary = compute_summary(&table, &taxonomy);
    assert_eq!(summary.total_occupied, 0);
    assert_eq!(summary.total_confirmed, 0);
    assert_eq!(summary.confirmation_rate, "0.00%");
    assert_eq!(summary.occupancy_rate, "0.00%");

    // Zero-denominator professionals still rank, at 0.00%, without error.
    let conversion = rank_conversion(&table, &taxonomy);
    assert_eq!(conversion.len(), 1);
    assert_eq!(conversion[0].professional, "Dr. B");
    assert_eq!(conversion[0].denominator, 0);
    assert_eq!(conversion[0].rate, "0.00%");

    let confirmation = rank_confirmation(&table, &taxonomy);
    assert_eq!(confirmation[0].rate, "0.00%");
}

#[test]
fn empty_table_yields_zeroes_not_errors() {
    let table = StatusCountTable::default();
    let taxonomy = StatusTaxonomy::default();

    let summary = compute_summary(&table, &taxonomy);
    assert_eq!(summary.total_slots_available, 0);
    assert_eq!(summary.occupancy_rate, "0.00%");

    assert!(rank_confirmation(&table, &taxonomy).is_empty());
    assert!(rank_occupation(&table, &taxonomy).is_empty());
    assert!(rank_conversion(&table, &taxonomy).is_empty());

    let conversion = global_conversion_rate(&table, &taxonomy);
    assert_eq!(conversion.conversion_rate, "0.00%");
    assert_eq!(conversion.total_attended, 0);
}

#[test]
fn bucket_containment_holds() {
    let tables = [
        table_from(&[(
            "Dr. A",
            &[("Livre", 3), ("Marcado - confirmado", 2), ("Agendado", 4)],
        )]),
        table_from(&[
            ("Dr. A", &[("Atendido", 2), ("Bloqueado", 5)]),
            ("Dr. B", &[("Marcado - confirmado", 7)]),
        ]),
    ];

    for table in &tables {
        let summary = compute_summary(table, &StatusTaxonomy::default());
        assert!(summary.total_confirmed <= summary.total_occupied);
        assert!(summary.total_occupied <= summary.total_slots_available);
    }
}

#[test]
fn effective_status_key_composition() {
    let plain = slot("Agendado", None, false);
    assert_eq!(EffectiveStatus::from_slot(&plain).key(), "Agendado");

    let resolved = slot("Agendado", Some("Atendido"), false);
    assert_eq!(EffectiveStatus::from_slot(&resolved).key(), "Atendido");

    let fit_in = slot("Encaixe", Some("Atendido"), true);
    assert_eq!(EffectiveStatus::from_slot(&fit_in).key(), "FitIn(Atendido)");

    // Unresolved fit-in keeps the raw status.
    let pending_fit_in = slot("Encaixe", None, true);
    assert_eq!(EffectiveStatus::from_slot(&pending_fit_in).key(), "Encaixe");

    assert_eq!(EffectiveStatus::resolved_of("FitIn(Atendido)"), "Atendido");
    assert_eq!(EffectiveStatus::resolved_of("Livre"), "Livre");
}

#[test]
fn composite_keys_classify_by_inner_status() {
    let taxonomy = StatusTaxonomy::default();

    assert_eq!(taxonomy.bucket("FitIn(Atendido)"), StatusBucket::Attended);
    assert_eq!(
        taxonomy.bucket("FitIn(Marcado - confirmado)"),
        StatusBucket::Confirmed
    );
    assert_eq!(taxonomy.bucket("Livre"), StatusBucket::Free);
    assert_eq!(taxonomy.bucket("Bloqueado"), StatusBucket::Blocked);
    assert_eq!(taxonomy.bucket("Não compareceu"), StatusBucket::NoShow);
    assert_eq!(taxonomy.bucket("Em atendimento"), StatusBucket::OtherOccupied);

    // Unknown statuses never fail classification.
    assert_eq!(taxonomy.bucket("Status novo"), StatusBucket::OtherOccupied);
}

#[test]
fn fit_in_outcomes_count_toward_their_buckets() {
    let table = table_from(&[(
        "Dr. A",
        &[
            ("FitIn(Atendido)", 1),
            ("Atendido", 1),
            ("FitIn(Marcado - confirmado)", 2),
            ("Livre", 4),
        ],
    )]);
    let taxonomy = StatusTaxonomy::default();

    let summary = compute_summary(&table, &taxonomy);
    assert_eq!(summary.total_confirmed, 2);
    assert_eq!(summary.total_occupied, 4);

    let conversion = rank_conversion(&table, &taxonomy);
    assert_eq!(conversion[0].numerator, 2);
    assert_eq!(conversion[0].denominator, 4);
    assert_eq!(conversion[0].rate, "50.00%");
}

#[test]
fn conversion_excludes_free_and_blocked_from_denominator() {
    let table = table_from(&[(
        "Dr. A",
        &[
            ("Livre", 3),
            ("Bloqueado", 2),
            ("Não compareceu", 1),
            ("Atendido", 1),
        ],
    )]);

    let conversion = rank_conversion(&table, &StatusTaxonomy::default());
    assert_eq!(conversion[0].numerator, 1);
    assert_eq!(conversion[0].denominator, 2);
    assert_eq!(conversion[0].rate, "50.00%");
}

#[test]
fn global_conversion_is_ratio_of_sums() {
    // Dr. A converts 1 of 1, Dr. B converts 0 of 9. An average of rates
    // would say 50%; the clinic-wide ratio is 10%.
    let table = table_from(&[
        ("Dr. A", &[("Atendido", 1)]),
        ("Dr. B", &[("Não compareceu", 9)]),
    ]);

    let conversion = global_conversion_rate(&table, &StatusTaxonomy::default());
    assert_eq!(conversion.total_attended, 1);
    assert_eq!(conversion.total_valid_bookings, 10);
    assert_eq!(conversion.conversion_rate, "10.00%");
}

#[test]
fn rankings_sort_descending_with_stable_ties() {
    // Dr. A and Dr. B both occupy 50%; Dr. C occupies 100%.
    let table = table_from(&[
        ("Dr. A", &[("Agendado", 1), ("Livre", 1)]),
        ("Dr. B", &[("Atendido", 2), ("Livre", 2)]),
        ("Dr. C", &[("Agendado", 3)]),
    ]);

    let ranking = rank_occupation(&table, &StatusTaxonomy::default());
    assert_eq!(ranking[0].professional, "Dr. C");
    assert_eq!(ranking[1].professional, "Dr. A");
    assert_eq!(ranking[2].professional, "Dr. B");
    assert_eq!(ranking[1].rate, "50.00%");
    assert_eq!(ranking[2].rate, "50.00%");
}

#[test]
fn occupancy_rate_stays_within_bounds() {
    let tables = [
        StatusCountTable::default(),
        table_from(&[("Dr. A", &[("Livre", 7)])]),
        table_from(&[("Dr. A", &[("Agendado", 7)])]),
        table_from(&[("Dr. A", &[("Livre", 3), ("Agendado", 5), ("Bloqueado", 2)])]),
    ];

    for table in &tables {
        let summary = compute_summary(table, &StatusTaxonomy::default());
        let rate: f64 = summary
            .occupancy_rate
            .trim_end_matches('%')
            .parse()
            .expect("rate parses");
        assert!((0.0..=100.0).contains(&rate));
        if summary.total_slots_available == 0 {
            assert_eq!(summary.occupancy_rate, "0.00%");
        }
    }
}

#[test]
fn reclassification_needs_no_code_change() {
    // Move "Aguardando pós-consulta" out of the attended bucket and the
    // conversion numerator follows the data.
    let table = table_from(&[(
        "Dr. A",
        &[("Atendido", 1), ("Aguardando pós-consulta", 1)],
    )]);

    let default_taxonomy = StatusTaxonomy::default();
    assert_eq!(rank_conversion(&table, &default_taxonomy)[0].numerator, 2);

    let mut strict = StatusTaxonomy::default();
    strict.attended.retain(|s| s != "Aguardando pós-consulta");
    let ranking = rank_conversion(&table, &strict);
    assert_eq!(ranking[0].numerator, 1);
    assert_eq!(ranking[0].denominator, 2);
}
