//! Golden tests for the conversion engine.
//!
//! These tests pin conversions against the bundled reference table with the
//! default safety settings.

use ome_core::{ConversionEngine, ConversionError, ConversionQuery, ConversionTable, EngineConfig};

/// A single-order conversion with a known answer.
struct GoldenCase {
    id: &'static str,
    drug: &'static str,
    route: &'static str,
    dose: f64,
    unit: &'static str,
    frequency: Option<&'static str>,
    target_drug: &'static str,
    target_route: &'static str,
    expected_ome: f64,
    expected_factor: f64,
    expected_dose: f64,
    expected_unit: &'static str,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "morphine-to-oxycodone",
            drug: "morphine",
            route: "po",
            dose: 30.0,
            unit: "mg",
            frequency: None,
            target_drug: "oxycodone",
            target_route: "po",
            expected_ome: 30.0,
            expected_factor: 0.5,
            expected_dose: 10.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "fentanyl-patch-to-morphine",
            drug: "fentanyl",
            route: "transdermal",
            dose: 25.0,
            unit: "mcg/hr",
            frequency: None,
            target_drug: "morphine",
            target_route: "po",
            expected_ome: 60.0,
            expected_factor: 0.5,
            expected_dose: 30.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "morphine-route-change",
            drug: "morphine",
            route: "po",
            dose: 30.0,
            unit: "mg",
            frequency: None,
            target_drug: "morphine",
            target_route: "iv",
            expected_ome: 30.0,
            expected_factor: 1.0,
            expected_dose: 10.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "hydromorphone-q4h-to-morphine",
            drug: "hydromorphone",
            route: "po",
            dose: 4.0,
            unit: "mg",
            frequency: Some("q4h"),
            target_drug: "morphine",
            target_route: "po",
            expected_ome: 120.0,
            expected_factor: 0.5,
            expected_dose: 60.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "oxycodone-bid-to-methadone",
            drug: "oxycodone",
            route: "po",
            dose: 20.0,
            unit: "mg",
            frequency: Some("twice daily"),
            target_drug: "methadone",
            target_route: "po",
            expected_ome: 60.0,
            expected_factor: 0.25,
            // 60 / 4.7 * 0.25 = 3.19 → 3.0 in 0.5 mg steps
            expected_dose: 3.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "tramadol-qid-to-morphine",
            drug: "Tramadol",
            route: "orally",
            dose: 50.0,
            unit: "mg",
            frequency: Some("QID"),
            target_drug: "morphine",
            target_route: "po",
            expected_ome: 40.0,
            expected_factor: 0.5,
            expected_dose: 20.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "fentanyl-iv-micrograms",
            drug: "fentanyl",
            route: "iv",
            dose: 50.0,
            unit: "mcg",
            frequency: Some("every 2 hours"),
            target_drug: "hydromorphone",
            target_route: "po",
            expected_ome: 180.0,
            expected_factor: 0.5,
            expected_dose: 18.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "morphine-iv-daily-total",
            drug: "morphine",
            route: "iv",
            dose: 10.0,
            unit: "mg/day",
            frequency: Some("q6h"),
            target_drug: "oxycodone",
            target_route: "po",
            expected_ome: 30.0,
            expected_factor: 0.5,
            expected_dose: 10.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "hydromorphone-micrograms-reported-in-mg",
            drug: "hydromorphone",
            route: "po",
            dose: 2000.0,
            unit: "mcg",
            frequency: None,
            target_drug: "hydromorphone",
            target_route: "po",
            expected_ome: 10.0,
            expected_factor: 1.0,
            expected_dose: 2.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "hydromorphone-q6h-round-trips-to-daily-total",
            drug: "hydromorphone",
            route: "po",
            dose: 2.0,
            unit: "mg",
            frequency: Some("q6h"),
            target_drug: "hydromorphone",
            target_route: "po",
            expected_ome: 40.0,
            expected_factor: 1.0,
            expected_dose: 8.0,
            expected_unit: "mg",
        },
        GoldenCase {
            id: "morphine-to-fentanyl-patch",
            drug: "morphine",
            route: "po",
            dose: 60.0,
            unit: "mg",
            frequency: Some("bid"),
            target_drug: "fentanyl",
            target_route: "patch",
            expected_ome: 120.0,
            expected_factor: 0.5,
            expected_dose: 25.0,
            expected_unit: "mcg/hr",
        },
    ]
}

fn engine(table: &ConversionTable) -> ConversionEngine<'_> {
    ConversionEngine::new(table, &EngineConfig::default()).unwrap()
}

#[test]
fn test_golden_cases() {
    let table = ConversionTable::bundled().unwrap();
    let engine = engine(&table);

    for case in get_golden_cases() {
        let mut query = ConversionQuery::new(case.drug, case.route, case.dose, case.unit);
        if let Some(frequency) = case.frequency {
            query = query.with_frequency(frequency);
        }

        let result = engine
            .convert(&query, case.target_drug, case.target_route)
            .unwrap_or_else(|e| panic!("Case {}: {}", case.id, e));

        assert!(
            (result.ome_value - case.expected_ome).abs() < 1e-9,
            "Case {}: OME mismatch - expected {}, got {}",
            case.id, case.expected_ome, result.ome_value
        );
        assert_eq!(
            result.safety_factor_applied, case.expected_factor,
            "Case {}: safety factor mismatch", case.id
        );
        assert!(
            (result.target_dose - case.expected_dose).abs() < 1e-9,
            "Case {}: dose mismatch - expected {}, got {}",
            case.id, case.expected_dose, result.target_dose
        );
        assert_eq!(
            result.target_unit.symbol(), case.expected_unit,
            "Case {}: unit mismatch", case.id
        );
    }
}

#[test]
fn test_rejected_inputs() {
    let table = ConversionTable::bundled().unwrap();
    let engine = engine(&table);

    let err = engine
        .to_ome(&ConversionQuery::new("unobtainium", "po", 10.0, "mg"))
        .unwrap_err();
    assert!(matches!(err, ConversionError::UnknownDrugRoute { .. }));

    for dose in [0.0, -5.0, f64::NAN, f64::NEG_INFINITY] {
        let err = engine
            .to_ome(&ConversionQuery::new("morphine", "po", dose, "mg"))
            .unwrap_err();
        assert!(
            matches!(err, ConversionError::NonPositiveDose(_)),
            "dose {} was accepted", dose
        );
    }

    let err = engine
        .to_ome(&ConversionQuery::new("morphine", "po", f64::INFINITY, "mg"))
        .unwrap_err();
    assert_eq!(err, ConversionError::DoseOutOfRange(f64::INFINITY));

    // Near the top of the range the answer is still a finite dose
    let result = engine
        .convert(&ConversionQuery::new("morphine", "po", 1e303, "mg"), "morphine", "iv")
        .unwrap();
    assert!(result.target_dose.is_finite());

    let err = engine
        .to_ome(&ConversionQuery::new("morphine", "intrathecal", 1.0, "mg"))
        .unwrap_err();
    assert!(matches!(err, ConversionError::UnknownDrugRoute { .. }));

    let err = engine
        .to_ome(&ConversionQuery::new("morphine", "po", 10.0, "tablets"))
        .unwrap_err();
    assert!(matches!(err, ConversionError::UnknownUnit(_)));

    let err = engine
        .to_ome(&ConversionQuery::new("morphine", "po", 10.0, "mg").with_frequency("whenever"))
        .unwrap_err();
    assert!(matches!(err, ConversionError::UnknownFrequency(_)));
}

#[test]
fn test_known_drug_on_unsupported_route_lists_routes() {
    let table = ConversionTable::bundled().unwrap();
    let engine = engine(&table);

    let err = engine
        .to_ome(&ConversionQuery::new("oxycodone", "transdermal", 10.0, "mcg/hr"))
        .unwrap_err();

    match err {
        ConversionError::UnknownDrugRoute { suggestion, .. } => {
            let suggestion = suggestion.unwrap();
            assert!(suggestion.contains("po"), "suggestion was {}", suggestion);
        }
        other => panic!("expected UnknownDrugRoute, got {:?}", other),
    }
}

#[test]
fn test_regimen_combines_sources() {
    let table = ConversionTable::bundled().unwrap();
    let engine = engine(&table);

    let regimen = [
        ConversionQuery::new("morphine", "po", 15.0, "mg").with_frequency("q12h"),
        ConversionQuery::new("oxycodone", "po", 5.0, "mg").with_frequency("q6h"),
    ];

    let conversion = engine.convert_regimen(&regimen, "methadone", "po").unwrap();

    // 30 + 30 mg OME
    assert_eq!(conversion.medications.len(), 2);
    assert!((conversion.result.ome_value - 60.0).abs() < 1e-9);
    assert_eq!(
        conversion.result.source_drugs,
        vec!["morphine".to_string(), "oxycodone".to_string()]
    );
    assert_eq!(conversion.result.safety_factor_applied, 0.25);
}

#[test]
fn test_regimen_reports_failing_position() {
    let table = ConversionTable::bundled().unwrap();
    let engine = engine(&table);

    let regimen = [
        ConversionQuery::new("morphine", "po", 15.0, "mg"),
        ConversionQuery::new("morphine", "po", 0.0, "mg"),
    ];

    let err = engine.convert_regimen(&regimen, "oxycodone", "po").unwrap_err();
    match err {
        ConversionError::Medication { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, ConversionError::NonPositiveDose(_)));
        }
        other => panic!("expected Medication error, got {:?}", other),
    }

    assert_eq!(
        engine.convert_regimen(&[], "oxycodone", "po").unwrap_err(),
        ConversionError::EmptyRegimen
    );
}

#[test]
fn test_every_bundled_entry_converts_to_itself() {
    let table = ConversionTable::bundled().unwrap();
    let engine = engine(&table);

    for entry in table.entries() {
        let dose = entry.rounding_increment * 4.0;
        let query = ConversionQuery::new(&entry.drug, entry.route.code(), dose, entry.unit.symbol());

        let result = engine
            .convert(&query, &entry.drug, entry.route.code())
            .unwrap();

        assert_eq!(result.safety_factor_applied, 1.0, "{} {}", entry.drug, entry.route);
        assert!(
            (result.target_dose - dose).abs() < 1e-6,
            "{} {}: expected {}, got {}",
            entry.drug, entry.route, dose, result.target_dose
        );
    }
}
