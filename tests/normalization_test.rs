use kiosk_etl::config::{MatchingConfig, NormalizationTables, PipelineOptions};
use kiosk_etl::normalize::{normalize_month, similarity};
use kiosk_etl::{AnomalyCollector, FieldKind, FieldNormalizer, Pipeline, RawSheet, ReferenceData};

fn references() -> ReferenceData {
    let countries = [
        "Brazil",
        "Côte d'Ivoire",
        "Eq. Guinea",
        "Malaysia",
        "Myanmar",
        "Norway",
        "Oman",
        "United Arab Emirates",
        "United Kingdom",
        "United States of America",
    ];
    let cities = ["Aberdeen", "Kuala Lumpur", "Muscat", "Stavanger", "Yangon"];
    ReferenceData::new(
        countries.iter().map(|s| s.to_string()).collect(),
        cities.iter().map(|s| s.to_string()).collect(),
    )
}

#[test]
fn test_reference_members_are_returned_unchanged() {
    let tables = NormalizationTables::default();
    let refs = references();
    let mut normalizer = FieldNormalizer::new(&tables, &refs, MatchingConfig::default());
    let mut anomalies = AnomalyCollector::new();

    for country in &refs.countries {
        assert_eq!(&normalizer.normalize_country(country, &mut anomalies), country);
    }
    for city in &refs.cities {
        assert_eq!(&normalizer.normalize_location(city, &mut anomalies), city);
    }
    assert!(anomalies.is_empty());
}

#[test]
fn test_every_override_maps_to_its_canonical_value() {
    let tables = NormalizationTables::default();
    let refs = references();
    let mut normalizer = FieldNormalizer::new(&tables, &refs, MatchingConfig::default());
    let mut anomalies = AnomalyCollector::new();

    for (raw, canonical) in &tables.country {
        assert_eq!(&normalizer.normalize_country(raw, &mut anomalies), canonical);
    }
    for (raw, canonical) in &tables.location {
        assert_eq!(&normalizer.normalize_location(raw, &mut anomalies), canonical);
    }
    for (raw, canonical) in &tables.region {
        assert_eq!(&normalizer.normalize_region(raw), canonical);
    }
    for (raw, canonical) in &tables.system {
        assert_eq!(&normalizer.normalize_system(raw), canonical);
    }
    assert!(anomalies.is_empty());
}

#[test]
fn test_fuzzy_and_unknown_outcomes_log_exactly_once_per_value() {
    let tables = NormalizationTables::default();
    let refs = references();
    let mut normalizer = FieldNormalizer::new(&tables, &refs, MatchingConfig::default());
    let mut anomalies = AnomalyCollector::new();

    let typo = "Untied Arab Emirates";
    assert!(similarity(typo, "United Arab Emirates") >= 0.85);
    assert_eq!(
        normalizer.normalize_country(typo, &mut anomalies),
        "United Arab Emirates"
    );
    assert_eq!(anomalies.fuzzy(FieldKind::Country).len(), 1);

    assert_eq!(normalizer.normalize_country("Narnia", &mut anomalies), "Narnia");
    assert_eq!(anomalies.unknown(FieldKind::Country).len(), 1);
    assert_eq!(anomalies.fuzzy(FieldKind::Country).len(), 1);
}

#[test]
fn test_normalization_is_idempotent() {
    let tables = NormalizationTables::default();
    let refs = references();
    let mut normalizer = FieldNormalizer::new(&tables, &refs, MatchingConfig::default());
    let mut anomalies = AnomalyCollector::new();

    let countries = ["UAE", "Ivory Coast", "Norwayy", "Malaysa", "Narnia", " Oman "];
    for raw in countries {
        let once = normalizer.normalize_country(raw, &mut anomalies);
        assert_eq!(normalizer.normalize_country(&once, &mut anomalies), once);
    }

    let locations = ["Yangoon", "Aberdeenn", "Gotham"];
    for raw in locations {
        let once = normalizer.normalize_location(raw, &mut anomalies);
        assert_eq!(normalizer.normalize_location(&once, &mut anomalies), once);
    }

    for raw in ["Yes", "unsuccessful", "??"] {
        let once = normalizer.normalize_success(raw);
        assert_eq!(normalizer.normalize_success(&once.to_string()), once);
    }
}

#[test]
fn test_month_examples() {
    assert_eq!(normalize_month("3"), Some(3));
    assert_eq!(normalize_month("March"), Some(3));
    assert_eq!(normalize_month("mar"), Some(3));
    assert_eq!(normalize_month(""), None);
    assert_eq!(normalize_month("13"), None);
}

#[test]
fn test_success_examples() {
    let tables = NormalizationTables::default();
    let refs = references();
    let normalizer = FieldNormalizer::new(&tables, &refs, MatchingConfig::default());

    assert_eq!(normalizer.normalize_success("Yes"), 1);
    assert_eq!(normalizer.normalize_success("unsuccessful"), 0);
    assert_eq!(normalizer.normalize_success("??"), 0);
}

#[test]
fn test_record_count_is_input_minus_marker_row() {
    let options = PipelineOptions::default();
    let tables = NormalizationTables::default();
    let refs = references();
    let mut pipeline = Pipeline::new(&options, &tables, &refs, MatchingConfig::default());

    let rows: Vec<Vec<String>> = (0..25)
        .map(|i| vec!["Oman".to_string(), (i % 12 + 1).to_string(), String::new()])
        .collect();
    let input_rows = rows.len();
    let sheet = RawSheet::from_strings(["Country", "Month", "Remarks"], rows);

    let output = pipeline.run(sheet).unwrap();
    assert_eq!(output.records.len(), input_rows - 1);
}
