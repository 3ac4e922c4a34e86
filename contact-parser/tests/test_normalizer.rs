use contact_parser::{builtin_table, classify, clean_input, format, ErrorKind, Normalizer};

#[test]
fn test_clean_input_examples() {
    assert_eq!(clean_input("06.12.34.56.78"), "0612345678");
    assert_eq!(clean_input("+33 (6) 12.34.56.78"), "33612345678");
    assert_eq!(clean_input(""), "");
    assert_eq!(clean_input(None::<&str>.unwrap_or_default()), "");
}

#[test]
fn test_french_mobile_local_form() {
    let number = format("0612345678").unwrap();
    assert_eq!(number.formatted, "+33612345678");
    assert_eq!(number.line_type, "Mobile FR");
}

#[test]
fn test_french_landline_rejected() {
    assert_eq!(format("0123456789").unwrap_err().kind(), ErrorKind::RejectedLineType);
}

#[test]
fn test_french_mobile_wrong_length() {
    assert_eq!(format("0612345").unwrap_err().kind(), ErrorKind::InvalidLength);
}

#[test]
fn test_swiss_and_reunion() {
    assert_eq!(format("41791234567").unwrap().formatted, "+41791234567");
    assert_eq!(format("262692123456").unwrap().formatted, "+262692123456");
    assert_eq!(format("262262123456").unwrap().formatted, "+262262123456");
}

#[test]
fn test_german_length_range() {
    assert_eq!(format("49123456789").unwrap().formatted, "+49123456789");
    assert_eq!(
        format("4912345678901234").unwrap_err().kind(),
        ErrorKind::InvalidLength
    );
}

#[test]
fn test_empty_and_unrecognized() {
    assert_eq!(format("").unwrap_err().kind(), ErrorKind::EmptyInput);
    assert_eq!(format("abc123").unwrap_err().kind(), ErrorKind::UnrecognizedFormat);
}

#[test]
fn test_every_country_has_a_canonical_number() {
    let canonical = vec![
        ("FR", "33612345678"),
        ("CH", "41791234567"),
        ("BE", "32471234567"),
        ("IT", "393123456789"),
        ("AD", "376123456"),
        ("RE", "262692123456"),
        ("DE", "49301234567"),
    ];

    for (country, number) in canonical {
        assert!(builtin_table().get(country).is_some(), "Missing country {}", country);
        assert_ne!(classify(number), "Unknown", "Should classify: {}", number);

        let normalized = format(number).unwrap();
        assert_eq!(normalized.country, country);
        assert_eq!(normalized.formatted, format!("+{}", number));
    }
}

#[test]
fn test_successful_format_matches_classification() {
    let normalizer = Normalizer::default();
    let inputs = vec![
        "06 12 34 56 78",
        "+33 7 12 34 56 78",
        "0041 79 123 45 67",
        "+41 22 123 45 67",
        "+32 471 23 45 67",
        "+39 312 345 6789",
        "+376 123 456",
        "+262 692 12 34 56",
        "+262 262 12 34 56",
        "+49 30 1234567",
        "+49 151 1234 5678",
    ];

    for input in inputs {
        let number = normalizer.format(input).unwrap();
        let matched = normalizer.classify_match(&clean_input(input)).unwrap();
        assert_eq!(matched.country.id, number.country, "Country of {:?}", input);
        assert_eq!(normalizer.classify(&clean_input(input)), number.line_type);
        assert!(number.formatted.starts_with('+'));
        assert!(number.formatted[1..].starts_with(&matched.country.international_prefix));
    }
}
