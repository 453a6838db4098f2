//! Normalization behaviour over realistic product names

use jewel_scout::{extract_diawt_value, extract_kt_value};

const CATALOG: &[&str] = &[
    "14K White Gold & Rose Gold Ring",
    "Sterling Silver Huggie Earrings",
    "Diamond Platinum Band",
    "18kt Yellow Gold 1/4 ct tw Diamond Studs",
    "9ct White Gold 0,15ct Diamond Pendant",
    "1-3/4 ct Cubic Zirconia Ring",
    "1/2 ct and 3/4 ct tw Setting",
    "10K Two-Tone Gold 7 ct tw Tennis Bracelet",
    "Created Sapphire 0.50 ct Ring",
    "Pearl Strand Necklace",
    "1/2 CT Pendant",
    "0.25 CT White Gold Band",
];

#[test]
fn test_catalog_values() {
    let results: Vec<(Option<String>, Option<String>)> = CATALOG
        .iter()
        .map(|name| (extract_kt_value(name), extract_diawt_value(name)))
        .collect();

    let expected: &[(Option<&str>, Option<&str>)] = &[
        (Some("14k white gold & rose gold"), None),
        (Some("sterling silver"), None),
        (Some("platinum"), None),
        (Some("18k yellow gold"), Some("1/4ct tw")),
        (Some("9k white gold"), Some("0.15ct")),
        (None, None),
        (None, Some("1/2ct")),
        (Some("10k two tone gold"), None),
        (None, None),
        (None, None),
        // Fraction and decimal tails of a weight never read as karats
        (None, Some("1/2ct")),
        (Some("white gold"), Some("0.25ct")),
    ];
    assert_eq!(CATALOG.len(), expected.len());

    for ((name, (metal, weight)), (want_metal, want_weight)) in
        CATALOG.iter().zip(&results).zip(expected)
    {
        assert_eq!(metal.as_deref(), *want_metal, "metal of {}", name);
        assert_eq!(weight.as_deref(), *want_weight, "weight of {}", name);
    }
}

#[test]
fn test_outputs_are_lowercase() {
    for name in CATALOG {
        for value in [extract_kt_value(name), extract_diawt_value(name)]
            .into_iter()
            .flatten()
        {
            assert_eq!(value, value.to_lowercase(), "output of {}", name);
        }
    }
}

#[test]
fn test_weights_never_reach_five_carats() {
    for name in [
        "5 ct Emerald Cut",
        "5.5 ct tw Riviera",
        "12 CT Gold Chain",
        "6 ct and 0.10 ct accents",
    ] {
        if let Some(weight) = extract_diawt_value(name) {
            let number = weight.trim_end_matches(" tw").trim_end_matches("ct");
            let value = jewel_scout::normalize::parse_weight_number(number).unwrap();
            assert!(value < 5.0, "{} gave {}", name, weight);
        }
    }
    assert_eq!(
        extract_diawt_value("6 ct and 0.10 ct accents").as_deref(),
        Some("0.10ct")
    );
}

#[test]
fn test_reapplying_to_output_is_stable() {
    for name in CATALOG {
        if let Some(metal) = extract_kt_value(name) {
            assert_eq!(extract_kt_value(&metal), Some(metal.clone()), "{}", name);
        }
        if let Some(weight) = extract_diawt_value(name) {
            assert_eq!(extract_diawt_value(&weight), Some(weight.clone()), "{}", name);
        }
    }
}
