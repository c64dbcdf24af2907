// Tests for the host-boundary value contract
use serde_json::json;
use textsim_core::wire::{
    calculate_distance, calculate_similarity, calculate_similarity_batch,
    get_global_configuration, supported_algorithms,
};
use textsim_core::{AlgorithmConfig, SimilarityEngine};

fn engine() -> SimilarityEngine {
    SimilarityEngine::with_worker_threads(1)
}

#[test]
fn test_similarity_by_name_and_by_tag_agree() {
    let engine = engine();
    let by_tag = calculate_similarity(&engine, "kitten", "sitting", &json!(0), None);
    let by_name = calculate_similarity(&engine, "kitten", "sitting", &json!("Levenshtein"), None);
    assert_eq!(by_tag.value, by_name.value);

    let hyphenated =
        calculate_similarity(&engine, "abcdef", "abcedf", &json!("damerau-levenshtein"), None);
    let numeric = calculate_similarity(&engine, "abcdef", "abcedf", &json!(1), None);
    assert_eq!(hyphenated.value, numeric.value);
}

#[test]
fn test_dice_alias_resolves_to_sorensen_dice() {
    let engine = engine();
    let alias = calculate_similarity(&engine, "night", "nacht", &json!("dice"), None);
    let canonical = calculate_similarity(&engine, "night", "nacht", &json!("sorensen-dice"), None);
    assert_eq!(alias.value, canonical.value);
}

#[test]
fn test_out_of_range_tag_reports_invalid_configuration() {
    let engine = engine();
    let response = calculate_similarity(&engine, "a", "b", &json!(13), None);
    assert!(!response.success);
    assert!(response.value.is_none());
    assert_eq!(response.error.unwrap().code, 2);
}

#[test]
fn test_distance_scaling_contract() {
    let engine = engine();
    // Disjoint alphabets: cosine distance is the full scale
    let response = calculate_distance(&engine, "abc", "xyz", &json!("cosine"), None);
    assert_eq!(response.value, Some(1000));

    // Edit distances stay unscaled
    let response = calculate_distance(&engine, "kitten", "sitting", &json!("levenshtein"), None);
    assert_eq!(response.value, Some(3));
}

#[test]
fn test_config_mapping_applies_tversky_weights() {
    let engine = engine();
    let config = json!({
        "preprocessing": 3,
        "ngramSize": 2,
        "alpha": 0.5,
        "beta": 0.5
    });
    let tversky =
        calculate_similarity(&engine, "hello", "hallo", &json!("tversky"), Some(&config));
    assert!(tversky.success);

    let dice_config = json!({"preprocessing": 3, "ngramSize": 2});
    let dice = calculate_similarity(
        &engine,
        "hello",
        "hallo",
        &json!("sorensen-dice"),
        Some(&dice_config),
    );
    assert_eq!(tversky.value, dice.value);
}

#[test]
fn test_missing_tversky_weights_fail_per_pair_in_batch() {
    let engine = engine();
    let pairs = vec![
        ("hello".to_owned(), "hallo".to_owned()),
        ("".to_owned(), "".to_owned()),
    ];
    let responses = calculate_similarity_batch(&engine, &pairs, &json!("tversky"), None);
    assert_eq!(responses.len(), 2);
    // Both fail validation; responses stay positionally aligned
    assert!(responses.iter().all(|response| !response.success));
    assert!(responses
        .iter()
        .all(|response| response.error.as_ref().unwrap().code == 2));
}

#[test]
fn test_batch_with_unknown_algorithm_fails_every_pair() {
    let engine = engine();
    let pairs = vec![("a".to_owned(), "b".to_owned()); 3];
    let responses = calculate_similarity_batch(&engine, &pairs, &json!("soundex"), None);
    assert_eq!(responses.len(), 3);
    assert!(responses.iter().all(|response| !response.success));
}

#[test]
fn test_supported_algorithms_cover_every_tag() {
    let algorithms = supported_algorithms();
    assert_eq!(algorithms.len(), 13);
    for (expected_tag, info) in algorithms.iter().enumerate() {
        assert_eq!(info.algorithm_type as usize, expected_tag);
        assert!(!info.name.is_empty());
    }

    let names: Vec<&str> = algorithms.iter().map(|info| info.name).collect();
    assert!(names.contains(&"Damerau-Levenshtein"));
    assert!(names.contains(&"Jaro-Winkler"));
    assert!(names.contains(&"Sorensen-Dice"));
}

#[test]
fn test_global_configuration_round_trip() {
    let engine = engine();
    engine
        .set_global_config(AlgorithmConfig {
            ngram_size: 3,
            threshold: Some(0.8),
            prefix_weight: Some(0.15),
            ..Default::default()
        })
        .unwrap();

    let value = get_global_configuration(&engine);
    assert_eq!(value["ngramSize"], json!(3));
    assert_eq!(value["threshold"], json!(0.8));
    assert_eq!(value["prefixWeight"], json!(0.15));
    // Absent optionals stay absent
    assert!(value.get("alpha").is_none());
    assert!(value.get("maxStringLength").is_none());
}

#[test]
fn test_error_record_distinguishes_input_from_configuration() {
    let engine = engine();

    let input_error = calculate_distance(&engine, "hello", "hi", &json!("hamming"), None)
        .error
        .unwrap();
    assert_eq!(input_error.code, 1);

    let config_error =
        calculate_similarity(&engine, "a", "b", &json!("jaccard"), Some(&json!({"ngramSize": 0})))
            .error
            .unwrap();
    assert_eq!(config_error.code, 2);
}
