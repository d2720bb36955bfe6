use super::distance::{cosine_distance, euclidean_distance, magnitude};
use super::*;

fn chunk(index: usize, content: &str) -> Chunk {
    Chunk {
        index,
        content: content.to_string(),
        start: index * 10,
        end: index * 10 + content.chars().count(),
    }
}

fn entry(index: usize, vector: Vec<f32>) -> IndexEntry {
    IndexEntry {
        chunk: chunk(index, &format!("chunk {}", index)),
        vector,
    }
}

fn sample_index(metric: DistanceMetric) -> VectorIndex {
    VectorIndex::build(
        vec![
            entry(0, vec![0.0, 0.0]),
            entry(1, vec![3.0, 4.0]),
            entry(2, vec![1.0, 0.0]),
            entry(3, vec![0.0, 2.0]),
            entry(4, vec![-1.0, -1.0]),
        ],
        metric,
    )
    .expect("index should build")
}

fn indices(results: &[SearchResult]) -> Vec<usize> {
    results.iter().map(|r| r.chunk.index).collect()
}

#[test]
fn distance_functions() {
    assert!((magnitude(&[3.0, 4.0]) - 5.0).abs() < 1e-6);
    assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
    assert!(euclidean_distance(&[1.5, -2.0], &[1.5, -2.0]).abs() < 1e-6);

    assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
    assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
    assert!((cosine_distance(&[0.0, 0.0], &[1.0, 1.0]) - 1.0).abs() < 1e-6);
}

#[test]
fn build_rejects_empty() {
    let result = VectorIndex::build(Vec::new(), DistanceMetric::Euclidean);
    assert!(matches!(result, Err(DocQaError::EmptyIndex)));
}

#[test]
fn build_rejects_mixed_dimensions() {
    let result = VectorIndex::build(
        vec![entry(0, vec![1.0, 2.0]), entry(1, vec![1.0, 2.0, 3.0])],
        DistanceMetric::Euclidean,
    );
    assert!(matches!(
        result,
        Err(DocQaError::DimensionMismatch {
            expected: 2,
            actual: 3
        })
    ));
}

#[test]
fn query_before_build_is_empty_index() {
    let index = VectorIndex::new(DistanceMetric::Cosine);
    assert!(index.is_empty());
    assert!(matches!(
        index.query(&[1.0, 0.0], 4),
        Err(DocQaError::EmptyIndex)
    ));
}

#[test]
fn query_orders_by_euclidean_distance() {
    let index = sample_index(DistanceMetric::Euclidean);
    let results = index.query(&[0.9, 0.1], 5).expect("query should succeed");

    assert_eq!(indices(&results), vec![2, 0, 3, 4, 1]);
    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn query_orders_by_cosine_distance() {
    let index = sample_index(DistanceMetric::Cosine);
    let results = index.query(&[1.0, 1.0], 5).expect("query should succeed");

    // [3, 4] is closest in angle; the zero vector sits at distance 1
    assert_eq!(results[0].chunk.index, 1);
    assert_eq!(results.last().map(|r| r.chunk.index), Some(4));
    for pair in results.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn query_returns_min_of_k_and_len() {
    let index = sample_index(DistanceMetric::Euclidean);

    for k in 0..8 {
        let results = index.query(&[0.0, 1.0], k).expect("query should succeed");
        assert_eq!(results.len(), k.min(index.len()));
    }
}

#[test]
fn exact_match_comes_first() {
    let index = sample_index(DistanceMetric::Euclidean);

    for k in 1..=5 {
        let results = index.query(&[3.0, 4.0], k).expect("query should succeed");
        assert_eq!(results[0].chunk.index, 1);
        assert!(results[0].distance.abs() < 1e-6);
    }
}

#[test]
fn ties_keep_insertion_order() {
    let index = VectorIndex::build(
        vec![
            entry(0, vec![1.0, 0.0]),
            entry(1, vec![0.0, 1.0]),
            entry(2, vec![-1.0, 0.0]),
            entry(3, vec![0.0, -1.0]),
        ],
        DistanceMetric::Euclidean,
    )
    .expect("index should build");

    let results = index.query(&[0.0, 0.0], 4).expect("query should succeed");
    assert_eq!(indices(&results), vec![0, 1, 2, 3]);

    let again = index.query(&[0.0, 0.0], 2).expect("query should succeed");
    assert_eq!(indices(&again), vec![0, 1]);
}

#[test]
fn query_rejects_wrong_dimension() {
    let index = sample_index(DistanceMetric::Euclidean);
    assert!(matches!(
        index.query(&[1.0, 2.0, 3.0], 2),
        Err(DocQaError::DimensionMismatch {
            expected: 2,
            actual: 3
        })
    ));
}

#[test]
fn index_accessors() {
    let index = sample_index(DistanceMetric::Cosine);
    assert_eq!(index.len(), 5);
    assert_eq!(index.dimension(), 2);
    assert_eq!(index.metric(), DistanceMetric::Cosine);
    assert_eq!(index.entries()[3].chunk.index, 3);
}

#[test]
fn metric_serialization() {
    assert_eq!(
        serde_json::to_string(&DistanceMetric::Cosine).expect("should serialize"),
        "\"cosine\""
    );
    assert_eq!(DistanceMetric::default(), DistanceMetric::Euclidean);
    assert_eq!(DistanceMetric::Euclidean.to_string(), "euclidean");
}
