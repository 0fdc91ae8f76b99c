use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sketchnn::{extend, lower_rank, row_start_indices, SparseCoo, EPSILON};

/// Random row-sorted graph without self pairs. Distances are drawn from a
/// small set so that ties are common.
fn random_graph(rng: &mut StdRng, n: usize, max_per_row: usize) -> SparseCoo {
    let mut triplets = Vec::new();
    for i in 0..n {
        for _ in 0..rng.gen_range(0..=max_per_row) {
            let j = rng.gen_range(0..n);
            if j != i {
                triplets.push((i, j, rng.gen_range(0..20) as f32 / 20.0));
            }
        }
    }
    SparseCoo::from_triplets(triplets)
}

fn random_dense(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(0..20) as f32 / 20.0)
}

fn distinct_values(mut dists: Vec<f32>) -> usize {
    dists.sort_by(f32::total_cmp);
    dists.dedup_by(|a, b| (*a - *b).abs() < EPSILON);
    dists.len()
}

#[test]
fn extend_without_queries_is_lower_rank() {
    let mut rng = StdRng::seed_from_u64(1);
    for n in [0usize, 1, 7, 30] {
        let graph = random_graph(&mut rng, n, 8);
        let qq = Array2::<f32>::zeros((0, 0));
        let qr = Array2::<f32>::zeros((n, 0));
        for knn in [0, 1, 3, 10] {
            assert_eq!(
                extend(&graph, qq.view(), qr.view(), knn),
                lower_rank(&graph, n, knn),
                "n={n} knn={knn}"
            );
        }
    }
}

#[test]
fn lower_rank_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..20 {
        let n = rng.gen_range(1..40);
        let graph = random_graph(&mut rng, n, 12);
        let knn = rng.gen_range(1..6);
        let once = lower_rank(&graph, n, knn);
        assert_eq!(lower_rank(&once, n, knn), once);
    }
}

#[test]
fn rows_hold_at_most_knn_distinct_values() {
    let mut rng = StdRng::seed_from_u64(3);
    let (nr, nq, knn) = (25, 9, 4);
    let graph = random_graph(&mut rng, nr, 10);
    let qq = random_dense(&mut rng, nq, nq);
    let qr = random_dense(&mut rng, nr, nq);
    let extended = extend(&graph, qq.view(), qr.view(), knn);

    assert!(extended.is_row_sorted());
    let row_start = row_start_indices(&extended, nr + nq);
    for i in 0..nr + nq {
        let range = SparseCoo::row_range(&row_start, i);
        assert!(distinct_values(extended.dists[range.clone()].to_vec()) <= knn);
        assert!(extended.cols[range].iter().all(|&j| j != i && j < nr + nq));
    }
}

#[test]
fn kept_neighbours_are_the_nearest() {
    let mut rng = StdRng::seed_from_u64(4);
    let (nr, nq, knn) = (12, 6, 3);
    let graph = random_graph(&mut rng, nr, 6);
    let qq = random_dense(&mut rng, nq, nq);
    let qr = random_dense(&mut rng, nr, nq);
    let extended = extend(&graph, qq.view(), qr.view(), knn);
    let row_start = row_start_indices(&extended, nr + nq);

    // every candidate closer than the furthest kept one must be kept
    for q in 0..nq {
        let i = nr + q;
        let kept = &extended.dists[SparseCoo::row_range(&row_start, i)];
        let Some(furthest) = kept.iter().copied().reduce(f32::max) else {
            continue;
        };
        let mut candidates: Vec<f32> = qr.column(q).to_vec();
        candidates.extend(
            qq.row(q)
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != q)
                .map(|(_, &d)| d),
        );
        let closer = candidates.iter().filter(|&&d| d <= furthest).count();
        assert_eq!(closer, kept.len(), "query row {i}");
    }
}

#[test]
fn thread_count_does_not_change_result() {
    let mut rng = StdRng::seed_from_u64(5);
    let (nr, nq) = (40, 13);
    let graph = random_graph(&mut rng, nr, 10);
    let qq = random_dense(&mut rng, nq, nq);
    let qr = random_dense(&mut rng, nr, nq);

    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| extend(&graph, qq.view(), qr.view(), 5));
    let many = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .unwrap()
        .install(|| extend(&graph, qq.view(), qr.view(), 5));
    assert_eq!(single, many);
}

#[test]
fn input_graph_is_left_untouched() {
    let mut rng = StdRng::seed_from_u64(6);
    let graph = random_graph(&mut rng, 10, 5);
    let before = graph.clone();
    let qq = random_dense(&mut rng, 2, 2);
    let qr = random_dense(&mut rng, 10, 2);
    let _ = extend(&graph, qq.view(), qr.view(), 2);
    let _ = lower_rank(&graph, 10, 1);
    assert_eq!(graph, before);
}
