//! Property-based tests for verity.
//!
//! These tests verify invariants that should hold regardless of input:
//! - Distance metrics satisfy metric space properties
//! - Top-k selection returns exactly k elements, partitioned and sorted
//! - Ground truth is independent of block size
//! - The comparator is reflexive and exact equality implies tolerant equality

use proptest::prelude::*;

use verity::compare::{allclose, array_equal, compare, Tolerance};
use verity::distance::{hamming, l1, pairwise_squared, row_norms, squared_euclidean, MemoryLimit};
use verity::ground_truth::{compute_true_knn, GroundTruthConfig};
use verity::matrix::Matrix;
use verity::select::{top_k, top_k_idxs, Order};
use verity::sequence::Sequence;

prop_compose! {
    fn arb_vector(dim: usize)(vec in prop::collection::vec(-10.0f32..10.0, dim)) -> Vec<f32> {
        vec
    }
}

prop_compose! {
    fn arb_matrix(max_rows: usize, dim: usize)
        (rows in prop::collection::vec(arb_vector(dim), 1..max_rows)) -> Matrix {
        Matrix::from_rows(&rows[..]).unwrap()
    }
}

fn arb_floats_with_nans() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![
            4 => (-1e6f64..1e6).boxed(),
            1 => Just(f64::NAN).boxed(),
        ],
        0..40,
    )
}

mod distance_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn squared_euclidean_non_negative_and_zero_on_self(a in arb_vector(32), b in arb_vector(32)) {
            let x = Matrix::from_rows(&[a.clone(), b.clone()]).unwrap();
            let d = squared_euclidean(&x, &a).unwrap();
            prop_assert!(d[0].abs() < 1e-10);
            prop_assert!(d[1] >= 0.0);
        }

        #[test]
        fn l1_symmetric(a in arb_vector(16), b in arb_vector(16)) {
            let d_ab = l1(&Matrix::from_rows(&[a.clone()]).unwrap(), &b).unwrap()[0];
            let d_ba = l1(&Matrix::from_rows(&[b]).unwrap(), &a).unwrap()[0];
            prop_assert!((d_ab - d_ba).abs() < 1e-4, "L1 not symmetric: {} vs {}", d_ab, d_ba);
        }

        #[test]
        fn pairwise_agrees_with_direct(x in arb_matrix(12, 8), q in arb_matrix(6, 8)) {
            let grid = pairwise_squared(&x, &q, None, None, MemoryLimit::default()).unwrap();
            prop_assert_eq!((grid.nrows(), grid.ncols()), (x.nrows(), q.nrows()));
            let (xn, qn) = (row_norms(&x), row_norms(&q));
            for j in 0..q.nrows() {
                let direct = squared_euclidean(&x, q.row(j)).unwrap();
                for i in 0..x.nrows() {
                    // Cancellation error scales with the norms, not the distance.
                    let tol = 1e-4 * (1.0 + xn[i] + qn[j]);
                    prop_assert!((grid.get(i, j) - direct[i]).abs() <= tol);
                }
            }
        }

        #[test]
        fn hamming_bounded_by_length(a in prop::collection::vec(0u8..3, 20), b in prop::collection::vec(0u8..3, 20)) {
            let d = hamming(&a, &b).unwrap();
            prop_assert!(d <= 20);
            prop_assert_eq!(hamming(&a, &a).unwrap(), 0);
        }
    }
}

mod select_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn top_k_has_length_k_and_partitions(
            values in prop::collection::vec(-100.0f32..100.0, 1..60),
            k_frac in 0.0f64..1.0,
        ) {
            let k = 1 + ((values.len() - 1) as f64 * k_frac) as usize;
            let top = top_k(&values, k, Order::SmallerBetter).unwrap();
            prop_assert_eq!(top.len(), k);

            let mut seen = std::collections::HashSet::new();
            for &i in &top.indices {
                prop_assert!(i < values.len());
                prop_assert!(seen.insert(i), "duplicate index {}", i);
            }
            prop_assert!(top.values.windows(2).all(|w| w[0] <= w[1]));

            let worst_selected = top.values[k - 1];
            for (i, &v) in values.iter().enumerate() {
                if !seen.contains(&i) {
                    prop_assert!(worst_selected <= v);
                }
            }
        }

        #[test]
        fn larger_better_is_descending(values in prop::collection::vec(-100.0f32..100.0, 1..60)) {
            let k = values.len().min(7);
            let top = top_k(&values, k, Order::LargerBetter).unwrap();
            prop_assert!(top.values.windows(2).all(|w| w[0] >= w[1]));
        }

        #[test]
        fn k_beyond_len_fails(values in prop::collection::vec(-1.0f32..1.0, 0..20)) {
            prop_assert!(top_k_idxs(&values, values.len() + 1, Order::SmallerBetter).is_err());
        }
    }
}

mod ground_truth_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn blocking_is_invisible(
            base in arb_matrix(30, 4),
            queries in arb_matrix(20, 4),
            b1 in 1usize..25,
            b2 in 1usize..25,
        ) {
            let k = base.nrows().min(5);
            let cfg = |bs| GroundTruthConfig { k, block_size: bs, progress_every: 0, ..Default::default() };
            let r1 = compute_true_knn(&base, &queries, &cfg(b1)).unwrap();
            let r2 = compute_true_knn(&base, &queries, &cfg(b2)).unwrap();
            prop_assert_eq!(r1, r2);
        }

        #[test]
        fn every_row_is_sorted_and_valid(base in arb_matrix(30, 3), queries in arb_matrix(10, 3)) {
            let k = base.nrows().min(4);
            let truth = compute_true_knn(&base, &queries, &GroundTruthConfig::with_k(k)).unwrap();
            prop_assert_eq!(truth.nqueries(), queries.nrows());
            for i in 0..truth.nqueries() {
                prop_assert!(truth.neighbors(i).iter().all(|&idx| (idx as usize) < base.nrows()));
                prop_assert!(truth.distances(i).windows(2).all(|w| w[0] <= w[1]));
            }
        }
    }
}

mod compare_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn reflexive_with_equal_nan(values in arb_floats_with_nans()) {
            let a = Sequence::float(values);
            prop_assert!(compare(&a, &a, &Tolerance::default()).matches);
            prop_assert!(array_equal(&a, &a, true));
        }

        #[test]
        fn exact_equality_implies_tolerant_equality(
            a in arb_floats_with_nans(),
            b in arb_floats_with_nans(),
            rtol in 0.0f64..1.0,
            atol in 0.0f64..1.0,
        ) {
            let (a, b) = (Sequence::float(a), Sequence::float(b));
            if array_equal(&a, &b, true) {
                prop_assert!(allclose(&a, &b, &Tolerance::new(rtol, atol).unwrap()));
            }
        }

        #[test]
        fn failing_indices_empty_iff_match_when_shapes_agree(
            pairs in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 0..30),
        ) {
            let (a, b): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let cmp = compare(&Sequence::float(a), &Sequence::float(b), &Tolerance::new(0.0, 1.0).unwrap());
            prop_assert_eq!(cmp.matches, cmp.failing_indices.is_empty());
        }
    }
}
