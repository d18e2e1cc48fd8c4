//! End-to-end assignment scenarios through the public API

use subassign::{
    subassign, subassign_scalar, AssignConfig, AssignError, BinaryOp, Descriptor, Element, IndexList, Mask,
    Matrix, Source, Sparsity, TypeCode,
};

/// Dense 0/1 layout of a matrix, for readable assertions
fn pattern<T: Element>(m: &Matrix<T>) -> Vec<Vec<Option<T>>> {
    (0..m.nrows())
        .map(|i| (0..m.ncols()).map(|j| m.get(i, j)).collect())
        .collect()
}

fn config() -> AssignConfig {
    AssignConfig::default()
}

#[test]
fn test_scalar_fills_empty_matrix() {
    let mut c = Matrix::<i32>::new(3, 3);
    let all = [0, 1, 2];
    subassign_scalar(
        &mut c,
        Mask::none(),
        None,
        7,
        IndexList::List(&all),
        IndexList::List(&all),
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_eq!(c.nvals(), 9);
    assert_eq!(c.sparsity(), Sparsity::Full);
    for i in 0..3 {
        for j in 0..3 {
            assert_eq!(c.get(i, j), Some(7));
        }
    }
}

#[test]
fn test_unsorted_rows_scalar() {
    let mut c = Matrix::from_triplets(2, 2, &[0, 1], &[0, 1], &[1, 2], None).unwrap();
    let rows = [1, 0];
    let cols = [0];
    subassign_scalar(
        &mut c,
        Mask::none(),
        None,
        9,
        IndexList::List(&rows),
        IndexList::List(&cols),
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_eq!(c.get(0, 0), Some(9));
    assert_eq!(c.get(1, 0), Some(9));
    assert_eq!(c.get(1, 1), Some(2));
    assert_eq!(c.nvals(), 3);
}

#[test]
fn test_full_matrix_structural_mask() {
    let mut c = Matrix::full(2, 2, vec![1, 1, 1, 1]).unwrap();
    let m = Matrix::from_triplets(2, 2, &[0, 1], &[0, 1], &[true, true], None).unwrap();
    subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        5,
        IndexList::All,
        IndexList::All,
        &Descriptor::new().structural_mask(),
        &config(),
    )
    .unwrap();

    assert_eq!(c.sparsity(), Sparsity::Full);
    assert_eq!(pattern(&c), vec![vec![Some(5), Some(1)], vec![Some(1), Some(5)]]);
}

#[test]
fn test_absent_complemented_mask_with_replace_clears_everything() {
    let mut c = Matrix::from_triplets(3, 3, &[2], &[2], &[4], None).unwrap();
    let a = Matrix::full(2, 2, vec![1, 2, 3, 4]).unwrap();
    let desc = Descriptor::new().complement_mask().replace_output();
    subassign(
        &mut c,
        Mask::none(),
        None,
        Source::Matrix(&a),
        IndexList::Range { begin: 0, end: 1 },
        IndexList::Range { begin: 0, end: 1 },
        &desc,
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    // (2,2) lies outside I×J and is cleared anyway
    assert_eq!(c.nvals(), 0);
    assert_eq!(c.get(2, 2), None);
}

#[test]
fn test_absent_complemented_mask_without_replace_is_a_no_op() {
    let mut c = Matrix::from_triplets(3, 3, &[2], &[2], &[4], None).unwrap();
    subassign_scalar(
        &mut c,
        Mask::none(),
        None,
        1,
        IndexList::All,
        IndexList::All,
        &Descriptor::new().complement_mask(),
        &config(),
    )
    .unwrap();
    assert_eq!(c.nvals(), 1);
    assert_eq!(c.npending(), 0);
}

#[test]
fn test_accumulate_dense_operand_keeps_entries() {
    let mut c = Matrix::from_triplets(3, 3, &[0, 1, 2], &[0, 1, 2], &[1, 2, 3], None).unwrap();
    let a = Matrix::full(2, 2, vec![10, 10, 10, 10]).unwrap();
    let plus = BinaryOp::plus();
    subassign(
        &mut c,
        Mask::none(),
        Some(&plus),
        Source::Matrix(&a),
        IndexList::Range { begin: 0, end: 1 },
        IndexList::Range { begin: 0, end: 1 },
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_eq!(
        pattern(&c),
        vec![
            vec![Some(11), Some(10), None],
            vec![Some(10), Some(12), None],
            vec![None, None, Some(3)],
        ]
    );
}

#[test]
fn test_accumulate_sparse_operand_keeps_unmatched_entries() {
    let mut c = Matrix::from_triplets(3, 3, &[0, 1], &[0, 1], &[1, 2], None).unwrap();
    let a = Matrix::from_triplets(2, 2, &[0], &[0], &[10], None).unwrap();
    let plus = BinaryOp::plus();
    subassign(
        &mut c,
        Mask::none(),
        Some(&plus),
        Source::Matrix(&a),
        IndexList::Range { begin: 0, end: 1 },
        IndexList::Range { begin: 0, end: 1 },
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_eq!(c.get(0, 0), Some(11));
    assert_eq!(c.get(1, 1), Some(2));
    assert_eq!(c.nvals(), 2);
}

#[test]
fn test_overwrite_without_accum_deletes_unmatched_entries() {
    let mut c = Matrix::from_triplets(3, 3, &[0, 1, 2], &[0, 1, 2], &[1, 2, 3], None).unwrap();
    let a = Matrix::from_triplets(2, 2, &[0], &[1], &[10], None).unwrap();
    subassign(
        &mut c,
        Mask::none(),
        None,
        Source::Matrix(&a),
        IndexList::Range { begin: 0, end: 1 },
        IndexList::Range { begin: 0, end: 1 },
        &Descriptor::new(),
        &config(),
    )
    .unwrap();

    // deletions are zombies until the next wait
    assert_eq!(c.nzombies(), 2);
    assert_eq!(c.get(0, 0), None);
    c.wait().unwrap();
    assert_eq!(c.nzombies(), 0);
    assert_eq!(
        pattern(&c),
        vec![
            vec![None, Some(10), None],
            vec![None, None, None],
            vec![None, None, Some(3)],
        ]
    );
}

#[test]
fn test_replace_only_clears_inside_selection() {
    let mut c = Matrix::from_triplets(3, 3, &[0, 1, 2, 0], &[0, 1, 2, 2], &[1, 2, 3, 4], None).unwrap();
    // mask allows only (0,0) of the 2x2 selection
    let m = Matrix::from_triplets(2, 2, &[0], &[0], &[true], None).unwrap();
    subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        8,
        IndexList::Range { begin: 0, end: 1 },
        IndexList::Range { begin: 0, end: 1 },
        &Descriptor::new().replace_output(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_eq!(c.get(0, 0), Some(8));
    assert_eq!(c.get(1, 1), None);
    assert_eq!(c.get(2, 2), Some(3));
    assert_eq!(c.get(0, 2), Some(4));
    assert_eq!(c.nvals(), 3);
}

#[test]
fn test_complemented_mask() {
    let mut c = Matrix::<f64>::new(2, 3);
    let m = Matrix::from_triplets(2, 3, &[0, 1], &[0, 2], &[1.0, 1.0], None).unwrap();
    subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        0.5,
        IndexList::All,
        IndexList::All,
        &Descriptor::new().complement_mask(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_eq!(c.nvals(), 4);
    assert_eq!(c.get(0, 0), None);
    assert_eq!(c.get(1, 2), None);
    assert_eq!(c.get(0, 1), Some(0.5));
}

#[test]
fn test_valued_mask_reads_zero_as_false() {
    let mut c = Matrix::<i64>::new(2, 2);
    let m = Matrix::from_triplets(2, 2, &[0, 1], &[0, 1], &[0u8, 3], None).unwrap();
    subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        1,
        IndexList::All,
        IndexList::All,
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();
    assert_eq!(c.get(0, 0), None);
    assert_eq!(c.get(1, 1), Some(1));

    // read structurally the zero counts
    let mut c = Matrix::<i64>::new(2, 2);
    subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        1,
        IndexList::All,
        IndexList::All,
        &Descriptor::new().structural_mask(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();
    assert_eq!(c.get(0, 0), Some(1));
    assert_eq!(c.get(1, 1), Some(1));
}

#[test]
fn test_duplicate_indices_last_wins() {
    let mut c = Matrix::<i32>::new(4, 2);
    // rows 2 and 0 each appear twice; the later row of A wins
    let rows = [2, 0, 2, 0];
    let a = Matrix::full(4, 1, vec![1, 2, 3, 4]).unwrap();
    subassign(
        &mut c,
        Mask::none(),
        None,
        Source::Matrix(&a),
        IndexList::List(&rows),
        IndexList::List(&[1]),
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_eq!(c.get(2, 1), Some(3));
    assert_eq!(c.get(0, 1), Some(4));
    assert_eq!(c.nvals(), 2);
}

#[test]
fn test_negative_stride() {
    let mut c = Matrix::<i32>::new(6, 1);
    // rows 5, 3, 1
    let a = Matrix::full(3, 1, vec![10, 20, 30]).unwrap();
    subassign(
        &mut c,
        Mask::none(),
        None,
        Source::Matrix(&a),
        IndexList::Stride { begin: 5, inc: -2, end: 0 },
        IndexList::All,
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_eq!(c.get(5, 0), Some(10));
    assert_eq!(c.get(3, 0), Some(20));
    assert_eq!(c.get(1, 0), Some(30));
    assert_eq!(c.nvals(), 3);
}

#[test]
fn test_hypersparse_output() {
    let mut c = Matrix::<f32>::hypersparse(1000, 1000);
    c.set_element(500, 999, 1.0).unwrap();
    c.wait().unwrap();
    let plus = BinaryOp::plus();
    subassign_scalar(
        &mut c,
        Mask::none(),
        Some(&plus),
        2.0,
        IndexList::List(&[499, 500]),
        IndexList::List(&[3, 999]),
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_eq!(c.sparsity(), Sparsity::Hypersparse);
    assert_eq!(c.get(500, 999), Some(3.0));
    assert_eq!(c.get(499, 3), Some(2.0));
    assert_eq!(c.nvals(), 4);
}

#[test]
fn test_bitmap_output_with_replace() {
    let mut c = Matrix::<i32>::bitmap(3, 3).unwrap();
    for (i, j) in [(0, 0), (1, 1), (2, 2)] {
        c.set_element(i, j, 1).unwrap();
    }
    let m = Matrix::from_triplets(3, 3, &[0, 2], &[1, 2], &[true, true], None).unwrap();
    subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        7,
        IndexList::All,
        IndexList::All,
        &Descriptor::new().replace_output(),
        &config(),
    )
    .unwrap();

    assert_eq!(c.sparsity(), Sparsity::Bitmap);
    assert_eq!(c.get(0, 1), Some(7));
    assert_eq!(c.get(2, 2), Some(7));
    assert_eq!(c.get(0, 0), None);
    assert_eq!(c.nvals(), 2);
}

#[test]
fn test_full_output_that_loses_entries() {
    let mut c = Matrix::full(2, 2, vec![1, 2, 3, 4]).unwrap();
    let a = Matrix::from_triplets(1, 2, &[0], &[0], &[9], None).unwrap();
    subassign(
        &mut c,
        Mask::none(),
        None,
        Source::Matrix(&a),
        IndexList::Range { begin: 1, end: 1 },
        IndexList::All,
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();

    assert_ne!(c.sparsity(), Sparsity::Full);
    assert_eq!(pattern(&c), vec![vec![Some(1), Some(3)], vec![Some(9), None]]);
}

#[test]
fn test_whole_matrix_copy_and_constant() {
    let a = Matrix::from_triplets(2, 2, &[1], &[0], &[3], None).unwrap();
    let mut c = Matrix::full(2, 2, vec![1, 1, 1, 1]).unwrap();
    subassign(
        &mut c,
        Mask::none(),
        None,
        Source::Matrix(&a),
        IndexList::All,
        IndexList::All,
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    assert_eq!(c.nvals(), 1);
    assert_eq!(c.get(1, 0), Some(3));

    subassign_scalar(
        &mut c,
        Mask::none(),
        None,
        4,
        IndexList::All,
        IndexList::All,
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    assert!(c.is_iso());
    assert_eq!(c.sparsity(), Sparsity::Full);
    assert_eq!(c.get(0, 1), Some(4));
}

#[test]
fn test_iso_output_stays_iso_for_equal_scalar() {
    let mut c = Matrix::iso_full(3, 3, 2);
    c.convert_to(Sparsity::Sparse).unwrap();
    let m = Matrix::from_triplets(2, 1, &[0], &[0], &[true], None).unwrap();
    subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        2,
        IndexList::Range { begin: 1, end: 2 },
        IndexList::List(&[1]),
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    assert!(c.is_iso());

    subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        5,
        IndexList::Range { begin: 1, end: 2 },
        IndexList::List(&[1]),
        &Descriptor::new(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();
    assert!(!c.is_iso());
    assert_eq!(c.get(1, 1), Some(5));
    assert_eq!(c.get(2, 1), Some(2));
}

#[test]
fn test_eager_materialization() {
    let mut c = Matrix::<i32>::new(4, 4);
    let config = AssignConfig {
        materialize: subassign::Materialize::Eager,
        ..AssignConfig::default()
    };
    subassign_scalar(
        &mut c,
        Mask::none(),
        None,
        1,
        IndexList::Range { begin: 1, end: 2 },
        IndexList::Range { begin: 0, end: 1 },
        &Descriptor::new(),
        &config,
    )
    .unwrap();
    assert_eq!(c.npending(), 0);
    assert_eq!(c.nvals(), 4);
}

#[test]
fn test_pending_tuples_accumulate_across_calls() {
    let mut c = Matrix::<i32>::new(3, 3);
    let plus = BinaryOp::plus();
    for x in [1, 2, 3] {
        subassign_scalar(
            &mut c,
            Mask::none(),
            Some(&plus),
            x,
            IndexList::List(&[1]),
            IndexList::List(&[2]),
            &Descriptor::new(),
            &config(),
        )
        .unwrap();
    }
    // same position queued three times, combined by the queue's operator
    assert_eq!(c.npending(), 3);
    assert_eq!(c.get(1, 2), Some(6));
    c.wait().unwrap();
    assert_eq!(c.npending(), 0);
    assert_eq!(c.get(1, 2), Some(6));
    assert_eq!(c.nvals(), 1);
}

#[test]
fn test_errors() {
    let mut c = Matrix::<i32>::new(3, 3);
    let a = Matrix::<i32>::new(2, 2);

    let err = subassign(
        &mut c,
        Mask::none(),
        None,
        Source::Matrix(&a),
        IndexList::List(&[0, 5]),
        IndexList::Range { begin: 0, end: 1 },
        &Descriptor::new(),
        &config(),
    )
    .unwrap_err();
    assert_eq!(err, AssignError::IndexOutOfBounds { index: 5, limit: 3 });

    let err = subassign(
        &mut c,
        Mask::none(),
        None,
        Source::Matrix(&a),
        IndexList::All,
        IndexList::Range { begin: 0, end: 1 },
        &Descriptor::new(),
        &config(),
    )
    .unwrap_err();
    assert!(matches!(err, AssignError::DimensionMismatch(_)));

    let err = subassign_scalar(
        &mut c,
        Mask::none(),
        None,
        1,
        IndexList::Stride { begin: 0, inc: 0, end: 2 },
        IndexList::All,
        &Descriptor::new(),
        &config(),
    )
    .unwrap_err();
    assert!(matches!(err, AssignError::InvalidValue(_)));
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Label(u32);

impl Element for Label {
    const TYPE: TypeCode = TypeCode::User("label");
}

#[test]
fn test_user_type_mask_must_be_structural() {
    let mut c = Matrix::<i32>::new(2, 2);
    let m = Matrix::from_triplets(2, 2, &[0], &[0], &[Label(1)], None).unwrap();

    let err = subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        1,
        IndexList::All,
        IndexList::All,
        &Descriptor::new(),
        &config(),
    )
    .unwrap_err();
    assert!(matches!(err, AssignError::DomainMismatch(_)));

    subassign_scalar(
        &mut c,
        Mask::Matrix(&m),
        None,
        1,
        IndexList::All,
        IndexList::All,
        &Descriptor::new().structural_mask(),
        &config(),
    )
    .unwrap();
    c.wait().unwrap();
    assert_eq!(c.get(0, 0), Some(1));
    assert_eq!(c.nvals(), 1);
}
