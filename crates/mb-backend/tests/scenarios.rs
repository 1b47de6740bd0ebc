use mb_backend::{Backend, Mode, Operand, Product, ThreadConfig};
use mb_matrix::{DenseMatrix, NestedMatrix, Oracle};

fn run_all(input: NestedMatrix) -> Vec<(Mode, Product)> {
    let operand = Operand::from(input);
    Mode::all()
        .map(|mode| {
            let backend = Backend::new(mode.strategy, ThreadConfig::with_threads(4)).unwrap();
            let product = backend.run(mode.layout, &operand, &operand).unwrap();
            (mode, product)
        })
        .collect()
}

#[test]
fn test_three_by_three_every_mode() {
    let input = NestedMatrix::from_rows(
        3,
        3,
        vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ],
    )
    .unwrap();
    let expected = NestedMatrix::from_rows(
        3,
        3,
        vec![
            vec![30.0, 36.0, 42.0],
            vec![66.0, 81.0, 96.0],
            vec![102.0, 126.0, 150.0],
        ],
    )
    .unwrap();
    let oracle = Oracle::new(input.clone(), expected);

    let results = run_all(input);
    assert_eq!(results.len(), 9);
    for (mode, product) in results {
        assert!(oracle.check(product.as_dense()), "{mode} FAILED");
    }
}

#[test]
fn test_one_by_one_every_mode() {
    let input = NestedMatrix::filled(1, 1, 5.0);
    for (mode, product) in run_all(input) {
        assert_eq!(product.as_dense().get(0, 0).unwrap(), 25.0, "{mode}");
    }
}

#[test]
fn test_uneven_rows_more_workers_than_rows() {
    let input = NestedMatrix::from_rows(2, 2, vec![vec![0.5, -1.0], vec![2.0, 4.0]]).unwrap();
    let oracle = Oracle::from_input(input.clone()).unwrap();
    let operand = Operand::from(input);
    for mode in Mode::all() {
        let backend = Backend::new(mode.strategy, ThreadConfig::with_threads(16)).unwrap();
        let product = backend.run(mode.layout, &operand, &operand).unwrap();
        assert!(oracle.check(product.as_dense()), "{mode}");
    }
}
