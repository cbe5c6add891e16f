use std::io::Cursor;

use ndarray::array;

use crate::{Dataset, JoinError, Point};

#[test]
fn test_new_keeps_ids_labels_and_values() {
    let data = Dataset::new(vec![
        Point::new(7, array![1., 2.]).with_label(1),
        Point::new(3, array![3., 4.]),
    ])
    .unwrap();

    assert_eq!(data.num_rows(), 2);
    assert_eq!(data.num_cols(), 2);
    assert_eq!(data.ids(), &[7, 3]);
    assert_eq!(data.labels(), &[Some(1), None]);
    assert_eq!(data.row(1), array![3., 4.]);
    assert_eq!(data.point(0), Point::new(7, array![1., 2.]).with_label(1));
}

#[test]
fn test_new_rejects_ragged_rows() {
    let err = Dataset::new(vec![
        Point::new(0, array![1., 2.]),
        Point::new(1, array![1., 2., 3.]),
    ])
    .unwrap_err();
    assert!(matches!(err, JoinError::InvalidArgument(_)));
}

#[test]
fn test_new_rejects_duplicate_ids() {
    let err = Dataset::new(vec![
        Point::new(4, array![1.]),
        Point::new(4, array![2.]),
    ])
    .unwrap_err();
    assert!(matches!(err, JoinError::InvalidArgument(_)));
}

#[test]
fn test_empty_dataset() {
    let data = Dataset::new(Vec::new()).unwrap();
    assert!(data.is_empty());
    assert_eq!(data.num_cols(), 0);
}

#[test]
fn test_from_array_assigns_row_ids() {
    let data = Dataset::from_array(array![[0.], [1.], [2.]]);
    assert_eq!(data.ids(), &[0, 1, 2]);
    assert_eq!(data.labels(), &[None, None, None]);
}

#[test]
fn test_permute_columns() {
    let mut data = Dataset::from_array(array![[1., 2., 3.], [4., 5., 6.]]);
    data.permute_columns(&[2, 0, 1]);
    assert_eq!(data.values(), array![[3., 1., 2.], [6., 4., 5.]]);
}

#[test]
fn test_select_rows() {
    let data = Dataset::new(vec![
        Point::new(10, array![1.]),
        Point::new(11, array![2.]).with_label(0),
        Point::new(12, array![3.]),
    ])
    .unwrap();

    let sorted = data.select_rows(&[2, 0, 1]);
    assert_eq!(sorted.ids(), &[12, 10, 11]);
    assert_eq!(sorted.labels(), &[None, None, Some(0)]);
    assert_eq!(sorted.values(), array![[3.], [1.], [2.]]);
}

#[test]
fn test_normalize() {
    let mut data = Dataset::from_array(array![[0., 5., -2.], [10., 5., 2.], [5., 5., 0.]]);
    data.normalize();
    assert_eq!(
        data.values(),
        array![[0., 0., 0.], [1., 0., 1.], [0.5, 0., 0.5]]
    );
}

#[test]
fn test_read_delimited_with_header_and_label() {
    let text = "a,b,class,c\n0.5,1.5,1,2.5\n\n3,4,0,5\n";
    let data = Dataset::read_delimited(Cursor::new(text), ',', Some(2), true).unwrap();

    assert_eq!(data.num_rows(), 2);
    assert_eq!(data.num_cols(), 3);
    assert_eq!(data.ids(), &[0, 1]);
    assert_eq!(data.labels(), &[Some(1), Some(0)]);
    assert_eq!(data.values(), array![[0.5, 1.5, 2.5], [3., 4., 5.]]);
}

#[test]
fn test_read_delimited_without_label() {
    let text = "1;2\n3;4\n";
    let data = Dataset::read_delimited(Cursor::new(text), ';', None, false).unwrap();
    assert_eq!(data.values(), array![[1., 2.], [3., 4.]]);
    assert_eq!(data.labels(), &[None, None]);
}

#[test]
fn test_read_delimited_reports_line() {
    let text = "x,y\n1,2\n3,oops\n";
    match Dataset::read_delimited(Cursor::new(text), ',', None, true) {
        Err(JoinError::Parse { line, .. }) => assert_eq!(line, 3),
        other => panic!("unexpected result: {:?}", other),
    }

    let ragged = "1,2\n3\n";
    match Dataset::read_delimited(Cursor::new(ragged), ',', None, false) {
        Err(JoinError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("unexpected result: {:?}", other),
    }
}
