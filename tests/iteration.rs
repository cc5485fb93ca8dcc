use std::sync::Arc;

use ndview::{Array, ArrayBase, ArrayView, ArrayViewMut, Core, Cursor, Dims, Idx, Shared, StridedRange};

#[test]
fn test_nested_iteration_visits_every_address_once() {
    let data: Vec<u32> = (0..60).collect();
    let a: ArrayView<'_, u32, 3, 3> = ArrayView::from_row_major(&data, &[3, 4, 5]).unwrap();

    let mut seen = Vec::new();
    for plane in a.iter() {
        for row in plane.iter() {
            for x in row.iter() {
                seen.push(x as *const u32);
            }
        }
    }
    let expected: Vec<*const u32> = data.iter().map(|x| x as *const u32).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_column_major_iteration_order() {
    let data: Vec<u32> = (0..6).collect();
    let a: ArrayView<'_, u32, 2, -2> = ArrayView::from_col_major(&data, &[2, 3]).unwrap();

    let rows: Vec<Vec<u32>> = a.iter().map(|row| row.iter().copied().collect()).collect();
    assert_eq!(rows, vec![vec![0, 2, 4], vec![1, 3, 5]]);
}

#[test]
fn test_reverse_and_cursor_distance() {
    let data: Vec<i64> = (0..12).collect();
    let a: ArrayView<'_, i64, 2, 0> =
        ArrayView::from_slice(&data, &[3, 4], &[1, 3], 0).unwrap();

    let firsts: Vec<i64> = a.iter().rev().map(|col| *col.at(0)).collect();
    assert_eq!(firsts, vec![2, 1, 0]);

    let mut it = a.iter();
    let start = it.cursor().clone();
    it.next();
    it.next();
    assert_eq!(it.cursor().distance_to(&start), -2);
    assert_eq!(start.distance_to(it.cursor()), 2);
    assert_eq!(it.len(), 1);
}

#[test]
fn test_sliced_views_iterate_their_window() {
    let data: Vec<u32> = (0..20).collect();
    let a: ArrayView<'_, u32, 2, 2> = ArrayView::from_row_major(&data, &[4, 5]).unwrap();

    let window = a.clone().slice_outer(1..3);
    assert_eq!(window.shape(), &[2, 5]);
    assert_eq!(window.iter().next().map(|row| *row.at(0)), Some(5));

    let every_other = a
        .slice_axis(1, StridedRange::new(0, 5, 2))
        .unwrap()
        .slice_axis(0, Idx(3))
        .unwrap();
    assert_eq!(every_other.shape(), &[1, 3]);
    let values: Vec<u32> = every_other.at(0).iter().copied().collect();
    assert_eq!(values, vec![15, 17, 19]);
}

#[test]
fn test_mutable_iteration_writes_through() {
    let mut data = vec![0i32; 6];
    let mut a: ArrayViewMut<'_, i32, 2, 2> =
        ArrayViewMut::from_row_major_mut(&mut data, &[2, 3]).unwrap();
    for (i, mut row) in a.iter_mut().enumerate() {
        for (j, x) in row.iter_mut().enumerate() {
            *x = (10 * i + j) as i32;
        }
    }
    assert_eq!(data, vec![0, 1, 2, 10, 11, 12]);
}

#[test]
fn test_overlapping_mutable_view_rejected() {
    let mut data = vec![0i32; 6];
    let err = ArrayViewMut::<'_, i32, 2, 0>::from_slice_mut(&mut data, &[2, 3], &[1, 1], 0)
        .unwrap_err();
    assert!(err.to_string().starts_with("overlapping strides"));
}

#[test]
fn test_anchor_outlives_array() {
    let a: Array<f64, Dims<2, 2>> =
        Array::from_shape_fn(&[2, 2], |i| (i[0] * 2 + i[1]) as f64).unwrap();
    let (ptr, core) = a.into_raw_parts();
    let weak = Arc::downgrade(core.anchor().unwrap());

    let sub = core.restride(&[2], &[2]).unwrap();
    drop(core);
    assert!(weak.upgrade().is_some(), "restrided descriptor keeps the buffer alive");

    let column: ArrayBase<'_, f64, Dims<1, 0>, Shared> =
        unsafe { ArrayBase::from_raw_parts(ptr, sub.clone()) };
    let values: Vec<f64> = column.iter().copied().collect();
    assert_eq!(values, vec![0.0, 2.0]);

    drop(column);
    drop(sub);
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_descriptor_rejects_bad_strides() {
    assert!(Core::new(&[2, 3], &[3]).is_err());
    assert!(Core::new(&[2, 3], &[3, 1]).is_ok());
}
