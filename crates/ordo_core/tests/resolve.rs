use ordo_core::prelude::*;
use proptest::prelude::*;

#[test]
fn test_resolve_last_axis() {
    let layout = BatchLayout::resolve(&Shape::from([2, 3]), &TopKParams::new(2).axis(-1)).unwrap();

    assert_eq!(layout.axis, Some(1));
    assert_eq!(layout.batch_size, 2);
    assert_eq!(layout.element_num, 3);
    assert_eq!(layout.k, 2);
    assert!(!layout.transpose);
    assert_eq!(layout.target_shape, Shape::from([2, 2]));
    assert_eq!(layout.order, Order::Descending);
}

#[test]
fn test_resolve_inner_axis_needs_transpose() {
    let params = TopKParams::new(1).axis(1).ascending(true);
    let layout = BatchLayout::resolve(&Shape::from([4, 5, 6]), &params).unwrap();

    assert_eq!(layout.batch_size, 24);
    assert_eq!(layout.element_num, 5);
    assert!(layout.transpose);
    assert_eq!(layout.target_shape, Shape::from([4, 1, 6]));
    assert_eq!(layout.order, Order::Ascending);
}

#[test]
fn test_resolve_flatten() {
    let layout = BatchLayout::resolve(&Shape::from([2, 3]), &TopKParams::new(-5)).unwrap();

    assert_eq!(layout.axis, None);
    assert_eq!(layout.batch_size, 1);
    assert_eq!(layout.element_num, 6);
    assert_eq!(layout.k, 6);
    assert_eq!(layout.target_shape, Shape::from([6]));
}

#[test]
fn test_resolve_mask_keeps_source_shape() {
    let shape = Shape::from([2, 3]);
    for params in [TopKParams::new(1).axis(0), TopKParams::new(1)] {
        let layout = BatchLayout::resolve(&shape, &params.ret_typ(ReturnMode::Mask)).unwrap();
        assert_eq!(layout.target_shape, shape);
    }
}

#[test]
fn test_resolve_errors() {
    let shape = Shape::from([2, 3]);
    assert_eq!(
        BatchLayout::resolve(&shape, &TopKParams::new(1).axis(-3)),
        Err(OrdoError::InvalidAxis { axis: -3, ndim: 2 })
    );
    assert_eq!(
        BatchLayout::resolve(&shape, &TopKParams::new(4).axis(1)),
        Err(OrdoError::InvalidK { k: 4, element_num: 3 })
    );
    assert!(matches!(
        BatchLayout::resolve(&Shape::from([2, 0, 3]), &TopKParams::new(1)),
        Err(OrdoError::InvalidShape { .. })
    ));
    assert!(matches!(
        BatchLayout::resolve(&Shape::from([1, 1, 1, 1, 1, 2]), &TopKParams::new(1)),
        Err(OrdoError::InvalidShape { .. })
    ));
}

#[test]
fn test_inference_rejects_overflowing_shapes() {
    let params = TopKParams::new(1).axis(-1);

    // element count does not fit in usize
    let huge = Shape::from([1usize << 40, 1 << 40]);
    assert!(matches!(
        infer_output_shapes(&huge, &params),
        Err(OrdoError::InvalidShape { .. })
    ));

    // element count fits, forward scratch does not
    let wide = Shape::from([1usize << 62, 2]);
    assert!(matches!(
        forward_workspace_len(&wide, &params),
        Err(OrdoError::InvalidShape { .. })
    ));
    assert!(matches!(
        backward_workspace_len(&wide, &params.ret_typ(ReturnMode::Value)),
        Err(OrdoError::InvalidShape { .. })
    ));
}

#[test]
fn test_output_arity() {
    let cases = [
        (ReturnMode::Value, 2, 1),
        (ReturnMode::Indices, 1, 1),
        (ReturnMode::Mask, 1, 1),
        (ReturnMode::Both, 2, 2),
    ];
    for (ret_typ, count, visible) in cases {
        let params = TopKParams::new(1).ret_typ(ret_typ);
        assert_eq!(infer_output_count(&params), count);
        assert_eq!(infer_visible_output_count(&params), visible);
    }
}

#[test]
fn test_output_shapes_and_dtypes() {
    let shape = Shape::from([3, 4]);
    let params = TopKParams::new(2).axis(0).ret_typ(ReturnMode::Value);

    assert_eq!(
        infer_output_shapes(&shape, &params).unwrap(),
        vec![Shape::from([2, 4]), Shape::from([2, 4])]
    );
    assert_eq!(infer_output_dtypes(DType::F16, &params), vec![DType::F16, DType::I32]);
    assert_eq!(
        infer_output_dtypes(DType::F64, &params.clone().ret_typ(ReturnMode::Mask)),
        vec![DType::F64]
    );
    assert_eq!(
        infer_output_dtypes(DType::F64, &params.ret_typ(ReturnMode::Indices)),
        vec![DType::I32]
    );
}

#[test]
fn test_workspace_lengths() {
    let shape = Shape::from([4, 5]);
    let params = TopKParams::new(2).axis(1);

    assert_eq!(forward_workspace_len(&shape, &params).unwrap(), 60);
    assert_eq!(
        forward_workspace_len(&shape, &params.clone().ret_typ(ReturnMode::Mask)).unwrap(),
        60 + 2 * 8
    );
    assert_eq!(backward_workspace_len(&shape, &params).unwrap(), 0);
    assert_eq!(
        backward_workspace_len(&shape, &params.ret_typ(ReturnMode::Both)).unwrap(),
        8 + 4
    );
}

proptest! {
    #[test]
    fn prop_layout_covers_source(
        dims in prop::collection::vec(1usize..=5, 0..=5),
        axis_seed in any::<usize>(),
        flatten in any::<bool>(),
        k in -2isize..=5,
    ) {
        let shape = Shape::from(dims);
        let mut params = TopKParams::new(k);
        if !flatten && !shape.is_scalar() {
            params = params.axis((axis_seed % shape.ndim()) as isize);
        }

        match BatchLayout::resolve(&shape, &params) {
            Ok(layout) => {
                prop_assert_eq!(layout.batch_size * layout.element_num, shape.size());
                prop_assert!(layout.k >= 1 && layout.k <= layout.element_num);
                prop_assert_eq!(layout.selected_shape().size(), layout.batch_size * layout.k);
                prop_assert_eq!(layout.target_shape.size(), layout.batch_size * layout.k);
            },
            Err(error) => {
                prop_assert!(k > 0, "unexpected {:?}", error);
                prop_assert!(matches!(error, OrdoError::InvalidK { .. }), "expected InvalidK, got {:?}", error);
            },
        }
    }
}
