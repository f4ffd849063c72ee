use ordo_core::prelude::*;
use ordo_cpu_kernels::*;
use proptest::prelude::*;
use std::cmp::Ordering;

#[derive(Debug)]
struct Case {
    dims: Vec<usize>,
    data: Vec<f32>,
    axis: Option<usize>,
    params: TopKParams,
}

impl Case {
    fn input(&self) -> Tensor<f32> {
        Tensor::from_vec(self.data.clone(), self.dims.clone()).unwrap()
    }

    fn with_ret_typ(&self, ret_typ: ReturnMode) -> TopKParams {
        self.params.clone().ret_typ(ret_typ)
    }

    fn k(&self) -> usize {
        let element_num = match self.axis {
            None => self.dims.iter().product(),
            Some(axis) => self.dims[axis],
        };
        if self.params.k <= 0 {
            element_num
        } else {
            self.params.k as usize
        }
    }
}

// Small integer values so that ties are common.
fn arb_case() -> impl Strategy<Value = Case> {
    prop::collection::vec(1usize..=4, 1..=3)
        .prop_flat_map(|dims| {
            let size: usize = dims.iter().product();
            let ndim = dims.len();
            (
                Just(dims),
                prop::collection::vec((-3i32..=3).prop_map(|v| v as f32), size),
                prop::option::of(0..ndim),
                any::<bool>(),
                -1isize..=4,
                any::<bool>(),
            )
        })
        .prop_map(|(dims, data, axis, negative_axis, k, is_ascend)| {
            let element_num = match axis {
                None => dims.iter().product(),
                Some(axis) => dims[axis],
            };
            let mut params = TopKParams::new(k.min(element_num as isize)).ascending(is_ascend);
            if let Some(axis) = axis {
                let requested = axis as isize;
                params = params.axis(if negative_axis { requested - dims.len() as isize } else { requested });
            }
            Case {
                dims,
                data,
                axis,
                params,
            }
        })
}

fn unravel(mut flat: usize, dims: &[usize]) -> Vec<usize> {
    let mut coords = vec![0; dims.len()];
    for d in (0..dims.len()).rev() {
        coords[d] = flat % dims[d];
        flat /= dims[d];
    }
    coords
}

fn ravel(coords: &[usize], dims: &[usize]) -> usize {
    coords.iter().zip(dims).fold(0, |acc, (&c, &d)| acc * d + c)
}

/// Source position of output position `o` that holds per-batch index `index`.
fn source_position(case: &Case, target: &Shape, o: usize, index: i32) -> usize {
    match case.axis {
        None => index as usize,
        Some(axis) => {
            let mut coords = unravel(o, target.dims());
            coords[axis] = index as usize;
            ravel(&coords, &case.dims)
        },
    }
}

/// Source positions of every batch, in axis order.
fn batches(case: &Case) -> Vec<Vec<usize>> {
    let size: usize = case.dims.iter().product();
    match case.axis {
        None => vec![(0..size).collect()],
        Some(axis) => {
            let stride: usize = case.dims[axis + 1..].iter().product();
            (0..size)
                .filter(|&i| unravel(i, &case.dims)[axis] == 0)
                .map(|start| (0..case.dims[axis]).map(|e| start + e * stride).collect())
                .collect()
        },
    }
}

/// Whether source position `a` is preferred over `b`.
fn beats(case: &Case, a: usize, b: usize) -> bool {
    case.params
        .order()
        .compare(&case.data[a], &case.data[b])
        .then(a.cmp(&b))
        == Ordering::Less
}

proptest! {
    #[test]
    fn prop_both_gathers_values_in_order(case in arb_case()) {
        let input = case.input();
        let output = topk_forward(&input.view(), &case.with_ret_typ(ReturnMode::Both), &HeapPool).unwrap();
        let values = output.values().unwrap();
        let indices = output.indices().unwrap();
        let target = values.shape().clone();

        let positions: Vec<usize> = (0..target.size())
            .map(|o| source_position(&case, &target, o, indices.data()[o]))
            .collect();
        for (o, &position) in positions.iter().enumerate() {
            prop_assert_eq!(values.data()[o], case.data[position]);
        }

        // along the axis, each output beats the next one
        let k = case.k();
        let stride: usize = match case.axis {
            None => 1,
            Some(axis) => target.dims()[axis + 1..].iter().product(),
        };
        for o in 0..target.size() {
            if (o / stride) % k + 1 < k {
                prop_assert!(beats(&case, positions[o], positions[o + stride]));
            }
        }
    }

    #[test]
    fn prop_mask_selects_k_best_per_batch(case in arb_case()) {
        let input = case.input();
        let output = topk_forward(&input.view(), &case.with_ret_typ(ReturnMode::Mask), &HeapPool).unwrap();
        let mask = output.mask().unwrap().data();
        let k = case.k();

        for batch in batches(&case) {
            let (selected, rest): (Vec<usize>, Vec<usize>) = batch.iter().copied().partition(|&i| mask[i] == 1.0);
            prop_assert_eq!(selected.len(), k);
            prop_assert!(rest.iter().all(|&i| mask[i] == 0.0));
            for &y in &selected {
                for &x in &rest {
                    prop_assert!(beats(&case, y, x));
                }
            }
        }

        let values = topk_forward(&input.view(), &case.with_ret_typ(ReturnMode::Value), &HeapPool).unwrap();
        let masked_sum: f32 = case.data.iter().zip(mask).map(|(&v, &m)| v * m).sum();
        let value_sum: f32 = values.values().unwrap().data().iter().sum();
        prop_assert_eq!(masked_sum, value_sum);
    }

    #[test]
    fn prop_indices_match_both(case in arb_case()) {
        let input = case.input();
        let both = topk_forward(&input.view(), &case.with_ret_typ(ReturnMode::Both), &HeapPool).unwrap();
        let indices = topk_forward(&input.view(), &case.with_ret_typ(ReturnMode::Indices), &HeapPool).unwrap();
        prop_assert_eq!(both.indices(), indices.indices());
    }

    #[test]
    fn prop_backward_routes_to_selection(case in arb_case()) {
        let input = case.input();
        let params = case.with_ret_typ(ReturnMode::Value);
        let output = topk_forward(&input.view(), &params, &HeapPool).unwrap();
        let indices = output.indices().unwrap();
        let target = indices.shape().clone();

        let out_grad = Tensor::from_vec((1..=target.size()).map(|g| g as f32).collect(), target.clone()).unwrap();
        let mut expected = vec![0.0f32; input.shape().size()];
        for o in 0..target.size() {
            expected[source_position(&case, &target, o, indices.data()[o])] = out_grad.data()[o];
        }

        let mut overwritten = Tensor::from_vec(vec![-1.0f32; expected.len()], case.dims.clone()).unwrap();
        topk_backward(&out_grad.view(), &indices.view(), &params, WriteMode::Overwrite, &HeapPool, &mut overwritten.view_mut()).unwrap();
        prop_assert_eq!(overwritten.data(), &expected[..]);

        let mut accumulated = Tensor::zeros(case.dims.clone());
        for _ in 0..2 {
            topk_backward(&out_grad.view(), &indices.view(), &params, WriteMode::Accumulate, &HeapPool, &mut accumulated.view_mut()).unwrap();
        }
        let doubled: Vec<f32> = expected.iter().map(|g| 2.0 * g).collect();
        prop_assert_eq!(accumulated.data(), &doubled[..]);
    }

    #[test]
    fn prop_permutation_round_trip(dims in prop::collection::vec(1usize..=3, 1..=5), axis_seed in any::<usize>()) {
        let shape = Shape::from(dims);
        let permutation = AxisPermutation::to_last(&shape, axis_seed % shape.ndim());
        for j in 0..shape.size() {
            prop_assert_eq!(permutation.src_to_dst(permutation.dst_to_src(j)), j);
        }
    }
}
