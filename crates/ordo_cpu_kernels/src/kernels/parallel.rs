//! Per-element and per-batch loops that run on rayon when the `rayon`
//! feature is enabled and sequentially otherwise. Results do not depend on
//! which path runs.

#[cfg(feature = "rayon")]
pub(crate) fn for_each_indexed<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Send + Sync,
{
    use rayon::prelude::*;

    items.par_iter_mut().enumerate().for_each(|(i, item)| f(i, item));
}

#[cfg(not(feature = "rayon"))]
pub(crate) fn for_each_indexed<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Send + Sync,
{
    items.iter_mut().enumerate().for_each(|(i, item)| f(i, item));
}

#[cfg(feature = "rayon")]
pub(crate) fn for_each_batch<T, F>(items: &mut [T], batch_len: usize, f: F)
where
    T: Send,
    F: Fn(&mut [T]) + Send + Sync,
{
    use rayon::prelude::*;

    items.par_chunks_mut(batch_len).for_each(f);
}

#[cfg(not(feature = "rayon"))]
pub(crate) fn for_each_batch<T, F>(items: &mut [T], batch_len: usize, f: F)
where
    T: Send,
    F: Fn(&mut [T]) + Send + Sync,
{
    items.chunks_mut(batch_len).for_each(f);
}
