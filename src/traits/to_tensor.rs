use burn::{
    prelude::*,
    tensor::{BasicOps, Element, TensorData},
};

/// A trait for converting items to tensors
///
/// Implemented for `Vec<E>` (one row) and `Vec<Vec<E>>` (a batch of
/// equal-width rows, as produced by replay buffer sampling).
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

impl<B, E, K> ToTensor<B, 1, K> for Vec<E>
where
    B: Backend,
    E: Element,
    K: BasicOps<B>,
{
    #[inline]
    fn to_tensor(self, device: &<B as Backend>::Device) -> Tensor<B, 1, K> {
        let len = self.len();
        Tensor::from_data(TensorData::new(self, [len]).convert::<K::Elem>(), device)
    }
}

impl<B, E, K> ToTensor<B, 2, K> for Vec<Vec<E>>
where
    B: Backend,
    E: Element,
    K: BasicOps<B>,
{
    /// Rows must all have the width of the first row.
    #[inline]
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, K> {
        let batch_size = self.len();
        let width = self.first().map_or(0, Vec::len);

        let mut flat = Vec::with_capacity(batch_size * width);
        for row in self {
            flat.extend(row);
        }

        let data = TensorData::new(flat, [batch_size, width]).convert::<K::Elem>();
        Tensor::<B, 2, K>::from_data(data, device)
    }
}

/// Read a float tensor back into a flat `Vec<f32>`.
pub fn to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> crate::Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| crate::Error::Tensor(format!("{e:?}")))
}
