use burn::{
    prelude::*,
    tensor::{BasicOps, Element},
};

/// A trait for converting items to tensors
///
/// Commonly implemented for `Vec<T>` to convert a batch of states `T` to a tensor of dimension `D`,
/// which is what a [`DQNAgent`](crate::algo::dqn::DQNAgent) feeds its Q-networks
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

impl<B, E, K> ToTensor<B, 1, K> for Vec<E>
where
    B: Backend,
    E: Element,
    K: BasicOps<B, Elem = E>,
{
    fn to_tensor(self, device: &<B as Backend>::Device) -> Tensor<B, 1, K> {
        let len = self.len();
        Tensor::from_data(Data::new(self, Shape::new([len])), device)
    }
}

impl<B, E, K, const A: usize> ToTensor<B, 2, K> for Vec<[E; A]>
where
    B: Backend,
    E: Element,
    K: BasicOps<B, Elem = E>,
{
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, K> {
        let len = self.len();
        let data = Data::new(
            self.into_iter().flatten().collect::<Vec<_>>(),
            Shape::new([len, A]),
        );
        Tensor::from_data(data, device)
    }
}
