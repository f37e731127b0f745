use burn::{
    prelude::*,
    tensor::{activation::relu, backend::AutodiffBackend},
};
use deepq::algo::dqn::{soft_update_linear, DQNModel};
use nn::{Linear, LinearConfig};

/// The local/target Q-network: two hidden ReLU layers over the 4 CartPole observations
#[derive(Module, Debug)]
pub struct Model<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
}

#[derive(Config, Debug)]
pub struct ModelConfig {
    fc1_out: usize,
    fc2_out: usize,
}

impl ModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Model<B> {
        Model {
            fc1: LinearConfig::new(4, self.fc1_out).init(device),
            fc2: LinearConfig::new(self.fc1_out, self.fc2_out).init(device),
            fc3: LinearConfig::new(self.fc2_out, 2).init(device),
        }
    }
}

impl<B: AutodiffBackend> DQNModel<B, 2> for Model<B> {
    fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.fc1.forward(input));
        let x = relu(self.fc2.forward(x));
        self.fc3.forward(x)
    }

    fn soft_update(self, other: &Self, tau: f32) -> Self {
        Self {
            fc1: soft_update_linear(self.fc1, &other.fc1, tau),
            fc2: soft_update_linear(self.fc2, &other.fc2, tau),
            fc3: soft_update_linear(self.fc3, &other.fc3, tau),
        }
    }
}
