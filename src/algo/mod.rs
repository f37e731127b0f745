/// Deep Q Network agent
pub mod dqn;
