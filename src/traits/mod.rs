pub mod to_tensor;
pub mod trainable;

pub use to_tensor::{to_vec, ToTensor};
pub use trainable::TrainingMetrics;
