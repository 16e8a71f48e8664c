// Domain models

mod sample;

pub use sample::{NewSample, Sample};
