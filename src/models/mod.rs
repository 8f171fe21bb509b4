pub mod frame;

pub use frame::{FrameRequest, FrameResult, ImageRef};
