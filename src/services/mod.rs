pub mod frame_service;
pub mod reply_parser;

pub use frame_service::FrameService;
pub use reply_parser::extract_image_ref;
