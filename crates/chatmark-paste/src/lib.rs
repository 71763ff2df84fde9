mod convert;
mod detect;
mod narrow;
mod node;

pub use convert::{TextareaContext, paste_handler_converter};
pub use detect::{is_single_image, maybe_transform_html};
pub use narrow::try_stream_topic_syntax_text;
