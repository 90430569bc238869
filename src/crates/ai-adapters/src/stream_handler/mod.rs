mod openai;

pub use openai::{extract_sse_api_error_message, handle_openai_stream};
