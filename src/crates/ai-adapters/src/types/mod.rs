pub mod openai;
pub mod unified;
