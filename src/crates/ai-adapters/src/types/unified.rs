/// Token accounting reported by the provider, usually on the last chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedTokenUsage {
    pub prompt_token_count: u32,
    pub candidates_token_count: u32,
    pub total_token_count: u32,
}

/// Provider-neutral view of one streamed chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedResponse {
    pub text: Option<String>,
    pub usage: Option<UnifiedTokenUsage>,
    pub finish_reason: Option<String>,
}
