use crate::error::RuntimeError;

/// Trait for tokenizers supplied by a runtime
///
/// Generation and representation models both expose one; the pipeline uses it
/// to encode prompts, decode output and scan for stop sequences.
pub trait TokenizerTrait: Send + Sync {
    /// Encode text to token IDs
    fn encode(&self, text: &str) -> Result<Vec<u32>, RuntimeError>;

    /// Decode token IDs to text
    fn decode(&self, ids: &[u32]) -> Result<String, RuntimeError>;

    /// Check if a token is the EOS token
    fn is_eos(&self, token_id: u32) -> bool;
}

/// Boxed tokenizer type for runtimes that pick a tokenizer at load time
pub type BoxedTokenizer = Box<dyn TokenizerTrait>;

impl TokenizerTrait for BoxedTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, RuntimeError> {
        self.as_ref().encode(text)
    }

    fn decode(&self, ids: &[u32]) -> Result<String, RuntimeError> {
        self.as_ref().decode(ids)
    }

    fn is_eos(&self, token_id: u32) -> bool {
        self.as_ref().is_eos(token_id)
    }
}
