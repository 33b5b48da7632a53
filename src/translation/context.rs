use crate::translation::TranslationResult;
use crate::utils::trailing_words;

/// Trailing `context_size` words of a chunk's translation.
pub fn extract_context(translated_text: &str, context_size: usize) -> String {
    trailing_words(translated_text, context_size)
}

/// Resolves the context handed to a chunk from its immediate predecessor's
/// translation. Context never accumulates beyond one chunk of lookback.
#[derive(Debug, Clone)]
pub struct ContextManager {
    context_size: usize,
}

impl ContextManager {
    pub fn new(context_size: usize) -> Self {
        Self { context_size }
    }

    pub fn context_for(&self, chunk_index: usize, completed: &[TranslationResult]) -> String {
        if chunk_index == 0 {
            return String::new();
        }

        completed
            .iter()
            .find(|r| r.chunk_index == chunk_index - 1)
            .map(|r| extract_context(&r.translated_text, self.context_size))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(index: usize, text: &str) -> TranslationResult {
        TranslationResult {
            chunk_index: index,
            translated_text: text.to_string(),
            original_length: 0,
            translated_length: text.split_whitespace().count(),
        }
    }

    #[test]
    fn extracts_trailing_words() {
        assert_eq!(extract_context("uno dos tres cuatro", 2), "tres cuatro");
        assert_eq!(extract_context("uno dos", 100), "uno dos");
    }

    #[test]
    fn first_chunk_has_no_context() {
        let manager = ContextManager::new(3);
        assert_eq!(manager.context_for(0, &[result(0, "a b c")]), "");
    }

    #[test]
    fn uses_only_the_immediate_predecessor() {
        let manager = ContextManager::new(2);
        let completed = vec![result(1, "deux trois quatre"), result(0, "un")];

        assert_eq!(manager.context_for(2, &completed), "trois quatre");
        assert_eq!(manager.context_for(1, &completed), "un");
        assert_eq!(manager.context_for(4, &completed), "");
    }
}
