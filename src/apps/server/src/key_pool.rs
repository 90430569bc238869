use rand::seq::SliceRandom;

/// Shared upstream keys; one is picked at random per request.
#[derive(Debug, Clone, Default)]
pub struct KeyPool {
    keys: Vec<String>,
}

impl KeyPool {
    pub fn new(keys: Vec<String>) -> Self {
        let keys = keys
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
        Self { keys }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn pick(&self) -> Option<&str> {
        self.keys.choose(&mut rand::thread_rng()).map(String::as_str)
    }
}
