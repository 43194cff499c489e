use async_trait::async_trait;
use core_wire::{
    CacheSnapshot, PredictionRequest, PredictionResponse, PredictionService, ResetBranchRequest,
    ResetBranchResponse, WireError,
};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend double answering every call from fixed data, or failing every call with a 503.
pub struct FixedBackend {
    healthy: bool,
    clear_used: AtomicUsize,
    last_reset: Mutex<Option<ResetBranchRequest>>,
}

impl FixedBackend {
    pub fn healthy() -> Self {
        Self::with_health(true)
    }

    pub fn unreachable() -> Self {
        Self::with_health(false)
    }

    fn with_health(healthy: bool) -> Self {
        Self {
            healthy,
            clear_used: AtomicUsize::new(0),
            last_reset: Mutex::new(None),
        }
    }

    pub fn clear_used_calls(&self) -> usize {
        self.clear_used.load(Ordering::SeqCst)
    }

    pub fn last_reset(&self) -> Option<ResetBranchRequest> {
        self.last_reset.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), WireError> {
        if self.healthy {
            Ok(())
        } else {
            Err(WireError::status(503, "down"))
        }
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

#[async_trait]
impl PredictionService for FixedBackend {
    async fn fetch_words(&self, _req: &PredictionRequest) -> Result<PredictionResponse, WireError> {
        self.check()?;
        Ok(PredictionResponse {
            words: words(&["dog", "cat"]),
            cached_words: words(&["dog"]),
            ..Default::default()
        })
    }

    async fn refresh_words(
        &self,
        _req: &PredictionRequest,
    ) -> Result<PredictionResponse, WireError> {
        self.check()?;
        Ok(PredictionResponse {
            words: words(&["bird", "fish"]),
            ..Default::default()
        })
    }

    async fn generate_cache(&self, _req: &PredictionRequest) -> Result<(), WireError> {
        self.check()
    }

    async fn cache_snapshot(&self) -> Result<CacheSnapshot, WireError> {
        self.check()?;
        Ok(CacheSnapshot {
            cached_words: words(&["dog", "cat"]),
            used_words: Vec::new(),
        })
    }

    async fn clear_used(&self) -> Result<(), WireError> {
        self.check()?;
        self.clear_used.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reset_branch(
        &self,
        req: &ResetBranchRequest,
    ) -> Result<ResetBranchResponse, WireError> {
        self.check()?;
        *self.last_reset.lock().unwrap() = Some(req.clone());
        Ok(ResetBranchResponse {
            words: words(&["to", "go"]),
        })
    }

    async fn check_health(&self) -> bool {
        self.healthy
    }
}
