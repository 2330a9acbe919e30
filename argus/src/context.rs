use crate::config::EngineConfig;
use argus_cfa::Cfa;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared flag polled by long-running algorithms.
///
/// Clones observe the same flag, so a caller can keep one handle and hand
/// another to the analysis.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything an analysis run needs besides the analyses themselves.
#[derive(Debug, Clone)]
pub struct AnalysisContext<'a> {
    pub cfa: &'a Cfa,
    pub config: EngineConfig,
    cancellation: CancellationToken,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(cfa: &'a Cfa, config: EngineConfig) -> Self {
        Self {
            cfa,
            config,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
