//! Action contract and the short-circuiting pipeline runner

use crate::pipeline::context::TaskContext;
use async_trait::async_trait;

/// One gated step of an item's work
///
/// `met` decides whether the step applies (and is where re-run idempotency
/// lives); `invoke` performs it. A `false` from either halts the pipeline.
#[async_trait]
pub trait Action: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn met(&self, _ctx: &TaskContext) -> bool {
        true
    }

    async fn invoke(&self, ctx: &mut TaskContext) -> bool;
}

/// Runs `met` and, only if it holds, `invoke`
pub async fn call(action: &dyn Action, ctx: &mut TaskContext) -> bool {
    if !action.met(ctx) {
        tracing::debug!("[{}] {} skipped: precondition not met", ctx.item.id, action.name());
        return false;
    }

    let ok = action.invoke(ctx).await;
    if !ok {
        tracing::debug!("[{}] {} failed", ctx.item.id, action.name());
    }
    ok
}

/// Ordered list of actions executed for one item
///
/// Actions run strictly in order; the first `false` stops the pipeline and no
/// later action runs.
#[derive(Default)]
pub struct Pipeline {
    actions: Vec<Box<dyn Action>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an action, builder style
    pub fn then(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    pub fn push(&mut self, action: Box<dyn Action>) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Action names in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    /// Executes the actions in order, stopping at the first failure
    pub async fn run(&self, ctx: &mut TaskContext) -> bool {
        for action in &self.actions {
            if !call(action.as_ref(), ctx).await {
                tracing::info!(
                    "[{}] pipeline stopped at {}",
                    ctx.item.id,
                    action.name()
                );
                return false;
            }
        }
        true
    }
}
