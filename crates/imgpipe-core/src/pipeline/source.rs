//! Turns candidate paths into items.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::types::Rejection;

use super::channel::WorkerContext;
use super::item::{Flow, Item};
use super::validate::Validator;

/// Validates candidates and builds items for one batch.
#[derive(Debug, Clone)]
pub struct Admission {
    validator: Validator,
    input_root: String,
    output_root: String,
}

impl Admission {
    pub fn new(validator: Validator, input_root: &str, output_root: &str) -> Self {
        Self {
            validator,
            input_root: input_root.to_string(),
            output_root: output_root.to_string(),
        }
    }

    /// Validate one candidate and, if it passes, create its item.
    pub fn admit(&self, path: &Path) -> Result<Item, Rejection> {
        self.validator.validate(path)?;
        Ok(Item::new(path, &self.input_root, &self.output_root))
    }

    /// Feed admitted items into the first hand-off, in input order.
    ///
    /// Rejected paths are reported to the observer and returned; they never
    /// enter the channel. The sender is dropped on return, closing the
    /// hand-off for the next worker.
    pub async fn feed<O, F>(
        self,
        paths: Vec<PathBuf>,
        output: mpsc::Sender<O>,
        ctx: WorkerContext,
        emit: F,
    ) -> Vec<Rejection>
    where
        F: Fn(Flow) -> O,
    {
        let mut rejected = Vec::new();

        for path in paths {
            if ctx.cancel.is_cancelled() {
                break;
            }

            let item = match self.admit(&path) {
                Ok(item) => item,
                Err(rejection) => {
                    ctx.observer.input_rejected(&rejection);
                    rejected.push(rejection);
                    continue;
                }
            };

            let sent = tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => break,
                sent = output.send(emit(Ok(item))) => sent,
            };
            if sent.is_err() {
                break;
            }
        }

        rejected
    }
}
