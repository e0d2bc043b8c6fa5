use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use callbackd::exec::{Invocation, Invoker};

/// A fake invoker that:
/// - records every invocation it receives (in start order)
/// - optionally holds each invocation open until the test releases it.
#[derive(Clone, Default)]
pub struct RecordingInvoker {
    started: Arc<Mutex<Vec<Invocation>>>,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingInvoker {
    /// Invocations complete immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations complete only once [`release`](Self::release) hands out
    /// a permit for them.
    pub fn gated() -> Self {
        Self {
            started: Arc::default(),
            gate: Some(Arc::new(Semaphore::new(0))),
        }
    }

    /// Let `n` held invocations finish.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn started(&self) -> Vec<Invocation> {
        self.started.lock().unwrap().clone()
    }

    /// Templates of the started invocations, in start order.
    pub fn templates(&self) -> Vec<String> {
        self.started()
            .iter()
            .map(|inv| inv.template.to_string())
            .collect()
    }

    /// Poll until at least `n` invocations have started.
    pub async fn wait_for_started(&self, n: usize) {
        for _ in 0..500 {
            if self.started.lock().unwrap().len() >= n {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("expected {n} invocations, got {:?}", self.templates());
    }
}

impl Invoker for RecordingInvoker {
    fn invoke<'a>(
        &'a self,
        invocation: &'a Invocation,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.started.lock().unwrap().push(invocation.clone());
            if let Some(gate) = &self.gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }
        })
    }
}
