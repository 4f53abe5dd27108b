//! Shutdown tasks and disposal.

use std::future::Future;
use std::mem;

use futures::FutureExt;
use log::{debug, info};

use common_error::ModelResult;

use crate::address_space::{AddressSpace, SpaceState};

impl AddressSpace {
    /// Register a task to run on [`shutdown`](Self::shutdown).
    ///
    /// Tasks run one after another in registration order.
    pub fn register_shutdown_task<F, Fut>(&mut self, task: F) -> ModelResult<()>
    where
        F: FnOnce() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.ensure_live()?;
        self.shutdown_tasks.push(Box::new(move || task().boxed()));
        Ok(())
    }

    /// Number of registered shutdown tasks not yet run.
    pub fn shutdown_task_count(&self) -> usize {
        self.shutdown_tasks.len()
    }

    /// Run every registered shutdown task, awaiting each before starting the
    /// next. Each task runs at most once.
    pub async fn shutdown(&mut self) -> ModelResult<()> {
        self.ensure_live()?;
        let tasks = mem::take(&mut self.shutdown_tasks);
        debug!("Running {} shutdown tasks", tasks.len());
        for task in tasks {
            task().await;
        }
        Ok(())
    }

    /// Release every node, reference and namespace.
    ///
    /// Value sources and method handlers held by nodes are dropped here. Any
    /// later graph operation fails with `AddressSpaceDisposed`. Disposing
    /// twice is a no-op.
    pub fn dispose(&mut self) {
        if self.state == SpaceState::Disposed {
            return;
        }
        let count = self.nodes.len();
        for node in self.nodes.values_mut() {
            node.references.clear();
        }
        self.nodes.clear();
        self.nodes.shrink_to_fit();
        self.browse_names.clear();
        self.pending.clear();
        self.invalidate_data_type_cache();
        self.namespaces.clear();
        self.shutdown_tasks.clear();
        self.state = SpaceState::Disposed;
        info!("Disposed address space ({count} nodes released)");
    }
}
