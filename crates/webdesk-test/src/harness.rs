//! A booted desktop with its loop running, for end-to-end tests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use webdesk_core::{SurfaceId, WindowId};
use webdesk_kernel::{
    ChannelSurfaceHost, ExitReason, HostConfig, InMemoryIdentityProvider, Kernel, KernelHandle,
    KernelResult, Process, SurfaceEvent,
};
use webdesk_rpc::RpcClient;
use webdesk_storage::{KvStore, MemoryKvStore};

/// Seed used for window placement so geometry is reproducible.
pub const TEST_PLACEMENT_SEED: u64 = 42;

/// A launched app as its own code sees it.
#[derive(Debug)]
pub struct RunningApp {
    /// The process record the kernel returned.
    pub process: Process,
    /// Surface the app was attached to.
    pub surface_id: SurfaceId,
    /// URL the surface was asked to load.
    pub entry_url: String,
    /// RPC client wired to the app's channel.
    pub client: RpcClient,
}

/// A signed-in desktop whose kernel loop runs on a background task.
pub struct TestDesk {
    /// Handle the shell chrome would hold.
    pub handle: KernelHandle,
    /// The identity provider, for signing out mid-test.
    pub identity: InMemoryIdentityProvider,
    /// The storage provider behind the desktop.
    pub store: Arc<dyn KvStore>,
    /// Per-call timeout handed to app clients.
    pub rpc_timeout: Duration,
    surfaces: mpsc::UnboundedReceiver<SurfaceEvent>,
    task: JoinHandle<ExitReason>,
}

impl TestDesk {
    /// Boot with defaults, an in-memory store and user `u1`.
    pub async fn boot() -> Self {
        Self::boot_with(HostConfig::default(), Arc::new(MemoryKvStore::new())).await
    }

    /// Boot with a custom config and store. Placement is always seeded.
    pub async fn boot_with(config: HostConfig, store: Arc<dyn KvStore>) -> Self {
        let identity = InMemoryIdentityProvider::signed_in("u1", "tester");
        let config = config.with_placement_seed(TEST_PLACEMENT_SEED);
        let rpc_timeout = config.rpc_timeout;
        let (host, surfaces) = ChannelSurfaceHost::new();

        let (kernel, handle) = Kernel::boot(
            config,
            Arc::new(identity.clone()),
            Arc::clone(&store),
            Box::new(host),
        )
        .await
        .expect("failed to boot test desktop");

        Self {
            handle,
            identity,
            store,
            rpc_timeout,
            surfaces,
            task: tokio::spawn(kernel.run()),
        }
    }

    /// Launch `app_id` and connect a client to its surface.
    ///
    /// # Errors
    ///
    /// Whatever the kernel's launch returns.
    pub async fn launch(&mut self, app_id: &str) -> KernelResult<RunningApp> {
        let process = self.handle.launch(app_id).await?;
        let attachment = self.attachment_for(process.window_id);
        Ok(RunningApp {
            surface_id: attachment.surface_id,
            entry_url: attachment.entry_url,
            client: RpcClient::with_timeout(attachment.channel, self.rpc_timeout),
            process,
        })
    }

    /// Surface ids detached so far, in order.
    pub fn detached(&mut self) -> Vec<SurfaceId> {
        let mut ids = Vec::new();
        while let Ok(event) = self.surfaces.try_recv() {
            if let SurfaceEvent::Detached { surface_id, .. } = event {
                ids.push(surface_id);
            }
        }
        ids
    }

    /// Wait for the kernel loop to end on its own.
    pub async fn join(self) -> ExitReason {
        let Self { handle, task, .. } = self;
        // Keep the handle alive so only the session ending can stop the loop.
        let reason = task.await.expect("kernel task panicked");
        drop(handle);
        reason
    }

    /// Drop every handle and wait for the loop to shut down.
    pub async fn shutdown(self) -> ExitReason {
        let Self { handle, task, .. } = self;
        drop(handle);
        task.await.expect("kernel task panicked")
    }

    fn attachment_for(&mut self, window_id: WindowId) -> webdesk_kernel::SurfaceAttachment {
        // The kernel attaches the surface before it replies to the launch.
        loop {
            match self.surfaces.try_recv() {
                Ok(SurfaceEvent::Attached(a)) if a.window_id == window_id => return a,
                Ok(_) => {},
                Err(e) => panic!("no surface attached for {window_id}: {e}"),
            }
        }
    }
}
