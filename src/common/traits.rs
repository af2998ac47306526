use crate::Result;

/// Lifecycle of a server
#[allow(async_fn_in_trait)]
pub trait ServerTrait {
    /// Starts the server and serves until it is shut down
    async fn run(&self) -> Result<()>;

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()>;
}
