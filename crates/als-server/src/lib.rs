pub mod dispatcher;
pub mod documents;
pub mod pool;
pub mod protocol;
pub mod server;
pub mod transport;

pub use dispatcher::{
    CancellationHandle, DispatcherStats, LoggingMiddleware, MethodMetrics, MetricsMiddleware,
    Middleware, RequestContext, RequestDispatcher,
};
pub use documents::DocumentStore;
pub use pool::{CancellationToken, TaskHandle, TaskPriority, TaskStats, ThreadPool};
pub use protocol::{Message, Notification, Request, RequestId, error_codes};
pub use server::LspServer;
pub use transport::{MAX_MESSAGE_SIZE, MessageReader, MessageWriter};
