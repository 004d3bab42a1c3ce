//! Method routing, per-request contexts, middleware, and in-flight
//! cancellation.
//!
//! Handler registries are populated before the read loop starts and are
//! never mutated afterwards, so dispatch reads them without locking.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde_json::{Value, json};

use crate::pool::{CancellationToken, TaskPriority, ThreadPool};
use crate::protocol::{Message, Notification, Request, RequestId, error_codes};
use crate::transport::MessageWriter;

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Per-request state handed to a handler. The reply callbacks are
/// single-shot: the first `respond` or `error` wins, later calls are
/// silently dropped.
pub struct RequestContext {
    pub request_id: RequestId,
    pub method: String,
    pub params: Value,
    pub cancellation_token: CancellationToken,
    pub start_time: Instant,
    replied: AtomicBool,
    writer: Arc<MessageWriter>,
}

impl RequestContext {
    pub fn respond(&self, result: Value) {
        if !self.replied.swap(true, Ordering::SeqCst) {
            let _ = self.writer.write_response(&self.request_id, result);
        }
    }

    pub fn error(&self, code: i64, message: &str, data: Value) {
        if !self.replied.swap(true, Ordering::SeqCst) {
            let _ = self.writer.write_error(&self.request_id, code, message, data);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.load(Ordering::SeqCst)
    }

    pub fn has_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }
}

/// Hook pair run around every request handler. `pre_process` returning
/// false blocks the handler; a blocking middleware is responsible for any
/// reply it wants on the wire.
pub trait Middleware: Send + Sync {
    fn pre_process(&self, _context: &RequestContext) -> bool {
        true
    }

    fn post_process(&self, _context: &RequestContext, _success: bool) {}
}

pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn pre_process(&self, context: &RequestContext) -> bool {
        log::debug!(
            "processing request method={} id={}",
            context.method,
            context.request_id
        );
        true
    }

    fn post_process(&self, context: &RequestContext, success: bool) {
        log::debug!(
            "completed request method={} id={} success={success} duration_ms={}",
            context.method,
            context.request_id,
            context.start_time.elapsed().as_millis()
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct MethodMetrics {
    pub total_requests: u64,
    pub method_counts: HashMap<String, u64>,
    pub total_time: Duration,
}

#[derive(Default)]
pub struct MetricsMiddleware {
    metrics: Mutex<MethodMetrics>,
}

impl MetricsMiddleware {
    pub fn metrics(&self) -> MethodMetrics {
        lock_ignoring_poison(&self.metrics).clone()
    }

    pub fn reset_metrics(&self) {
        *lock_ignoring_poison(&self.metrics) = MethodMetrics::default();
    }
}

impl Middleware for MetricsMiddleware {
    fn pre_process(&self, context: &RequestContext) -> bool {
        let mut metrics = lock_ignoring_poison(&self.metrics);
        metrics.total_requests += 1;
        *metrics
            .method_counts
            .entry(context.method.clone())
            .or_insert(0) += 1;
        true
    }

    fn post_process(&self, context: &RequestContext, _success: bool) {
        lock_ignoring_poison(&self.metrics).total_time += context.start_time.elapsed();
    }
}

pub type RequestHandler = Arc<dyn Fn(&RequestContext) + Send + Sync>;
pub type NotificationHandler = Arc<dyn Fn(&Notification) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct DispatcherStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub cancelled_requests: u64,
    pub total_notifications: u64,
    pub total_processing_time: Duration,
    pub average_processing_time: Duration,
    pub method_counts: HashMap<String, u64>,
}

/// Shared view of the in-flight request table, used to translate
/// `$/cancelRequest` without holding a handle on the whole dispatcher.
#[derive(Clone)]
pub struct CancellationHandle {
    active: Arc<Mutex<HashMap<RequestId, CancellationToken>>>,
}

impl CancellationHandle {
    pub fn cancel(&self, id: &RequestId) {
        let active = lock_ignoring_poison(&self.active);
        if let Some(token) = active.get(id) {
            token.store(true, Ordering::SeqCst);
            log::debug!("cancelled request id={id}");
        }
    }
}

pub struct RequestDispatcher {
    writer: Arc<MessageWriter>,
    pool: Arc<ThreadPool>,
    request_handlers: HashMap<String, RequestHandler>,
    notification_handlers: HashMap<String, NotificationHandler>,
    middleware: Vec<Arc<dyn Middleware>>,
    active_requests: Arc<Mutex<HashMap<RequestId, CancellationToken>>>,
    stats: Arc<Mutex<DispatcherStats>>,
}

impl RequestDispatcher {
    pub fn new(writer: Arc<MessageWriter>, pool: Arc<ThreadPool>) -> Self {
        RequestDispatcher {
            writer,
            pool,
            request_handlers: HashMap::new(),
            notification_handlers: HashMap::new(),
            middleware: Vec::new(),
            active_requests: Arc::new(Mutex::new(HashMap::new())),
            stats: Arc::new(Mutex::new(DispatcherStats::default())),
        }
    }

    pub fn register_request_handler<F>(&mut self, method: &str, handler: F)
    where
        F: Fn(&RequestContext) + Send + Sync + 'static,
    {
        log::debug!("registering request handler method={method}");
        self.request_handlers
            .insert(method.to_string(), Arc::new(handler));
    }

    pub fn register_notification_handler<F>(&mut self, method: &str, handler: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        log::debug!("registering notification handler method={method}");
        self.notification_handlers
            .insert(method.to_string(), Arc::new(handler));
    }

    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    pub fn has_request_handler(&self, method: &str) -> bool {
        self.request_handlers.contains_key(method)
    }

    pub fn has_notification_handler(&self, method: &str) -> bool {
        self.notification_handlers.contains_key(method)
    }

    pub fn cancellation_handle(&self) -> CancellationHandle {
        CancellationHandle {
            active: Arc::clone(&self.active_requests),
        }
    }

    pub fn dispatch(&self, message: Message) {
        match message {
            Message::Request(request) => self.dispatch_request(request),
            Message::Notification(notification) => self.dispatch_notification(notification),
            Message::Response { id, .. } => {
                log::debug!("ignoring response message id={id}");
            }
            Message::ErrorResponse { id, code, .. } => {
                log::debug!("ignoring error response id={id} code={code}");
            }
        }
    }

    fn dispatch_request(&self, request: Request) {
        log::debug!("dispatching request method={}", request.method);

        let handler = match self.request_handlers.get(&request.method) {
            Some(handler) => Arc::clone(handler),
            None => {
                let _ = self.writer.write_error(
                    &request.id,
                    error_codes::METHOD_NOT_FOUND,
                    "Method not found",
                    json!({ "method": request.method }),
                );
                let mut stats = lock_ignoring_poison(&self.stats);
                stats.total_requests += 1;
                stats.failed_requests += 1;
                return;
            }
        };

        let token = ThreadPool::create_cancellation_token();
        lock_ignoring_poison(&self.active_requests)
            .insert(request.id.clone(), Arc::clone(&token));

        let context = RequestContext {
            request_id: request.id.clone(),
            method: request.method.clone(),
            params: request.params,
            cancellation_token: token,
            start_time: Instant::now(),
            replied: AtomicBool::new(false),
            writer: Arc::clone(&self.writer),
        };

        let middleware = self.middleware.clone();
        let active_requests = Arc::clone(&self.active_requests);
        let stats = Arc::clone(&self.stats);

        let priority = if request.method == "shutdown" {
            TaskPriority::Urgent
        } else {
            TaskPriority::Normal
        };

        let submitted = self.pool.submit(priority, move || {
            execute_request(context, handler, &middleware, &active_requests, &stats);
        });

        if let Err(e) = submitted {
            log::error!("failed to submit request task: {e}");
            lock_ignoring_poison(&self.active_requests).remove(&request.id);
            let _ = self.writer.write_error(
                &request.id,
                error_codes::INTERNAL_ERROR,
                "Internal error",
                json!({ "details": e.to_string() }),
            );
            let mut stats = lock_ignoring_poison(&self.stats);
            stats.total_requests += 1;
            stats.failed_requests += 1;
        }
    }

    fn dispatch_notification(&self, notification: Notification) {
        log::debug!("dispatching notification method={}", notification.method);

        let handler = match self.notification_handlers.get(&notification.method) {
            Some(handler) => Arc::clone(handler),
            None => {
                log::debug!(
                    "no handler registered for notification method={}",
                    notification.method
                );
                return;
            }
        };

        // Cancellation and exit jump the queue so a busy pool cannot delay
        // them behind the very work they affect.
        let priority = match notification.method.as_str() {
            "exit" | "$/cancelRequest" => TaskPriority::Urgent,
            _ => TaskPriority::Low,
        };

        let stats = Arc::clone(&self.stats);
        let submitted = self.pool.submit(priority, move || {
            if catch_unwind(AssertUnwindSafe(|| handler(&notification))).is_err() {
                log::error!("notification handler panicked method={}", notification.method);
            }
            lock_ignoring_poison(&stats).total_notifications += 1;
        });
        if let Err(e) = submitted {
            log::error!("failed to submit notification task: {e}");
        }
    }

    /// Set the cancellation flag for an in-flight request, if any.
    pub fn cancel_request(&self, id: &RequestId) {
        self.cancellation_handle().cancel(id);
    }

    pub fn cancel_all_requests(&self) {
        let mut active = lock_ignoring_poison(&self.active_requests);
        for token in active.values() {
            token.store(true, Ordering::SeqCst);
        }
        log::info!("cancelled {} active requests", active.len());
        active.clear();
    }

    pub fn active_request_count(&self) -> usize {
        lock_ignoring_poison(&self.active_requests).len()
    }

    pub fn stats(&self) -> DispatcherStats {
        lock_ignoring_poison(&self.stats).clone()
    }

    pub fn reset_stats(&self) {
        *lock_ignoring_poison(&self.stats) = DispatcherStats::default();
    }
}

fn execute_request(
    context: RequestContext,
    handler: RequestHandler,
    middleware: &[Arc<dyn Middleware>],
    active_requests: &Mutex<HashMap<RequestId, CancellationToken>>,
    stats: &Mutex<DispatcherStats>,
) {
    // Cancelled before starting: no reply at all, by design.
    if context.is_cancelled() {
        log::debug!("request cancelled before execution method={}", context.method);
        lock_ignoring_poison(active_requests).remove(&context.request_id);
        let mut stats = lock_ignoring_poison(stats);
        stats.total_requests += 1;
        stats.cancelled_requests += 1;
        return;
    }

    let mut ran = 0;
    let mut blocked = false;
    for m in middleware {
        if !m.pre_process(&context) {
            blocked = true;
            break;
        }
        ran += 1;
    }

    let mut success = false;
    if blocked {
        log::warn!("request blocked by middleware method={}", context.method);
    } else {
        match catch_unwind(AssertUnwindSafe(|| handler(&context))) {
            Ok(()) => success = true,
            Err(payload) => {
                let details = panic_message(&payload);
                log::error!("request handler panicked method={}: {details}", context.method);
                context.error(
                    error_codes::INTERNAL_ERROR,
                    "Internal error",
                    json!({ "details": details }),
                );
            }
        }
    }

    // Only middlewares whose pre-process actually ran see the post hook,
    // in reverse order.
    for m in middleware[..ran].iter().rev() {
        m.post_process(&context, success);
    }

    lock_ignoring_poison(active_requests).remove(&context.request_id);

    let elapsed = context.start_time.elapsed();
    let mut stats = lock_ignoring_poison(stats);
    stats.total_requests += 1;
    if success {
        stats.successful_requests += 1;
    } else {
        stats.failed_requests += 1;
    }
    stats.total_processing_time += elapsed;
    stats.average_processing_time = stats.total_processing_time / stats.total_requests as u32;
    *stats
        .method_counts
        .entry(context.method.clone())
        .or_insert(0) += 1;
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
