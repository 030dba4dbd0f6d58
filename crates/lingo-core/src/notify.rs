/// Fire-and-forget signal that stored vocabulary changed.
///
/// Implementations must not block and must swallow their own failures.
pub trait RefreshNotifier: Send + Sync {
    fn notify(&self);
}

pub struct NoopNotifier;

impl RefreshNotifier for NoopNotifier {
    fn notify(&self) {}
}
