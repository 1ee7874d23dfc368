//! Generic proxy chain assembly.
//!
//! A [`ProxyChain`] wraps an externally supplied connection (database
//! handle, cache connection, HTTP transport) in an ordered list of
//! decorator nodes without changing its public contract. Each node holds
//! the next delegate behind a shared capability trait; assembly wires
//! `node[i].next = node[i+1]` and terminates at the real connection.
//!
//! Chains are assembled once at startup and reused by every call. With
//! zero nodes, [`assemble`](ProxyChain::assemble) returns the terminal
//! delegate itself - a zero-overhead pass-through, which is the common
//! production case with instrumentation disabled.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// A boxed future returning a proxied operation's result.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A node constructor: receives the next delegate, returns the wrapping
/// node under the same capability interface.
pub type NodeFactory<T> = Box<dyn FnOnce(Arc<T>) -> Arc<T> + Send>;

/// Hook invoked when a proxied operation exceeds its slow threshold.
///
/// Receives an operation label and the elapsed time.
pub type SlowCallHook = Arc<dyn Fn(&str, Duration) + Send + Sync>;

/// Returns the default slow-call hook: a structured warning log.
#[must_use]
pub fn log_slow_call_hook() -> SlowCallHook {
    Arc::new(|operation, elapsed| {
        tracing::warn!(operation = %operation, elapsed = ?elapsed, "slow proxied call");
    })
}

/// An ordered list of proxy node factories over one capability interface.
///
/// # Example
///
/// ```ignore
/// let conn: Arc<dyn SqlConn> = ProxyChain::new()
///     .layer(|next| Arc::new(TimingSqlConn::new(threshold, hook, next)) as Arc<dyn SqlConn>)
///     .layer(|next| Arc::new(TracingSqlConn::new(correlator, next)) as Arc<dyn SqlConn>)
///     .assemble(real_conn);
/// ```
pub struct ProxyChain<T: ?Sized> {
    factories: Vec<NodeFactory<T>>,
}

impl<T: ?Sized> ProxyChain<T> {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Appends a node factory. Nodes run in the order they are added: the
    /// first layer becomes the outermost node.
    #[must_use]
    pub fn layer<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(Arc<T>) -> Arc<T> + Send + 'static,
    {
        self.factories.push(Box::new(factory));
        self
    }

    /// Returns the number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Checks whether the chain has no layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Wires the nodes around `terminal` and returns the entry point.
    ///
    /// Folding right to left sets each node's next delegate exactly once;
    /// with no layers the terminal itself is returned unchanged.
    #[must_use]
    pub fn assemble(self, terminal: Arc<T>) -> Arc<T> {
        let mut current = terminal;
        for factory in self.factories.into_iter().rev() {
            current = factory(current);
        }
        current
    }
}

impl<T: ?Sized> Default for ProxyChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Plain;

    impl Greeter for Plain {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct Loud {
        next: Arc<dyn Greeter>,
    }

    impl Greeter for Loud {
        fn greet(&self) -> String {
            self.next.greet().to_uppercase()
        }
    }

    struct Bracketed {
        next: Arc<dyn Greeter>,
    }

    impl Greeter for Bracketed {
        fn greet(&self) -> String {
            format!("[{}]", self.next.greet())
        }
    }

    #[test]
    fn test_empty_chain_returns_terminal_itself() {
        let terminal: Arc<dyn Greeter> = Arc::new(Plain);
        let assembled = ProxyChain::new().assemble(Arc::clone(&terminal));
        assert!(Arc::ptr_eq(&terminal, &assembled));
    }

    #[test]
    fn test_first_layer_is_outermost() {
        let terminal: Arc<dyn Greeter> = Arc::new(Plain);
        let assembled = ProxyChain::new()
            .layer(|next| Arc::new(Bracketed { next }) as Arc<dyn Greeter>)
            .layer(|next| Arc::new(Loud { next }) as Arc<dyn Greeter>)
            .assemble(terminal);

        // Bracketed wraps Loud wraps Plain.
        assert_eq!(assembled.greet(), "[HELLO]");
    }

    #[test]
    fn test_len_and_is_empty() {
        let chain: ProxyChain<dyn Greeter> = ProxyChain::new();
        assert!(chain.is_empty());

        let chain = chain.layer(|next| Arc::new(Loud { next }) as Arc<dyn Greeter>);
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
    }
}
